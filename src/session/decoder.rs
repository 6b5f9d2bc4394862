//! Line-delimited JSON stream decoder
//!
//! The chat backend streams its reply as newline-terminated JSON objects,
//! one per line: `{"response": "<fragment>"}` for incremental text and
//! `{"error": "<message>"}` for a terminal failure signal. Chunk boundaries
//! are arbitrary -- a chunk may end mid-line or even mid-codepoint -- so the
//! decoder buffers raw bytes and only resolves syntactically complete lines.
//!
//! Malformed lines are recoverable noise, not a stream-ending failure:
//! upstream providers are not guaranteed to line-split exactly on
//! JSON-object boundaries. Such lines are reported at `warn` and skipped.

use serde::Deserialize;

/// One decoded line from the reply stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    /// Incremental text fragment to append to the live assistant message
    Fragment(String),
    /// Terminal failure signal; no further lines should be processed
    Failure(String),
}

/// Wire shape of a single stream line
#[derive(Debug, Deserialize)]
struct LinePayload {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Incremental decoder for newline-delimited JSON byte streams
///
/// Feed arbitrary byte chunks with [`feed`](Self::feed); every complete
/// `\n`-terminated line is decoded and returned in arrival order. The
/// unterminated tail stays buffered until more bytes arrive.
///
/// # Examples
///
/// ```
/// use chatwire::session::{LineDecoder, StreamLine};
///
/// let mut decoder = LineDecoder::new();
/// let lines = decoder.feed(b"{\"response\":\"Hel\"}\n{\"respo");
/// assert_eq!(lines, vec![StreamLine::Fragment("Hel".to_string())]);
///
/// let lines = decoder.feed(b"nse\":\"lo\"}\n");
/// assert_eq!(lines, vec![StreamLine::Fragment("lo".to_string())]);
/// ```
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Creates an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk and return every line completed by it, in order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamLine> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(line) = decode_line(&raw[..raw.len() - 1]) {
                lines.push(line);
            }
        }
        lines
    }

    /// Number of buffered bytes not yet resolved into a complete line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the decoder at end-of-stream
    ///
    /// A non-empty buffer at this point is a trailing partial line that was
    /// never completed; it is discarded. Returns the discarded tail so
    /// callers can report it.
    pub fn finish(self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = String::from_utf8_lossy(&self.buffer).into_owned();
        tracing::debug!("discarding unterminated stream tail: {:?}", tail);
        Some(tail)
    }
}

/// Decode a single complete line (without its terminator)
///
/// Empty lines are a no-op. An `error` field wins over `response` when both
/// are present. Lines that fail to parse, or parse to an object carrying
/// neither field, are skipped.
fn decode_line(raw: &[u8]) -> Option<StreamLine> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }

    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!("skipping non-UTF-8 stream line ({} bytes)", raw.len());
            return None;
        }
    };

    match serde_json::from_str::<LinePayload>(text) {
        Ok(payload) => {
            if let Some(message) = payload.error {
                Some(StreamLine::Failure(message))
            } else if let Some(fragment) = payload.response {
                Some(StreamLine::Fragment(fragment))
            } else {
                tracing::debug!("stream line carries neither response nor error: {}", text);
                None
            }
        }
        Err(err) => {
            tracing::warn!("skipping non-JSON stream line: {} ({})", text, err);
            None
        }
    }
}
