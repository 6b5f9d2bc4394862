use std::sync::Arc;

use chatwire::auth::StaticCredentials;
use chatwire::{ChatSession, Config};

#[allow(dead_code)]
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.backend.base_url = base_url.to_string();
    config.backend.request_timeout_seconds = 5;
    config
}

#[allow(dead_code)]
pub fn make_session(base_url: &str) -> ChatSession {
    make_session_with_config(&test_config(base_url))
}

#[allow(dead_code)]
pub fn make_session_with_config(config: &Config) -> ChatSession {
    ChatSession::new(config, Arc::new(StaticCredentials::new("test-token")))
        .expect("failed to create session")
}
