use std::time::Duration;

/// Environment-driven settings for the demo server binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn load() -> Self {
        let listen_addr =
            std::env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let request_timeout = std::env::var("REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis);
        Self {
            listen_addr,
            request_timeout,
        }
    }
}
