/// Errors raised while talking to the receipt server.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a JSON `null` instead of an object.
    #[error("Server returned an empty (null) response body")]
    NullBody,

    /// The upload was accepted but the redirect carried no job id.
    #[error("Server did not return a job id (landed on {0})")]
    MissingJobId(String),

    #[error("Background runtime unavailable: {0}")]
    Runtime(String),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
