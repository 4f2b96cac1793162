use thiserror::Error;

/// Failures talking to an external feed or image endpoint.
///
/// None of these abort a query: a failed feed contributes no entries and a
/// failed image lookup leaves the game without a cover.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Body was not the expected JSON shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// No feed registered for this source (offline fetchers)
    #[error("no feed for source '{0}'")]
    Missing(String),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Worth another attempt: transport trouble or a 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
