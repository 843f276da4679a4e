use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid {kind} URL {url:?}: {reason}")]
    InvalidUrl {
        kind: &'static str,
        url: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
