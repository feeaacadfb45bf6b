use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    /// The HTTP call itself failed before a response was available.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside the accepted set.
    /// `retry_after` holds the parsed `Retry-After` header, if any.
    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: StatusCode,
        retry_after: Option<u64>,
        body: String,
    },

    /// The response body did not deserialize into the expected shape.
    #[error("unexpected body {body}")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Pagination ended without any version carrying the requested tag.
    #[error("container package version id for tag {tag:?} not found")]
    TagNotFound { tag: String },
}

impl GithubError {
    /// The HTTP status of the failed call, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport { source, .. } => source.status(),
            Self::Status { status, .. } => Some(*status),
            Self::Parse { .. } | Self::TagNotFound { .. } => None,
        }
    }
}
