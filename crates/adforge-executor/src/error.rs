use thiserror::Error;

/// Errors returned by a rendering backend adapter.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend {backend} rate limited the request")]
    RateLimited { backend: String },

    #[error("backend {backend} returned server error {status}")]
    ServerError { backend: String, status: u16 },

    #[error("backend {backend} returned unexpected status {status}")]
    UnexpectedStatus { backend: String, status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid endpoint for backend {backend}: {reason}")]
    InvalidEndpoint { backend: String, reason: String },

    /// The backend accepted the job but reported it could not render it.
    #[error("backend {backend} rejected the job: {reason}")]
    Rejected { backend: String, reason: String },
}
