use thiserror::Error;

/// Result alias for backend fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a fetch cycle produced no payload.
///
/// All three variants are transient from the engine's point of view: the
/// prior snapshot is retained and the next scheduled cycle retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, TLS, request build, timeout).
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status code.
    #[error("backend status {0}")]
    Status(u16),
    /// The body did not decode into the expected payload shape.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}
