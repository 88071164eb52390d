use thiserror::Error;

/// Everything that can go wrong talking to the answer service.
///
/// The chat client shows all of these as the same generic notice; the
/// variants exist for logs and for the one-shot CLI commands.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Connection, timeout or body read failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service replied with a non-2xx status
    #[error("service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Reply body was not valid JSON of the expected shape
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}
