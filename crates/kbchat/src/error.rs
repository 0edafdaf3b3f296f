use std::path::PathBuf;

use crate::messages::ApiError;

/// The main error type for the kbchat [`crate`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Represents errors that occur during IO operations.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// The error type for operations interacting with environment variables.
    /// Possibly returned from [`std::env::var()`].
    #[error("Environment variable error: {0} {1}")]
    EnvVarError(String, std::env::VarError),

    #[error("Invalid header value for {0}: {1}")]
    InvalidHeaderValue(String, reqwest::header::InvalidHeaderValue),

    /// Represents [`crate::messages::MessageRequestBuilder`] errors.
    #[error(transparent)]
    MessageRequestBuilderError(#[from] crate::messages::MessageRequestBuilderError),

    /// Represents [`crate::session::SessionConfigBuilder`] errors.
    #[error(transparent)]
    SessionConfigBuilderError(#[from] crate::session::SessionConfigBuilderError),

    /// The knowledge base file could not be read.
    #[error("{}: {source}", path.display())]
    KnowledgeBase {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error reported by the remote endpoint, either as the body of a failed
    /// request or as an `error` event in the middle of a stream.
    #[error(transparent)]
    Api(ApiError),

    #[error("Unexpected response status {0}: {1}")]
    UnexpectedStatus(reqwest::StatusCode, String),

    #[error("Event stream error: {0}")]
    StreamError(String),

    /// Catches any other error types that don't fit into the above categories.
    /// Uses a boxed trait object to support a wide range of error types.
    #[error("OtherError: {0}")]
    OtherError(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// A specialized [`Result`] type for this kbchat [`crate`].
///
/// This type is broadly used across kbchat [`crate`] for any operation which
/// may produce an error.
///
/// This typedef is generally used to avoid writing out [`Error`] directly and
/// is otherwise a direct mapping to [`Result`].
///
/// # Examples
///
/// A convenience function that bubbles a `kbchat::Result` to its caller:
///
/// ```
///
/// fn load_and_ask() -> kbchat::Result<()> {
///     // run some code that may produce an error from the kbchat code
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;
