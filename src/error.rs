//! Error types for the preview engine

use thiserror::Error;

/// Result type alias for preview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing, fetching or exporting a preview
///
/// None of these are fatal to a session: every failing operation leaves the
/// snippet state as it was before the call.
#[derive(Error, Debug)]
pub enum Error {
    /// The URL handed to a fetch was blank or could not be parsed
    #[error("Invalid URL: {0}")]
    Validation(String),

    /// The metadata provider failed
    #[error("Failed to fetch URL metadata: {0}")]
    Fetch(String),

    /// A fetch is already pending for this model
    #[error("A metadata fetch is already in progress")]
    FetchInFlight,

    /// Serializing or writing the export artifact failed
    #[error("Failed to export preview: {0}")]
    Export(String),

    /// None of the requested font families are registered with the measurer
    #[error("No registered font matches '{0}'")]
    UnknownFont(String),

    /// Font data could not be read or parsed
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Export(err.to_string())
    }
}
