// Error types module

use thiserror::Error;

/// Centralized error type for URL building and signing
///
/// Every failure is caused by invalid input, never by the environment,
/// so none of these are worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// The request has no image locator (absent or empty)
    #[error("image is a required argument")]
    MissingImage,

    /// An option has the wrong shape or an out-of-range value
    #[error("Invalid argument '{param}': {message}")]
    InvalidArgument { param: String, message: String },

    /// A legacy segment could not be base64-decoded, decrypted or parsed
    #[error("Failed to decode legacy url: {message}")]
    Decode { message: String },

    /// A signed path does not carry the expected signature
    #[error("Invalid or missing URL signature")]
    InvalidSignature,
}

impl UrlError {
    pub fn invalid_argument(param: impl Into<String>, message: impl Into<String>) -> Self {
        UrlError::InvalidArgument {
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        UrlError::Decode {
            message: message.into(),
        }
    }
}
