/// Error types shared by every gallery operation
///
/// Errors carry owned strings so they can travel inside GUI messages,
/// which must be `Clone`.
use thiserror::Error;

/// Everything that can go wrong while talking to an image source,
/// saving a download or reading configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalleryError {
    /// Request rejected, timed out or answered with a non-success status
    #[error("network error: {0}")]
    Network(String),

    /// The requested image does not exist (locally or on the server)
    #[error("image not found: {0}")]
    NotFound(String),

    /// Local file system failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Fetched bytes could not be decoded as an image
    #[error("could not decode image: {0}")]
    Decode(String),

    /// Sign-in was refused or the session store is unusable
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Configuration file is malformed
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, GalleryError>;

impl GalleryError {
    /// Short text suitable for a notification
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Could not reach the image server.",
            Self::NotFound(_) => "The image no longer exists.",
            Self::Io(_) => "Could not access the file system.",
            Self::Decode(_) => "The image data is unreadable.",
            Self::Auth(_) => "Invalid username or password.",
            Self::Config(_) => "The configuration file is invalid.",
        }
    }
}

impl From<reqwest::Error> for GalleryError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Self::NotFound(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Io(err.to_string())
        }
    }
}

impl From<image::ImageError> for GalleryError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err: GalleryError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, GalleryError::NotFound(_)));

        let err: GalleryError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(err, GalleryError::Io(_)));
    }

    #[test]
    fn test_display_includes_detail() {
        let err = GalleryError::Network("status 503".to_string());
        assert_eq!(err.to_string(), "network error: status 503");
        assert_eq!(err.user_message(), "Could not reach the image server.");
    }
}
