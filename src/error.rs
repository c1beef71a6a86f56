//! Error types for the annotation pipeline.
//!
//! Most of the pipeline degrades silently (see [`crate::outcome::Outcome`]);
//! these errors describe *why* a value could not be produced and travel
//! inside `Outcome::Failed` or across the few fallible public entry points.

/// Result type alias for annotation pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while decoding annotations and their images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Referenced object not found by the resolver
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// A required dictionary entry is missing
    #[error("Missing required key: /{0}")]
    MissingKey(&'static str),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Image error
    #[error("Image error: {0}")]
    Image(String),

    /// Annotation subtype has no record mapping
    #[error("Unsupported annotation subtype: {0}")]
    UnsupportedSubtype(String),

    /// Annotation lacks the geometry its subtype needs
    #[error("Invalid annotation geometry: {0}")]
    InvalidGeometry(String),

    /// No image could be associated with a stamp annotation
    #[error("No image found for stamp at {0}")]
    StampImageMissing(String),

    /// Page rasterizer failure
    #[error("Page render failed: {0}")]
    Render(String),

    /// Loading was cancelled
    #[error("Loading cancelled")]
    Cancelled,

    /// Worker pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Recursion depth limit exceeded
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_not_found_error() {
        let err = Error::ObjectNotFound(10, 0);
        let msg = format!("{}", err);
        assert!(msg.contains("10 0 R"));
    }

    #[test]
    fn test_invalid_object_type_error() {
        let err = Error::InvalidObjectType {
            expected: "Stream".to_string(),
            found: "Array".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Stream"));
        assert!(msg.contains("Array"));
    }

    #[test]
    fn test_missing_key_error() {
        let err = Error::MissingKey("Width");
        assert_eq!(err.to_string(), "Missing required key: /Width");
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
