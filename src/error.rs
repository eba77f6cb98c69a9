//! # Error Types
//!
//! This module defines error types used throughout the memeforge library.
//!
//! None of these are fatal to an editing session: the renderer contains them
//! and reports them through [`RenderResult`](crate::render::RenderResult).

use thiserror::Error;

/// Main error type for memeforge operations
#[derive(Debug, Error)]
pub enum MemeforgeError {
    /// Image reference could not be resolved or decoded
    #[error("Image load error: {0}")]
    ImageLoad(String),

    /// Text measurement primitive missing or failed for one text item
    #[error("Measurement unavailable: {0}")]
    MeasurementUnavailable(String),

    /// Primary filter mechanism cannot handle the request
    #[error("Filter unsupported: {0}")]
    FilterUnsupported(String),

    /// A completed render pass whose inputs changed while it was in flight
    #[error("Stale render discarded (generation {generation}, current {current})")]
    StaleRenderDiscarded { generation: u64, current: u64 },

    /// Style engine failure
    #[error("Style error: {0}")]
    Style(String),

    /// Style engine did not answer in time
    #[error("Style timed out after {0:?}")]
    StyleTimeout(std::time::Duration),

    /// Export requested before a render pass reached `Ready`
    #[error("Canvas not ready: {0}")]
    NotReady(String),

    /// Invalid template or text content
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration file or value error
    #[error("Config error: {0}")]
    Config(String),

    /// A render pass died before producing a canvas
    #[error("Render error: {0}")]
    Render(String),

    /// Image encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T, E = MemeforgeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert!(
            MemeforgeError::ImageLoad("x".into())
                .to_string()
                .starts_with("Image load error:")
        );
        assert!(
            MemeforgeError::FilterUnsupported("x".into())
                .to_string()
                .starts_with("Filter unsupported:")
        );
        let stale = MemeforgeError::StaleRenderDiscarded {
            generation: 1,
            current: 3,
        };
        assert!(stale.to_string().contains("generation 1"));
        assert!(
            MemeforgeError::Render("x".into())
                .to_string()
                .starts_with("Render error:")
        );
    }

    #[test]
    fn test_io_from() {
        let err: MemeforgeError = std::io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
