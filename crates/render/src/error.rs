use thiserror::Error;

/// Errors that can occur while producing a PDF.
///
/// Logo problems are not errors: the renderer logs them and carries on
/// without the logo.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load built-in font {font}: {reason}")]
    Font { font: &'static str, reason: String },

    #[error("Failed to write PDF: {0}")]
    Write(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
