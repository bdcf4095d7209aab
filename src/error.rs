//! Structured error types for the flowpress renderer.
//!
//! The three render failures are terminal: there is no partial document. The
//! remaining variants belong to the input surface (JSON documents, files).

use thiserror::Error;

/// Result alias used by every fallible public function.
pub type Result<T> = std::result::Result<T, RenderError>;

/// The unified error type returned by all public flowpress API functions.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The document sink could not be set up for the requested media size.
    #[error("Failed to acquire a drawing context for a {width:.2} x {height:.2} pt page")]
    FailedToAcquireDrawingContext { width: f64, height: f64 },

    /// The measuring pass ended without a final page count.
    #[error("Failed to calculate the page count")]
    FailedToCalculatePageCount,

    /// The finished bytes are not a readable PDF.
    #[error("Failed to produce an output document: {0}")]
    FailedToProduceOutputDocument(String),

    /// JSON input failed to parse as a valid flowpress document.
    #[error("Failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {hint}")
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the document schema. Check node types and field names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        RenderError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_errors_carry_a_hint() {
        let err: RenderError = serde_json::from_str::<serde_json::Value>("{ \"a\": 1, }")
            .unwrap_err()
            .into();
        let message = err.to_string();
        assert!(message.starts_with("Failed to parse document"));
        assert!(message.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn eof_errors_mention_truncation() {
        let err: RenderError = serde_json::from_str::<serde_json::Value>("{ \"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn drawing_context_error_names_the_size() {
        let err = RenderError::FailedToAcquireDrawingContext {
            width: 0.0,
            height: 841.89,
        };
        assert_eq!(
            err.to_string(),
            "Failed to acquire a drawing context for a 0.00 x 841.89 pt page"
        );
    }
}
