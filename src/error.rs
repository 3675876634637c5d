//! Global error handling for code-extractor
//!
//! Only a handful of failures ever reach the caller: a missing root, a rule
//! set that cannot be built, or a report that cannot be written. Everything
//! that happens per file or per directory is rendered inline instead.

use std::io;
use thiserror::Error;

/// Global error type for code-extractor operations
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The directory to scan does not exist or is not a directory
    #[error("Directory not found: {0}")]
    RootNotFound(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ignore/include rules that could not be compiled
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Specialized Result type for code-extractor operations
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Creates an ExtractorError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::ExtractorError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// The binary's main returns io::Result
impl From<ExtractorError> for io::Error {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::Io(e) => e,
            ExtractorError::RootNotFound(path) => io::Error::new(
                io::ErrorKind::NotFound,
                format!("Directory not found: {}", path),
            ),
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}
