//! Structural errors raised while assembling or navigating a form tree
//!
//! Validation findings are not errors in this sense; they live on each
//! controller as [`crate::Errors`].

/// Result alias for fallible tree operations
pub type FormResult<T> = Result<T, FormError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Duplicate key: {key}")]
    DuplicateKey { key: String },

    /// Group keys may not contain the path separator `.`
    #[error("Invalid key: {key}")]
    InvalidKey { key: String },

    #[error("Control at {at} already belongs to another group or array")]
    AlreadyOwned { at: String },

    #[error("No control at path: {path}")]
    NotFound { path: String },

    #[error("Control at {path} is not a {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
    },
}
