use thiserror::Error;

/// Errors raised by object-model operations and by user code running inside
/// them (getters, setters, methods, change callbacks).
///
/// A reflective operation that is merely refused (writing a frozen property,
/// deleting a non-configurable one) is not an error: those return `Ok(false)`.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("RangeError: {0}")]
    RangeError(String),

    #[error("TypeError: {0} is not a function")]
    NotCallable(String),

    #[error("{0}")]
    Thrown(Box<dyn std::error::Error + 'static>),
}

impl ModelError {
    /// Wraps an arbitrary error raised by user code.
    pub fn thrown(error: impl Into<Box<dyn std::error::Error + 'static>>) -> Self {
        ModelError::Thrown(error.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        ModelError::TypeError(message.into())
    }
}
