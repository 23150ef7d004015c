//! Error types for lazy streams
//!
//! Every failure the library reports is a programmer error (using a stream
//! twice, a negative count, a bad configuration). They are returned at the
//! offending call and never retried.

/// Stable numeric code for [`StreamError::StreamTerminated`].
pub const STREAM_TERMINATED: i32 = 1;
/// Stable numeric code for [`StreamError::IllegalArgument`].
pub const ILLEGAL_ARGUMENT: i32 = 2;
/// Stable numeric code for [`StreamError::StreamClosed`].
pub const STREAM_CLOSED: i32 = 3;
/// Stable numeric code for [`StreamError::IllegalConfig`].
pub const ILLEGAL_CONFIG: i32 = 4;
/// Stable numeric code for [`StreamError::NoNextElement`].
pub const NO_NEXT_ELEMENT: i32 = 5;

/// Main error type for stream operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// A terminal operation already consumed the stream
    #[error("ErrStreamTerminated: A terminal operation has been invoked on the stream.")]
    StreamTerminated,
    /// A stream was derived from this one, or it was terminated
    #[error("ErrStreamClosed: The stream has been closed.")]
    StreamClosed,
    /// An operation received an argument outside its domain
    #[error("ErrIllegalArgument: Illegal argument: {argument} for operation: {operation}.")]
    IllegalArgument { operation: String, argument: String },
    /// A stream was constructed with an unusable configuration
    #[error("ErrIllegalStreamConfig: Illegal configuration {config} when trying to create a stream using {function}.")]
    IllegalConfig { config: String, function: String },
    /// `next` was called on an exhausted source
    #[error("ErrNoNextElement: The source has no next element.")]
    NoNextElement,
}

impl StreamError {
    pub fn illegal_argument(operation: impl Into<String>, argument: impl ToString) -> Self {
        StreamError::IllegalArgument {
            operation: operation.into(),
            argument: argument.to_string(),
        }
    }

    pub fn illegal_config(config: impl Into<String>, function: impl Into<String>) -> Self {
        StreamError::IllegalConfig {
            config: config.into(),
            function: function.into(),
        }
    }

    /// Stable integer code of this error.
    pub fn code(&self) -> i32 {
        match self {
            StreamError::StreamTerminated => STREAM_TERMINATED,
            StreamError::IllegalArgument { .. } => ILLEGAL_ARGUMENT,
            StreamError::StreamClosed => STREAM_CLOSED,
            StreamError::IllegalConfig { .. } => ILLEGAL_CONFIG,
            StreamError::NoNextElement => NO_NEXT_ELEMENT,
        }
    }
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;
