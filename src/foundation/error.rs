/// Crate-wide result alias.
pub type VeilResult<T> = Result<T, VeilError>;

/// Errors surfaced by sampling, compositing, and encoding.
#[derive(thiserror::Error, Debug)]
pub enum VeilError {
    /// Invalid configuration, arguments, or input parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// A source frame could not be decoded, even after the single retry.
    #[error("decode error: {0}")]
    Decode(String),

    /// Two frames reached a blend with different pixel dimensions.
    #[error("shape mismatch: {left_w}x{left_h} vs {right_w}x{right_h}")]
    ShapeMismatch {
        /// Width of the left-hand frame.
        left_w: u32,
        /// Height of the left-hand frame.
        left_h: u32,
        /// Width of the right-hand frame.
        right_w: u32,
        /// Height of the right-hand frame.
        right_h: u32,
    },

    /// The encoder failed or rejected its input.
    #[error("encode error: {0}")]
    Encode(String),

    /// The render was interrupted before the full grid completed.
    #[error("render cancelled")]
    Cancelled,

    /// Any other error, usually I/O with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VeilError {
    /// Build a [`VeilError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VeilError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`VeilError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Return `true` for errors raised by a source decoder.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
