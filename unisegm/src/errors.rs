//! Error types shared by every component of the segmenter.

/// Result type defaulting to [`SegmentError`].
pub type Result<T, E = SegmentError> = std::result::Result<T, E>;

/// Errors raised while building models, training or decoding.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// A categorical draw was requested over weights that sum to zero.
    #[error("cannot sample from an all-zero weight vector")]
    DegenerateSampling,

    /// A word was retracted from the model more times than it was added.
    #[error("word {word:?} has no occurrences left to remove")]
    InconsistentModelState { word: String },

    /// The input cannot be segmented, e.g. an empty sentence.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A model parameter is out of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SegmentError {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        SegmentError::MalformedInput(msg.into())
    }

    pub(crate) fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SegmentError::InvalidArgument(msg.into())
    }
}
