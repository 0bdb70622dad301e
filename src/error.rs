use thiserror::Error;

/// Failures of the recognition core.
///
/// "No hand in frame" is deliberately absent: extraction reports it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum GestureError {
    #[error("frame decode failed: {0}")]
    FrameDecode(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("landmark detection failed: {0}")]
    Detection(String),

    #[error("failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("label table has {expected} entries but model produces {actual} outputs")]
    LabelMismatch { expected: usize, actual: usize },

    #[error("feature vector must hold 63 values, got {0}")]
    FeatureShape(usize),

    #[error("observation at {incoming} is older than the last logged entry at {last}")]
    OutOfOrder { last: String, incoming: String },

    #[error("csv export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, GestureError>;

impl GestureError {
    /// Per-frame failures: the frame is dropped and the loop moves on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GestureError::FrameDecode(_)
                | GestureError::Capture(_)
                | GestureError::Detection(_)
                | GestureError::Inference(_)
        )
    }
}

impl From<csv::Error> for GestureError {
    fn from(e: csv::Error) -> Self {
        GestureError::Export(e.to_string())
    }
}
