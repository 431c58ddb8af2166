use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Recognition engine is not ready")]
    EngineNotReady,

    #[error("Model processing failed")]
    ModelProcessingError {
        #[from]
        source: crate::inference::InferenceError,
    },

    #[error("Recognition failed for all {total} lines")]
    RecognitionFailed { failed: usize, total: usize },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}
