use std::path::PathBuf;

use ort::Error as OrtError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("ONNX Runtime error: {source}")]
    Ort {
        #[from]
        source: OrtError,
    },

    #[error("Failed to load data file: {path}")]
    DataFileLoadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data file: {path}: {message}")]
    DataFileParseError { path: PathBuf, message: String },

    #[error("Failed to load model file: {path}")]
    ModelFileLoadError {
        path: PathBuf,
        #[source]
        source: OrtError,
    },

    #[error("Model execution failed: {operation}")]
    ModelExecutionError {
        operation: String,
        #[source]
        source: OrtError,
    },

    #[error("Image preprocessing failed: {operation}: {message}")]
    PreprocessingError { operation: String, message: String },

    #[error("Prediction processing failed: {operation}: {message}")]
    PredictionError { operation: String, message: String },

    #[error("Failed to start worker pool: {message}")]
    WorkerPool { message: String },

    #[error("Recognizer panicked: {message}")]
    RecognizerPanic { message: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}
