pub mod cascade;
pub mod deim;
pub mod engine;
pub mod error;
pub mod parseq;
pub mod session_pool;
pub mod worker_pool;

use image::RgbImage;

use crate::document::detection::Detection;
use crate::document::line::LineGeometry;

pub use cascade::{CascadeConfig, CascadeDispatcher, DispatchOutcome, RecognizerTiers, Tier};
pub use engine::EngineSlot;
pub use error::InferenceError;
pub use session_pool::SessionPool;
pub use worker_pool::WorkerPool;

/// Finds candidate text regions on a page.
pub trait Detector: Send + Sync {
    /// Returns every region found on the page. The result may be empty.
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, InferenceError>;
}

/// Turns raw detections into text lines in reading order.
pub trait LayoutAnalyzer: Send + Sync {
    /// Returns the page's lines in reading order.
    ///
    /// May return no lines even when `detections` is non-empty; the page
    /// assembler then falls back to the raw detections.
    fn analyze(
        &self,
        detections: &[Detection],
        page_width: u32,
        page_height: u32,
    ) -> Result<Vec<LineGeometry>, InferenceError>;
}

/// Reads the text of one cropped line image.
///
/// Implementations must not depend on the order of calls; the cascade calls
/// the same recognizer from several workers at once.
pub trait Recognizer: Send + Sync {
    fn read(&self, image: &RgbImage) -> Result<String, InferenceError>;
}
