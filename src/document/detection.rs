use serde::{Deserialize, Serialize};

use crate::document::bounds::Bounds;

/// A single region found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounds: Bounds,
    /// Detector confidence (0.0 to 1.0).
    pub confidence: f32,
    /// Index into the detector's class list.
    pub class_index: usize,
    /// Character count predicted by the detector, when the model provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_count: Option<f32>,
}

impl Detection {
    pub fn new(bounds: Bounds, confidence: f32, class_index: usize) -> Self {
        Self {
            bounds,
            confidence,
            class_index,
            char_count: None,
        }
    }

    pub fn with_char_count(mut self, char_count: f32) -> Self {
        self.char_count = Some(char_count);
        self
    }
}
