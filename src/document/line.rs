//! Line geometry and line region types.
//!
//! [`LineGeometry`] is what the layout analyzer hands to the page assembler:
//! a box in reading order plus a complexity estimate. [`LineRegion`] is the
//! cropped line image that travels through the recognition cascade.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::document::bounds::Bounds;
use crate::document::detection::Detection;

/// Complexity substituted when an estimate is missing or unusable.
///
/// It matches none of the cascade's class values, so the line always goes to
/// the highest-capacity tier.
pub const FALLBACK_COMPLEXITY: f32 = 100.0;

/// Parses a textual complexity estimate.
///
/// Returns `None` for empty, unparseable or non-finite input.
pub fn parse_complexity(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Returns the estimate if usable, otherwise [`FALLBACK_COMPLEXITY`].
#[inline]
pub fn complexity_or_fallback(estimate: Option<f32>) -> f32 {
    match estimate {
        Some(value) if value.is_finite() => value,
        _ => FALLBACK_COMPLEXITY,
    }
}

/// A text line located on the page, as produced by a layout analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Detector confidence for the line, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Predicted character count used for tier routing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f32>,
}

impl LineGeometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: None,
            complexity: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_complexity(mut self, complexity: f32) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Builds a geometry straight from a detection box.
    ///
    /// The complexity estimate is deliberately left unset so the line is
    /// routed to the highest tier.
    pub fn from_detection(detection: &Detection) -> Self {
        let bounds = detection.bounds;
        Self::new(bounds.left(), bounds.top(), bounds.width(), bounds.height())
            .with_confidence(detection.confidence)
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_xywh(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A cropped line image awaiting recognition.
#[derive(Debug, Clone)]
pub struct LineRegion {
    /// Pixels copied out of the page image.
    pub image: RgbImage,
    /// Position in reading order; the only sort key.
    pub order_index: usize,
    /// Routing hint, never part of the output.
    pub complexity: f32,
    recognized_text: Option<String>,
    recognition_failed: bool,
}

impl LineRegion {
    pub fn new(image: RgbImage, order_index: usize, complexity: f32) -> Self {
        Self {
            image,
            order_index,
            complexity,
            recognized_text: None,
            recognition_failed: false,
        }
    }

    /// Records the final text for this line.
    ///
    /// The first accepted text wins; later calls are ignored.
    pub fn accept(&mut self, text: String) {
        if self.recognized_text.is_none() {
            self.recognized_text = Some(text);
        }
    }

    /// Records that every recognition attempt failed and the line degrades to
    /// empty text.
    pub fn accept_failure(&mut self) {
        if self.recognized_text.is_none() {
            self.recognized_text = Some(String::new());
            self.recognition_failed = true;
        }
    }

    pub fn recognized_text(&self) -> Option<&str> {
        self.recognized_text.as_deref()
    }

    pub fn into_text(self) -> String {
        self.recognized_text.unwrap_or_default()
    }

    pub fn is_recognized(&self) -> bool {
        self.recognized_text.is_some()
    }

    pub fn recognition_failed(&self) -> bool {
        self.recognition_failed
    }
}
