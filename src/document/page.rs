use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::utils::serialization_utils::point_pairs;

/// One recognized line of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineResult {
    /// Position in reading order, starting at 0.
    pub id: usize,
    pub text: String,
    /// Detector confidence; 0.0 when the layout step did not report one.
    pub confidence: f32,
    /// Corners in the order top-left, bottom-left, bottom-right, top-right.
    #[serde(with = "point_pairs")]
    pub bounding_box: [Coord<i32>; 4],
}

/// The assembled output for one page image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Line texts in reading order, joined with `\n`.
    pub text: String,
    pub lines: Vec<LineResult>,
}

impl PageResult {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
