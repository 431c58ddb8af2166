//! Bounding box representation with utility methods.
//!
//! This module provides the [`Bounds`] type for representing axis-aligned
//! boxes produced by the detector and consumed by line extraction.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in pixel coordinates.
///
/// # Coordinate System
///
/// - **X-axis**: Increases from left to right
/// - **Y-axis**: Increases from top to bottom (standard image coordinates)
///
/// `xmax` and `ymax` are exclusive, so `width() == xmax - xmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl Bounds {
    /// Creates a new `Bounds` from its corner coordinates.
    #[inline]
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Creates a `Bounds` from an origin and a size.
    #[inline]
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.xmin
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.xmax
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.ymin
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.ymax
    }

    /// Returns the width of the box. Negative for inverted boxes.
    #[inline]
    pub fn width(&self) -> i32 {
        self.xmax - self.xmin
    }

    /// Returns the height of the box. Negative for inverted boxes.
    #[inline]
    pub fn height(&self) -> i32 {
        self.ymax - self.ymin
    }

    #[inline]
    pub fn center_x(&self) -> i32 {
        (self.xmin + self.xmax) / 2
    }

    #[inline]
    pub fn center_y(&self) -> i32 {
        (self.ymin + self.ymax) / 2
    }

    /// Returns the area of the box, or `0` if it is empty or inverted.
    #[inline]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width() as i64 * self.height() as i64
        }
    }

    /// Returns `true` if the box has no positive width or height.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Returns `true` if the box is taller than it is wide.
    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.height() > self.width()
    }

    /// Returns the area shared by two boxes.
    pub fn intersection_area(&self, other: &Bounds) -> i64 {
        let overlap = Bounds::new(
            self.xmin.max(other.xmin),
            self.ymin.max(other.ymin),
            self.xmax.min(other.xmax),
            self.ymax.min(other.ymax),
        );
        overlap.area()
    }

    /// Clamps the box to an image of the given dimensions.
    ///
    /// The result may be empty when the box lies entirely outside the image.
    pub fn clip_to(&self, image_width: u32, image_height: u32) -> Bounds {
        let max_x = image_width.min(i32::MAX as u32) as i32;
        let max_y = image_height.min(i32::MAX as u32) as i32;
        Bounds::new(
            self.xmin.clamp(0, max_x),
            self.ymin.clamp(0, max_y),
            self.xmax.clamp(0, max_x),
            self.ymax.clamp(0, max_y),
        )
    }

    /// Returns the four corners as a polygon.
    ///
    /// ```text
    /// [0] top-left        [3] top-right
    ///       |                    |
    /// [1] bottom-left --- [2] bottom-right
    /// ```
    pub fn polygon(&self) -> [Coord<i32>; 4] {
        [
            Coord {
                x: self.xmin,
                y: self.ymin,
            },
            Coord {
                x: self.xmin,
                y: self.ymax,
            },
            Coord {
                x: self.xmax,
                y: self.ymax,
            },
            Coord {
                x: self.xmax,
                y: self.ymin,
            },
        ]
    }
}
