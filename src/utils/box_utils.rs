//! Utility functions for bounding box operations.

use crate::document::bounds::Bounds;
use crate::document::detection::Detection;

/// Calculates the Intersection over Union (IoU) between two boxes.
///
/// # Returns
///
/// A value between 0.0 and 1.0 where:
/// - 0.0 indicates no overlap
/// - 1.0 indicates perfect overlap
///
/// Returns 0.0 if either box has zero area.
#[inline]
#[must_use]
pub fn calculate_iou(a: &Bounds, b: &Bounds) -> f32 {
    let area1 = a.area();
    let area2 = b.area();

    if area1 == 0 || area2 == 0 {
        return 0.0;
    }

    let intersection = a.intersection_area(b);
    let union = area1 + area2 - intersection;

    if union > 0 {
        intersection as f32 / union as f32
    } else {
        0.0
    }
}

/// Applies Non-Maximum Suppression (NMS) to filter overlapping detections.
///
/// # Algorithm
///
/// 1. Sort detections by confidence in descending order
/// 2. For each detection (starting from highest confidence):
///    - Keep the detection if not suppressed
///    - Suppress all lower-confidence detections of the same class
///      that have IoU above the threshold
///
/// Only boxes with the same class index are compared for suppression.
#[must_use]
pub fn apply_nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; detections.len()];
    let mut kept = Vec::with_capacity(detections.len());

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }

        for j in (i + 1)..detections.len() {
            if suppressed[j] || detections[i].class_index != detections[j].class_index {
                continue;
            }

            if calculate_iou(&detections[i].bounds, &detections[j].bounds) > iou_threshold {
                suppressed[j] = true;
            }
        }

        kept.push(i);
    }

    let mut detections: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();
    kept.into_iter()
        .filter_map(|i| detections[i].take())
        .collect()
}
