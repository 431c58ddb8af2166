//! Built-in layout analyzer.
//!
//! Keeps the detections whose class marks a text line and orders them with a
//! precedence graph: an edge `i -> j` means line `i` is read before line `j`.
//! Lines are emitted with Kahn's algorithm, breaking ties by position, and
//! any lines left over by a cycle are appended in plain spatial order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::document::bounds::Bounds;
use crate::document::detection::Detection;
use crate::document::line::LineGeometry;
use crate::inference::{InferenceError, LayoutAnalyzer};

/// Writing direction of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directionality {
    /// Rows top to bottom, left to right within a row.
    Horizontal,
    /// Columns right to left, top to bottom within a column.
    VerticalRtl,
}

impl Directionality {
    /// A page is vertical when most of its lines are taller than they are wide.
    pub fn detect(bounds_list: &[Bounds]) -> Self {
        let vertical = bounds_list.iter().filter(|b| b.is_vertical()).count();
        if vertical * 2 > bounds_list.len() {
            Directionality::VerticalRtl
        } else {
            Directionality::Horizontal
        }
    }

    /// Heap key: smallest is read first.
    fn sort_key(self, bounds: &Bounds) -> (i32, i32) {
        match self {
            Directionality::Horizontal => (bounds.center_y(), bounds.center_x()),
            Directionality::VerticalRtl => (-bounds.center_x(), bounds.center_y()),
        }
    }
}

/// Returns indices into `bounds_list` in reading order.
#[must_use]
pub fn graph_based_reading_order(bounds_list: &[Bounds], directionality: Directionality) -> Vec<usize> {
    let n = bounds_list.len();
    if n == 0 {
        return Vec::new();
    }

    let mut graph: Vec<Vec<usize>> = vec![Vec::with_capacity(n / 4); n];
    let mut in_degree: Vec<usize> = vec![0; n];

    for i in 0..n {
        for j in 0..n {
            if i != j && should_come_before(&bounds_list[i], &bounds_list[j], directionality) {
                graph[i].push(j);
                in_degree[j] += 1;
            }
        }
    }

    let mut heap: BinaryHeap<Reverse<((i32, i32), usize)>> = BinaryHeap::with_capacity(n);
    let mut result: Vec<usize> = Vec::with_capacity(n);

    for (i, &deg) in in_degree.iter().enumerate() {
        if deg == 0 {
            heap.push(Reverse((directionality.sort_key(&bounds_list[i]), i)));
        }
    }

    while let Some(Reverse((_, node))) = heap.pop() {
        result.push(node);

        for &neighbor in &graph[node] {
            in_degree[neighbor] -= 1;
            if in_degree[neighbor] == 0 {
                heap.push(Reverse((
                    directionality.sort_key(&bounds_list[neighbor]),
                    neighbor,
                )));
            }
        }
    }

    if result.len() < n {
        let mut placed = vec![false; n];
        for &i in &result {
            placed[i] = true;
        }
        let mut remaining: Vec<usize> = (0..n).filter(|&i| !placed[i]).collect();
        remaining.sort_by_key(|&i| (directionality.sort_key(&bounds_list[i]), i));
        result.extend(remaining);
    }

    result
}

/// Whether box `a` is read before box `b`.
///
/// For horizontal text a box clearly above another comes first, and on a
/// shared row the left one does. Vertical text is the same rule rotated: a
/// column clearly to the right comes first, and within a column the upper
/// box does.
fn should_come_before(a: &Bounds, b: &Bounds, directionality: Directionality) -> bool {
    match directionality {
        Directionality::Horizontal => {
            let avg_height = (a.height() + b.height()) / 2;
            let separation = b.center_y() - a.center_y();

            if separation > (avg_height as f32 * 0.3) as i32 {
                return true;
            }

            separation.abs() <= (avg_height as f32 * 0.5) as i32
                && a.center_x() < b.center_x()
                && a.right() <= b.left() + avg_height / 4
        }
        Directionality::VerticalRtl => {
            let avg_width = (a.width() + b.width()) / 2;
            let separation = a.center_x() - b.center_x();

            if separation > (avg_width as f32 * 0.3) as i32 {
                return true;
            }

            separation.abs() <= (avg_width as f32 * 0.5) as i32
                && a.center_y() < b.center_y()
                && a.bottom() <= b.top() + avg_width / 4
        }
    }
}

/// Orders line detections and carries their predicted character count
/// through as the routing estimate.
#[derive(Debug, Clone)]
pub struct ReadingOrderAnalyzer {
    line_classes: Vec<usize>,
}

impl ReadingOrderAnalyzer {
    pub fn new(line_classes: Vec<usize>) -> Self {
        Self { line_classes }
    }

    pub fn line_classes(&self) -> &[usize] {
        &self.line_classes
    }

    fn is_line(&self, detection: &Detection) -> bool {
        self.line_classes.contains(&detection.class_index) && !detection.bounds.is_empty()
    }
}

impl LayoutAnalyzer for ReadingOrderAnalyzer {
    fn analyze(
        &self,
        detections: &[Detection],
        page_width: u32,
        page_height: u32,
    ) -> Result<Vec<LineGeometry>, InferenceError> {
        let lines: Vec<(Bounds, &Detection)> = detections
            .iter()
            .filter(|d| self.is_line(d))
            .map(|d| (d.bounds.clip_to(page_width, page_height), d))
            .filter(|(bounds, _)| !bounds.is_empty())
            .collect();

        let bounds_list: Vec<Bounds> = lines.iter().map(|(b, _)| *b).collect();
        let directionality = Directionality::detect(&bounds_list);
        let order = graph_based_reading_order(&bounds_list, directionality);

        tracing::debug!(
            "Ordered {} of {} detections as {:?}",
            order.len(),
            detections.len(),
            directionality
        );

        Ok(order
            .into_iter()
            .map(|i| {
                let (bounds, detection) = lines[i];
                let geometry = LineGeometry::new(
                    bounds.left(),
                    bounds.top(),
                    bounds.width(),
                    bounds.height(),
                )
                .with_confidence(detection.confidence);
                match detection.char_count {
                    Some(count) => geometry.with_complexity(count),
                    None => geometry,
                }
            })
            .collect())
    }
}
