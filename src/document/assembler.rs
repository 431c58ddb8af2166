//! Page assembly: detection, layout, line extraction, cascade dispatch and
//! page result construction.

use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use crate::document::line::{complexity_or_fallback, LineGeometry, LineRegion};
use crate::document::page::{LineResult, PageResult};
use crate::document::DocumentError;
use crate::inference::{CascadeDispatcher, Detector, LayoutAnalyzer};
use crate::utils::image_utils;

/// Crops every usable geometry out of `image`.
///
/// Geometries without a positive width and height, or whose box falls
/// entirely outside the page, are skipped. The remaining lines get dense
/// `order_index` values in the order the geometries were given. Returns the
/// regions together with the geometries they were cut from.
pub fn extract_lines<'a>(
    image: &RgbImage,
    geometries: &'a [LineGeometry],
) -> (Vec<LineRegion>, Vec<&'a LineGeometry>) {
    let mut regions = Vec::with_capacity(geometries.len());
    let mut kept = Vec::with_capacity(geometries.len());

    for geometry in geometries {
        if !geometry.has_area() {
            continue;
        }

        let crop = match image_utils::crop_region(image, &geometry.bounds()) {
            Ok(crop) => crop,
            Err(e) => {
                debug!("Skipping line outside the page: {}", e);
                continue;
            }
        };

        let complexity = complexity_or_fallback(geometry.complexity);
        regions.push(LineRegion::new(crop, kept.len(), complexity));
        kept.push(geometry);
    }

    (regions, kept)
}

/// Turns one page image into a [`PageResult`].
pub struct PageAssembler {
    detector: Arc<dyn Detector>,
    layout: Arc<dyn LayoutAnalyzer>,
    dispatcher: CascadeDispatcher,
}

impl PageAssembler {
    pub fn new(
        detector: Arc<dyn Detector>,
        layout: Arc<dyn LayoutAnalyzer>,
        dispatcher: CascadeDispatcher,
    ) -> Self {
        Self {
            detector,
            layout,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &CascadeDispatcher {
        &self.dispatcher
    }

    /// Recognizes a page, blocking until every line has its final text.
    ///
    /// With `cascade` disabled every line is read by the largest tier.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn recognize(
        &self,
        image: &RgbImage,
        name: &str,
        cascade: bool,
    ) -> Result<PageResult, DocumentError> {
        let (width, height) = image.dimensions();

        let detections = self.detector.detect(image)?;
        let mut geometries = self.layout.analyze(&detections, width, height)?;

        if geometries.is_empty() && !detections.is_empty() {
            warn!(
                "Layout analysis returned no lines for {} detections, using detector boxes",
                detections.len()
            );
            geometries = detections.iter().map(LineGeometry::from_detection).collect();
        }

        let (regions, kept) = extract_lines(image, &geometries);
        let total = regions.len();
        debug!(
            "Extracted {} line regions from {} geometries",
            total,
            geometries.len()
        );

        let outcome = self.dispatcher.dispatch(regions, cascade);
        if outcome.all_failed() {
            return Err(DocumentError::RecognitionFailed {
                failed: outcome.failed,
                total,
            });
        }

        if outcome.lines.len() != kept.len() {
            return Err(DocumentError::ProcessingError {
                message: format!(
                    "Dispatch returned {} lines for {} regions",
                    outcome.lines.len(),
                    kept.len()
                ),
            });
        }

        let failed = outcome.failed;
        let escalations = outcome.escalations;

        let lines: Vec<LineResult> = outcome
            .lines
            .into_iter()
            .map(|line| {
                let geometry = kept[line.order_index];
                LineResult {
                    id: line.order_index,
                    confidence: geometry.confidence.unwrap_or(0.0),
                    bounding_box: geometry.bounds().polygon(),
                    text: line.into_text(),
                }
            })
            .collect();

        let text = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        info!(
            "Recognized {} lines ({} escalations, {} failed)",
            lines.len(),
            escalations,
            failed
        );

        Ok(PageResult {
            name: name.to_string(),
            width,
            height,
            text,
            lines,
        })
    }
}
