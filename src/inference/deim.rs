use std::path::{Path, PathBuf};

use image::RgbImage;
use ort::{inputs, session::builder::PrepackedWeights, session::Session, value::Value};

use crate::document::bounds::Bounds;
use crate::document::detection::Detection;
use crate::inference::{Detector, InferenceError, SessionPool};
use crate::utils::config::DetectionConfig;
use crate::utils::{box_utils, image_utils};

/// Raw detector outputs for one page.
struct DeimOutputs {
    labels: Vec<i64>,
    boxes: Vec<f32>,
    scores: Vec<f32>,
    char_counts: Option<Vec<f32>>,
}

struct DeimModel {
    session: Session,
}

impl DeimModel {
    const NUM_THREADS: usize = 4;

    fn new(model_path: &Path, prepacked: &PrepackedWeights) -> Result<Self, InferenceError> {
        let session = Session::builder()
            .map_err(|source| InferenceError::ModelFileLoadError {
                path: model_path.to_path_buf(),
                source,
            })?
            .with_intra_threads(Self::NUM_THREADS)?
            .with_prepacked_weights(prepacked)?
            .commit_from_file(model_path)
            .map_err(|source| InferenceError::ModelFileLoadError {
                path: model_path.to_path_buf(),
                source,
            })?;

        Ok(Self { session })
    }

    fn run(&mut self, image_input: Value, size_input: Value) -> Result<DeimOutputs, InferenceError> {
        let outputs = self
            .session
            .run(inputs![
                Deim::IMAGE_INPUT => image_input,
                Deim::SIZE_INPUT => size_input
            ])
            .map_err(|source| InferenceError::ModelExecutionError {
                operation: "DEIM forward pass".to_string(),
                source,
            })?;

        let labels = outputs
            .get(Deim::LABELS_OUTPUT)
            .ok_or_else(|| InferenceError::PredictionError {
                operation: "get labels output".to_string(),
                message: format!("Output '{}' not found", Deim::LABELS_OUTPUT),
            })?
            .try_extract_tensor::<i64>()
            .map_err(|source| InferenceError::PredictionError {
                operation: "extract labels tensor".to_string(),
                message: source.to_string(),
            })?
            .1
            .to_vec();

        let boxes = outputs
            .get(Deim::BOXES_OUTPUT)
            .ok_or_else(|| InferenceError::PredictionError {
                operation: "get boxes output".to_string(),
                message: format!("Output '{}' not found", Deim::BOXES_OUTPUT),
            })?
            .try_extract_tensor::<f32>()
            .map_err(|source| InferenceError::PredictionError {
                operation: "extract boxes tensor".to_string(),
                message: source.to_string(),
            })?
            .1
            .to_vec();

        let scores = outputs
            .get(Deim::SCORES_OUTPUT)
            .ok_or_else(|| InferenceError::PredictionError {
                operation: "get scores output".to_string(),
                message: format!("Output '{}' not found", Deim::SCORES_OUTPUT),
            })?
            .try_extract_tensor::<f32>()
            .map_err(|source| InferenceError::PredictionError {
                operation: "extract scores tensor".to_string(),
                message: source.to_string(),
            })?
            .1
            .to_vec();

        // Only some exports carry the character-count head.
        let char_counts = outputs
            .get(Deim::CHAR_COUNT_OUTPUT)
            .and_then(|value| value.try_extract_tensor::<f32>().ok())
            .map(|tensor| tensor.1.to_vec());

        Ok(DeimOutputs {
            labels,
            boxes,
            scores,
            char_counts,
        })
    }
}

/// DEIM page-region detector.
///
/// Pages are padded to a square on the right and bottom, so boxes reported
/// against the padded size are already in original page coordinates.
pub struct Deim {
    pool: SessionPool<DeimModel>,
    config: DetectionConfig,
    model_path: PathBuf,
}

impl Deim {
    const IMAGE_INPUT: &'static str = "images";
    const SIZE_INPUT: &'static str = "orig_target_sizes";
    const LABELS_OUTPUT: &'static str = "labels";
    const BOXES_OUTPUT: &'static str = "boxes";
    const SCORES_OUTPUT: &'static str = "scores";
    const CHAR_COUNT_OUTPUT: &'static str = "char_counts";

    const MEAN_VALUES: [f32; 3] = [0.0, 0.0, 0.0];
    const NORM_VALUES: [f32; 3] = [1.0 / 255.0, 1.0 / 255.0, 1.0 / 255.0];

    pub fn new(
        model_path: impl Into<PathBuf>,
        config: DetectionConfig,
        pool_size: usize,
    ) -> Result<Self, InferenceError> {
        let model_path = model_path.into();
        let pool = SessionPool::new(pool_size, |w| DeimModel::new(&model_path, w))?;

        tracing::debug!(
            "Loaded DEIM model {} ({} sessions)",
            model_path.display(),
            pool.len()
        );

        Ok(Self {
            pool,
            config,
            model_path,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn create_model_inputs(&self, image: &RgbImage) -> Result<(Value, Value), InferenceError> {
        let (square, side) = image_utils::pad_to_square(image);
        let resized =
            image_utils::resize_exact(&square, self.config.input_size, self.config.input_size);

        let input_array =
            image_utils::subtract_mean_normalize(&resized, &Self::MEAN_VALUES, &Self::NORM_VALUES)
                .map_err(|e| InferenceError::PreprocessingError {
                    operation: "normalize image".to_string(),
                    message: e.to_string(),
                })?;

        let image_shape = input_array.shape().to_vec();
        let (image_data, _offset) = input_array.into_raw_vec_and_offset();
        let image_input = Value::from_array((image_shape.as_slice(), image_data)).map_err(|e| {
            InferenceError::PreprocessingError {
                operation: "create image input".to_string(),
                message: e.to_string(),
            }
        })?;

        let size_shape = [1usize, 2];
        let size_input = Value::from_array((size_shape.as_slice(), vec![side as i64, side as i64]))
            .map_err(|e| InferenceError::PreprocessingError {
                operation: "create target size input".to_string(),
                message: e.to_string(),
            })?;

        Ok((image_input.into(), size_input.into()))
    }
}

/// Converts raw outputs into clipped, thresholded, de-duplicated detections.
fn postprocess(
    outputs: DeimOutputs,
    config: &DetectionConfig,
    width: u32,
    height: u32,
) -> Vec<Detection> {
    let count = outputs
        .labels
        .len()
        .min(outputs.scores.len())
        .min(outputs.boxes.len() / 4);

    let mut detections = Vec::with_capacity(count);
    for i in 0..count {
        let score = outputs.scores[i];
        if score < config.score_threshold {
            continue;
        }

        let b = &outputs.boxes[i * 4..i * 4 + 4];
        let bounds = Bounds::new(
            b[0].round() as i32,
            b[1].round() as i32,
            b[2].round() as i32,
            b[3].round() as i32,
        )
        .clip_to(width, height);

        if bounds.is_empty() {
            continue;
        }

        let mut detection = Detection::new(bounds, score, outputs.labels[i].max(0) as usize);
        if let Some(count) = outputs.char_counts.as_ref().and_then(|c| c.get(i)) {
            detection = detection.with_char_count(*count);
        }
        detections.push(detection);
    }

    box_utils::apply_nms(detections, config.iou_threshold)
}

impl Detector for Deim {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, InferenceError> {
        let (image_input, size_input) = self.create_model_inputs(image)?;
        let outputs = self.pool.with(|model| model.run(image_input, size_input))?;
        let detections = postprocess(outputs, &self.config, image.width(), image.height());
        tracing::debug!("Detected {} regions", detections.len());
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs() -> DeimOutputs {
        DeimOutputs {
            labels: vec![1, 1, 2, 1],
            boxes: vec![
                10.0, 10.0, 110.0, 30.0, // kept
                12.0, 11.0, 111.0, 31.0, // suppressed by the first
                -20.0, 40.0, 50.4, 60.6, // clipped
                10.0, 80.0, 110.0, 100.0, // below threshold
            ],
            scores: vec![0.9, 0.8, 0.7, 0.1],
            char_counts: Some(vec![3.0, 3.0, 2.0, 100.0]),
        }
    }

    #[test]
    fn test_postprocess_filters_and_suppresses() {
        let detections = postprocess(outputs(), &DetectionConfig::default(), 200, 200);

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].bounds, Bounds::new(10, 10, 110, 30));
        assert_eq!(detections[0].char_count, Some(3.0));
        assert_eq!(detections[1].bounds, Bounds::new(0, 40, 50, 61));
        assert_eq!(detections[1].class_index, 2);
    }

    #[test]
    fn test_postprocess_without_char_counts() {
        let mut raw = outputs();
        raw.char_counts = None;

        let detections = postprocess(raw, &DetectionConfig::default(), 200, 200);

        assert!(detections.iter().all(|d| d.char_count.is_none()));
    }

    #[test]
    fn test_postprocess_drops_boxes_outside_page() {
        let raw = DeimOutputs {
            labels: vec![1],
            boxes: vec![300.0, 300.0, 400.0, 320.0],
            scores: vec![0.9],
            char_counts: None,
        };

        assert!(postprocess(raw, &DetectionConfig::default(), 200, 200).is_empty());
    }
}
