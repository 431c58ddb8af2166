//! PARSeq line recognizer.
//!
//! Each recognizer tier is one PARSeq ONNX model with a fixed input size.
//! Line images are turned upright, resized to the model's input, normalised
//! to `[-1, 1]` and decoded greedily until the end-of-sequence token.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use ort::{inputs, session::builder::PrepackedWeights, session::Session, value::Value};
use serde::Deserialize;

use crate::inference::{InferenceError, Recognizer, SessionPool};
use crate::utils::image_utils;

#[derive(Deserialize)]
struct CharsetFile {
    model: CharsetModel,
}

#[derive(Deserialize)]
struct CharsetModel {
    charset_train: String,
}

/// Loads the recognizer alphabet from a YAML file's `model.charset_train`.
pub fn load_charset<P: AsRef<Path>>(path: P) -> Result<Arc<[char]>, InferenceError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| InferenceError::DataFileLoadError {
        path: path.to_path_buf(),
        source,
    })?;
    let file: CharsetFile =
        serde_yaml::from_str(&content).map_err(|e| InferenceError::DataFileParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(file.model.charset_train.chars().collect())
}

/// Greedy decoding of PARSeq logits laid out as `[seq_len, num_classes]`.
///
/// Class 0 is the end-of-sequence token and class `i > 0` maps to
/// `charset[i - 1]`; classes past the charset (BOS and padding) are skipped.
pub fn decode_greedy(logits: &[f32], seq_len: usize, num_classes: usize, charset: &[char]) -> String {
    let mut text = String::new();
    if num_classes == 0 {
        return text;
    }

    for step in logits.chunks_exact(num_classes).take(seq_len) {
        let (max_index, _) = step
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                if v > best.1 {
                    (i, v)
                } else {
                    best
                }
            });

        if max_index == 0 {
            break;
        }
        if let Some(&ch) = charset.get(max_index - 1) {
            text.push(ch);
        }
    }

    text
}

struct ParseqModel {
    session: Session,
    input_name: String,
    output_name: String,
}

impl ParseqModel {
    /// Threads per session; parallelism comes from the worker pool.
    const NUM_THREADS: usize = 1;

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

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| InferenceError::ProcessingError {
                message: format!("Model {} declares no inputs", model_path.display()),
            })?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| InferenceError::ProcessingError {
                message: format!("Model {} declares no outputs", model_path.display()),
            })?;

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }

    fn infer(&mut self, input: Value) -> Result<(Vec<f32>, Vec<i64>), InferenceError> {
        let outputs = self
            .session
            .run(inputs![self.input_name.as_str() => input])
            .map_err(|source| InferenceError::ModelExecutionError {
                operation: "PARSeq forward pass".to_string(),
                source,
            })?;

        let output_tensor = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| InferenceError::PredictionError {
                operation: "get model outputs".to_string(),
                message: format!("Output '{}' not found", self.output_name),
            })?
            .try_extract_tensor::<f32>()
            .map_err(|source| InferenceError::PredictionError {
                operation: "extract output tensor".to_string(),
                message: source.to_string(),
            })?;

        Ok((output_tensor.1.to_vec(), output_tensor.0.to_vec()))
    }
}

/// A PARSeq recognizer for one tier.
pub struct Parseq {
    pool: SessionPool<ParseqModel>,
    charset: Arc<[char]>,
    input_width: u32,
    input_height: u32,
    model_path: PathBuf,
}

impl Parseq {
    pub const INPUT_HEIGHT: u32 = 16;

    const MEAN_VALUES: [f32; 3] = [127.5, 127.5, 127.5];
    const NORM_VALUES: [f32; 3] = [1.0 / 127.5, 1.0 / 127.5, 1.0 / 127.5];

    /// Loads `pool_size` sessions of the model at `model_path`.
    pub fn new(
        model_path: impl Into<PathBuf>,
        charset: Arc<[char]>,
        input_width: u32,
        pool_size: usize,
    ) -> Result<Self, InferenceError> {
        let model_path = model_path.into();
        let pool = SessionPool::new(pool_size, |w| ParseqModel::new(&model_path, w))?;

        tracing::debug!(
            "Loaded PARSeq model {} ({}x{}, {} sessions)",
            model_path.display(),
            input_width,
            Self::INPUT_HEIGHT,
            pool.len()
        );

        Ok(Self {
            pool,
            charset,
            input_width,
            input_height: Self::INPUT_HEIGHT,
            model_path,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn preprocess(&self, image: &RgbImage) -> Result<Value, InferenceError> {
        let upright = image_utils::orient_line(image);
        let resized = image_utils::resize_exact(&upright, self.input_width, self.input_height);
        let input_array =
            image_utils::subtract_mean_normalize(&resized, &Self::MEAN_VALUES, &Self::NORM_VALUES)
                .map_err(|e| InferenceError::PreprocessingError {
                    operation: "normalize line image".to_string(),
                    message: e.to_string(),
                })?;

        let shape = input_array.shape().to_vec();
        let (data, _offset) = input_array.into_raw_vec_and_offset();
        let value = Value::from_array((shape.as_slice(), data)).map_err(|e| {
            InferenceError::PreprocessingError {
                operation: "create input value".to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(value.into())
    }
}

impl Recognizer for Parseq {
    fn read(&self, image: &RgbImage) -> Result<String, InferenceError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(String::new());
        }

        let input = self.preprocess(image)?;
        let (logits, shape) = self.pool.with(|model| model.infer(input))?;

        if shape.len() != 3 {
            return Err(InferenceError::PredictionError {
                operation: "decode logits".to_string(),
                message: format!("Expected a 3-dimensional output, got {:?}", shape),
            });
        }

        let seq_len = shape[1] as usize;
        let num_classes = shape[2] as usize;
        Ok(decode_greedy(&logits, seq_len, num_classes, &self.charset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn one_hot(indices: &[usize], num_classes: usize) -> Vec<f32> {
        let mut logits = vec![0.0; indices.len() * num_classes];
        for (step, &index) in indices.iter().enumerate() {
            logits[step * num_classes + index] = 1.0;
        }
        logits
    }

    #[test]
    fn test_decode_greedy_stops_at_eos() {
        let charset: Vec<char> = "abc".chars().collect();
        let logits = one_hot(&[1, 3, 2, 0, 1], 5);

        assert_eq!(decode_greedy(&logits, 5, 5, &charset), "acb");
    }

    #[test]
    fn test_decode_greedy_skips_unknown_classes() {
        let charset: Vec<char> = "ab".chars().collect();
        let logits = one_hot(&[1, 4, 2], 5);

        assert_eq!(decode_greedy(&logits, 3, 5, &charset), "ab");
    }

    #[test]
    fn test_decode_greedy_empty() {
        let charset: Vec<char> = "ab".chars().collect();
        assert_eq!(decode_greedy(&one_hot(&[0, 1], 3), 2, 3, &charset), "");
        assert_eq!(decode_greedy(&[], 0, 0, &charset), "");
    }

    #[test]
    fn test_load_charset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model:\n  charset_train: \"あいう123\"").unwrap();

        let charset = load_charset(file.path()).unwrap();

        assert_eq!(charset.len(), 6);
        assert_eq!(charset[0], 'あ');
    }

    #[test]
    fn test_load_charset_missing_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model:\n  other: 1").unwrap();

        assert!(matches!(
            load_charset(file.path()),
            Err(InferenceError::DataFileParseError { .. })
        ));
    }
}
