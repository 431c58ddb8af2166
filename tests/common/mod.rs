#![allow(dead_code)]

use std::sync::Arc;

use cascade_ocr::document::{Bounds, Detection, LineGeometry, PageAssembler};
use cascade_ocr::inference::{
    CascadeConfig, CascadeDispatcher, Detector, InferenceError, LayoutAnalyzer, Recognizer,
    RecognizerTiers, WorkerPool,
};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;

/// Line images carry their identity in the red channel of every pixel.
pub fn line_image(id: u8) -> RgbImage {
    RgbImage::from_pixel(12, 4, Rgb([id, 0, 0]))
}

pub fn line_id(image: &RgbImage) -> u8 {
    image.get_pixel(0, 0)[0]
}

pub fn failure(message: &str) -> InferenceError {
    InferenceError::ProcessingError {
        message: message.to_string(),
    }
}

/// Recognizer driven by a closure over the line id, recording every call.
pub struct FakeRecognizer {
    read: Box<dyn Fn(u8) -> Result<String, InferenceError> + Send + Sync>,
    calls: Mutex<Vec<u8>>,
}

impl FakeRecognizer {
    pub fn new<F>(read: F) -> Arc<Self>
    where
        F: Fn(u8) -> Result<String, InferenceError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            read: Box::new(read),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers `<prefix>-<id>` for every line.
    pub fn labelled(prefix: &'static str) -> Arc<Self> {
        Self::new(move |id| Ok(format!("{prefix}-{id}")))
    }

    pub fn failing() -> Arc<Self> {
        Self::new(|_| Err(failure("recognizer unavailable")))
    }

    pub fn calls(&self) -> Vec<u8> {
        let mut calls = self.calls.lock().clone();
        calls.sort_unstable();
        calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Recognizer for FakeRecognizer {
    fn read(&self, image: &RgbImage) -> Result<String, InferenceError> {
        let id = line_id(image);
        self.calls.lock().push(id);
        (self.read)(id)
    }
}

pub struct Tiers {
    pub small: Arc<FakeRecognizer>,
    pub medium: Arc<FakeRecognizer>,
    pub large: Arc<FakeRecognizer>,
}

impl Tiers {
    pub fn labelled() -> Self {
        Self {
            small: FakeRecognizer::labelled("small"),
            medium: FakeRecognizer::labelled("medium"),
            large: FakeRecognizer::labelled("large"),
        }
    }

    pub fn dispatcher(&self) -> CascadeDispatcher {
        self.dispatcher_with(CascadeConfig::default())
    }

    pub fn dispatcher_with(&self, config: CascadeConfig) -> CascadeDispatcher {
        let tiers = RecognizerTiers::new(
            self.small.clone(),
            self.medium.clone(),
            self.large.clone(),
        );
        let pool = Arc::new(WorkerPool::new(Some(4)).unwrap());
        CascadeDispatcher::new(tiers, pool, config)
    }
}

pub struct FakeDetector {
    detections: Vec<Detection>,
    delay: Option<std::time::Duration>,
}

impl FakeDetector {
    pub fn new(detections: Vec<Detection>) -> Arc<Self> {
        Arc::new(Self {
            detections,
            delay: None,
        })
    }

    pub fn slow(detections: Vec<Detection>, delay: std::time::Duration) -> Arc<Self> {
        Arc::new(Self {
            detections,
            delay: Some(delay),
        })
    }
}

impl Detector for FakeDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, InferenceError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.detections.clone())
    }
}

pub struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, InferenceError> {
        Err(failure("detector crashed"))
    }
}

pub struct PanickingDetector;

impl Detector for PanickingDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<Detection>, InferenceError> {
        panic!("detector bug")
    }
}

/// Layout analyzer that ignores its input and returns fixed lines.
pub struct FixedLayout {
    lines: Vec<LineGeometry>,
}

impl FixedLayout {
    pub fn new(lines: Vec<LineGeometry>) -> Arc<Self> {
        Arc::new(Self { lines })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

impl LayoutAnalyzer for FixedLayout {
    fn analyze(
        &self,
        _detections: &[Detection],
        _page_width: u32,
        _page_height: u32,
    ) -> Result<Vec<LineGeometry>, InferenceError> {
        Ok(self.lines.clone())
    }
}

/// A white page with each box painted in its id colour.
pub fn page_with(boxes: &[(Bounds, u8)]) -> RgbImage {
    let mut page = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
    for (bounds, id) in boxes {
        for y in bounds.top()..bounds.bottom() {
            for x in bounds.left()..bounds.right() {
                page.put_pixel(x as u32, y as u32, Rgb([*id, 0, 0]));
            }
        }
    }
    page
}

/// Horizontal line boxes stacked down the page, 10px apart.
pub fn row(index: i32) -> Bounds {
    Bounds::new(10, 10 + index * 20, 150, 20 + index * 20)
}

pub fn geometry(bounds: Bounds) -> LineGeometry {
    LineGeometry::new(bounds.left(), bounds.top(), bounds.width(), bounds.height())
}

/// An assembler whose layout step returns `lines` and whose page has one
/// painted box per line, each labelled by its position.
pub fn assembler_for(tiers: &Tiers, detections: Vec<Detection>, lines: Vec<LineGeometry>) -> PageAssembler {
    PageAssembler::new(
        FakeDetector::new(detections),
        FixedLayout::new(lines),
        tiers.dispatcher(),
    )
}
