//! Engine construction and the process-wide readiness slot.
//!
//! Models load once, in the background, after the server starts listening.
//! Until [`EngineSlot::install`] has run, every request that needs the engine
//! is rejected with [`DocumentError::EngineNotReady`].

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::document::assembler::PageAssembler;
use crate::document::reading_order::ReadingOrderAnalyzer;
use crate::document::DocumentError;
use crate::inference::deim::Deim;
use crate::inference::parseq::{self, Parseq};
use crate::inference::{CascadeDispatcher, InferenceError, RecognizerTiers, WorkerPool};
use crate::utils::config::AppConfig;

/// Recognizer input widths, cheapest tier first.
const SMALL_INPUT_WIDTH: u32 = 256;
const MEDIUM_INPUT_WIDTH: u32 = 384;
const LARGE_INPUT_WIDTH: u32 = 768;

/// Holds the loaded engine once it is available.
#[derive(Default)]
pub struct EngineSlot {
    assembler: OnceCell<Arc<PageAssembler>>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that is ready from the start.
    pub fn ready(assembler: PageAssembler) -> Self {
        let slot = Self::new();
        slot.install(assembler);
        slot
    }

    /// Publishes the engine. Only the first call has any effect.
    pub fn install(&self, assembler: PageAssembler) -> bool {
        self.assembler.set(Arc::new(assembler)).is_ok()
    }

    pub fn is_ready(&self) -> bool {
        self.assembler.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<PageAssembler>, DocumentError> {
        self.assembler
            .get()
            .cloned()
            .ok_or(DocumentError::EngineNotReady)
    }
}

impl std::fmt::Debug for EngineSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSlot")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Loads the detector, the three recognizer tiers and the worker pool.
///
/// This blocks for as long as the ONNX sessions take to build; call it from a
/// blocking context.
pub fn load_engine(config: &AppConfig) -> Result<PageAssembler, InferenceError> {
    let started = Instant::now();
    let sessions = config.inference_pool_size;

    tracing::info!("Loading recognition engine...");

    let pool = Arc::new(WorkerPool::new(config.worker_threads)?);
    tracing::info!("  Worker pool: {} threads", pool.size());

    tracing::info!("  Loading detector {}...", config.detector_model);
    let detector = Deim::new(
        config.model_path(&config.detector_model),
        config.detection.clone(),
        sessions,
    )?;

    let charset = parseq::load_charset(config.model_path(&config.charset_file))?;
    tracing::info!("  Charset: {} symbols", charset.len());

    tracing::info!("  Loading recognizer tiers...");
    let small = Parseq::new(
        config.model_path(&config.recognizer_small_model),
        charset.clone(),
        SMALL_INPUT_WIDTH,
        sessions,
    )?;
    let medium = Parseq::new(
        config.model_path(&config.recognizer_medium_model),
        charset.clone(),
        MEDIUM_INPUT_WIDTH,
        sessions,
    )?;
    let large = Parseq::new(
        config.model_path(&config.recognizer_large_model),
        charset,
        LARGE_INPUT_WIDTH,
        sessions,
    )?;

    let tiers = RecognizerTiers::new(Arc::new(small), Arc::new(medium), Arc::new(large));
    let dispatcher = CascadeDispatcher::new(tiers, pool, config.cascade.clone());
    let layout = ReadingOrderAnalyzer::new(config.layout.line_classes.clone());

    tracing::info!(
        "Recognition engine loaded in {:.1}s",
        started.elapsed().as_secs_f32()
    );

    Ok(PageAssembler::new(
        Arc::new(detector),
        Arc::new(layout),
        dispatcher,
    ))
}
