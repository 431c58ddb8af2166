pub mod document;
pub mod inference;
pub mod jobs;
pub mod server;
pub mod utils;

pub use document::{
    Bounds, Detection, DocumentError, LineGeometry, LineRegion, LineResult, PageAssembler,
    PageResult, ReadingOrderAnalyzer,
};
pub use inference::{
    CascadeConfig, CascadeDispatcher, Detector, EngineSlot, InferenceError, LayoutAnalyzer,
    Recognizer, RecognizerTiers, Tier, WorkerPool,
};
pub use jobs::{Job, JobError, JobStatus, JobSupervisor};
pub use server::{create_app, start_server, AppState};
pub use utils::config::AppConfig;
