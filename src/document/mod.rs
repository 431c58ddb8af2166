pub mod assembler;
pub mod bounds;
pub mod detection;
pub mod error;
pub mod line;
pub mod page;
pub mod reading_order;

pub use assembler::{extract_lines, PageAssembler};
pub use bounds::Bounds;
pub use detection::Detection;
pub use error::DocumentError;
pub use line::{LineGeometry, LineRegion, FALLBACK_COMPLEXITY};
pub use page::{LineResult, PageResult};
pub use reading_order::{Directionality, ReadingOrderAnalyzer};
