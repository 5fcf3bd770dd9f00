pub mod pipeline;
pub mod types;

pub use pipeline::ImageProcessor;
pub use types::{BoundingBox, Detection, ProcessOutcome};
