pub mod detector;
pub mod labels;
pub mod manager;

pub use detector::{ObjectDetector, YoloDetector};
pub use labels::ClassLabels;
pub use manager::{ModelManager, ModelStats};
