pub mod config;
pub mod error;
pub mod food;

// 重新导出food模块中的常用类型和函数
pub use config::DetectConfig;
pub use error::DetectError;
pub use food::{FoodDetector, draw_detections, class_color};
pub use food::{Raster, load_image, letterbox, TransformParams};
pub use food::{BoundingBox, Candidate, Detection, DetectionResult};
pub use food::{decode, suppress, remap};
pub use food::{InferenceEngine, OrtEngine, infer_detached};
pub use food::{load_model, shared_engine};
