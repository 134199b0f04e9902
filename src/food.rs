//! Food模块 - 食物检测的前后处理流程
//!
//! 推理引擎由外部注入，本模块只负责数值流程：
//! - 信箱缩放与归一化（prevs）
//! - 解码模型输出张量（posts）
//! - 不区分类别的非极大值抑制（nms）
//! - 把检测框映射回原图坐标（remap）
//! - 串联以上步骤并计时（detect）
//!
//! # 工作流程
//!
//! 1. 把图像转换为 Raster（RGBA8）
//! 2. letterbox 得到 [1, 3, S, S] 输入张量和变换参数
//! 3. 调用注入的推理引擎得到 [1, N, 5+C] 输出张量
//! 4. decode → suppress → remap 得到原图坐标下的检测结果
//!
//! # 示例
//!
//! ```
//! use ndarray::{Array3, Array4};
//! use thali::{DetectConfig, DetectError, FoodDetector, Raster};
//!
//! # fn main() -> Result<(), DetectError> {
//! let detector = FoodDetector::new(DetectConfig::default())?;
//! let raster = Raster::new(2, 2, vec![255; 16])?;
//!
//! // 用一个返回空输出的闭包代替真实模型
//! let mut engine = |_input: &Array4<f32>| -> Result<Array3<f32>, DetectError> {
//!     Ok(Array3::zeros((1, 4, 13)))
//! };
//! let result = detector.run(&raster, &mut engine)?;
//! assert!(result.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod raster;
pub mod bounds;
pub mod prevs;
pub mod posts;
pub mod nms;
pub mod remap;
pub mod array;
pub mod infer;
pub mod model;
pub mod detect;
pub mod draw;

// 重新导出常用类型和函数
pub use raster::{Raster, load_image};
pub use bounds::{BoundingBox, Candidate, Detection, DetectionResult};
pub use prevs::{TransformParams, letterbox};
pub use posts::decode;
pub use nms::suppress;
pub use remap::remap;
pub use infer::{InferenceEngine, OrtEngine, infer_detached};
pub use model::{load_model, shared_engine};
pub use detect::FoodDetector;
pub use draw::{draw_detections, class_color};
