use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

// 目标检测超参数配置
pub const DEFAULT_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
pub const DEFAULT_MODEL_PATH: &str = "best.onnx";

/// YOLOv5 在 640x640 输入下的锚框行数 (80² + 40² + 20²) × 3
pub const YOLOV5_ANCHOR_ROWS: usize = 25200;

/// 每行中类别概率之前的字段数: cx, cy, w, h, objectness
pub const BOX_FIELDS: usize = 5;

/// 填充区域的灰色值（归一化之后）
pub const PAD_VALUE: f32 = 0.5;

/// 食物类别，顺序与训练时一致
pub const FOOD_CLASSES: [&str; 8] = [
    "chicken",
    "daal",
    "mixsweet",
    "naan",
    "rice",
    "roti",
    "salad",
    "yogurt",
];

/// 检测流程配置
///
/// JSON 字段使用 camelCase，缺省字段取默认值。
///
/// ```
/// use thali::DetectConfig;
///
/// let config = DetectConfig::from_json_str(r#"{ "confidenceThreshold": 0.4 }"#).unwrap();
/// assert_eq!(config.input_size, 640);
/// assert_eq!(config.confidence_threshold, 0.4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectConfig {
    /// 模型输入边长 S，输入张量为 [1, 3, S, S]
    pub input_size: u32,
    /// 置信度阈值，低于此值的候选框将被丢弃
    pub confidence_threshold: f32,
    /// NMS 的 IoU 阈值，严格大于此值才会抑制
    pub iou_threshold: f32,
    /// 类别名称，长度即类别数 C
    pub class_names: Vec<String>,
    /// 期望的输出行数 N，为 None 时不检查
    pub expected_detections: Option<usize>,
    /// ONNX 模型路径，只由模型加载使用
    pub model_path: String,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            class_names: FOOD_CLASSES.iter().map(|name| name.to_string()).collect(),
            expected_detections: None,
            model_path: DEFAULT_MODEL_PATH.to_string(),
        }
    }
}

impl DetectConfig {
    /// 训练好的 YOLOv5 食物模型的配置，额外校验输出行数
    pub fn yolov5_food() -> Self {
        Self::default().with_expected_detections(Some(YOLOV5_ANCHOR_ROWS))
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    pub fn with_class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expected_detections(mut self, rows: Option<usize>) -> Self {
        self.expected_detections = rows;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
        self.model_path = path.into();
        self
    }

    /// 类别数 C
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// 每行的列数 5 + C
    pub fn row_width(&self) -> usize {
        BOX_FIELDS + self.num_classes()
    }

    /// 检查配置是否合法
    ///
    /// 阈值必须在 [0, 1] 内，输入边长必须为正，类别列表不能为空。
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.input_size == 0 {
            return Err(DetectError::InvalidConfig("inputSize must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DetectError::InvalidConfig(format!(
                "confidenceThreshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(DetectError::InvalidConfig(format!(
                "iouThreshold {} is outside [0, 1]",
                self.iou_threshold
            )));
        }
        if self.class_names.is_empty() {
            return Err(DetectError::InvalidConfig("classNames must not be empty".into()));
        }
        Ok(())
    }

    /// 从 JSON 字符串解析配置并校验
    pub fn from_json_str(json: &str) -> Result<Self, DetectError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载配置并校验
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
