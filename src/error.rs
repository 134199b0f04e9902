use thiserror::Error;

/// 检测流程中的错误
///
/// 这些错误在本层都不可恢复：流程不重试也不返回部分结果，
/// 由调用者决定换一张图片重试或提示用户。
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidRasterDimensions { width: u32, height: u32 },

    #[error("raster buffer holds {got} bytes, expected {expected} (width * height * 4)")]
    InvalidRasterBuffer { expected: usize, got: usize },

    #[error("tensor shape mismatch: expected {expected}, got {got}")]
    TensorShapeMismatch { expected: String, got: String },

    #[error("inference failed: {0}")]
    InferenceFailure(String),

    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("config parse failed: {0}")]
    Config(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render failed: {0}")]
    Render(String),
}

impl From<ort::Error> for DetectError {
    fn from(err: ort::Error) -> Self {
        tracing::error!(error = %err, "ONNX Runtime error");
        DetectError::InferenceFailure(err.to_string())
    }
}

impl DetectError {
    pub fn shape_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        DetectError::TensorShapeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
