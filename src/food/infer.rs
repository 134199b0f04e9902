use std::sync::{Arc, Mutex};

use ndarray::{Array3, Array4};
use ort::{inputs, session::Session};
use tracing::debug;

use crate::error::DetectError;
use crate::food::array::{to_input, to_output};

/// YOLOv5 导出模型的输入名
pub const DEFAULT_INPUT_NAME: &str = "images";

/// 外部推理引擎
///
/// 检测流程只依赖这一个函数边界：输入 [1, 3, S, S] 张量，输出 [1, N, 5+C] 张量。
/// 任何 `FnMut(&Array4<f32>) -> Result<Array3<f32>, DetectError>` 闭包都实现了该 trait，
/// 测试中可以直接传入桩函数。
pub trait InferenceEngine {
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array3<f32>, DetectError>;
}

impl<F> InferenceEngine for F
where
    F: FnMut(&Array4<f32>) -> Result<Array3<f32>, DetectError>,
{
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array3<f32>, DetectError> {
        self(input)
    }
}

/// 基于 ONNX Runtime 的推理引擎
pub struct OrtEngine {
    session: Session,
    input_name: String,
}

impl OrtEngine {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            input_name: DEFAULT_INPUT_NAME.to_string(),
        }
    }

    /// 设置模型输入名
    pub fn with_input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = name.into();
        self
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }
}

impl InferenceEngine for OrtEngine {
    /// 运行模型推理，取第一个输出
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array3<f32>, DetectError> {
        let input_tensor = to_input(input)?;
        let outputs = self
            .session
            .run(inputs![self.input_name.as_str() => input_tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        debug!("模型输出形状: {:?}", shape);
        to_output(&shape[..], data)
    }
}

/// 在 tokio 阻塞线程池中运行共享的推理引擎
///
/// 互斥锁保证同一时刻只有一个推理在使用该引擎。
pub async fn infer_detached<E>(
    engine: Arc<Mutex<E>>,
    input: Array4<f32>,
) -> Result<Array3<f32>, DetectError>
where
    E: InferenceEngine + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut engine = engine
            .lock()
            .map_err(|_| DetectError::InferenceFailure("推理引擎锁已中毒".into()))?;
        engine.infer(&input)
    })
    .await
    .map_err(|e| DetectError::InferenceFailure(format!("推理任务失败: {e}")))?
}
