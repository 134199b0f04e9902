use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::info;

use crate::error::DetectError;
use crate::food::infer::OrtEngine;

/// 进程内共享的推理引擎，第一次使用时加载
static SHARED_ENGINE: OnceLock<Arc<Mutex<OrtEngine>>> = OnceLock::new();

/// 加载YOLO食物检测模型
///
/// 加载ONNX格式的模型，并应用优化配置。
///
/// # 参数
/// * `model_path` - 模型文件路径
///
/// # 错误处理
/// 如果模型加载失败会返回 `ModelLoad`
pub fn load_model(model_path: impl AsRef<Path>) -> Result<Session, DetectError> {
    let model_path = model_path.as_ref();
    info!("加载模型文件: {}", model_path.display());

    let build = || -> Result<Session, ort::Error> {
        Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(model_path)
    };
    let model = build()
        .map_err(|e| DetectError::ModelLoad(format!("{}: {e}", model_path.display())))?;

    info!("模型加载完成");
    Ok(model)
}

/// 获取进程内共享的推理引擎
///
/// 第一次调用时加载模型，之后的调用直接返回同一个引擎，忽略 `model_path`。
/// 加载失败不会被缓存，下次调用会重新尝试。
pub fn shared_engine(model_path: impl AsRef<Path>) -> Result<Arc<Mutex<OrtEngine>>, DetectError> {
    if let Some(engine) = SHARED_ENGINE.get() {
        return Ok(Arc::clone(engine));
    }

    let engine = Arc::new(Mutex::new(OrtEngine::new(load_model(model_path)?)));
    // 另一个线程可能先完成了初始化，此时使用它的引擎
    Ok(Arc::clone(SHARED_ENGINE.get_or_init(|| engine)))
}
