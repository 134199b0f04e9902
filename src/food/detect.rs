use std::future::Future;
use std::time::Instant;

use image::DynamicImage;
use ndarray::{Array3, Array4};
use tracing::debug;

use crate::config::DetectConfig;
use crate::error::DetectError;
use crate::food::bounds::DetectionResult;
use crate::food::infer::InferenceEngine;
use crate::food::nms::suppress;
use crate::food::posts::{check_output_shape, decode};
use crate::food::prevs::{TransformParams, letterbox};
use crate::food::raster::Raster;
use crate::food::remap::remap;

/// 食物检测器
///
/// 串联 letterbox → 推理 → decode → suppress → remap，并统计耗时。
/// 推理引擎由调用者注入，检测器本身不持有可变状态，
/// 可以在多个调用之间共享。
///
/// # 示例
///
/// ```
/// use thali::{DetectConfig, FoodDetector};
///
/// let detector = FoodDetector::new(DetectConfig::default())
///     .and_then(|d| d.with_confidence_threshold(0.5))
///     .and_then(|d| d.with_iou_threshold(0.45))
///     .unwrap();
/// assert_eq!(detector.config().confidence_threshold, 0.5);
///
/// assert!(detector.with_confidence_threshold(f32::NAN).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FoodDetector {
    config: DetectConfig,
}

impl FoodDetector {
    /// 创建检测器
    ///
    /// # 错误处理
    /// 配置不合法时返回 `InvalidConfig`
    pub fn new(config: DetectConfig) -> Result<Self, DetectError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 设置置信度阈值
    ///
    /// # 错误处理
    /// 阈值不在 [0, 1] 内（包括 NaN）时返回 `InvalidConfig`
    pub fn with_confidence_threshold(self, threshold: f32) -> Result<Self, DetectError> {
        Self::new(self.config.with_confidence_threshold(threshold))
    }

    /// 设置NMS阈值
    ///
    /// # 错误处理
    /// 阈值不在 [0, 1] 内（包括 NaN）时返回 `InvalidConfig`
    pub fn with_iou_threshold(self, threshold: f32) -> Result<Self, DetectError> {
        Self::new(self.config.with_iou_threshold(threshold))
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// 完整的检测流程：从光栅图像到检测结果
    ///
    /// 推理引擎只被调用一次，失败时整个调用失败，不重试也不返回部分结果。
    /// `Raster` 构造时已保证宽高大于0，这里不再检查。
    ///
    /// # 参数
    /// * `raster` - 待检测的图像
    /// * `engine` - 外部推理引擎
    ///
    /// # 错误处理
    /// 推理失败时返回引擎给出的错误，输出形状不符时返回 `TensorShapeMismatch`
    pub fn run<E>(&self, raster: &Raster, engine: &mut E) -> Result<DetectionResult, DetectError>
    where
        E: InferenceEngine + ?Sized,
    {
        let start = Instant::now();
        let (input, transform) = letterbox(raster, self.config.input_size);
        let output = engine.infer(&input)?;
        self.finish(raster, &output, &transform, start)
    }

    /// 异步版本：等待注入的推理回调完成后再继续
    ///
    /// 回调只会被调用一次；取消与超时由调用者在回调外部决定。
    pub async fn run_async<F, Fut>(
        &self,
        raster: &Raster,
        infer: F,
    ) -> Result<DetectionResult, DetectError>
    where
        F: FnOnce(Array4<f32>) -> Fut,
        Fut: Future<Output = Result<Array3<f32>, DetectError>>,
    {
        let start = Instant::now();
        let (input, transform) = letterbox(raster, self.config.input_size);
        let output = infer(input).await?;
        self.finish(raster, &output, &transform, start)
    }

    /// 对已解码的图像执行检测
    pub fn detect<E>(&self, img: &DynamicImage, engine: &mut E) -> Result<DetectionResult, DetectError>
    where
        E: InferenceEngine + ?Sized,
    {
        let raster = Raster::from_image(img)?;
        self.run(&raster, engine)
    }

    fn finish(
        &self,
        raster: &Raster,
        output: &Array3<f32>,
        transform: &TransformParams,
        start: Instant,
    ) -> Result<DetectionResult, DetectError> {
        let config = &self.config;
        check_output_shape(&output.view(), config.num_classes(), config.expected_detections)?;

        let candidates = decode(output.view(), &config.class_names, config.confidence_threshold)?;
        let kept = suppress(candidates, config.iou_threshold);
        let detections = remap(
            &kept,
            transform,
            raster.width(),
            raster.height(),
            &config.class_names,
        );

        let inference_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!("检测到 {} 个目标, 耗时 {:.2} ms", detections.len(), inference_time_ms);

        Ok(DetectionResult {
            detections,
            inference_time_ms,
            image_width: raster.width(),
            image_height: raster.height(),
        })
    }
}
