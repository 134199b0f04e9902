use std::collections::BTreeMap;

use serde::Serialize;

/// 边界框结构
///
/// 以左上角和宽高 (x, y, w, h) 表示的轴对齐矩形。
/// 坐标空间由上下文决定：解码后在输入张量空间，映射后在原图空间。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    /// 左上角x坐标
    pub x: f32,
    /// 左上角y坐标
    pub y: f32,
    /// 宽度
    pub w: f32,
    /// 高度
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// 由中心点格式 (cx, cy, w, h) 转换
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
        }
    }

    /// 右边界 x + w
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// 下边界 y + h
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// 计算两个边界框的交集面积
    pub fn intersection(&self, other: &BoundingBox) -> f32 {
        let inter_w = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let inter_h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        inter_w * inter_h
    }

    /// 计算交并比 (IoU)
    ///
    /// 并集面积为 area1 + area2 - intersection；并集为0时 IoU 定义为0，
    /// 因此零面积框不会抑制其他框，也不会被抑制。
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;
        if union > 0.0 { inter / union } else { 0.0 }
    }
}

/// 候选检测
///
/// 由解码器产生，经过 NMS 筛选后再映射回原图。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// 类别索引
    pub class_index: usize,
    /// 置信度 = objectness × 最大类别概率
    pub confidence: f32,
    /// 边界框
    pub bbox: BoundingBox,
}

/// 检测结果
///
/// 边界框已映射到原图像素坐标并裁剪到图像范围内。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// 类别名称
    pub class_name: String,
    /// 类别索引
    pub class_index: usize,
    /// 置信度
    pub confidence: f32,
    /// 原图坐标下的边界框
    pub bbox: BoundingBox,
}

impl Detection {
    /// 显示用标签，例如 `naan 81.0%`
    pub fn label(&self) -> String {
        format!("{} {:.1}%", self.class_name, self.confidence * 100.0)
    }
}

/// 一次检测的完整输出
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// 按置信度降序排列的检测结果
    pub detections: Vec<Detection>,
    /// 处理耗时（毫秒），包含推理与后处理
    pub inference_time_ms: f64,
    /// 原图宽度
    pub image_width: u32,
    /// 原图高度
    pub image_height: u32,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// 按置信度降序排列的副本
    pub fn by_confidence(&self) -> Vec<Detection> {
        let mut sorted = self.detections.clone();
        sorted.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        sorted
    }

    /// 每个类别的检测数量
    pub fn count_by_class(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for detection in &self.detections {
            *counts.entry(detection.class_name.clone()).or_insert(0) += 1;
        }
        counts
    }
}
