use crate::food::bounds::{BoundingBox, Candidate, Detection};
use crate::food::prevs::TransformParams;

/// 把输入张量空间的框映射回原图并裁剪
///
/// 先完整做信箱的逆变换，再裁剪：x、y 限制在 [0, W] / [0, H]，
/// 宽高截断到不超出右边和下边。部分出界的框被截断而不是丢弃，
/// 完全出界的框可能变成零宽或零高。
pub fn remap_box(
    bbox: &BoundingBox,
    transform: &TransformParams,
    image_width: u32,
    image_height: u32,
) -> BoundingBox {
    let (width, height) = (image_width as f32, image_height as f32);
    let (x, y) = transform.inverse(bbox.x, bbox.y);
    let w = bbox.w / transform.scale;
    let h = bbox.h / transform.scale;

    let x = x.clamp(0.0, width);
    let y = y.clamp(0.0, height);
    BoundingBox {
        x,
        y,
        w: w.min(width - x).max(0.0),
        h: h.min(height - y).max(0.0),
    }
}

/// 把保留的候选框转换为原图坐标下的检测结果
///
/// # 参数
/// * `candidates` - NMS 之后的候选框（输入张量空间）
/// * `transform` - 预处理时记录的变换参数
/// * `image_width` / `image_height` - 原图尺寸
/// * `class_names` - 类别名称，用于填充 `class_name`
pub fn remap(
    candidates: &[Candidate],
    transform: &TransformParams,
    image_width: u32,
    image_height: u32,
    class_names: &[String],
) -> Vec<Detection> {
    candidates
        .iter()
        .map(|candidate| Detection {
            class_name: class_names
                .get(candidate.class_index)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", candidate.class_index)),
            class_index: candidate.class_index,
            confidence: candidate.confidence,
            bbox: remap_box(&candidate.bbox, transform, image_width, image_height),
        })
        .collect()
}
