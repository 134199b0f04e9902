use tracing::debug;

use crate::food::bounds::Candidate;

/// 应用非极大值抑制
///
/// 不区分类别：所有候选框互相比较（同一盘中的食物不会互相重叠）。
/// 先按置信度稳定降序排序，置信度相同时保持解码顺序；
/// 然后依次接受与所有已接受框的 IoU 都不超过阈值的框，
/// 被丢弃的框不会再被考虑。
///
/// # 参数
/// * `candidates` - 候选框
/// * `iou_threshold` - IoU 阈值，严格大于才抑制
///
/// # 返回值
/// 按置信度降序排列的保留框
pub fn suppress(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    let total = candidates.len();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|accepted| accepted.bbox.iou(&candidate.bbox) > iou_threshold);
        if !overlaps {
            kept.push(candidate);
        }
    }

    debug!("NMS: {} -> {}", total, kept.len());
    kept
}
