//! 输出解码模块
//!
//! 把模型的稠密输出 [1, N, 5+C] 解释为输入张量空间中的候选框。

use ndarray::{ArrayView3, Axis};
use tracing::{debug, warn};

use crate::config::BOX_FIELDS;
use crate::error::DetectError;
use crate::food::bounds::{BoundingBox, Candidate};

/// 校验输出张量形状
///
/// 批大小必须为1，列数必须为 5 + C；给定 `expected_rows` 时行数也必须一致。
pub fn check_output_shape(
    output: &ArrayView3<f32>,
    num_classes: usize,
    expected_rows: Option<usize>,
) -> Result<(), DetectError> {
    let shape = output.shape();
    let columns = BOX_FIELDS + num_classes;
    let rows = expected_rows.map_or("N".to_string(), |n| n.to_string());
    let expected = format!("[1, {rows}, {columns}]");

    let rows_ok = expected_rows.is_none_or(|n| n == shape[1]);
    if shape[0] != 1 || shape[2] != columns || !rows_ok {
        return Err(DetectError::shape_mismatch(expected, format!("{shape:?}")));
    }
    Ok(())
}

/// 解码模型输出
///
/// 每一行为 (cx, cy, w, h, objectness, p1..pC)：
/// 1. objectness 低于阈值的行直接跳过
/// 2. 在类别概率中找最大值，相等时取索引较小者
/// 3. confidence = objectness × 最大类别概率，仍低于阈值则跳过
/// 4. 框坐标含 NaN 或无穷大的行跳过
/// 5. 中心点格式转换为左上角格式，坐标仍在输入张量空间
///
/// 输出顺序与行顺序一致，不排序。
///
/// # 参数
/// * `output` - 模型输出，形状为 (1, N, 5 + C)
/// * `class_names` - 类别名称，长度为 C
/// * `confidence_threshold` - 置信度阈值
///
/// # 错误处理
/// 列数与类别数不符时返回 `TensorShapeMismatch`
pub fn decode(
    output: ArrayView3<f32>,
    class_names: &[String],
    confidence_threshold: f32,
) -> Result<Vec<Candidate>, DetectError> {
    let num_classes = class_names.len();
    check_output_shape(&output, num_classes, None)?;

    let rows = output.index_axis_move(Axis(0), 0);
    let mut candidates = Vec::new();

    for row in rows.axis_iter(Axis(0)) {
        let objectness = row[4];
        if objectness.is_nan() || objectness < confidence_threshold {
            continue;
        }

        let mut max_prob = 0.0f32;
        let mut class_index = 0usize;
        for (idx, &prob) in row.iter().skip(BOX_FIELDS).enumerate() {
            if prob > max_prob {
                max_prob = prob;
                class_index = idx;
            }
        }

        let confidence = objectness * max_prob;
        if confidence.is_nan() || confidence < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        if ![cx, cy, w, h].iter().all(|v| v.is_finite()) {
            warn!("跳过坐标非有限值的输出行: ({cx}, {cy}, {w}, {h})");
            continue;
        }

        candidates.push(Candidate {
            class_index,
            confidence,
            bbox: BoundingBox::from_center(cx, cy, w, h),
        });
    }

    debug!(
        "解码 {} 行, 得到 {} 个候选框",
        rows.len_of(Axis(0)),
        candidates.len()
    );
    Ok(candidates)
}
