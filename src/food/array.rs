//! 数组处理模块
//!
//! 在 ndarray 数组与 ONNX Runtime 张量之间转换。

use ndarray::{Array3, Array4};
use ort::value::{Tensor, TensorValueType, Value};

use crate::error::DetectError;

/// 将ndarray数组转换为ONNX Runtime张量
///
/// # 参数
/// * `mats` - 四维数组，形状为(1, 3, height, width)
///
/// # 返回值
/// 返回对应的ONNX Runtime张量
pub fn to_input(mats: &Array4<f32>) -> Result<Value<TensorValueType<f32>>, DetectError> {
    let shape: Vec<usize> = mats.shape().to_vec();
    let (data, _offset) = mats.as_standard_layout().into_owned().into_raw_vec_and_offset();
    let tensor = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))?;
    Ok(tensor)
}

/// 将模型输出的形状与数据组装为三维数组
///
/// # 参数
/// * `shape` - 输出形状，必须是三维 [1, N, 5 + C]
/// * `data` - 按行存储的数据
pub fn to_output(shape: &[i64], data: &[f32]) -> Result<Array3<f32>, DetectError> {
    let dims: Vec<usize> = shape
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<Result<_, _>>()
        .map_err(|_| DetectError::shape_mismatch("[1, N, 5 + C]", format!("{shape:?}")))?;

    let [batch, rows, columns] = dims[..] else {
        return Err(DetectError::shape_mismatch(
            "[1, N, 5 + C]",
            format!("{shape:?}"),
        ));
    };

    Array3::from_shape_vec((batch, rows, columns), data.to_vec())
        .map_err(|e| DetectError::shape_mismatch(format!("{dims:?}"), e.to_string()))
}
