use ndarray::parallel::prelude::*;
use ndarray::{Array, Array4, Axis, s};
use tracing::{debug, warn};

use crate::config::PAD_VALUE;
use crate::food::raster::Raster;

/// 信箱变换参数
///
/// 记录原图如何嵌入输入张量：先按统一比例缩放，再居中填充。
/// 只由 remap 用于逆变换。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    /// 缩放比例（输入像素 / 原图像素），两个方向相同
    pub scale: f32,
    /// 左侧填充
    pub pad_x: u32,
    /// 顶部填充
    pub pad_y: u32,
    /// 缩放后宽度 round(W * scale)
    pub scaled_width: u32,
    /// 缩放后高度 round(H * scale)
    pub scaled_height: u32,
    /// 双精度的缩放比例，采样索引必须用它计算
    exact_scale: f64,
}

impl TransformParams {
    /// 计算把 width × height 的图像放入 target × target 方框的变换
    ///
    /// scale = min(target / W, target / H)，填充居中并向下取整。
    /// 比例和缩放尺寸在 f64 下计算，`scale` 字段只是它的单精度副本。
    pub fn fit(width: u32, height: u32, target: u32) -> Self {
        let exact_scale = (target as f64 / width as f64).min(target as f64 / height as f64);
        let scaled_width = ((width as f64 * exact_scale).round() as u32).min(target);
        let scaled_height = ((height as f64 * exact_scale).round() as u32).min(target);
        Self {
            scale: exact_scale as f32,
            pad_x: (target - scaled_width) / 2,
            pad_y: (target - scaled_height) / 2,
            scaled_width,
            scaled_height,
            exact_scale,
        }
    }

    /// 原图坐标 → 输入张量坐标
    pub fn forward(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.pad_x as f32,
            y * self.scale + self.pad_y as f32,
        )
    }

    /// 输入张量坐标 → 原图坐标（不裁剪）
    pub fn inverse(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.pad_x as f32) / self.scale,
            (y - self.pad_y as f32) / self.scale,
        )
    }

    /// 目标像素对应的源像素索引 floor(dst / scale)，不会越界
    ///
    /// 单精度下 `dst * W / S` 恰为整数时会少算一个像素，所以这里用 f64。
    fn source_index(&self, dst: usize, limit: u32) -> usize {
        ((dst as f64 / self.exact_scale).floor() as usize).min(limit as usize - 1)
    }
}

/// 将光栅图像转换为模型输入张量
///
/// 1. 计算保持宽高比的缩放比例与居中填充
/// 2. 整个张量先填充中灰色 0.5
/// 3. 缩放区域内每个像素按最近邻取源像素，RGB 除以 255
/// 4. 按通道平面 (NCHW) 写入
///
/// 每个通道平面内的行互不相关，使用 rayon 并行写入。
///
/// # 参数
/// * `raster` - 原始 RGBA 图像
/// * `target_size` - 输入边长 S
///
/// # 返回值
/// 返回形状为 (1, 3, S, S) 的张量和变换参数
pub fn letterbox(raster: &Raster, target_size: u32) -> (Array4<f32>, TransformParams) {
    let params = TransformParams::fit(raster.width(), raster.height(), target_size);
    debug!(
        "信箱变换: {}x{} -> {}x{}, scale={}, pad=({}, {})",
        raster.width(),
        raster.height(),
        params.scaled_width,
        params.scaled_height,
        params.scale,
        params.pad_x,
        params.pad_y
    );
    if params.scaled_width == 0 || params.scaled_height == 0 {
        warn!(
            "图像 {}x{} 缩放到 {} 后面积为零，输入张量只有填充",
            raster.width(),
            raster.height(),
            target_size
        );
    }

    let size = target_size as usize;
    let mut tensor = Array::from_elem((1, 3, size, size), PAD_VALUE);

    let (x0, y0) = (params.pad_x as usize, params.pad_y as usize);
    let (x1, y1) = (
        x0 + params.scaled_width as usize,
        y0 + params.scaled_height as usize,
    );
    let width = raster.width() as usize;
    let data = raster.data();

    // 每行的源像素列只与 x 有关，预先算好
    let src_cols: Vec<usize> = (0..params.scaled_width as usize)
        .map(|x| params.source_index(x, raster.width()))
        .collect();

    for channel in 0..3 {
        let mut region = tensor.slice_mut(s![0, channel, y0..y1, x0..x1]);
        region
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(y, mut line)| {
                let src_row = params.source_index(y, raster.height()) * width;
                for (value, &src_col) in line.iter_mut().zip(&src_cols) {
                    *value = data[(src_row + src_col) * 4 + channel] as f32 / 255.0;
                }
            });
    }

    (tensor, params)
}
