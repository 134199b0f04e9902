#![allow(dead_code)]

use ndarray::Array3;
use thali::Raster;

pub const NUM_CLASSES: usize = 8;
pub const ROW_WIDTH: usize = 5 + NUM_CLASSES;

/// 构造一行模型输出: (cx, cy, w, h, objectness, 类别概率...)
pub fn row(cx: f32, cy: f32, w: f32, h: f32, objectness: f32, probs: &[(usize, f32)]) -> [f32; ROW_WIDTH] {
    let mut r = [0.0; ROW_WIDTH];
    r[..5].copy_from_slice(&[cx, cy, w, h, objectness]);
    for &(class, prob) in probs {
        r[5 + class] = prob;
    }
    r
}

/// 把若干行组装成 [1, N, 13] 的输出张量
pub fn output(rows: &[[f32; ROW_WIDTH]]) -> Array3<f32> {
    let data: Vec<f32> = rows.iter().flatten().copied().collect();
    Array3::from_shape_vec((1, rows.len(), ROW_WIDTH), data).unwrap()
}

pub fn gray_raster(width: u32, height: u32) -> Raster {
    Raster::filled(width, height, [128, 128, 128, 255]).unwrap()
}

/// 确定性的伪随机数，取值 [0, 1)
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32
    }
}

/// 随机但合法的输出张量，框中心可能落在填充区或画面外
pub fn random_output(rows: usize, seed: u64) -> Array3<f32> {
    let mut rng = Lcg::new(seed);
    let mut data = Vec::with_capacity(rows * ROW_WIDTH);
    for _ in 0..rows {
        data.push(rng.next() * 800.0 - 80.0);
        data.push(rng.next() * 800.0 - 80.0);
        data.push(rng.next() * 300.0);
        data.push(rng.next() * 300.0);
        for _ in 0..(1 + NUM_CLASSES) {
            data.push(rng.next());
        }
    }
    Array3::from_shape_vec((1, rows, ROW_WIDTH), data).unwrap()
}
