//! 不需要模型的示例：用合成的输出张量走一遍完整流程

use std::sync::{Arc, Mutex};

use ndarray::{Array3, Array4};
use thali::{DetectConfig, DetectError, FoodDetector, Raster, infer_detached};
use tracing::info;

/// 在输入张量中心放一个 "naan"，旁边放一个与之重叠的低分框
fn fake_engine(input: &Array4<f32>) -> Result<Array3<f32>, DetectError> {
    let size = input.shape()[2] as f32;
    let mut output = Array3::zeros((1, 3, 13));
    let rows = [
        [size / 2.0, size / 2.0, 120.0, 80.0, 0.95, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0],
        [size / 2.0 + 10.0, size / 2.0, 120.0, 80.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0],
        [40.0, 40.0, 30.0, 30.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    ];
    for (r, values) in rows.iter().enumerate() {
        for (c, &value) in values.iter().enumerate() {
            output[[0, r, c]] = value;
        }
    }
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<(), DetectError> {
    tracing_subscriber::fmt::init();

    let detector = FoodDetector::new(DetectConfig::default())?;
    let raster = Raster::filled(1280, 720, [200, 180, 120, 255])?;

    let result = detector.run(&raster, &mut fake_engine)?;
    info!("同步: {} 个目标", result.len());

    // 共享引擎放在阻塞线程池中运行
    let engine = Arc::new(Mutex::new(fake_engine));
    let result = detector
        .run_async(&raster, move |input| infer_detached(engine, input))
        .await?;
    info!("异步: {} 个目标", result.len());

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
