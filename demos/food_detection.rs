use clap::Parser;
use thali::{DetectConfig, DetectError, FoodDetector, draw_detections, load_image, shared_engine};
use tracing::info;

/// 食物检测示例参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ONNX 模型文件路径
    #[arg(long, value_name = "FILE", default_value = "best.onnx")]
    model: String,

    /// 输入图像路径
    #[arg(long, value_name = "IMAGE")]
    input: String,

    /// 绘制结果的输出路径
    #[arg(long, value_name = "OUTPUT", default_value = "results/food_detection_result.jpg")]
    output: String,

    /// JSON 配置文件，缺省时使用默认配置
    #[arg(long, value_name = "CONFIG")]
    config: Option<String>,

    /// 置信度阈值 (0.0 - 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    confidence: Option<f32>,

    /// NMS IOU 阈值 (0.0 - 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    iou: Option<f32>,

    /// 以 JSON 打印检测结果
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), DetectError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DetectConfig::from_json_file(path)?,
        None => DetectConfig::yolov5_food(),
    };
    if let Some(threshold) = args.confidence {
        config = config.with_confidence_threshold(threshold);
    }
    if let Some(threshold) = args.iou {
        config = config.with_iou_threshold(threshold);
    }

    let image = load_image(&args.input)?;
    info!("原始图像尺寸: {}x{}", image.width(), image.height());

    let engine = shared_engine(&args.model)?;
    let mut engine = engine
        .lock()
        .map_err(|_| DetectError::InferenceFailure("推理引擎锁已中毒".into()))?;
    let detector = FoodDetector::new(config)?;

    info!("正在执行食物检测...");
    let result = detector.detect(&image, &mut *engine)?;
    info!("检测到 {} 个目标, 耗时 {:.0} ms", result.len(), result.inference_time_ms);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for (i, detection) in result.by_confidence().iter().enumerate() {
            let b = detection.bbox;
            println!(
                "目标 {}: {} - 位置: ({:.1}, {:.1}, {:.1}, {:.1})",
                i + 1,
                detection.label(),
                b.x,
                b.y,
                b.w,
                b.h
            );
        }
        for (class_name, count) in result.count_by_class() {
            println!("{class_name}: {count}");
        }
    }

    let drawn = draw_detections(&image, &result.detections)?;
    if let Some(parent) = std::path::Path::new(&args.output).parent() {
        std::fs::create_dir_all(parent)?;
    }
    drawn.to_rgb8().save(&args.output)?;
    info!("结果已保存到: {}", args.output);

    Ok(())
}
