mod common;

use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use common::{gray_raster, output, random_output, row};
use ndarray::{Array3, Array4};
use thali::{BoundingBox, DetectConfig, DetectError, FoodDetector, InferenceEngine, Raster, infer_detached};

fn detector() -> FoodDetector {
    FoodDetector::new(DetectConfig::default()).unwrap()
}

/// 返回固定输出的桩引擎
fn stub(out: Array3<f32>) -> impl FnMut(&Array4<f32>) -> Result<Array3<f32>, DetectError> {
    move |_input: &Array4<f32>| Ok(out.clone())
}

#[test]
fn single_centered_detection() {
    let raster = gray_raster(640, 640);
    let mut engine = stub(output(&[row(320.0, 320.0, 100.0, 50.0, 0.9, &[(0, 0.9)])]));

    let result = detector().run(&raster, &mut engine).unwrap();

    assert_eq!(result.len(), 1);
    let d = &result.detections[0];
    assert_eq!(d.class_name, "chicken");
    assert_abs_diff_eq!(d.confidence, 0.81, epsilon = 1e-6);
    assert_eq!(d.bbox, BoundingBox::new(270.0, 295.0, 100.0, 50.0));
    assert_eq!((result.image_width, result.image_height), (640, 640));
    assert!(result.inference_time_ms >= 0.0);
}

#[test]
fn overlapping_pair_keeps_the_stronger() {
    let raster = gray_raster(640, 640);
    // 同类别，IoU = 0.6
    let mut engine = stub(output(&[
        row(105.0, 105.0, 10.0, 10.0, 0.8, &[(4, 0.8)]),
        row(107.5, 105.0, 10.0, 10.0, 0.9, &[(4, 0.9)]),
    ]));

    let result = detector().run(&raster, &mut engine).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.detections[0].class_name, "rice");
    assert_abs_diff_eq!(result.detections[0].confidence, 0.81, epsilon = 1e-6);
    assert_abs_diff_eq!(result.detections[0].bbox.x, 102.5);
}

#[test]
fn letterboxed_box_maps_back_to_image() {
    let raster = gray_raster(1280, 640);
    // 张量空间中的框 (0, 160, 100, 100)
    let mut engine = stub(output(&[row(50.0, 210.0, 100.0, 100.0, 0.9, &[(2, 0.9)])]));

    let result = detector().run(&raster, &mut engine).unwrap();

    assert_eq!(result.detections[0].bbox, BoundingBox::new(0.0, 0.0, 200.0, 200.0));
    assert_eq!(result.detections[0].class_name, "mixsweet");
    assert_eq!((result.image_width, result.image_height), (1280, 640));
}

#[test]
fn nothing_above_threshold_is_an_empty_result() {
    let raster = gray_raster(320, 240);
    let rows: Vec<_> = (0..100)
        .map(|i| row(i as f32 * 6.0, 100.0, 20.0, 20.0, 0.2, &[(1, 1.0)]))
        .collect();
    let mut engine = stub(output(&rows));

    let result = detector().run(&raster, &mut engine).unwrap();
    assert!(result.is_empty());
    assert_eq!((result.image_width, result.image_height), (320, 240));
}

#[test]
fn engine_sees_letterboxed_input_once() {
    let raster = gray_raster(1280, 640);
    let mut calls = 0;
    let mut engine = |input: &Array4<f32>| -> Result<Array3<f32>, DetectError> {
        calls += 1;
        assert_eq!(input.shape(), &[1, 3, 640, 640]);
        assert_eq!(input[[0, 0, 0, 0]], 0.5);
        assert_abs_diff_eq!(input[[0, 0, 320, 320]], 128.0 / 255.0);
        Ok(Array3::zeros((1, 10, 13)))
    };

    detector().run(&raster, &mut engine).unwrap();
    assert_eq!(calls, 1);
}

#[test]
fn engine_failure_fails_the_run() {
    let raster = gray_raster(64, 64);
    let mut engine = |_input: &Array4<f32>| -> Result<Array3<f32>, DetectError> {
        Err(DetectError::InferenceFailure("engine not ready".into()))
    };

    match detector().run(&raster, &mut engine) {
        Err(DetectError::InferenceFailure(msg)) => assert_eq!(msg, "engine not ready"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn wrong_class_count_is_shape_mismatch() {
    let raster = gray_raster(64, 64);
    let mut engine = stub(Array3::zeros((1, 10, 85)));
    assert!(matches!(
        detector().run(&raster, &mut engine),
        Err(DetectError::TensorShapeMismatch { .. })
    ));
}

#[test]
fn wrong_row_count_is_shape_mismatch_when_checked() {
    let raster = gray_raster(64, 64);
    let detector = FoodDetector::new(DetectConfig::yolov5_food()).unwrap();

    let mut short = stub(Array3::zeros((1, 100, 13)));
    assert!(matches!(
        detector.run(&raster, &mut short),
        Err(DetectError::TensorShapeMismatch { .. })
    ));

    let mut full = stub(Array3::zeros((1, 25200, 13)));
    assert!(detector.run(&raster, &mut full).unwrap().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = DetectConfig::default().with_iou_threshold(1.2);
    assert!(matches!(
        FoodDetector::new(config),
        Err(DetectError::InvalidConfig(_))
    ));
}

#[test]
fn empty_images_never_reach_the_engine() {
    assert!(matches!(
        Raster::filled(0, 10, [0, 0, 0, 255]),
        Err(DetectError::InvalidRasterDimensions { width: 0, height: 10 })
    ));

    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(16, 0));
    let mut engine = |_input: &Array4<f32>| -> Result<Array3<f32>, DetectError> {
        panic!("engine must not be called");
    };
    assert!(matches!(
        detector().detect(&img, &mut engine),
        Err(DetectError::InvalidRasterDimensions { width: 16, height: 0 })
    ));
}

#[test]
fn detector_threshold_setters_validate() {
    assert!(matches!(
        detector().with_confidence_threshold(f32::NAN),
        Err(DetectError::InvalidConfig(_))
    ));
    assert!(matches!(
        detector().with_confidence_threshold(1.5),
        Err(DetectError::InvalidConfig(_))
    ));
    assert!(matches!(
        detector().with_iou_threshold(f32::NAN),
        Err(DetectError::InvalidConfig(_))
    ));
    assert!(matches!(
        detector().with_iou_threshold(-0.1),
        Err(DetectError::InvalidConfig(_))
    ));

    let detector = detector().with_confidence_threshold(0.0).unwrap();
    assert_eq!(detector.config().confidence_threshold, 0.0);
}

#[test]
fn custom_class_list_is_used_for_names() {
    let config = DetectConfig::default().with_class_names(["plate", "cup"]);
    let detector = FoodDetector::new(config).unwrap();
    let raster = gray_raster(100, 100);

    let rows = [[50.0, 50.0, 10.0, 10.0, 0.9, 0.1, 0.8]];
    let data: Vec<f32> = rows.iter().flatten().copied().collect();
    let mut engine = stub(Array3::from_shape_vec((1, 1, 7), data).unwrap());

    let result = detector.run(&raster, &mut engine).unwrap();
    assert_eq!(result.detections[0].class_name, "cup");
    assert_eq!(result.detections[0].class_index, 1);
}

#[test]
fn results_respect_threshold_and_image_bounds() {
    let detector = detector().with_confidence_threshold(0.4).unwrap();
    for &(w, h) in &[(1280, 720), (480, 960), (640, 640), (7, 3)] {
        let raster = gray_raster(w, h);
        let mut engine = stub(random_output(3000, (w * h) as u64));
        let result = detector.run(&raster, &mut engine).unwrap();

        assert!(!result.is_empty());
        for d in &result.detections {
            assert!(d.confidence >= 0.4 && d.confidence <= 1.0);
            assert!(d.bbox.x >= 0.0 && d.bbox.y >= 0.0);
            assert!(d.bbox.w >= 0.0 && d.bbox.h >= 0.0);
            assert!(d.bbox.x + d.bbox.w <= w as f32 + 1e-3);
            assert!(d.bbox.y + d.bbox.h <= h as f32 + 1e-3);
        }
        let confidences: Vec<f32> = result.detections.iter().map(|d| d.confidence).collect();
        assert!(confidences.windows(2).all(|pair| pair[0] >= pair[1]));
    }
}

#[test]
fn detect_accepts_decoded_images() {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        200,
        100,
        image::Rgb([10, 200, 30]),
    ));
    let mut engine = stub(output(&[row(320.0, 320.0, 64.0, 64.0, 0.95, &[(6, 0.9)])]));

    let result = detector().detect(&img, &mut engine).unwrap();
    assert_eq!((result.image_width, result.image_height), (200, 100));
    assert_eq!(result.detections[0].class_name, "salad");
    // scale = 3.2, pad_y = 160
    let b = result.detections[0].bbox;
    assert_abs_diff_eq!(b.x, 90.0, epsilon = 1e-3);
    assert_abs_diff_eq!(b.y, 40.0, epsilon = 1e-3);
    assert_abs_diff_eq!(b.w, 20.0, epsilon = 1e-3);
}

#[test]
fn trait_objects_work_as_engines() {
    let raster = gray_raster(32, 32);
    let mut engine: Box<dyn InferenceEngine> = Box::new(stub(Array3::zeros((1, 3, 13))));
    assert!(detector().run(&raster, engine.as_mut()).unwrap().is_empty());
}

#[test]
fn result_serializes_in_camel_case() {
    let raster = Raster::filled(640, 640, [0, 0, 0, 255]).unwrap();
    let mut engine = stub(output(&[row(320.0, 320.0, 100.0, 50.0, 0.9, &[(3, 0.9)])]));
    let result = detector().run(&raster, &mut engine).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["imageWidth"], 640);
    assert_eq!(json["imageHeight"], 640);
    assert!(json["inferenceTimeMs"].is_f64());
    assert_eq!(json["detections"][0]["className"], "naan");
    assert_eq!(json["detections"][0]["bbox"]["x"], 270.0);
}

#[tokio::test]
async fn async_callback_is_awaited() {
    let raster = gray_raster(1280, 640);
    let out = output(&[row(50.0, 210.0, 100.0, 100.0, 0.9, &[(2, 0.9)])]);

    let result = detector()
        .run_async(&raster, |input| async move {
            assert_eq!(input.shape(), &[1, 3, 640, 640]);
            tokio::task::yield_now().await;
            Ok(out)
        })
        .await
        .unwrap();

    assert_eq!(result.detections[0].bbox, BoundingBox::new(0.0, 0.0, 200.0, 200.0));
}

#[tokio::test]
async fn async_failure_propagates() {
    let raster = gray_raster(16, 16);
    let result = detector()
        .run_async(&raster, |_input| async {
            Err(DetectError::InferenceFailure("unsupported hardware path".into()))
        })
        .await;
    assert!(matches!(result, Err(DetectError::InferenceFailure(_))));
}

#[tokio::test]
async fn shared_engine_runs_on_blocking_pool() {
    let out = output(&[row(320.0, 320.0, 100.0, 50.0, 0.9, &[(0, 0.9)])]);
    let engine = Arc::new(Mutex::new(stub(out)));
    let detector = detector();

    for _ in 0..3 {
        let raster = gray_raster(640, 640);
        let engine = Arc::clone(&engine);
        let result = detector
            .run_async(&raster, move |input| infer_detached(engine, input))
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.detections[0].bbox, BoundingBox::new(270.0, 295.0, 100.0, 50.0));
    }
}
