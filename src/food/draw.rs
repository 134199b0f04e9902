use image::{DynamicImage, GenericImageView};
use raqote::{DrawOptions, DrawTarget, LineJoin, PathBuilder, SolidSource, Source, StrokeStyle};

use crate::error::DetectError;
use crate::food::bounds::Detection;

const BOX_LINE_WIDTH: f32 = 4.0;
const LABEL_HEIGHT: f32 = 28.0;
// 没有字体渲染，标签宽度按字符数估算
const LABEL_CHAR_WIDTH: f32 = 9.0;

/// 各类别的框颜色
pub fn class_color(class_name: &str) -> SolidSource {
    let [r, g, b] = match class_name {
        "chicken" => [0xFF, 0x6B, 0x6B],
        "daal" => [0x4E, 0xCD, 0xC4],
        "mixsweet" => [0xFF, 0xE6, 0x6D],
        "naan" => [0xA8, 0xE6, 0xCF],
        "rice" => [0xFF, 0x8B, 0x94],
        "roti" => [0xC7, 0xCE, 0xEA],
        "salad" => [0x95, 0xE1, 0xD3],
        "yogurt" => [0xF3, 0x81, 0x81],
        _ => [0x00, 0xFF, 0x00],
    };
    SolidSource::from_unpremultiplied_argb(0xFF, r, g, b)
}

/// 在图像上绘制检测结果
///
/// 每个框用其类别颜色描边，并在框上方画一个同色的标签底块。
///
/// # 参数
/// * `image` - 原始图像
/// * `detections` - 原图坐标下的检测结果
///
/// # 返回值
/// 返回绘制了检测框的图像
pub fn draw_detections(
    image: &DynamicImage,
    detections: &[Detection],
) -> Result<DynamicImage, DetectError> {
    let (img_width, img_height) = image.dimensions();
    let mut dt = DrawTarget::new(img_width as i32, img_height as i32);

    // 将原始图像绘制到DrawTarget上
    let rgba_image = image.to_rgba8();
    let image_data: Vec<u32> = rgba_image
        .chunks(4)
        .map(|pixel| u32::from_le_bytes([pixel[2], pixel[1], pixel[0], pixel[3]]))
        .collect();

    let img = raqote::Image {
        width: img_width as i32,
        height: img_height as i32,
        data: &image_data,
    };
    dt.draw_image_at(0.0, 0.0, &img, &DrawOptions::new());

    for detection in detections {
        let bbox = &detection.bbox;
        let color = Source::Solid(class_color(&detection.class_name));

        let mut pb = PathBuilder::new();
        pb.rect(bbox.x, bbox.y, bbox.w, bbox.h);
        let path = pb.finish();
        dt.stroke(
            &path,
            &color,
            &StrokeStyle {
                join: LineJoin::Round,
                width: BOX_LINE_WIDTH,
                ..StrokeStyle::default()
            },
            &DrawOptions::default(),
        );

        let label_width = detection.label().chars().count() as f32 * LABEL_CHAR_WIDTH + 12.0;
        let label_y = (bbox.y - LABEL_HEIGHT).max(0.0);
        dt.fill_rect(bbox.x, label_y, label_width, LABEL_HEIGHT, &color, &DrawOptions::default());
    }

    // 将DrawTarget转换回图像
    let pixels: Vec<u8> = dt
        .get_data()
        .iter()
        .flat_map(|&pixel| {
            let bytes = pixel.to_le_bytes();
            [bytes[2], bytes[1], bytes[0], bytes[3]] // BGRA to RGBA
        })
        .collect();

    image::ImageBuffer::from_raw(img_width, img_height, pixels)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| DetectError::Render("绘制结果与图像尺寸不符".into()))
}
