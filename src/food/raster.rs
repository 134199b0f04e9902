use image::DynamicImage;
use std::path::Path;

use crate::error::DetectError;

/// RGBA 光栅图像
///
/// 宽 W、高 H，每个像素 4 个 8 位通道（R, G, B, A），按行存储。
/// 构造时校验尺寸，之后只读。
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// 创建光栅图像
    ///
    /// # 参数
    /// * `width` - 图像宽度，必须大于0
    /// * `height` - 图像高度，必须大于0
    /// * `data` - RGBA 像素数据，长度必须为 width * height * 4
    ///
    /// # 错误处理
    /// 宽或高为0时返回 `InvalidRasterDimensions`，数据长度不符时返回 `InvalidRasterBuffer`
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DetectError> {
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidRasterDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(DetectError::InvalidRasterBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// 用单一颜色填充的光栅图像
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, DetectError> {
        let pixels = width as usize * height as usize;
        let data = rgba.iter().copied().cycle().take(pixels * 4).collect();
        Self::new(width, height, data)
    }

    /// 从已解码的图像转换
    pub fn from_image(img: &DynamicImage) -> Result<Self, DetectError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// 像素 (x, y) 的 RGBA 值，越界时返回 `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(idx..idx + 4)?.try_into().ok()
    }
}

/// 加载图像文件
///
/// 编解码由 image 库完成，检测流程本身只处理 RGBA 像素。
///
/// # 参数
/// * `path` - 图像文件路径
///
/// # 错误处理
/// 文件不存在时返回 `Io`，解码失败时返回 `Image`
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, DetectError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DetectError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("图像文件不存在: {}", path.display()),
        )));
    }
    Ok(image::open(path)?)
}
