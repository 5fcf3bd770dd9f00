use crate::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;

pub struct ImageLoader;

impl ImageLoader {
    /// 从文件路径加载图像，格式按文件内容识别而不是扩展名
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let image = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;

        Ok(image)
    }

    /// 转为RGB并拉伸到固定的 size x size 帧（不保持宽高比）
    pub fn resize_to_frame(image: &DynamicImage, size: u32) -> RgbImage {
        let rgb_image = image.to_rgb8();
        if rgb_image.dimensions() == (size, size) {
            return rgb_image;
        }
        image::imageops::resize(&rgb_image, size, size, FilterType::Triangle)
    }
}
