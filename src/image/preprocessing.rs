use ndarray::Array4;
use image::RgbImage;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// RGB帧转换为模型输入张量：NCHW，取值归一化到 [0, 1]
    pub fn to_nchw_tensor(frame: &RgbImage) -> Array4<f32> {
        let (width, height) = frame.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in frame.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                tensor[[0, c, y, x]] = pixel[c] as f32 / 255.0;
            }
        }

        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn produces_normalized_planar_tensor() {
        let mut frame = RgbImage::new(4, 2);
        frame.put_pixel(3, 1, Rgb([255, 0, 51]));

        let tensor = ImagePreprocessor::to_nchw_tensor(&frame);

        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 1, 3]], 1.0);
        assert_eq!(tensor[[0, 1, 1, 3]], 0.0);
        assert!((tensor[[0, 2, 1, 3]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
    }
}
