use crate::{Effect, ImageEffectResult};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;

/// 3x3 kernel with its divisor, weights in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel3x3 {
    pub weights: [f32; 9],
    pub scale: f32,
}

pub const SMOOTH_KERNEL: Kernel3x3 = Kernel3x3 {
    weights: [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0],
    scale: 13.0,
};

pub const SHARPEN_KERNEL: Kernel3x3 = Kernel3x3 {
    weights: [-2.0, -2.0, -2.0, -2.0, 32.0, -2.0, -2.0, -2.0, -2.0],
    scale: 16.0,
};

/// Convolves the color channels of `image`. The one pixel border and the
/// alpha channel are copied through unchanged.
pub fn convolve3x3(image: &RgbaImage, kernel: &Kernel3x3) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut result = image.clone();

    if width < 3 || height < 3 {
        return result;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sum = [0.0f32; 3];

            for ky in 0..3u32 {
                for kx in 0..3u32 {
                    let pixel = image.get_pixel(x + kx - 1, y + ky - 1);
                    let weight = kernel.weights[(ky * 3 + kx) as usize];
                    for (c, acc) in sum.iter_mut().enumerate() {
                        *acc += pixel[c] as f32 * weight;
                    }
                }
            }

            let pixel = result.get_pixel_mut(x, y);
            for (c, acc) in sum.iter().enumerate() {
                pixel[c] = (acc / kernel.scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    result
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SharpenConfig {
    #[derivative(Default(value = "1"))]
    passes: u32,
}

impl SharpenConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for SharpenConfig {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        for _ in 0..self.passes {
            *image = convolve3x3(image, &SHARPEN_KERNEL);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_sharpen_flat_image_unchanged() {
        let mut img = RgbaImage::from_pixel(6, 4, Rgba([120, 30, 200, 77]));
        let before = img.clone();
        SharpenConfig::new().apply(&mut img).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_sharpen_boosts_center_and_keeps_border() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 1, Rgba([116, 100, 100, 10]));

        SharpenConfig::new().apply(&mut img).unwrap();

        // (32 * 116 - 16 * 100) / 16 = 132
        assert_eq!(img.get_pixel(1, 1), &Rgba([132, 100, 100, 10]));
        assert_eq!(img.get_pixel(0, 0), &Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_smooth_small_image_is_copied() {
        let img = RgbaImage::from_fn(2, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        assert_eq!(convolve3x3(&img, &SMOOTH_KERNEL), img);
    }

    #[test]
    fn test_zero_passes() {
        let mut img = RgbaImage::from_fn(4, 4, |x, y| Rgba([(x * y) as u8 * 9, 0, 0, 255]));
        let before = img.clone();
        SharpenConfig::new().with_passes(0).apply(&mut img).unwrap();
        assert_eq!(img, before);
    }
}
