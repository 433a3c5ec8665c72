use crate::{Effect, ImageEffectError, ImageEffectResult, stylized_effect};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;

/// ITU-R 601-2 luma in 16.16 fixed point, rounded.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Mean luma over all pixels, rounded to the nearest integer.
pub fn mean_luma(image: &RgbaImage) -> u8 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0;
    }

    let sum: u64 = image
        .pixels()
        .map(|p| luma(p[0], p[1], p[2]) as u64)
        .sum();

    ((sum as f64 / count as f64) + 0.5) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GrayscaleMode {
    Average,
    #[default]
    Luminance,
}

/// Grayscale keeps the alpha channel so cutouts stay transparent.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GrayscaleConfig {
    mode: GrayscaleMode,
}

impl GrayscaleConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for GrayscaleConfig {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        for pixel in image.pixels_mut() {
            let gray = match self.mode {
                GrayscaleMode::Average => {
                    ((pixel[0] as u32 + pixel[1] as u32 + pixel[2] as u32) / 3) as u8
                }
                GrayscaleMode::Luminance => luma(pixel[0], pixel[1], pixel[2]),
            };

            pixel[0] = gray;
            pixel[1] = gray;
            pixel[2] = gray;
        }

        Ok(())
    }
}

/// Enhancement factors, `1.0` leaves the image unchanged.
///
/// Each factor blends the image away from a degenerate version of itself:
/// black for brightness, flat mean gray for contrast and a smoothed copy for
/// sharpness. Applied in that order.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EnhanceConfig {
    #[derivative(Default(value = "1.0"))]
    brightness: f32,

    #[derivative(Default(value = "1.0"))]
    contrast: f32,

    #[derivative(Default(value = "1.0"))]
    sharpness: f32,
}

impl EnhanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate(&self) -> ImageEffectResult<()> {
        for (name, v) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("sharpness", self.sharpness),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(ImageEffectError::InvalidParameter(format!(
                    "{name} factor must be a non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// Truncates toward zero before clamping, like an `(int)` cast.
#[inline]
fn blend(degenerate: f32, value: u8, factor: f32) -> u8 {
    (degenerate + (value as f32 - degenerate) * factor)
        .trunc()
        .clamp(0.0, 255.0) as u8
}

impl Effect for EnhanceConfig {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        self.validate()?;

        if self.brightness != 1.0 {
            for pixel in image.pixels_mut() {
                for i in 0..3 {
                    pixel[i] = blend(0.0, pixel[i], self.brightness);
                }
            }
        }

        if self.contrast != 1.0 {
            let mean = mean_luma(image) as f32;
            for pixel in image.pixels_mut() {
                for i in 0..3 {
                    pixel[i] = blend(mean, pixel[i], self.contrast);
                }
            }
        }

        if self.sharpness != 1.0 {
            let smoothed = stylized_effect::convolve3x3(image, &stylized_effect::SMOOTH_KERNEL);
            for (pixel, soft) in image.pixels_mut().zip(smoothed.pixels()) {
                for i in 0..3 {
                    pixel[i] = blend(soft[i] as f32, pixel[i], self.sharpness);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_luma() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_grayscale_keeps_alpha() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 40]));
        GrayscaleConfig::new().apply(&mut img).unwrap();
        assert!(img.pixels().all(|p| *p == Rgba([76, 76, 76, 40])));

        let mut img = RgbaImage::from_pixel(1, 1, Rgba([30, 60, 90, 255]));
        GrayscaleConfig::new()
            .with_mode(GrayscaleMode::Average)
            .apply(&mut img)
            .unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([60, 60, 60, 255]));
    }

    #[test]
    fn test_enhance_identity() {
        let mut img = RgbaImage::from_fn(4, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 30, 7, 200]));
        let before = img.clone();
        EnhanceConfig::new().apply(&mut img).unwrap();
        assert_eq!(img, before);
    }

    #[test]
    fn test_brightness_scales_channels() {
        let mut img = RgbaImage::from_pixel(1, 1, Rgba([100, 200, 250, 9]));
        EnhanceConfig::new()
            .with_brightness(1.2)
            .apply(&mut img)
            .unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([120, 240, 255, 9]));
    }

    #[test]
    fn test_blend_truncates() {
        assert_eq!(blend(0.0, 103, 1.2), 123);
        assert_eq!(blend(0.0, 101, 1.2), 121);
        assert_eq!(blend(150.0, 10, 1.3), 0);
        assert_eq!(blend(90.0, 91, 0.5), 90);

        let mut img = RgbaImage::from_pixel(1, 1, Rgba([103, 103, 103, 255]));
        EnhanceConfig::new()
            .with_brightness(1.2)
            .apply(&mut img)
            .unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([123, 123, 123, 255]));
    }

    #[test]
    fn test_contrast_pivots_on_mean() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 0, Rgba([200, 200, 200, 255]));

        EnhanceConfig::new().with_contrast(2.0).apply(&mut img).unwrap();

        // mean luma is 150
        assert_eq!(img.get_pixel(0, 0), &Rgba([50, 50, 50, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([250, 250, 250, 255]));
    }

    #[test]
    fn test_sharpness_on_flat_image_is_noop() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([90, 90, 90, 255]));
        EnhanceConfig::new().with_sharpness(1.5).apply(&mut img).unwrap();
        assert!(img.pixels().all(|p| *p == Rgba([90, 90, 90, 255])));
    }

    #[test]
    fn test_invalid_factor() {
        let mut img = RgbaImage::new(1, 1);
        let err = EnhanceConfig::new().with_contrast(-1.0).apply(&mut img);
        assert!(matches!(err, Err(ImageEffectError::InvalidParameter(_))));
    }
}
