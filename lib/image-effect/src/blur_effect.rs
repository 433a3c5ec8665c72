use crate::{Effect, ImageEffectError, ImageEffectResult};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;

/// Gaussian blur over all four channels, `radius` is the standard deviation in pixels.
///
/// Three box passes approximate the kernel. Flat regions come back unchanged.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct GaussianBlurConfig {
    #[derivative(Default(value = "5.0"))]
    radius: f32,
}

impl GaussianBlurConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Effect for GaussianBlurConfig {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ImageEffectError::InvalidParameter(format!(
                "blur radius must be positive, got {}",
                self.radius
            )));
        }

        if image.width() == 0 || image.height() == 0 {
            return Ok(());
        }

        *image = image::imageops::fast_blur(image, self.radius);
        Ok(())
    }
}
