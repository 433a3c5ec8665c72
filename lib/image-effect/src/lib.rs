pub mod base_effect;
pub mod blur_effect;
pub mod composite;
pub mod export;
pub mod resize;
pub mod stylized_effect;

pub use export::OutputFormat;

use image::RgbaImage;

pub type ImageEffectResult<T> = Result<T, ImageEffectError>;

#[derive(thiserror::Error, Debug)]
pub enum ImageEffectError {
    #[error("Image processing error: {0}")]
    ImageProc(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Image resize error: {0}")]
    Resize(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub trait Effect {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()>;
}

#[derive(Debug, Clone)]
pub enum ImageEffect {
    Grayscale(base_effect::GrayscaleConfig),
    Enhance(base_effect::EnhanceConfig),
    GaussianBlur(blur_effect::GaussianBlurConfig),
    Sharpen(stylized_effect::SharpenConfig),
    MagicTouch(composite::MagicTouchConfig),
}

impl ImageEffect {
    pub fn name(&self) -> &'static str {
        match self {
            ImageEffect::Grayscale(_) => "Grayscale",
            ImageEffect::Enhance(_) => "Enhance",
            ImageEffect::GaussianBlur(_) => "Blur",
            ImageEffect::Sharpen(_) => "Sharpen",
            ImageEffect::MagicTouch(_) => "Magic Touch",
        }
    }
}

impl Effect for ImageEffect {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        log::debug!(
            "apply {} to {}x{} image",
            self.name(),
            image.width(),
            image.height()
        );

        match self {
            ImageEffect::Grayscale(config) => config.apply(image),
            ImageEffect::Enhance(config) => config.apply(image),
            ImageEffect::GaussianBlur(config) => config.apply(image),
            ImageEffect::Sharpen(config) => config.apply(image),
            ImageEffect::MagicTouch(config) => config.apply(image),
        }
    }
}

/// Runs `effect` on a copy of `image`, leaving the source untouched.
pub fn applied(effect: &impl Effect, image: &RgbaImage) -> ImageEffectResult<RgbaImage> {
    let mut out = image.clone();
    effect.apply(&mut out)?;
    Ok(out)
}
