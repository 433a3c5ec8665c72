use crate::{ImageEffectError, ImageEffectResult};
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image as FastImage,
};
use image::RgbaImage;

/// Largest size with the same aspect ratio that fits into `max_width x max_height`.
/// Images that already fit are left alone.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );

    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (w, h)
}

pub fn resize_exact(image: &RgbaImage, width: u32, height: u32) -> ImageEffectResult<RgbaImage> {
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }

    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return Err(ImageEffectError::InvalidParameter(format!(
            "can not resize {:?} to {width}x{height}",
            image.dimensions()
        )));
    }

    let src = FastImage::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageEffectError::Resize(e.to_string()))?;

    let mut dst = FastImage::new(width, height, PixelType::U8x4);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));

    Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| ImageEffectError::Resize(e.to_string()))?;

    RgbaImage::from_raw(width, height, dst.into_vec())
        .ok_or_else(|| ImageEffectError::Resize("to RgbaImage failed".to_string()))
}

pub fn thumbnail(image: &RgbaImage, max_width: u32, max_height: u32) -> ImageEffectResult<RgbaImage> {
    let (w, h) = fit_within(image.width(), image.height(), max_width, max_height);
    resize_exact(image, w, h)
}
