use crate::{ImageEffectResult, composite::composite_over};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::path::Path;

/// Formats offered when saving. The discriminants follow the order shown in the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OutputFormat {
    #[default]
    Png = 0,
    Jpeg,
    Webp,
    Bmp,
}

impl OutputFormat {
    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Png,
            OutputFormat::Jpeg,
            OutputFormat::Webp,
            OutputFormat::Bmp,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Webp => "WEBP",
            OutputFormat::Bmp => "BMP",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Bmp => "bmp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::Webp),
            "bmp" => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    pub fn supports_alpha(&self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Drops transparency by drawing the image on a white canvas.
pub fn flatten_on_white(image: &RgbaImage) -> ImageEffectResult<DynamicImage> {
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), Rgba([255, 255, 255, 255]));
    composite_over(&mut canvas, image)?;
    Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()))
}

/// Writes `image` to `path` in `format`, whatever extension the path carries.
pub fn encode_to_path(
    image: &RgbaImage,
    path: impl AsRef<Path>,
    format: OutputFormat,
) -> ImageEffectResult<()> {
    let path = path.as_ref();

    let encodable = if format.supports_alpha() {
        DynamicImage::ImageRgba8(image.clone())
    } else {
        flatten_on_white(image)?
    };

    encodable.save_with_format(path, format.image_format())?;
    log::info!("saved {} image to {}", format.name(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_conversion_matches_ui_order() {
        assert_eq!(OutputFormat::try_from(0u8).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::try_from(1u8).unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::try_from(3u8).unwrap(), OutputFormat::Bmp);
        assert!(OutputFormat::try_from(4u8).is_err());
        assert_eq!(u8::from(OutputFormat::Webp), 2);
    }

    #[test]
    fn test_names_and_extensions() {
        assert_eq!(OutputFormat::from_name("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("gif"), None);

        for format in OutputFormat::all() {
            assert_eq!(OutputFormat::from_extension(format.extension()), Some(*format));
        }
    }

    #[test]
    fn test_jpeg_is_flattened_on_white() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.jpeg");

        let image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        encode_to_path(&image, &path, OutputFormat::Jpeg)?;

        let decoded = image::open(&path)?.to_rgb8();
        assert!(decoded.pixels().all(|p| p[0] > 245 && p[1] > 245 && p[2] > 245));
        Ok(())
    }

    #[test]
    fn test_png_keeps_alpha() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.png");

        let image = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 4]));
        encode_to_path(&image, &path, OutputFormat::Png)?;

        assert_eq!(image::open(&path)?.to_rgba8(), image);
        Ok(())
    }
}
