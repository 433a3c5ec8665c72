use crate::{
    Effect, ImageEffectError, ImageEffectResult, base_effect::EnhanceConfig, resize::resize_exact,
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{Rgba, RgbaImage};

/// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional).
pub fn parse_hex_color(hex: &str) -> ImageEffectResult<Rgba<u8>> {
    let hex = hex.trim().trim_start_matches('#');

    let invalid = || ImageEffectError::InvalidParameter(format!("invalid color: #{hex}"));

    if !hex.is_ascii() {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Ok(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ])),
        8 => Ok(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ])),
        _ => Err(invalid()),
    }
}

pub fn to_hex_color(color: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Porter-Duff "over": draws `fg` on top of `bg` in place. Both must share dimensions.
pub fn composite_over(bg: &mut RgbaImage, fg: &RgbaImage) -> ImageEffectResult<()> {
    if bg.dimensions() != fg.dimensions() {
        return Err(ImageEffectError::InvalidParameter(format!(
            "background {:?} and foreground {:?} differ in size",
            bg.dimensions(),
            fg.dimensions()
        )));
    }

    for (b, f) in bg.pixels_mut().zip(fg.pixels()) {
        let fa = f[3] as f32 / 255.0;
        let ba = b[3] as f32 / 255.0;
        let out_a = fa + ba * (1.0 - fa);

        if out_a <= f32::EPSILON {
            *b = Rgba([0, 0, 0, 0]);
            continue;
        }

        for c in 0..3 {
            let v = (f[c] as f32 * fa + b[c] as f32 * ba * (1.0 - fa)) / out_a;
            b[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        b[3] = (out_a * 255.0).round() as u8;
    }

    Ok(())
}

pub fn fill_background(fg: &RgbaImage, color: Rgba<u8>) -> ImageEffectResult<RgbaImage> {
    let mut bg = RgbaImage::from_pixel(fg.width(), fg.height(), color);
    composite_over(&mut bg, fg)?;
    Ok(bg)
}

/// Stretches `bg` to the foreground size and draws the foreground on top.
pub fn replace_background(fg: &RgbaImage, bg: &RgbaImage) -> ImageEffectResult<RgbaImage> {
    let mut bg = resize_exact(bg, fg.width(), fg.height())?;
    composite_over(&mut bg, fg)?;
    Ok(bg)
}

/// Opaque top-to-bottom gradient from white to a soft lavender.
pub fn vertical_gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, y| {
        let t = y as f32 / height as f32;
        Rgba([
            (255.0 - t * 40.0) as u8,
            (255.0 - t * 60.0) as u8,
            (255.0 - t * 80.0) as u8,
            255,
        ])
    })
}

/// Enhances a cutout and places it on the gradient backdrop.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct MagicTouchConfig {
    #[derivative(Default(value = "EnhanceConfig::new()
        .with_brightness(1.2)
        .with_contrast(1.3)
        .with_sharpness(1.5)"))]
    enhance: EnhanceConfig,
}

impl MagicTouchConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for MagicTouchConfig {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        self.enhance.apply(image)?;

        let mut backdrop = vertical_gradient(image.width(), image.height());
        composite_over(&mut backdrop, image)?;
        *image = backdrop;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8000").unwrap(), Rgba([255, 128, 0, 255]));
        assert_eq!(parse_hex_color("00ff0080").unwrap(), Rgba([0, 255, 0, 128]));
        assert_eq!(parse_hex_color("#fa0").unwrap(), Rgba([255, 170, 0, 255]));
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
        assert!(parse_hex_color("#ÿÿÿ").is_err());
    }

    #[test]
    fn test_hex_roundtrip_for_opaque_colors() {
        let color = Rgba([18, 52, 86, 255]);
        assert_eq!(to_hex_color(color), "#123456");
        assert_eq!(parse_hex_color(&to_hex_color(color)).unwrap(), color);
    }

    #[test]
    fn test_fill_background() {
        let mut fg = RgbaImage::new(2, 1);
        fg.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        fg.put_pixel(1, 0, Rgba([200, 200, 200, 0]));

        let out = fill_background(&fg, Rgba([0, 0, 255, 255])).unwrap();
        assert_eq!(out.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_half_alpha_blends_evenly() {
        let fg = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128]));
        let out = fill_background(&fg, Rgba([0, 0, 0, 255])).unwrap();
        let p = out.get_pixel(0, 0);
        assert_eq!(p[3], 255);
        assert_eq!(p[0], 128);
        assert_eq!(p[2], 0);
    }

    #[test]
    fn test_composite_size_mismatch() {
        let mut bg = RgbaImage::new(2, 2);
        let fg = RgbaImage::new(1, 2);
        assert!(composite_over(&mut bg, &fg).is_err());
    }

    #[test]
    fn test_replace_background_resizes_backdrop() {
        let fg = RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 0]));
        let bg = RgbaImage::from_pixel(7, 9, Rgba([0, 200, 0, 255]));

        let out = replace_background(&fg, &bg).unwrap();
        assert_eq!(out.dimensions(), (40, 20));
        let p = out.get_pixel(20, 10);
        assert_eq!(p[3], 255);
        assert!((p[1] as i32 - 200).abs() <= 1);
    }

    #[test]
    fn test_vertical_gradient() {
        let g = vertical_gradient(3, 10);
        assert_eq!(g.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(g.get_pixel(2, 5), &Rgba([235, 225, 215, 255]));
        assert_eq!(g.get_pixel(1, 9), &Rgba([219, 201, 183, 255]));
    }

    #[test]
    fn test_magic_touch_is_opaque() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 0]));
        img.put_pixel(1, 1, Rgba([100, 100, 100, 255]));

        MagicTouchConfig::new().apply(&mut img).unwrap();

        assert!(img.pixels().all(|p| p[3] == 255));
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }
}
