use crate::{Error, Model, Result, model::Normalization};
use fast_image_resize::{PixelType, ResizeOptions, Resizer, images::Image as FrImage};
use image::{GrayImage, RgbImage, Rgba, RgbaImage};
use ndarray::Array;
use ort::{session::Session, value::TensorRef};
use std::path::Path;

/// Anything able to turn an RGB image into an RGBA cutout.
pub trait Segmenter {
    fn remove(&mut self, image: &RgbImage) -> Result<RgbaImage>;
}

#[derive(Debug)]
#[non_exhaustive]
pub struct BackgroundRemover {
    model: Model,
    session: Session,
    input_name: String,
    output_names: Vec<String>,
}

impl BackgroundRemover {
    pub fn new<P: AsRef<Path>>(model: Model, model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            return Err(Error::ModelNotFound(model_path.to_path_buf()));
        }

        log::info!("Loading ONNX model from: {}", model_path.display());

        let session = Session::builder()?
            .commit_from_file(model_path)
            .map_err(|e| Error::ModelLoadFailed(format!("{}: {e}", model_path.display())))?;

        let input_name = Self::get_input_name(&session);
        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|output| output.name().to_string())
            .collect();

        log::debug!("model input: {input_name}, outputs: {output_names:?}");

        Ok(Self {
            model,
            session,
            input_name,
            output_names,
        })
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn input_size(&self) -> (u32, u32) {
        self.model.to_input_size()
    }

    // mask is grayscale (0=background, 255=foreground)
    pub fn get_mask(&mut self, image: &RgbImage) -> Result<GrayImage> {
        let (target_width, target_height) = self.input_size();

        let resized = fast_resize(image, target_width, target_height)?;
        let input_array = preprocess_image(&resized, &self.model.normalization());
        let (shape, data) = self.run_inference(input_array)?;
        let mask = mask_from_output(&shape, &data)?;

        fast_resize_mask(&mask, image.width(), image.height())
    }

    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Result<RgbaImage> {
        let img = image::open(path.as_ref())?;
        self.remove(&img.to_rgb8())
    }

    fn run_inference(
        &mut self,
        input: Array<f32, ndarray::Ix4>,
    ) -> Result<(Vec<usize>, Vec<f32>)> {
        let input_tensor = TensorRef::from_array_view(input.view())?;
        let outputs = self
            .session
            .run(ort::inputs! { &self.input_name => input_tensor })?;

        // u2net exposes several side outputs, the first one is the fused mask
        for output_name in &self.output_names {
            if let Ok(arr) = outputs[output_name.as_str()].try_extract_array::<f32>() {
                return Ok((arr.shape().to_vec(), arr.iter().copied().collect()));
            }
        }

        Err(Error::InvalidOutput(
            "Failed to extract any output from model".to_string(),
        ))
    }

    fn get_input_name(session: &Session) -> String {
        let common_names = ["input", "input.1", "input_image", "image", "x"];
        let model_inputs: Vec<String> = session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect();

        for common_name in &common_names {
            if model_inputs.iter().any(|name| name == common_name) {
                return common_name.to_string();
            }
        }

        model_inputs
            .first()
            .cloned()
            .unwrap_or_else(|| "input".to_string())
    }
}

impl Segmenter for BackgroundRemover {
    fn remove(&mut self, image: &RgbImage) -> Result<RgbaImage> {
        let mask = self.get_mask(image)?;
        remove_background(image, &mask)
    }
}

pub fn remove_background(image: &RgbImage, mask: &GrayImage) -> Result<RgbaImage> {
    if image.dimensions() != mask.dimensions() {
        return Err(Error::ImageProcessing(format!(
            "mask size {:?} does not match image size {:?}",
            mask.dimensions(),
            image.dimensions()
        )));
    }

    let (width, height) = image.dimensions();
    let mut result = RgbaImage::new(width, height);

    for ((out, pixel), alpha) in result.pixels_mut().zip(image.pixels()).zip(mask.pixels()) {
        *out = Rgba([pixel[0], pixel[1], pixel[2], alpha[0]]);
    }

    Ok(result)
}

/// Converts a raw model output tensor into a mask, stretching the value range to `0..=255`.
pub fn mask_from_output(shape: &[usize], data: &[f32]) -> Result<GrayImage> {
    let (width, height) = match shape.len() {
        4 => (shape[3], shape[2]), // (1, C, H, W)
        3 => (shape[2], shape[1]), // (C, H, W)
        2 => (shape[1], shape[0]), // (H, W)
        _ => {
            return Err(Error::InvalidOutput(format!(
                "Unsupported output shape: {shape:?}",
            )));
        }
    };

    let plane = width * height;
    if plane == 0 || data.len() < plane {
        return Err(Error::InvalidOutput(format!(
            "output holds {} values, expected at least {plane}",
            data.len()
        )));
    }

    let plane_data = &data[..plane];
    let (min, max) = plane_data
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    let mask = plane_data
        .iter()
        .map(|&v| {
            let v = if range > f32::EPSILON {
                (v - min) / range
            } else {
                v.clamp(0.0, 1.0)
            };
            (v * 255.0).round() as u8
        })
        .collect::<Vec<u8>>();

    GrayImage::from_raw(width as u32, height as u32, mask)
        .ok_or_else(|| Error::ImageProcessing("Failed to create mask image".to_string()))
}

fn preprocess_image(image: &RgbImage, norm: &Normalization) -> Array<f32, ndarray::Ix4> {
    let (width, height) = image.dimensions();

    // NCHW: (1, 3, H, W)
    let mut array = Array::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            array[[0, c, y as usize, x as usize]] = norm.apply(c, pixel[c]);
        }
    }

    array
}

fn fast_resize(image: &RgbImage, target_width: u32, target_height: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if width == target_width && height == target_height {
        return Ok(image.clone());
    }

    let src_image = FrImage::from_vec_u8(width, height, image.as_raw().clone(), PixelType::U8x3)?;
    let mut dst_image = FrImage::new(target_width, target_height, PixelType::U8x3);
    Resizer::new().resize(&src_image, &mut dst_image, &ResizeOptions::new())?;

    RgbImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| Error::ImageProcessing("Failed to create resized image".to_string()))
}

fn fast_resize_mask(mask: &GrayImage, target_width: u32, target_height: u32) -> Result<GrayImage> {
    let (width, height) = mask.dimensions();
    if width == target_width && height == target_height {
        return Ok(mask.clone());
    }

    let src_image = FrImage::from_vec_u8(width, height, mask.as_raw().clone(), PixelType::U8)?;
    let mut dst_image = FrImage::new(target_width, target_height, PixelType::U8);
    Resizer::new().resize(&src_image, &mut dst_image, &ResizeOptions::new())?;

    GrayImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| Error::ImageProcessing("Failed to create resized mask".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_mask_from_output_stretches_range() {
        let data = [1.0, 2.0, 3.0, 1.0];
        let mask = mask_from_output(&[1, 1, 2, 2], &data).unwrap();

        assert_eq!(mask.dimensions(), (2, 2));
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(0, 1)[0], 255);
        assert_eq!(mask.get_pixel(1, 0)[0], 128);
    }

    #[test]
    fn test_mask_from_output_flat_values_are_clamped() {
        let mask = mask_from_output(&[2, 3], &[1.5; 6]).unwrap();
        assert_eq!(mask.dimensions(), (3, 2));
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_mask_from_output_rejects_bad_shapes() {
        assert!(matches!(
            mask_from_output(&[1, 1, 1, 2, 2], &[0.0; 4]),
            Err(Error::InvalidOutput(_))
        ));
        assert!(matches!(
            mask_from_output(&[1, 4, 4], &[0.0; 3]),
            Err(Error::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_remove_background_uses_mask_as_alpha() {
        let image = RgbImage::from_pixel(2, 1, Rgb([10, 20, 30]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([200]));

        let result = remove_background(&image, &mask).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([10, 20, 30, 0]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([10, 20, 30, 200]));
    }

    #[test]
    fn test_remove_background_size_mismatch() {
        let image = RgbImage::new(2, 2);
        let mask = GrayImage::new(1, 1);
        assert!(remove_background(&image, &mask).is_err());
    }

    #[test]
    fn test_preprocess_layout() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(1, 0, Rgb([255, 0, 255]));

        let norm = Model::Modnet.normalization();
        let array = preprocess_image(&image, &norm);

        assert_eq!(array.shape(), &[1, 3, 1, 2]);
        assert_eq!(array[[0, 0, 0, 1]], 1.0);
        assert_eq!(array[[0, 1, 0, 1]], -1.0);
        assert_eq!(array[[0, 0, 0, 0]], -1.0);
    }

    #[test]
    fn test_mask_resize_roundtrip_size() {
        let mask = GrayImage::from_pixel(4, 4, Luma([255]));
        let resized = fast_resize_mask(&mask, 9, 7).unwrap();
        assert_eq!(resized.dimensions(), (9, 7));
        assert!(resized.pixels().all(|p| p[0] >= 254));
    }
}
