use crate::{Result, Segmenter};
use std::path::{Path, PathBuf};

pub const DEFAULT_SUFFIX: &str = "_nobg";

#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub result: std::result::Result<PathBuf, String>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchItem> {
        self.items.iter().filter(|item| item.result.is_err())
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }
}

/// `photo.jpg` -> `<out_dir>/photo<suffix>.png`
pub fn output_path(input: &Path, out_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    out_dir.join(format!("{stem}{suffix}.png"))
}

fn process_one(
    segmenter: &mut impl Segmenter,
    input: &Path,
    out_dir: &Path,
    suffix: &str,
) -> Result<PathBuf> {
    let img = image::open(input)?.to_rgb8();
    let cutout = segmenter.remove(&img)?;

    let output = output_path(input, out_dir, suffix);
    cutout.save(&output)?;
    Ok(output)
}

/// Removes the background of every input in order and writes PNG cutouts into `out_dir`.
/// A failing file is recorded in the report and does not stop the run.
pub fn run(
    segmenter: &mut impl Segmenter,
    inputs: &[PathBuf],
    out_dir: &Path,
    suffix: &str,
    mut progress_cb: impl FnMut(usize, usize, &Path),
) -> Result<BatchReport> {
    std::fs::create_dir_all(out_dir)?;

    let total = inputs.len();
    let mut report = BatchReport::default();

    for (index, input) in inputs.iter().enumerate() {
        let result = process_one(segmenter, input, out_dir, suffix).map_err(|e| {
            log::warn!("batch: {} failed. {e}", input.display());
            e.to_string()
        });

        if let Ok(output) = &result {
            log::info!("batch: {} -> {}", input.display(), output.display());
        }

        report.items.push(BatchItem {
            input: input.clone(),
            result,
        });

        progress_cb(index + 1, total, input);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use image::{RgbImage, RgbaImage};

    struct HalfAlpha;

    impl Segmenter for HalfAlpha {
        fn remove(&mut self, image: &RgbImage) -> Result<RgbaImage> {
            let mut out = RgbaImage::new(image.width(), image.height());
            for (o, p) in out.pixels_mut().zip(image.pixels()) {
                *o = image::Rgba([p[0], p[1], p[2], 128]);
            }
            Ok(out)
        }
    }

    struct AlwaysFails;

    impl Segmenter for AlwaysFails {
        fn remove(&mut self, _image: &RgbImage) -> Result<RgbaImage> {
            Err(Error::InvalidOutput("no output".to_string()))
        }
    }

    #[test]
    fn test_output_path() {
        let out = output_path(Path::new("/tmp/in/cat.photo.jpg"), Path::new("/out"), "_nobg");
        assert_eq!(out, PathBuf::from("/out/cat.photo_nobg.png"));

        let out = output_path(Path::new("dog.webp"), Path::new("out"), "");
        assert_eq!(out, PathBuf::from("out/dog.png"));
    }

    #[test]
    fn test_run_keeps_going_after_failure() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let good = dir.path().join("good.png");
        RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3])).save(&good)?;
        let missing = dir.path().join("missing.png");
        let out_dir = dir.path().join("out");

        let mut progress = vec![];
        let report = run(
            &mut HalfAlpha,
            &[missing.clone(), good.clone()],
            &out_dir,
            DEFAULT_SUFFIX,
            |i, n, _| progress.push((i, n)),
        )?;

        assert_eq!(progress, vec![(1, 2), (2, 2)]);
        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed().next().map(|i| i.input.clone()), Some(missing));

        let written = image::open(out_dir.join("good_nobg.png"))?.to_rgba8();
        assert_eq!(written.dimensions(), (3, 2));
        assert_eq!(written.get_pixel(0, 0)[3], 128);
        Ok(())
    }

    #[test]
    fn test_run_reports_segmenter_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("a.png");
        RgbImage::new(1, 1).save(&input)?;

        let report = run(&mut AlwaysFails, &[input], dir.path(), "_x", |_, _, _| {})?;
        assert_eq!(report.succeeded(), 0);
        assert!(!dir.path().join("a_x.png").exists());
        Ok(())
    }
}
