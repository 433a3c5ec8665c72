use anyhow::{Context, Result};
use background_remover::{BackgroundRemover, Model, Segmenter};
use std::{env, path::PathBuf, time::Instant};

// cargo run --example remover_demo -- ./models/u2net.onnx ./input.png
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let model_path = PathBuf::from(args.next().context("missing model path")?);
    let input_file = PathBuf::from(args.next().context("missing input image")?);

    let model = model_path
        .file_name()
        .and_then(|name| Model::try_from(&name.to_string_lossy()))
        .unwrap_or_default();

    let mut remover = BackgroundRemover::new(model, &model_path)?;

    let img = image::open(&input_file)?.to_rgb8();
    log::info!("Image size: {}x{}", img.width(), img.height());

    let inference_start = Instant::now();
    let result = remover.remove(&img)?;
    log::info!("Remove background spent: {:?}", inference_start.elapsed());

    let output_path = background_remover::batch::output_path(
        &input_file,
        &env::current_dir()?,
        background_remover::batch::DEFAULT_SUFFIX,
    );
    result
        .save(&output_path)
        .with_context(|| output_path.to_string_lossy().to_string())?;

    log::info!("Saving result to: {}", output_path.display());
    Ok(())
}
