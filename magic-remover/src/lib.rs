//! Magical Background Remover
//!
//! A desktop application that cuts the background out of a photo with an
//! ONNX segmentation model, then lets the user touch up the result with
//! blur, sharpen and grayscale effects or a new background before saving.
//!
//! # Architecture
//! - `config`: TOML settings in the platform config directory
//! - `session`: the edit state behind the two image panes and its undo stack
//! - `logic`: Slint callbacks, one module per panel or feature

slint::include_modules!();

#[macro_use]
extern crate derivative;

mod config;
mod logic;
mod session;
mod version;

use clap::Parser;
use std::path::PathBuf;

/// Command line arguments.
#[derive(Parser, Debug, Default)]
#[command(version, about = "Remove image backgrounds and touch up the result")]
pub struct Args {
    /// Image to open on startup
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,
}

/// Sets up `env_logger` with a `[HH:MM:SS LEVEL file line] message` format.
pub fn init_logger() {
    use std::io::Write;

    env_logger::builder()
        .filter_module("ort", log::LevelFilter::Warn)
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            let ts = chrono::Local::now().format("%H:%M:%S");

            writeln!(
                buf,
                "[{} {style}{}{style:#} {} {}] {}",
                ts,
                record.level(),
                record
                    .file()
                    .unwrap_or("None")
                    .split('/')
                    .next_back()
                    .unwrap_or("None"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

async fn ui_before() {
    init_logger();
    config::init();

    #[cfg(target_os = "linux")]
    {
        _ = slint::set_xdg_app_id("magic-remover".to_string());
    }
}

fn ui_after(ui: &AppWindow, args: Args) {
    logic::init(ui);

    if let Some(image) = args.image {
        global_logic!(ui).invoke_open_image(image.to_string_lossy().to_string().into());
    }
}

/// Main entry point for desktop applications.
pub async fn desktop_main(args: Args) {
    log::debug!("start...");

    ui_before().await;
    let ui = AppWindow::new().unwrap();
    ui_after(&ui, args);
    global_util!(ui).invoke_update_window_size();

    ui.run().unwrap();

    log::debug!("exit...");
}
