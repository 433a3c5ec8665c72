//! Input and output panes: loading, background removal, effects, undo and save.
//!
//! Heavy work runs on a worker thread. The session is only locked for short
//! reads and commits, results go back to the UI with `upgrade_in_event_loop`.

use super::{
    toast,
    tr::tr,
    util::{
        IMAGE_EXTENSIONS, file_name, picker_file, picker_save_file, preview_buffer,
        remember_dir, to_slint_image, with_extension,
    },
};
use crate::{
    config, global_store, global_util, logic_cb,
    session::{Edit, EditSession, SessionResult, UndoOutcome},
    slint_generatedAppWindow::{AppWindow, ConfirmDialogSetting},
    toast_info, toast_success, toast_warn,
};
use anyhow::{Context, Result, bail};
use background_remover::BackgroundRemover;
use image_effect::{
    ImageEffect, OutputFormat, applied,
    base_effect::GrayscaleConfig,
    blur_effect::GaussianBlurConfig,
    composite::{MagicTouchConfig, parse_hex_color, to_hex_color},
    export::encode_to_path,
    stylized_effect::SharpenConfig,
};
use once_cell::sync::Lazy;
use slint::{ComponentHandle, Image, Rgba8Pixel, SharedPixelBuffer, SharedString};
use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

pub const INPUT_PREVIEW_SIZE: u32 = 300;
pub const OUTPUT_PREVIEW_SIZE: u32 = 400;

static SESSION: Lazy<Mutex<EditSession>> = Lazy::new(|| {
    Mutex::new(EditSession::new(
        config::all().editor.history_limit as usize,
    ))
});

// Loaded model keyed by its file path, reused until the configured model changes
static REMOVER: Lazy<Mutex<Option<(PathBuf, BackgroundRemover)>>> = Lazy::new(|| Mutex::new(None));

type Preview = SharedPixelBuffer<Rgba8Pixel>;

enum OutputUpdate {
    Show(Preview),
    Clear,
}

struct JobOutput {
    input: Option<Preview>,
    output: OutputUpdate,
    status: String,
    toast: Option<String>,
}

impl JobOutput {
    fn output(preview: Preview, status: String) -> Self {
        Self {
            input: None,
            output: OutputUpdate::Show(preview),
            status,
            toast: None,
        }
    }

    fn with_toast(mut self, msg: String) -> Self {
        self.toast = Some(msg);
        self
    }
}

pub fn session() -> MutexGuard<'static, EditSession> {
    SESSION.lock().unwrap()
}

pub fn set_history_limit(limit: usize) {
    session().set_history_limit(limit);
}

/// Runs `f` with the configured model, loading it on first use or after the model changed.
pub fn with_remover<T>(
    f: impl FnOnce(&mut BackgroundRemover) -> background_remover::Result<T>,
) -> Result<T> {
    let (model, path) = config::all().model();

    if !path.exists() {
        bail!(
            "{}: {}",
            tr("Model file not found, download it in Settings"),
            path.display()
        );
    }

    let mut cache = REMOVER.lock().unwrap();

    if !matches!(cache.as_ref(), Some((cached, _)) if *cached == path) {
        log::info!("load {} from {}", model.display_name(), path.display());

        *cache = None;
        let remover = BackgroundRemover::new(model, &path).with_context(|| tr("Load model failed"))?;
        *cache = Some((path, remover));
    }

    let Some((_, remover)) = cache.as_mut() else {
        bail!(tr("Load model failed"));
    };

    Ok(f(remover)?)
}

pub fn set_processing(ui: &AppWindow, processing: bool) {
    global_store!(ui).set_is_processing(processing);
}

pub fn set_status(ui: &AppWindow, status: impl Into<SharedString>) {
    global_store!(ui).set_status_text(status.into());
}

pub fn refresh_flags(ui: &AppWindow) {
    let (has_input, has_output, has_cutout, can_undo) = {
        let session = session();
        (
            session.has_input(),
            session.has_output(),
            session.has_cutout(),
            session.can_undo(),
        )
    };

    global_store!(ui).set_has_input(has_input);
    global_store!(ui).set_has_output(has_output);
    global_store!(ui).set_has_cutout(has_cutout);
    global_store!(ui).set_can_undo(can_undo);
}

/// Reads from the session, showing the error as a warning toast.
fn require<T>(ui: &AppWindow, check: impl FnOnce(&EditSession) -> SessionResult<T>) -> Option<T> {
    let result = check(&*session());

    match result {
        Ok(value) => Some(value),
        Err(e) => {
            toast_warn!(ui, tr(&e.to_string()));
            None
        }
    }
}

fn spawn_job(
    ui: &AppWindow,
    running_status: String,
    failed_status: String,
    job: impl FnOnce() -> Result<JobOutput> + Send + 'static,
) {
    if let Err(e) = session().begin_task() {
        toast_warn!(ui, tr(&e.to_string()));
        return;
    }

    set_processing(ui, true);
    set_status(ui, running_status);

    let ui_weak = ui.as_weak();
    std::thread::spawn(move || {
        let result = job();

        _ = ui_weak.upgrade_in_event_loop(move |ui| {
            session().end_task();
            set_processing(&ui, false);

            match result {
                Ok(output) => {
                    if let Some(preview) = output.input {
                        global_store!(ui).set_input_image(to_slint_image(preview));
                    }

                    match output.output {
                        OutputUpdate::Show(preview) => {
                            global_store!(ui).set_output_image(to_slint_image(preview))
                        }
                        OutputUpdate::Clear => global_store!(ui).set_output_image(Image::default()),
                    }

                    set_status(&ui, output.status);

                    if let Some(msg) = output.toast {
                        toast_success!(ui, msg);
                    }
                }
                Err(e) => {
                    log::warn!("{failed_status}: {e:?}");
                    set_status(&ui, failed_status.clone());
                    toast_warn!(ui, format!("{failed_status}. {}: {e:#}", tr("Reason")));
                }
            }

            refresh_flags(&ui);
        });
    });
}

pub fn init(ui: &AppWindow) {
    refresh_flags(ui);
    set_status(ui, tr("Ready"));
    global_store!(ui).set_is_drop_enabled(cfg!(feature = "drag-drop"));

    logic_cb!(upload_image, ui);
    logic_cb!(open_image, ui, path);
    logic_cb!(remove_background, ui);
    logic_cb!(magic_touch, ui);
    logic_cb!(apply_blur, ui);
    logic_cb!(apply_sharpen, ui);
    logic_cb!(apply_grayscale, ui);
    logic_cb!(replace_bg_color, ui, color);
    logic_cb!(replace_bg_image, ui);
    logic_cb!(undo, ui);
    logic_cb!(save_output, ui);
    logic_cb!(show_help, ui);
    logic_cb!(quit, ui);

    #[cfg(feature = "drag-drop")]
    init_drag_drop(ui);
}

#[cfg(feature = "drag-drop")]
fn init_drag_drop(ui: &AppWindow) {
    use slint::winit_030::{WinitWindowAccessor, WinitWindowEventResult, winit::event::WindowEvent};

    let ui_weak = ui.as_weak();
    ui.window().on_winit_window_event(move |_, event| {
        if let WindowEvent::DroppedFile(path) = event {
            let ui = ui_weak.unwrap();
            open_image(&ui, path.to_string_lossy().to_string().into());
            return WinitWindowEventResult::PreventDefault;
        }

        WinitWindowEventResult::Propagate
    });
}

fn upload_image(ui: &AppWindow) {
    let ui_weak = ui.as_weak();

    tokio::spawn(async move {
        let Some(path) = picker_file(
            ui_weak.clone(),
            &tr("Select an Image"),
            &tr("Image Files"),
            IMAGE_EXTENSIONS,
        ) else {
            return;
        };

        _ = ui_weak.upgrade_in_event_loop(move |ui| {
            open_image(&ui, path.to_string_lossy().to_string().into());
        });
    });
}

fn open_image(ui: &AppWindow, path: SharedString) {
    let path = PathBuf::from(path.as_str());

    spawn_job(
        ui,
        format!("{} {}...", tr("Processing"), file_name(&path)),
        tr("Error loading image"),
        move || {
            let image = image::open(&path)
                .with_context(|| format!("open {} failed", path.display()))?
                .to_rgba8();

            let preview = preview_buffer(&image, INPUT_PREVIEW_SIZE, INPUT_PREVIEW_SIZE)?;
            session().load_input(&path);
            remember_dir(&path);

            log::info!(
                "loaded {} ({}x{})",
                path.display(),
                image.width(),
                image.height()
            );

            Ok(JobOutput {
                input: Some(preview),
                output: OutputUpdate::Clear,
                status: format!("{}: {}", tr("Loaded"), file_name(&path)),
                toast: None,
            })
        },
    );
}

fn remove_background(ui: &AppWindow) {
    let Some(input) = require(ui, |s| s.require_input()) else {
        return;
    };

    spawn_job(
        ui,
        tr("Removing background..."),
        tr("Failed to remove background"),
        move || {
            let cutout = with_remover(|remover| remover.remove_file(&input))?;
            let preview = preview_buffer(&cutout, OUTPUT_PREVIEW_SIZE, OUTPUT_PREVIEW_SIZE)?;
            session().set_cutout(cutout);

            let msg = tr("Background removed successfully!");
            Ok(JobOutput::output(preview, msg.clone()).with_toast(msg))
        },
    );
}

fn magic_touch(ui: &AppWindow) {
    let Some(input) = require(ui, |s| s.require_input()) else {
        return;
    };

    spawn_job(
        ui,
        tr("Applying magic touch..."),
        tr("Magic failed"),
        move || {
            let cutout = with_remover(|remover| remover.remove_file(&input))?;
            let output = applied(&ImageEffect::MagicTouch(MagicTouchConfig::new()), &cutout)?;
            let preview = preview_buffer(&output, OUTPUT_PREVIEW_SIZE, OUTPUT_PREVIEW_SIZE)?;
            session().set_cutout_with_output(cutout, output);

            Ok(JobOutput::output(preview, tr("Magic applied!"))
                .with_toast(tr("Your image has been magically enhanced!")))
        },
    );
}

fn apply_effect(ui: &AppWindow, effect: ImageEffect, done: &str) {
    let Some(pending) = require(ui, |s| s.prepare(Edit::Effect(effect))) else {
        return;
    };

    let done = tr(done);
    spawn_job(ui, tr("Applying effect..."), tr("Effect failed"), move || {
        let output = pending.run()?;
        let preview = preview_buffer(&output, OUTPUT_PREVIEW_SIZE, OUTPUT_PREVIEW_SIZE)?;
        session().commit(output);

        Ok(JobOutput::output(preview, done))
    });
}

fn apply_blur(ui: &AppWindow) {
    let radius = config::all().editor.blur_radius;
    apply_effect(
        ui,
        ImageEffect::GaussianBlur(GaussianBlurConfig::new().with_radius(radius)),
        "Blur effect applied",
    );
}

fn apply_sharpen(ui: &AppWindow) {
    apply_effect(
        ui,
        ImageEffect::Sharpen(SharpenConfig::new()),
        "Sharpen effect applied",
    );
}

fn apply_grayscale(ui: &AppWindow) {
    apply_effect(
        ui,
        ImageEffect::Grayscale(GrayscaleConfig::new()),
        "Grayscale effect applied",
    );
}

fn replace_bg_color(ui: &AppWindow, color: SharedString) {
    let color = match parse_hex_color(&color) {
        Ok(color) => color,
        Err(e) => {
            toast_warn!(ui, format!("{}. {}: {e}", tr("Invalid color"), tr("Reason")));
            return;
        }
    };

    let Some(pending) = require(ui, |s| s.prepare(Edit::FillBackground(color))) else {
        return;
    };

    spawn_job(
        ui,
        tr("Replacing background..."),
        tr("Effect failed"),
        move || {
            let output = pending.run()?;
            let preview = preview_buffer(&output, OUTPUT_PREVIEW_SIZE, OUTPUT_PREVIEW_SIZE)?;
            session().commit(output);

            Ok(JobOutput::output(
                preview,
                format!("{} {}", tr("Background replaced with"), to_hex_color(color)),
            ))
        },
    );
}

fn replace_bg_image(ui: &AppWindow) {
    if require(ui, |s| s.require_cutout()).is_none() {
        return;
    }

    let ui_weak = ui.as_weak();
    tokio::spawn(async move {
        let Some(path) = picker_file(
            ui_weak.clone(),
            &tr("Select Background Image"),
            &tr("Image Files"),
            IMAGE_EXTENSIONS,
        ) else {
            return;
        };

        _ = ui_weak.upgrade_in_event_loop(move |ui| replace_bg_with_file(&ui, path));
    });
}

fn replace_bg_with_file(ui: &AppWindow, path: PathBuf) {
    if require(ui, |s| s.require_cutout()).is_none() {
        return;
    }

    spawn_job(
        ui,
        tr("Replacing background..."),
        tr("Effect failed"),
        move || {
            let background = image::open(&path)
                .with_context(|| format!("open {} failed", path.display()))?
                .to_rgba8();

            let pending = session().prepare(Edit::ReplaceBackground(background))?;
            let output = pending.run()?;
            let preview = preview_buffer(&output, OUTPUT_PREVIEW_SIZE, OUTPUT_PREVIEW_SIZE)?;
            session().commit(output);

            Ok(JobOutput::output(preview, tr("Background replaced with image")))
        },
    );
}

fn undo(ui: &AppWindow) {
    if session().is_busy() {
        toast_warn!(ui, tr("Please wait for current operation to complete"));
        return;
    }

    let outcome = session().undo();

    match outcome {
        UndoOutcome::NothingToUndo => {
            toast_info!(ui, tr("Nothing to undo"));
            return;
        }
        UndoOutcome::Restored => {
            let current = session().current().cloned();
            if let Some(image) = current {
                match preview_buffer(&image, OUTPUT_PREVIEW_SIZE, OUTPUT_PREVIEW_SIZE) {
                    Ok(preview) => global_store!(ui).set_output_image(to_slint_image(preview)),
                    Err(e) => log::warn!("{e:?}"),
                }
            }
        }
        UndoOutcome::Cleared => global_store!(ui).set_output_image(Image::default()),
    }

    set_status(ui, tr("Undo successful"));
    refresh_flags(ui);
}

fn accepted_extensions(format: OutputFormat) -> &'static [&'static str] {
    match format {
        OutputFormat::Png => &["png"],
        OutputFormat::Jpeg => &["jpg", "jpeg"],
        OutputFormat::Webp => &["webp"],
        OutputFormat::Bmp => &["bmp"],
    }
}

/// `cat.jpg` saved as JPEG with suffix `_nobg` becomes `cat_nobg.jpeg`.
fn default_save_name(input: Option<&std::path::Path>, suffix: &str, format: OutputFormat) -> String {
    let stem = input
        .and_then(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    format!("{stem}{suffix}.{}", format.extension())
}

fn save_output(ui: &AppWindow) {
    let format = output_format(ui);
    let suffix = config::all().editor.batch_suffix;

    let (output, filename) = {
        let session = session();
        (
            session.current().cloned(),
            default_save_name(session.input_path(), &suffix, format),
        )
    };

    let Some(output) = output else {
        toast_warn!(ui, tr("No output to save!"));
        return;
    };

    set_status(ui, tr("Saving..."));

    let ui_weak = ui.as_weak();
    tokio::spawn(async move {
        let Some(path) = picker_save_file(
            ui_weak.clone(),
            &tr("Save Image"),
            &filename,
            format.name(),
            accepted_extensions(format),
        ) else {
            _ = ui_weak.upgrade_in_event_loop(|ui| set_status(&ui, tr("Ready")));
            return;
        };

        let path = with_extension(path, format.extension(), accepted_extensions(format));

        let result = tokio::task::spawn_blocking(move || {
            encode_to_path(&output, &path, format).map(|_| path)
        })
        .await;

        match result {
            Ok(Ok(path)) => {
                remember_dir(&path);

                let status = format!("{}: {}", tr("Saved to"), file_name(&path));
                let msg = format!("{}:\n{}", tr("Saved successfully to"), path.display());
                _ = ui_weak.upgrade_in_event_loop(move |ui| {
                    set_status(&ui, status);
                    toast_success!(ui, msg);
                });
            }
            Ok(Err(e)) => {
                log::warn!("save output failed: {e:?}");
                toast::async_toast_warn(
                    ui_weak.clone(),
                    format!("{}. {}: {e}", tr("Save failed"), tr("Reason")),
                );
                _ = ui_weak.upgrade_in_event_loop(|ui| set_status(&ui, tr("Save failed")));
            }
            Err(e) => {
                log::warn!("save task failed: {e:?}");
                toast::async_toast_warn(
                    ui_weak,
                    format!("{}. {}: {e}", tr("Save failed"), tr("Reason")),
                );
            }
        }
    });
}

fn output_format(ui: &AppWindow) -> OutputFormat {
    let index = global_store!(ui).get_output_format_index().clamp(0, u8::MAX as i32) as u8;
    OutputFormat::try_from(index).unwrap_or_default()
}

const INPUT_FORMATS: &str = "PNG, JPEG, BMP, WEBP, GIF";

fn help_text(drop_enabled: bool) -> String {
    let shortcuts = [
        ("Ctrl+O", "Open image"),
        ("Ctrl+S", "Save output"),
        ("Ctrl+Z", "Undo last edit"),
        ("F1", "Show this help"),
        ("Esc", "Quit application"),
    ];

    let mut features = vec![
        ("Remove Background", "Cut the subject out with an AI model"),
        ("Magic Touch", "Enhance the cutout and add a soft gradient backdrop"),
        ("Effects", "Blur, sharpen or grayscale the current output"),
        ("Replace Background", "Put the cutout on a solid color or another image"),
        ("Batch Process", "Remove the background of many images at once"),
    ];

    if drop_enabled {
        features.push(("Drag & Drop", "Drop an image file onto the window to open it"));
    }

    let mut text = format!("{}\n", tr("Keyboard Shortcuts"));
    for (key, action) in shortcuts {
        text.push_str(&format!("  {key:<8}{}\n", tr(action)));
    }

    text.push_str(&format!("\n{}\n", tr("Features")));
    for (name, desc) in features {
        text.push_str(&format!("  • {}: {}\n", tr(name), tr(desc)));
    }

    let output_formats = OutputFormat::all()
        .iter()
        .map(|format| format.name())
        .collect::<Vec<_>>()
        .join(", ");

    text.push_str(&format!("\n{}\n", tr("Supported Formats")));
    text.push_str(&format!("  {}: {INPUT_FORMATS}\n", tr("Input")));
    text.push_str(&format!("  {}: {output_formats}\n", tr("Output")));

    text
}

fn show_help(ui: &AppWindow) {
    global_store!(ui).set_help_text(help_text(cfg!(feature = "drag-drop")).into());
    global_store!(ui).set_is_show_help_dialog(true);
}

fn quit(ui: &AppWindow) {
    if !session().is_busy() {
        global_util!(ui).invoke_close_window();
        return;
    }

    global_store!(ui).set_confirm_dialog_setting(ConfirmDialogSetting {
        title: tr("Quit").into(),
        body: tr("Quit while a task is running?").into(),
        handle_type: "close-window".into(),
        user_data: "".into(),
    });
    global_store!(ui).set_is_show_confirm_dialog(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_save_name() {
        assert_eq!(
            default_save_name(Some(Path::new("/photos/cat.jpg")), "_nobg", OutputFormat::Png),
            "cat_nobg.png"
        );
        assert_eq!(
            default_save_name(None, "", OutputFormat::Jpeg),
            "output.jpeg"
        );
    }

    #[test]
    fn test_accepted_extensions_contain_default() {
        for format in OutputFormat::all() {
            assert!(accepted_extensions(*format).contains(&format.extension()));
        }
    }

    #[test]
    fn test_help_lists_every_shortcut() {
        let help = help_text(true);
        for key in ["Ctrl+O", "Ctrl+S", "Ctrl+Z", "F1", "Esc"] {
            assert!(help.contains(key), "{key}");
        }
    }

    #[test]
    fn test_help_features_and_formats() {
        let help = help_text(true);
        assert!(help.contains("Effects: Blur, sharpen or grayscale the current output"));
        assert!(help.contains("Replace Background: Put the cutout on a solid color or another image"));
        assert!(help.contains("Drag & Drop: Drop an image file"));
        assert!(help.contains("Input: PNG, JPEG, BMP, WEBP, GIF"));
        assert!(help.contains("Output: PNG, JPEG, WEBP, BMP"));

        assert!(!help_text(false).contains("Drag & Drop"));
    }
}
