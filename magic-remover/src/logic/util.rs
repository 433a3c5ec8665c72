//! Window management, native file dialogs and image conversion helpers.

use super::{toast, tr::tr};
use crate::{config, global_util, slint_generatedAppWindow::AppWindow};
use anyhow::{Context, Result};
use image::RgbaImage;
use image_effect::resize::thumbnail;
use slint::{ComponentHandle, Image, Rgba8Pixel, SharedPixelBuffer, Weak};
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "gif"];

pub fn init(ui: &AppWindow) {
    global_util!(ui).on_close_window(move || {
        _ = slint::quit_event_loop();
    });

    let ui_weak = ui.as_weak();
    global_util!(ui).on_update_window_size(move || {
        let ui = ui_weak.unwrap();
        let preference = config::all().preference;

        let scale = ui.window().scale_factor();
        let psize = slint::PhysicalSize::from_logical(
            slint::LogicalSize {
                width: preference.win_width as f32,
                height: preference.win_height as f32,
            },
            scale,
        );
        ui.window().set_size(psize);
    });
}

fn last_dir() -> Option<PathBuf> {
    let dir = PathBuf::from(config::all().editor.last_dir);
    dir.is_dir().then_some(dir)
}

/// Remembers the directory of `path` for the next dialog.
pub fn remember_dir(path: &Path) {
    let Some(dir) = path.parent() else {
        return;
    };

    let mut all = config::all();
    all.editor.last_dir = dir.to_string_lossy().to_string();
    if let Err(e) = config::save(all) {
        log::warn!("save last directory failed: {e:?}");
    }
}

pub fn picker_file(
    ui: Weak<AppWindow>,
    title: &str,
    filter_name: &str,
    filter_extensions: &[&str],
) -> Option<PathBuf> {
    let mut file_dialog = native_dialog::DialogBuilder::file().set_title(title);

    if let Some(dir) = last_dir() {
        file_dialog = file_dialog.set_location(&dir);
    }

    if !filter_extensions.is_empty() {
        file_dialog = file_dialog.add_filter(filter_name, filter_extensions);
    }

    match file_dialog.open_single_file().show() {
        Ok(Some(path)) => Some(path),
        Err(e) => {
            toast::async_toast_warn(
                ui,
                format!("{}. {}: {}", tr("Choose file failed"), tr("Reason"), e),
            );
            None
        }
        _ => None,
    }
}

pub fn picker_files(
    ui: Weak<AppWindow>,
    title: &str,
    filter_name: &str,
    filter_extensions: &[&str],
) -> Vec<PathBuf> {
    let mut file_dialog = native_dialog::DialogBuilder::file()
        .set_title(title)
        .add_filter(filter_name, filter_extensions);

    if let Some(dir) = last_dir() {
        file_dialog = file_dialog.set_location(&dir);
    }

    match file_dialog.open_multiple_file().show() {
        Ok(paths) => paths,
        Err(e) => {
            toast::async_toast_warn(
                ui,
                format!("{}. {}: {}", tr("Choose file failed"), tr("Reason"), e),
            );
            vec![]
        }
    }
}

pub fn picker_directory(ui: Weak<AppWindow>, title: &str) -> Option<PathBuf> {
    let mut file_dialog = native_dialog::DialogBuilder::file().set_title(title);

    if let Some(dir) = last_dir() {
        file_dialog = file_dialog.set_location(&dir);
    }

    match file_dialog.open_single_dir().show() {
        Ok(Some(path)) => Some(path),
        Err(e) => {
            toast::async_toast_warn(
                ui,
                format!("{}. {}: {}", tr("Choose directory failed"), tr("Reason"), e),
            );
            None
        }
        _ => None,
    }
}

pub fn picker_save_file(
    ui: Weak<AppWindow>,
    title: &str,
    filename: &str,
    filter_name: &str,
    filter_extensions: &[&str],
) -> Option<PathBuf> {
    let mut file_dialog = native_dialog::DialogBuilder::file()
        .set_title(title)
        .set_filename(filename)
        .add_filter(filter_name, filter_extensions);

    if let Some(dir) = last_dir() {
        file_dialog = file_dialog.set_location(&dir);
    }

    match file_dialog.save_single_file().show() {
        Ok(Some(path)) => Some(path),
        Err(e) => {
            toast::async_toast_warn(
                ui,
                format!("{}. {}: {}", tr("Choose file failed"), tr("Reason"), e),
            );
            None
        }
        _ => None,
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Appends `extension` unless the path already ends with one of `accepted`.
pub fn with_extension(path: PathBuf, extension: &str, accepted: &[&str]) -> PathBuf {
    let has_accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| accepted.iter().any(|a| a.eq_ignore_ascii_case(ext)));

    if has_accepted {
        return path;
    }

    let mut name = path.into_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Scales `image` down to fit the preview pane. The buffer is `Send`, the
/// `slint::Image` built from it must be created on the UI thread.
pub fn preview_buffer(
    image: &RgbaImage,
    max_width: u32,
    max_height: u32,
) -> Result<SharedPixelBuffer<Rgba8Pixel>> {
    let thumb = thumbnail(image, max_width, max_height).with_context(|| "create preview failed")?;

    Ok(SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(
        thumb.as_raw(),
        thumb.width(),
        thumb.height(),
    ))
}

pub fn to_slint_image(buffer: SharedPixelBuffer<Rgba8Pixel>) -> Image {
    Image::from_rgba8(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_with_extension() {
        let accepted = ["jpg", "jpeg"];
        assert_eq!(
            with_extension(PathBuf::from("/tmp/out"), "jpeg", &accepted),
            PathBuf::from("/tmp/out.jpeg")
        );
        assert_eq!(
            with_extension(PathBuf::from("/tmp/out.JPG"), "jpeg", &accepted),
            PathBuf::from("/tmp/out.JPG")
        );
        assert_eq!(
            with_extension(PathBuf::from("/tmp/out.v2"), "png", &["png"]),
            PathBuf::from("/tmp/out.v2.png")
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/a/b/cat.png")), "cat.png");
        assert_eq!(file_name(Path::new("/")), "/");
    }

    #[test]
    fn test_preview_buffer_fits_pane() -> Result<()> {
        let img = RgbaImage::from_pixel(1200, 600, Rgba([1, 2, 3, 255]));
        let buffer = preview_buffer(&img, 400, 400)?;
        assert_eq!((buffer.width(), buffer.height()), (400, 200));
        Ok(())
    }
}
