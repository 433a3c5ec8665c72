//! Model list in the settings dialog: choosing, downloading and locating model files.

use super::{
    downloader::{downloader_cancel, downloader_start, is_downloading},
    tr::tr,
    util::picker_directory,
};
use crate::{
    config, global_store, logic_cb,
    slint_generatedAppWindow::{AppWindow, DownloaderState, ModelEntry as UIModelEntry},
    toast_warn,
};
use ::downloader::DownloadState;
use background_remover::Model;
use slint::{ComponentHandle, Model as _, ModelRc, VecModel};
use std::path::Path;

macro_rules! store_models {
    ($ui:expr) => {
        $ui.global::<crate::slint_generatedAppWindow::Store>()
            .get_models()
            .as_any()
            .downcast_ref::<VecModel<UIModelEntry>>()
            .expect("We know we set a VecModel earlier")
    };
}

fn model_entry(model: Model, model_dir: &Path) -> UIModelEntry {
    let state = if is_downloading(model.download_url()) {
        DownloaderState::Downloading
    } else if model_dir.join(model.to_str()).exists() {
        DownloaderState::Finished
    } else {
        DownloaderState::UnStart
    };

    UIModelEntry {
        name: model.display_name().into(),
        filename: model.to_str().into(),
        url: model.download_url().into(),
        state,
        progress: if state == DownloaderState::Finished { 1.0 } else { 0.0 },
    }
}

fn refresh_models(ui: &AppWindow) {
    let config = config::all();
    let model_dir = config.model_dir();
    let (current, _) = config.model();

    let entries = Model::all_models()
        .into_iter()
        .map(|model| model_entry(model, &model_dir))
        .collect::<Vec<_>>();

    let current_index = Model::all_models()
        .iter()
        .position(|model| *model == current)
        .unwrap_or_default();

    store_models!(ui).set_vec(entries);
    global_store!(ui).set_current_model_index(current_index as i32);
    global_store!(ui).set_model_dir(model_dir.to_string_lossy().to_string().into());
}

fn update_entry(ui: &AppWindow, index: usize, f: impl FnOnce(&mut UIModelEntry)) {
    let models = global_store!(ui).get_models();

    if let Some(mut entry) = models.row_data(index) {
        f(&mut entry);
        models.set_row_data(index, entry);
    }
}

pub fn init(ui: &AppWindow) {
    global_store!(ui).set_models(ModelRc::new(VecModel::from(vec![])));
    refresh_models(ui);

    logic_cb!(select_model, ui, index);
    logic_cb!(choose_model_dir, ui);
    logic_cb!(model_start_download, ui, index);
    logic_cb!(model_cancel_download, ui, index);
}

fn select_model(ui: &AppWindow, index: i32) {
    let Some(model) = Model::all_models().get(index.max(0) as usize).copied() else {
        return;
    };

    let mut all = config::all();
    all.remover.model = model.to_str().to_string();
    let model_path = all.model_dir().join(model.to_str());
    _ = config::save(all);

    log::info!("use model {}", model.display_name());
    global_store!(ui).set_current_model_index(index);

    if !model_path.exists() {
        toast_warn!(ui, tr("Model file not found, download it in Settings"));
    }
}

fn choose_model_dir(ui: &AppWindow) {
    let ui_weak = ui.as_weak();

    tokio::spawn(async move {
        let Some(dir) = picker_directory(ui_weak.clone(), &tr("Select Model Directory")) else {
            return;
        };

        _ = ui_weak.upgrade_in_event_loop(move |ui| {
            let mut all = config::all();
            all.remover.model_dir = dir.to_string_lossy().to_string();
            _ = config::save(all);

            refresh_models(&ui);
        });
    });
}

fn model_start_download(ui: &AppWindow, index: i32) {
    let index = index.max(0) as usize;
    let Some(entry) = store_models!(ui).row_data(index) else {
        return;
    };

    if entry.state == DownloaderState::Downloading {
        return;
    }

    let model_dir = config::all().model_dir();
    if let Err(e) = std::fs::create_dir_all(&model_dir) {
        toast_warn!(ui, format!("{}. {}: {e}", tr("Download failed"), tr("Reason")));
        return;
    }

    update_entry(ui, index, |entry| {
        entry.state = DownloaderState::Downloading;
        entry.progress = 0.0;
    });

    downloader_start(
        ui,
        entry.url.to_string(),
        model_dir.join(entry.filename.as_str()),
        move |ui, _downloaded, _total, progress| {
            update_entry(ui, index, |entry| entry.progress = progress);
        },
        move |ui, result| {
            update_entry(ui, index, |entry| {
                entry.state = match result {
                    Ok(DownloadState::Finished) => DownloaderState::Finished,
                    Ok(DownloadState::Cancelled) => DownloaderState::Cancelled,
                    _ => DownloaderState::Failed,
                };

                if entry.state != DownloaderState::Finished {
                    entry.progress = 0.0;
                }
            });
        },
    );
}

fn model_cancel_download(ui: &AppWindow, index: i32) {
    let index = index.max(0) as usize;
    let Some(entry) = store_models!(ui).row_data(index) else {
        return;
    };

    if downloader_cancel(entry.url.as_str()) {
        update_entry(ui, index, |entry| {
            entry.state = DownloaderState::Cancelled;
            entry.progress = 0.0;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_entry_state() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let entry = model_entry(Model::U2NetP, dir.path());
        assert_eq!(entry.state, DownloaderState::UnStart);
        assert_eq!(entry.filename, "u2netp.onnx");

        std::fs::write(dir.path().join("u2netp.onnx"), b"onnx")?;
        let entry = model_entry(Model::U2NetP, dir.path());
        assert_eq!(entry.state, DownloaderState::Finished);
        assert_eq!(entry.progress, 1.0);
        Ok(())
    }
}
