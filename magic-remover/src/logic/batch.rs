use super::{
    editor::{self, set_processing, set_status},
    tr::tr,
    util::{IMAGE_EXTENSIONS, picker_directory, picker_files},
};
use crate::{config, global_store, logic_cb, slint_generatedAppWindow::AppWindow, toast_success, toast_warn};
use background_remover::{BatchReport, batch};
use slint::ComponentHandle;
use std::path::PathBuf;

pub fn init(ui: &AppWindow) {
    logic_cb!(batch_process, ui);
}

fn progress_status(index: usize, total: usize) -> String {
    format!("{} {index}/{total} {}", tr("Processed"), tr("images"))
}

/// Returns whether every file succeeded and the message to show.
fn summary(report: &BatchReport) -> (bool, String) {
    let failed = report.failed().count();

    if failed == 0 {
        (
            true,
            format!(
                "{} {}/{}",
                tr("Processed images successfully"),
                report.succeeded(),
                report.total()
            ),
        )
    } else {
        let names = report
            .failed()
            .filter_map(|item| item.input.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        (
            false,
            format!(
                "{} {}/{} {}, {failed} {}: {names}",
                tr("Processed"),
                report.succeeded(),
                report.total(),
                tr("images"),
                tr("failed"),
            ),
        )
    }
}

fn batch_process(ui: &AppWindow) {
    if editor::session().is_busy() {
        toast_warn!(ui, tr("Please wait for current operation to complete"));
        return;
    }

    let ui_weak = ui.as_weak();
    tokio::spawn(async move {
        let inputs = picker_files(
            ui_weak.clone(),
            &tr("Select Images"),
            &tr("Image Files"),
            IMAGE_EXTENSIONS,
        );

        if inputs.is_empty() {
            return;
        }

        let Some(out_dir) = picker_directory(ui_weak.clone(), &tr("Select Output Directory"))
        else {
            return;
        };

        _ = ui_weak.upgrade_in_event_loop(move |ui| start_batch(&ui, inputs, out_dir));
    });
}

fn start_batch(ui: &AppWindow, inputs: Vec<PathBuf>, out_dir: PathBuf) {
    if let Err(e) = editor::session().begin_task() {
        toast_warn!(ui, tr(&e.to_string()));
        return;
    }

    log::info!("batch: {} images -> {}", inputs.len(), out_dir.display());

    set_processing(ui, true);
    set_status(ui, progress_status(0, inputs.len()));

    let suffix = config::all().editor.batch_suffix;
    let ui_weak = ui.as_weak();

    std::thread::spawn(move || {
        let progress_ui = ui_weak.clone();

        let result = editor::with_remover(|remover| {
            batch::run(remover, &inputs, &out_dir, &suffix, |index, total, _| {
                let status = progress_status(index, total);
                _ = progress_ui.upgrade_in_event_loop(move |ui| {
                    global_store!(ui).set_status_text(status.into());
                });
            })
        });

        _ = ui_weak.upgrade_in_event_loop(move |ui| {
            editor::session().end_task();
            set_processing(&ui, false);

            match result {
                Ok(report) => {
                    let (all_ok, msg) = summary(&report);
                    set_status(
                        &ui,
                        format!(
                            "{} {}",
                            tr("Batch processing complete! Saved to"),
                            out_dir.display()
                        ),
                    );

                    if all_ok {
                        toast_success!(ui, msg);
                    } else {
                        toast_warn!(ui, msg);
                    }
                }
                Err(e) => {
                    log::warn!("batch failed: {e:?}");
                    set_status(&ui, tr("Batch processing failed"));
                    toast_warn!(
                        ui,
                        format!("{}. {}: {e:#}", tr("Batch processing failed"), tr("Reason"))
                    );
                }
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use background_remover::BatchItem;

    #[test]
    fn test_progress_status() {
        assert_eq!(progress_status(3, 7), "Processed 3/7 images");
    }

    #[test]
    fn test_summary() {
        let mut report = BatchReport::default();
        report.items.push(BatchItem {
            input: PathBuf::from("/in/a.png"),
            result: Ok(PathBuf::from("/out/a_nobg.png")),
        });

        let (all_ok, msg) = summary(&report);
        assert!(all_ok);
        assert!(msg.ends_with("1/1"));

        report.items.push(BatchItem {
            input: PathBuf::from("/in/broken.jpg"),
            result: Err("decode failed".to_string()),
        });

        let (all_ok, msg) = summary(&report);
        assert!(!all_ok);
        assert!(msg.contains("1/2"));
        assert!(msg.contains("broken.jpg"));
    }
}
