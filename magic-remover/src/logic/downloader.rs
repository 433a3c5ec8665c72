use crate::{
    logic::{toast, tr::tr, util::file_name},
    slint_generatedAppWindow::AppWindow,
};
use downloader::{DownloadState, Downloader};
use once_cell::sync::Lazy;
use slint::ComponentHandle;
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

type CancelSigs = HashMap<String, Arc<AtomicBool>>;

// Cancel signals of running downloads keyed by url
static DOWNLOADER_CACHE: Lazy<Mutex<CancelSigs>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

// Drops the entry only while it still belongs to `cancel_sig`.
// Returns false when a newer run has taken the url over.
fn release(cache: &mut CancelSigs, url: &str, cancel_sig: &Arc<AtomicBool>) -> bool {
    match cache.get(url) {
        Some(sig) if Arc::ptr_eq(sig, cancel_sig) => {
            cache.remove(url);
            true
        }
        Some(_) => false,
        None => true,
    }
}

pub fn is_downloading(url: &str) -> bool {
    DOWNLOADER_CACHE.lock().unwrap().contains_key(url)
}

pub fn downloader_start(
    ui: &AppWindow,
    url: String,
    save_path: PathBuf,
    progress_cb: impl FnMut(&AppWindow, u64, u64, f32) + 'static + Send + Clone,
    mut exit_cb: impl FnMut(&AppWindow, downloader::Result<DownloadState>) + 'static + Send,
) {
    let ui_weak = ui.as_weak();

    let downloader = Downloader::new(url.clone(), save_path.clone());
    let cancel_sig = downloader.cancel_sig();
    DOWNLOADER_CACHE
        .lock()
        .unwrap()
        .insert(url.clone(), cancel_sig.clone());

    tokio::spawn(async move {
        let ui_weak_clone = ui_weak.clone();
        let name = file_name(&save_path);

        let result = downloader
            .start(move |downloaded: u64, total: u64, progress: f32| {
                let mut cb = progress_cb.clone();
                _ = ui_weak_clone.clone().upgrade_in_event_loop(move |ui| {
                    cb(&ui, downloaded, total, progress);
                });
            })
            .await;

        match result {
            Ok(DownloadState::Cancelled) => {
                toast::async_toast_info(
                    ui_weak.clone(),
                    format!("{}: {name}", tr("Download cancelled")),
                );
            }
            Ok(DownloadState::Incompleted) => {
                toast::async_toast_warn(
                    ui_weak.clone(),
                    format!("{}: {name}", tr("Download incompleted")),
                );
            }
            Ok(DownloadState::Finished) => {
                toast::async_toast_success(
                    ui_weak.clone(),
                    format!("{}: {}", tr("Download completed"), save_path.display()),
                );
            }
            Err(ref e) => {
                log::warn!("download {url} failed: {e:?}");
                toast::async_toast_warn(
                    ui_weak.clone(),
                    format!("{}: {name}. {}: {e}", tr("Download failed"), tr("Reason")),
                );
            }
        }

        if !release(&mut DOWNLOADER_CACHE.lock().unwrap(), &url, &cancel_sig) {
            log::debug!("{url} was restarted, dropping the stale result");
            return;
        }

        _ = ui_weak.clone().upgrade_in_event_loop(move |ui| {
            exit_cb(&ui, result);
        });
    });
}

pub fn downloader_cancel(url: &str) -> bool {
    match DOWNLOADER_CACHE.lock().unwrap().remove(url) {
        Some(cancel_sig) => {
            cancel_sig.store(true, Ordering::Relaxed);
            true
        }
        None => false,
    }
}
