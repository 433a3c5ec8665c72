use crate::{DownloadError, Result};
use futures::StreamExt;
use reqwest::Client;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Finished,
    Cancelled,
    Incompleted,
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Downloader {
    url: String,
    save_path: PathBuf,
    tmp_path: PathBuf,
    cancel_sig: Arc<AtomicBool>,
}

/// `model.onnx` -> `model.onnx.<run_id>.tmp`, the file the body is streamed into.
pub fn temp_path(save_path: &Path, run_id: &str) -> PathBuf {
    let mut name = save_path.as_os_str().to_os_string();
    name.push(format!(".{run_id}.tmp"));
    PathBuf::from(name)
}

impl Downloader {
    /// Every downloader streams into its own temp file, so a cancelled run
    /// still draining its last chunk never touches a restarted one.
    pub fn new(url: String, save_path: PathBuf) -> Downloader {
        let tmp_path = temp_path(&save_path, &uuid::Uuid::new_v4().simple().to_string());

        Downloader {
            url,
            save_path,
            tmp_path,
            cancel_sig: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    pub async fn start(
        &self,
        mut progress_cb: impl FnMut(u64, u64, f32) + 'static,
    ) -> Result<DownloadState> {
        if let Some(dir) = self.save_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        let response =
            Client::new()
                .get(&self.url)
                .send()
                .await
                .map_err(|e| DownloadError::RequestError {
                    error: e,
                    url: self.url.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(DownloadError::StatusError {
                status: response.status().as_u16(),
                url: self.url.to_string(),
            });
        }

        let total_size = response
            .content_length()
            .ok_or(DownloadError::ContentLengthError)?;

        log::info!(
            "downloading {} ({total_size} bytes) to {}",
            self.url,
            self.save_path.display()
        );

        let result = self.save_body(response, total_size, &mut progress_cb).await;

        match result {
            Ok(DownloadState::Finished) => {
                fs::rename(&self.tmp_path, &self.save_path)?;
                Ok(DownloadState::Finished)
            }
            other => {
                _ = fs::remove_file(&self.tmp_path);
                other
            }
        }
    }

    async fn save_body(
        &self,
        response: reqwest::Response,
        total_size: u64,
        progress_cb: &mut impl FnMut(u64, u64, f32),
    ) -> Result<DownloadState> {
        let mut save_file =
            fs::File::create(&self.tmp_path).map_err(|e| DownloadError::FileCreateError {
                error: e,
                path: self.tmp_path.display().to_string(),
            })?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            if self.cancel_sig.load(Ordering::Relaxed) {
                return Ok(DownloadState::Cancelled);
            }

            let chunk = chunk.map_err(|e| DownloadError::IncompleteDownload {
                error: e.to_string(),
                downloaded,
                total: total_size,
            })?;
            save_file.write_all(&chunk)?;

            downloaded += chunk.len() as u64;

            let progress = downloaded as f32 / total_size as f32;
            progress_cb(downloaded, total_size, progress);
        }

        save_file.flush()?;

        if total_size == downloaded {
            Ok(DownloadState::Finished)
        } else {
            log::warn!("download incomplete: {downloaded}/{total_size} bytes");
            Ok(DownloadState::Incompleted)
        }
    }

    pub fn cancel(&self) {
        self.cancel_sig.store(true, Ordering::Relaxed);
    }

    pub fn cancel_sig(&self) -> Arc<AtomicBool> {
        self.cancel_sig.clone()
    }
}
