use downloader::{DownloadError, DownloadState, Downloader};
use std::io::Write;

#[tokio::main]
async fn main() -> Result<(), DownloadError> {
    let save_path = "./models/u2netp.onnx";
    let download_url = "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2netp.onnx";

    println!("Starting download from: {}", download_url);
    println!("Saving to: {}", save_path);

    let downloader = Downloader::new(download_url.to_string(), save_path.into());

    match downloader
        .start(|downloaded: u64, total: u64, progress: f32| {
            print!(
                "\rProgress: {:.2}% ({:.2} MB / {:.2} MB)",
                progress * 100.0,
                downloaded as f64 / 1024.0 / 1024.0,
                total as f64 / 1024.0 / 1024.0
            );
            _ = std::io::stdout().flush();
        })
        .await?
    {
        DownloadState::Finished => println!("\nDownload completed: {}", save_path),
        DownloadState::Cancelled => println!("\nDownload was cancelled"),
        DownloadState::Incompleted => println!("\nDownload was incompleted"),
    }

    Ok(())
}
