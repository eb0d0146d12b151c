use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

const HANDPOSE_MODEL_FILENAME: &str = "handpose_estimation_mediapipe_2023feb.onnx";
const HANDPOSE_MODEL_URL: &str = "https://github.com/opencv/opencv_zoo/raw/main/models/handpose_estimation_mediapipe/handpose_estimation_mediapipe_2023feb.onnx";

pub fn default_handpose_model_path() -> PathBuf {
    PathBuf::from("models").join(HANDPOSE_MODEL_FILENAME)
}

#[derive(Clone, Debug)]
pub enum DownloadEvent {
    Started { total: Option<u64> },
    Progress { downloaded: u64, total: Option<u64> },
    Finished,
}

/// Makes sure the hand-pose model exists at `model_path`, downloading it
/// with a terminal progress bar when missing.
pub fn ensure_handpose_model_ready(model_path: &Path) -> anyhow::Result<()> {
    if model_path.exists() {
        log::debug!("handpose model present at {}", model_path.display());
        return Ok(());
    }

    if let Some(parent) = model_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create model directory {}", parent.display()))?;
    }

    let mut progress: Option<ProgressBar> = None;
    download_to_path(HANDPOSE_MODEL_URL, model_path, &mut |event| match event {
        DownloadEvent::Started { total } => progress = Some(create_progress_bar(total)),
        DownloadEvent::Progress { downloaded, .. } => {
            if let Some(pb) = progress.as_ref() {
                pb.set_position(downloaded);
            }
        }
        DownloadEvent::Finished => {
            if let Some(pb) = progress.take() {
                pb.finish_with_message("handpose model ready");
            }
        }
    })
}

fn download_to_path<F>(url: &str, dest: &Path, on_event: &mut F) -> anyhow::Result<()>
where
    F: FnMut(DownloadEvent),
{
    log::info!("downloading handpose model from {url} to {}", dest.display());

    let mut response = Client::new()
        .get(url)
        .send()
        .context("failed to start model download")?
        .error_for_status()
        .context("model download returned error status")?;

    let total = response.content_length();
    on_event(DownloadEvent::Started { total });
    stream_to_path(&mut response, total, dest, on_event)?;
    on_event(DownloadEvent::Finished);
    Ok(())
}

/// Copies `reader` into `dest` through a sibling `.download` file, which is
/// removed again if the copy fails.
fn stream_to_path<R, F>(
    reader: &mut R,
    total: Option<u64>,
    dest: &Path,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    R: Read,
    F: FnMut(DownloadEvent),
{
    // Write beside the destination so a partial download never looks complete.
    let tmp_path = dest.with_extension("download");
    let result = write_partial(reader, total, &tmp_path, on_event).and_then(|()| {
        fs::rename(&tmp_path, dest).with_context(|| {
            format!(
                "failed to move {} into place at {}",
                tmp_path.display(),
                dest.display()
            )
        })
    });
    if result.is_err() && tmp_path.exists() {
        if let Err(err) = fs::remove_file(&tmp_path) {
            log::warn!("failed to remove partial download {}: {err}", tmp_path.display());
        }
    }
    result
}

fn write_partial<R, F>(
    reader: &mut R,
    total: Option<u64>,
    tmp_path: &Path,
    on_event: &mut F,
) -> anyhow::Result<()>
where
    R: Read,
    F: FnMut(DownloadEvent),
{
    let mut file = fs::File::create(tmp_path)
        .with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; 16 * 1024];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .context("failed while reading model bytes")?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])
            .context("failed while writing model to disk")?;
        downloaded += bytes_read as u64;
        on_event(DownloadEvent::Progress { downloaded, total });
    }

    file.sync_all()
        .context("failed to flush downloaded model to disk")
}

fn create_progress_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            ) {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb
        }
        _ => {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} downloading model") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        }
    }
}
