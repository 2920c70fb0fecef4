use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{ComputeType, ModelSize};

const WHISPER_HF_REPO: &str = "ggerganov/whisper.cpp";

/// Silero VAD weights, converted to ggml by the whisper.cpp project.
const VAD_HF_REPO: &str = "ggml-org/whisper-vad";
const VAD_FILENAME: &str = "ggml-silero-v5.1.2.bin";

pub fn hf_url(repo: &str, filename: &str) -> String {
    format!("https://huggingface.co/{}/resolve/main/{}", repo, filename)
}

/// Resolve the ggml weights for (size, compute) under `models_dir`,
/// downloading from Hugging Face if missing. The progress callback receives
/// (bytes_downloaded, total_bytes); total is None when Content-Length is
/// absent.
pub async fn ensure_model<F>(
    models_dir: &Path,
    model: ModelSize,
    compute: ComputeType,
    on_progress: F,
) -> Result<PathBuf>
where
    F: FnMut(u64, Option<u64>),
{
    let filename = model.ggml_filename(compute);
    let url = hf_url(WHISPER_HF_REPO, &filename);
    ensure_file(models_dir, &filename, &url, on_progress)
        .await
        .with_context(|| format!("Failed to fetch model {}", filename))
}

pub async fn ensure_vad_model<F>(models_dir: &Path, on_progress: F) -> Result<PathBuf>
where
    F: FnMut(u64, Option<u64>),
{
    let url = hf_url(VAD_HF_REPO, VAD_FILENAME);
    ensure_file(models_dir, VAD_FILENAME, &url, on_progress)
        .await
        .context("Failed to fetch VAD model")
}

/// Staging path used while a download is in flight.
pub fn part_path(models_dir: &Path, filename: &str) -> PathBuf {
    models_dir.join(format!("{}.part", filename))
}

async fn ensure_file<F>(
    models_dir: &Path,
    filename: &str,
    url: &str,
    mut on_progress: F,
) -> Result<PathBuf>
where
    F: FnMut(u64, Option<u64>),
{
    let target = models_dir.join(filename);
    if target.exists() {
        log::debug!("{} already present, skipping download", filename);
        return Ok(target);
    }

    std::fs::create_dir_all(models_dir)
        .with_context(|| format!("Failed to create {:?}", models_dir))?;

    log::info!("Downloading {} from {}", filename, url);

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(anyhow!("download failed: HTTP {}", response.status()));
    }

    let total = response.content_length();
    let staging = part_path(models_dir, filename);
    let mut file = std::fs::File::create(&staging)
        .with_context(|| format!("Failed to create {:?}", staging))?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        on_progress(downloaded, total);
    }
    file.flush()?;
    drop(file);

    std::fs::rename(&staging, &target)
        .with_context(|| format!("Failed to move {:?} into place", staging))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hf_url_shape() {
        assert_eq!(
            hf_url(WHISPER_HF_REPO, "ggml-base.bin"),
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin"
        );
    }

    #[test]
    fn part_path_appends_suffix() {
        let staging = part_path(Path::new("/tmp/models"), "ggml-base.bin");
        assert_eq!(staging, Path::new("/tmp/models/ggml-base.bin.part"));
    }

    #[tokio::test]
    async fn existing_file_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let filename = ModelSize::Tiny.ggml_filename(ComputeType::Float16);
        std::fs::write(dir.path().join(&filename), b"weights").unwrap();

        let mut called = false;
        let path = ensure_model(dir.path(), ModelSize::Tiny, ComputeType::Float16, |_, _| {
            called = true;
        })
        .await
        .unwrap();

        assert_eq!(path, dir.path().join(filename));
        assert!(!called);
    }
}
