use std::path::PathBuf;
use std::thread;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};

use crate::config::Settings;
use crate::model;
use crate::transcribe::{TranscriptSegment, Whisper};

/// Messages sent from the worker thread to the UI.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    DownloadProgress(u64, Option<u64>),
    TranscribeProgress(i32),
    Done(Vec<TranscriptSegment>),
    Error(String),
}

/// Parameters for a transcription job.
pub struct JobParams {
    pub audio_path: PathBuf,
    pub settings: Settings,
}

/// Spawn a background transcription worker. The UI drains the returned
/// channel from its polling subscription.
pub fn spawn(params: JobParams) -> Receiver<WorkerMessage> {
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();

    thread::spawn(move || {
        if let Err(e) = run_job(&tx, params) {
            let _ = tx.send(WorkerMessage::Error(format!("{e:#}")));
        }
    });

    rx
}

fn run_job(tx: &Sender<WorkerMessage>, mut params: JobParams) -> Result<()> {
    params.settings.apply_device_fallback();
    let settings = &params.settings;

    // Model downloads are async; the worker thread runs them on its own
    // single-threaded runtime.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let tx_dl = tx.clone();
    let model_path = rt.block_on(model::ensure_model(
        &settings.models_dir,
        settings.model,
        settings.compute_type,
        move |downloaded, total| {
            let _ = tx_dl.send(WorkerMessage::DownloadProgress(downloaded, total));
        },
    ))?;

    let vad_path = if settings.whisper.vad.unwrap_or(true) {
        let tx_dl = tx.clone();
        let path = rt.block_on(model::ensure_vad_model(
            &settings.models_dir,
            move |downloaded, total| {
                let _ = tx_dl.send(WorkerMessage::DownloadProgress(downloaded, total));
            },
        ))?;
        Some(path)
    } else {
        None
    };

    let mut whisper = Whisper::new(&model_path, settings.device)?;

    let tx_progress = tx.clone();
    let segments = whisper.transcribe(
        &params.audio_path,
        &settings.whisper,
        vad_path.as_deref(),
        &move |progress| {
            let _ = tx_progress.send(WorkerMessage::TranscribeProgress(progress));
        },
    )?;

    let _ = tx.send(WorkerMessage::Done(segments));
    Ok(())
}
