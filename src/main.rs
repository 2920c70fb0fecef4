mod config;
mod decode;
mod gui;
mod model;
mod output;
mod transcribe;

use anyhow::{Context, anyhow};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::config::{ComputeType, Device, ModelSize, Settings};
use crate::transcribe::Whisper;

#[derive(Parser)]
#[command(name = "quickscribe")]
#[command(about = "Transcribe audio with whisper.cpp", long_about = None)]
struct Cli {
    /// Launch the graphical interface
    #[arg(long)]
    gui: bool,

    /// Path to the audio file
    #[arg(long = "audio_path")]
    audio_path: Option<PathBuf>,

    /// Model size: tiny, base, small, medium, large-v3 (default: large-v3)
    #[arg(long)]
    model: Option<ModelSize>,

    /// Device to use: cuda or cpu (default: cuda)
    #[arg(long)]
    device: Option<Device>,

    /// Compute type: float16 or int8 (default: float16)
    #[arg(long = "compute_type")]
    compute_type: Option<ComputeType>,

    /// Output file path (optional; a .json extension saves raw segments)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let file_config = config::load_app_config().context("Failed to load app config")?;
    let mut settings = Settings::resolve(cli.model, cli.device, cli.compute_type, file_config)?;

    if cli.gui {
        return gui::run(settings).map_err(|e| anyhow!("GUI error: {}", e));
    }

    let audio_path = cli.audio_path.ok_or_else(|| {
        anyhow!("Please provide an audio path or use --gui for the graphical interface")
    })?;
    let audio_path = audio_path
        .canonicalize()
        .with_context(|| format!("Audio file not found at {:?}", audio_path))?;

    settings.apply_device_fallback();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_batch(&settings, &audio_path, cli.output.as_deref()))
}

async fn run_batch(
    settings: &Settings,
    audio_path: &Path,
    output_path: Option<&Path>,
) -> anyhow::Result<()> {
    // 1. Fetch models (no-op when already cached)
    let dl_pb = ProgressBar::new(settings.model.size_mb() * 1_048_576);
    dl_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let model_path = model::ensure_model(
        &settings.models_dir,
        settings.model,
        settings.compute_type,
        |downloaded, total| {
            if let Some(total) = total {
                dl_pb.set_length(total);
            }
            dl_pb.set_position(downloaded);
        },
    )
    .await?;

    let vad_path = if settings.whisper.vad.unwrap_or(true) {
        let path = model::ensure_vad_model(&settings.models_dir, |downloaded, total| {
            if let Some(total) = total {
                dl_pb.set_length(total);
            }
            dl_pb.set_position(downloaded);
        })
        .await?;
        Some(path)
    } else {
        None
    };
    dl_pb.finish_and_clear();

    // 2. Transcribe
    println!("Transcribing...");

    let mut whisper =
        Whisper::new(&model_path, settings.device).context("Failed to load model")?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let segments = whisper
        .transcribe(audio_path, &settings.whisper, vad_path.as_deref(), &|p| {
            pb.set_position(p as u64)
        })
        .context("Failed to transcribe")?;

    pb.finish_with_message("Transcription complete");

    // 3. Print and optionally save
    println!("{}", output::render(&segments));

    if let Some(path) = output_path {
        output::save_transcript(path, &segments)?;
        println!("Saved transcript to {:?}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_accepts_all_flags() {
        let cli = Cli::parse_from([
            "quickscribe",
            "--audio_path",
            "a.mp3",
            "--model",
            "small",
            "--device",
            "cpu",
            "--compute_type",
            "int8",
            "--output",
            "out.txt",
        ]);
        assert!(!cli.gui);
        assert_eq!(cli.audio_path, Some(PathBuf::from("a.mp3")));
        assert_eq!(cli.model, Some(ModelSize::Small));
        assert_eq!(cli.device, Some(Device::Cpu));
        assert_eq!(cli.compute_type, Some(ComputeType::Int8));
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn cli_gui_needs_no_audio_path() {
        let cli = Cli::parse_from(["quickscribe", "--gui"]);
        assert!(cli.gui);
        assert!(cli.audio_path.is_none());
    }
}
