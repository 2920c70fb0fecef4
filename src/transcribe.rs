use std::{
    ffi::{c_int, c_void},
    path::Path,
};

use anyhow::{Result, anyhow};
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters, WhisperVadParams};

use crate::{
    config::{
        DEFAULT_BEAM_SIZE, DEFAULT_MIN_SILENCE_MS, DEFAULT_PATIENCE, Device, WhisperOptions,
    },
    decode,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptSegment {
    pub start: i64, // milliseconds
    pub end: i64,   // milliseconds
    pub text: String,
}

/// Thin pointer target for the whisper.cpp C progress callback; `&dyn Fn` is
/// fat and cannot cross the FFI boundary directly.
struct ProgressTrampoline<'a> {
    on_progress: &'a (dyn Fn(i32) + Sync),
}

unsafe extern "C" fn whisper_progress_callback(
    _ctx: *mut c_void,
    _state: *mut c_void,
    progress: c_int,
    user_data: *mut c_void,
) {
    if !user_data.is_null() {
        unsafe {
            let trampoline = &*(user_data as *const ProgressTrampoline);
            (trampoline.on_progress)(progress as i32);
        }
    }
}

pub struct Whisper {
    ctx: WhisperContext,
}

impl Whisper {
    /// Load the ggml weights at `model_path`. `Device::Cuda` enables GPU
    /// inference when compiled with the `cuda` feature.
    pub fn new(model_path: &Path, device: Device) -> Result<Self> {
        let model_path = model_path
            .to_str()
            .ok_or_else(|| anyhow!("invalid model path"))?;

        let mut param = WhisperContextParameters::default();
        param.use_gpu(device == Device::Cuda);

        let ctx = WhisperContext::new_with_params(model_path, param)?;

        Ok(Self { ctx })
    }

    /// Run the model over `audio` and return timestamped segments. Language
    /// is auto-detected. `on_progress` observes whisper.cpp progress in the
    /// 0-100 range.
    pub fn transcribe<P: AsRef<Path>>(
        &mut self,
        audio: P,
        conf: &WhisperOptions,
        vad_model: Option<&Path>,
        on_progress: &(dyn Fn(i32) + Sync),
    ) -> Result<Vec<TranscriptSegment>> {
        let mut params = FullParams::new(whisper_rs::SamplingStrategy::BeamSearch {
            beam_size: conf.beam_size.unwrap_or(DEFAULT_BEAM_SIZE) as c_int,
            patience: conf.patience.unwrap_or(DEFAULT_PATIENCE),
        });

        if conf.vad.unwrap_or(true) {
            let vad_model = vad_model.ok_or_else(|| anyhow!("VAD enabled but no VAD model"))?;

            let mut vad_params = WhisperVadParams::new();
            vad_params.set_min_speech_duration(150);
            vad_params
                .set_min_silence_duration(conf.min_silence_ms.unwrap_or(DEFAULT_MIN_SILENCE_MS) as _);
            vad_params.set_speech_pad(30);
            params.set_no_context(true);

            params.set_vad_params(vad_params);
            params.set_vad_model_path(Some(
                vad_model.to_str().ok_or_else(|| anyhow!("invalid path"))?,
            ));
            params.enable_vad(true);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(false);

        params.set_language(Some("auto"));
        match conf.initial_prompt.as_ref() {
            Some(prompt) => params.set_initial_prompt(prompt),
            None => {}
        }

        // Route whisper.cpp progress to the caller's closure
        let trampoline = ProgressTrampoline { on_progress };
        unsafe {
            params.set_progress_callback(Some(std::mem::transmute(
                whisper_progress_callback as *const (),
            )));
            params.set_progress_callback_user_data(
                &trampoline as *const ProgressTrampoline as *mut c_void,
            );
        }

        let audio = decode::read_file(audio)?;

        let mut state = self.ctx.create_state()?;
        state.full(params, &audio)?;

        let num_segments = state.full_n_segments();
        if num_segments < 1 {
            return Err(anyhow!("no segments found"));
        }

        let mut segments = Vec::with_capacity(num_segments as usize);

        for segment in state.as_iter() {
            let text = segment.to_str_lossy()?.to_string();
            // whisper.cpp timestamps are 10 ms ticks
            let start = segment.start_timestamp() * 10;
            let end = segment.end_timestamp() * 10;

            segments.push(TranscriptSegment { start, end, text });
        }

        Ok(segments)
    }
}
