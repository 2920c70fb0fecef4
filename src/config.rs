use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    LargeV3,
}

impl ModelSize {
    pub const ALL: &[ModelSize] = &[
        ModelSize::Tiny,
        ModelSize::Base,
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::LargeV3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::LargeV3 => "large-v3",
        }
    }

    /// ggml weights filename in the ggerganov/whisper.cpp repository.
    /// `int8` compute selects the q8_0 quantized variant.
    pub fn ggml_filename(&self, compute: ComputeType) -> String {
        match compute {
            ComputeType::Float16 => format!("ggml-{}.bin", self.as_str()),
            ComputeType::Int8 => format!("ggml-{}-q8_0.bin", self.as_str()),
        }
    }

    /// Approximate download size of the float16 weights, for messages.
    pub fn size_mb(&self) -> u64 {
        match self {
            ModelSize::Tiny => 75,
            ModelSize::Base => 142,
            ModelSize::Small => 466,
            ModelSize::Medium => 1500,
            ModelSize::LargeV3 => 3100,
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large-v3" => Ok(ModelSize::LargeV3),
            _ => Err(format!(
                "unknown model size: {}. Use tiny, base, small, medium, or large-v3",
                s
            )),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    pub const ALL: &[Device] = &[Device::Cuda, Device::Cpu];

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cuda" => Ok(Device::Cuda),
            "cpu" => Ok(Device::Cpu),
            _ => Err(format!("unknown device: {}. Use cuda or cpu", s)),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ComputeType {
    Float16,
    Int8,
}

impl ComputeType {
    pub const ALL: &[ComputeType] = &[ComputeType::Float16, ComputeType::Int8];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeType::Float16 => "float16",
            ComputeType::Int8 => "int8",
        }
    }
}

impl std::fmt::Display for ComputeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComputeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float16" => Ok(ComputeType::Float16),
            "int8" => Ok(ComputeType::Int8),
            _ => Err(format!("unknown compute type: {}. Use float16 or int8", s)),
        }
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(ModelSize);
string_serde!(Device);
string_serde!(ComputeType);

/// Knobs passed through to whisper.cpp. Defaults mirror the tool's
/// historical fixed arguments: beam size 5, VAD on with 500 ms minimum
/// silence.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct WhisperOptions {
    pub beam_size: Option<u32>,
    pub patience: Option<f32>,
    pub vad: Option<bool>,
    pub min_silence_ms: Option<u32>,
    pub initial_prompt: Option<String>,
}

pub const DEFAULT_BEAM_SIZE: u32 = 5;
pub const DEFAULT_PATIENCE: f32 = 1.0;
pub const DEFAULT_MIN_SILENCE_MS: u32 = 500;

/// Optional `~/.quickscribe/config.yaml`.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub models_dir: Option<PathBuf>,
    pub model: Option<ModelSize>,
    pub device: Option<Device>,
    pub compute_type: Option<ComputeType>,
    pub whisper: Option<WhisperOptions>,
}

pub fn load_app_config() -> anyhow::Result<Option<AppConfig>> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let config_path = home.join(".quickscribe/config.yaml");

    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {:?}", config_path))?;
    let config: AppConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {:?}", config_path))?;
    Ok(Some(config))
}

pub fn default_models_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".quickscribe/models"))
}

/// Fully resolved run settings: CLI flag beats config file beats built-in
/// default.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model: ModelSize,
    pub device: Device,
    pub compute_type: ComputeType,
    pub models_dir: PathBuf,
    pub whisper: WhisperOptions,
}

impl Settings {
    pub fn resolve(
        model: Option<ModelSize>,
        device: Option<Device>,
        compute_type: Option<ComputeType>,
        file: Option<AppConfig>,
    ) -> anyhow::Result<Settings> {
        let file = file.unwrap_or_default();

        let models_dir = match file.models_dir {
            Some(dir) => dir,
            None => default_models_dir()?,
        };

        Ok(Settings {
            model: model.or(file.model).unwrap_or(ModelSize::LargeV3),
            device: device.or(file.device).unwrap_or(Device::Cuda),
            compute_type: compute_type
                .or(file.compute_type)
                .unwrap_or(ComputeType::Float16),
            models_dir,
            whisper: file.whisper.unwrap_or_default(),
        })
    }

    /// CUDA requested without GPU support compiled in falls back to
    /// cpu + int8.
    pub fn apply_device_fallback(&mut self) {
        let (device, compute) = resolve_device(self.device, self.compute_type);
        self.device = device;
        self.compute_type = compute;
    }
}

pub fn resolve_device(device: Device, compute: ComputeType) -> (Device, ComputeType) {
    if device == Device::Cuda && !cfg!(feature = "cuda") {
        log::warn!("CUDA not available. Falling back to CPU with int8 compute");
        return (Device::Cpu, ComputeType::Int8);
    }
    (device, compute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_size_round_trips() {
        for size in ModelSize::ALL {
            assert_eq!(size.as_str().parse::<ModelSize>(), Ok(*size));
        }
        assert!("large".parse::<ModelSize>().is_err());
    }

    #[test]
    fn ggml_filename_per_compute() {
        assert_eq!(
            ModelSize::LargeV3.ggml_filename(ComputeType::Float16),
            "ggml-large-v3.bin"
        );
        assert_eq!(
            ModelSize::Tiny.ggml_filename(ComputeType::Int8),
            "ggml-tiny-q8_0.bin"
        );
    }

    #[test]
    fn device_and_compute_parse() {
        assert_eq!("cuda".parse::<Device>(), Ok(Device::Cuda));
        assert_eq!("cpu".parse::<Device>(), Ok(Device::Cpu));
        assert!("mps".parse::<Device>().is_err());
        assert_eq!("float16".parse::<ComputeType>(), Ok(ComputeType::Float16));
        assert_eq!("int8".parse::<ComputeType>(), Ok(ComputeType::Int8));
        assert!("bf16".parse::<ComputeType>().is_err());
    }

    #[test]
    fn settings_precedence_flag_beats_file() {
        let file = AppConfig {
            model: Some(ModelSize::Base),
            device: Some(Device::Cpu),
            ..Default::default()
        };
        let settings = Settings::resolve(Some(ModelSize::Small), None, None, Some(file)).unwrap();
        assert_eq!(settings.model, ModelSize::Small);
        assert_eq!(settings.device, Device::Cpu);
        assert_eq!(settings.compute_type, ComputeType::Float16);
    }

    #[test]
    fn settings_defaults_without_file() {
        let settings = Settings::resolve(None, None, None, None).unwrap();
        assert_eq!(settings.model, ModelSize::LargeV3);
        assert_eq!(settings.device, Device::Cuda);
        assert_eq!(settings.compute_type, ComputeType::Float16);
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn cuda_fallback_forces_int8() {
        assert_eq!(
            resolve_device(Device::Cuda, ComputeType::Float16),
            (Device::Cpu, ComputeType::Int8)
        );
        assert_eq!(
            resolve_device(Device::Cpu, ComputeType::Float16),
            (Device::Cpu, ComputeType::Float16)
        );
    }

    #[test]
    fn config_yaml_parses() {
        let yaml = "model: small\ndevice: cpu\ncompute_type: int8\nwhisper:\n  beam_size: 3\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.model, Some(ModelSize::Small));
        assert_eq!(config.device, Some(Device::Cpu));
        assert_eq!(config.compute_type, Some(ComputeType::Int8));
        assert_eq!(config.whisper.unwrap().beam_size, Some(3));
    }
}
