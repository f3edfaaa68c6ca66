use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub consent: ConsentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the inference service
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Sample rate used for answer recordings
    pub sample_rate: u32,
    /// Channel count (1 = mono)
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsentConfig {
    /// Where the consent record is persisted
    pub record_path: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Load from file, falling back to defaults when the file is absent
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config {} not loaded ({}), using defaults", path, e);
                Self::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://localhost:8000".to_string(),
            },
            audio: AudioConfig {
                sample_rate: 16000, // Whisper expects 16kHz
                channels: 1,        // Mono
            },
            consent: ConsentConfig {
                record_path: "data/consent.json".to_string(),
            },
        }
    }
}
