use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Suppress status messages on stderr (same as `--quiet`)
    #[serde(default)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Tracing filter directive, e.g. "faststart_media=debug".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Largest input accepted, in bytes. The whole file is held in memory
    /// twice while relocating.
    #[serde(default = "default_max_input_size")]
    pub max_input_size: u64,
}

fn default_max_input_size() -> u64 {
    4 * 1024 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_size: default_max_input_size(),
        }
    }
}
