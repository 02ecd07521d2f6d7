//! Loader for Mimic configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added; `MIMIC_`-prefixed
//! environment variables (nested keys separated by `__`) always win, so
//! `MIMIC_HUMANIZE__TYPO_PROBABILITY=0.05` overrides `humanize.typo_probability`.
//! String values may reference other variables as `${VAR}`.
//!
//! ```yaml
//! version: "1"
//! humanize:
//!   typing_wpm: { min: 45, max: 70 }
//!   typo_probability: 0.03
//!   scroll_chunk: { min: 60, max: 180 }
//!   viewport: { width: 1440, height: 900 }
//! logging:
//!   format: json
//!   emit_stderr: true
//!   dir: "${HOME}/.local/share/mimic"
//! ```
use config::{Config, ConfigError, Environment, File};
use mimic_common::observability::{LogConfig, LogFormat};
use mimic_common::HumanizeConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "MIMIC";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    pub version: Option<String>,
    pub humanize: HumanizeConfig,
    pub logging: LoggingSettings,
}

/// The `logging` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub emit_stderr: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: false,
            filter: "info".to_string(),
            dir: None,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

/// `<config dir>/mimic/mimic.yaml`, e.g. `~/.config/mimic/mimic.yaml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mimic").join("mimic.yaml"))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                *s = expand_bounded(std::mem::take(s));
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Expand `${VAR}` repeatedly until stable, giving up after a fixed depth so
/// self-referencing variables terminate.
fn expand_bounded(mut cur: String) -> String {
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let expanded = match shellexpand::env(&cur) {
            Ok(cow) => cow.into_owned(),
            Err(_) => return cur,
        };
        if expanded == cur {
            break;
        }
        cur = expanded;
    }
    cur
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct MimicConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for MimicConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MimicConfigLoader {
    /// Start from built-in defaults with `MIMIC_` env overrides.
    ///
    /// ```
    /// use mimic_config::MimicConfigLoader;
    ///
    /// let config = MimicConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.humanize.typo_probability, 0.02);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred from
    /// the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is skipped when missing, so deployments can rely on
    /// environment variables alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use mimic_common::Span;
    /// use mimic_config::MimicConfigLoader;
    ///
    /// let cfg = MimicConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// humanize:
    ///   typing_wpm: { min: 55, max: 65 }
    ///   overshoot_chance: 0.5
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.humanize.typing_wpm, Span::new(55, 65));
    /// assert_eq!(cfg.humanize.overshoot_chance, 0.5);
    /// // Untouched fields keep their defaults.
    /// assert_eq!(cfg.humanize.scroll_chunk, Span::new(50, 200));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// Values are not normalized here; the engine repairs out-of-range values
    /// when it is constructed.
    pub fn load(self) -> Result<MimicConfig, ConfigError> {
        // Environment goes last so it overrides every file and snippet.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
