//! Configuration loading and resolution.
//!
//! Parses `dwatch.toml` (or an override path provided by the binary) into a
//! `ConfigFile`. Every section and field is optional; missing values take the
//! defaults below, and a missing or unparsable file yields the defaults
//! entirely. Unknown fields are ignored.
//!
//! ```toml
//! [watch]
//! interval_ms = 1000
//! timeout_ms = 0        # 0: same as the interval
//! seconds = 0           # 0: run until quit
//! banner = true
//! multiple_commands = false
//!
//! [display]
//! style = "value"
//! diff = true
//! drop_zero = false
//! color = true
//!
//! [tokenizer]
//! heuristic = "extended"
//! shape = "strict"
//! ```
//!
//! `Config::resolve` turns the names into typed settings. An unknown name is
//! logged under the `config` target and replaced by its default.

use anyhow::Result;
use core_render::DisplayPolicy;
use core_state::ShapeMatch;
use core_text::Heuristic;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

const FILE_NAME: &str = "dwatch.toml";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
    pub seconds: u64,
    pub banner: bool,
    pub multiple_commands: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_ms: 0,
            seconds: 0,
            banner: true,
            multiple_commands: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    pub style: String,
    pub diff: bool,
    pub drop_zero: bool,
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            style: DisplayPolicy::default().name().to_string(),
            diff: true,
            drop_zero: false,
            color: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TokenizerConfig {
    pub heuristic: String,
    pub shape: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::default().name().to_string(),
            shape: ShapeMatch::default().name().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

/// Fully typed settings after name resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub interval: Duration,
    pub timeout: Duration,
    pub run_for: Option<Duration>,
    pub banner: bool,
    pub multiple_commands: bool,
    pub policy: DisplayPolicy,
    pub diff_mode: bool,
    pub drop_zero: bool,
    pub color: bool,
    pub heuristic: Heuristic,
    pub shape: ShapeMatch,
}

/// Local `dwatch.toml` first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("dwatch").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

fn resolve_name<T: Copy + Default>(
    kind: &'static str,
    name: &str,
    lookup: impl Fn(&str) -> Option<T>,
) -> T {
    lookup(name).unwrap_or_else(|| {
        warn!(target: "config", kind, name, "unknown_name_using_default");
        T::default()
    })
}

impl Config {
    pub fn resolve(&self) -> Settings {
        let watch = &self.file.watch;
        let display = &self.file.display;
        let tokenizer = &self.file.tokenizer;

        let interval = Duration::from_millis(watch.interval_ms.max(1));
        let timeout = match watch.timeout_ms {
            0 => interval,
            ms => Duration::from_millis(ms),
        };
        let run_for = (watch.seconds > 0).then(|| Duration::from_secs(watch.seconds));

        Settings {
            interval,
            timeout,
            run_for,
            banner: watch.banner,
            multiple_commands: watch.multiple_commands,
            policy: resolve_name("style", &display.style, DisplayPolicy::from_name),
            diff_mode: display.diff,
            drop_zero: display.drop_zero,
            color: display.color,
            heuristic: resolve_name("heuristic", &tokenizer.heuristic, Heuristic::from_name),
            shape: resolve_name("shape", &tokenizer.shape, ShapeMatch::from_name),
        }
    }
}
