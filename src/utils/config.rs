use std::fs::{self, File};
use std::io::{Write, BufRead, BufReader};
use std::path::{Path, PathBuf};
use anyhow::{Result, Context, anyhow};
use tracing::{debug, info};

use crate::media::transcoder::Dimensions;

pub const DEFAULT_CONFIG_FILE: &str = ".env";

const KEYS: [&str; 4] = [
    "VQATS_TRANSCODER",
    "VQATS_SCORER",
    "VQATS_RESIZE",
    "VQATS_RESIZE_SUFFIX",
];

/// Tool locations and resize behavior for one run. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub transcoder: PathBuf,
    pub scorer: PathBuf,
    /// `None` disables resizing.
    pub resize: Option<Dimensions>,
    pub resize_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcoder: PathBuf::from("ffmpeg"),
            scorer: PathBuf::from("vqats"),
            resize: Some(Dimensions { width: 160, height: 120 }),
            resize_suffix: "resized.mpg".to_string(),
        }
    }
}

/// Main entry point to get the run configuration.
/// An explicit `path` must exist and hold only `KEY=VALUE` lines. Otherwise
/// `.env` is read if present; since other tools share that file, lines that
/// are not `KEY=VALUE` are skipped there.
pub fn resolve(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = load_from_file(path, Config::default(), true)
                .with_context(|| format!("Failed to load config file {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            Ok(config)
        }
        None => {
            let env_path = Path::new(DEFAULT_CONFIG_FILE);
            if env_path.is_file() {
                let config = load_from_file(env_path, Config::default(), false)
                    .context("Failed to load .env")?;
                info!("Loaded configuration from .env");
                Ok(config)
            } else {
                debug!("No .env found, using built-in defaults");
                Ok(Config::default())
            }
        }
    }
}

/// `"160x120"` enables resizing, an empty string disables it.
pub fn parse_resize(value: &str) -> Result<Option<Dimensions>> {
    let value = value.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

/// Applies `KEY=VALUE` lines from `path` on top of `base`. Unknown keys are ignored.
/// With `strict`, any other non-comment line is an error; without, it is skipped.
fn load_from_file(path: &Path, base: Config, strict: bool) -> Result<Config> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config = base;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            if strict {
                return Err(anyhow!("Line {}: expected KEY=VALUE", number + 1));
            }
            debug!("Skipping line {} of {:?}: not KEY=VALUE", number + 1, path);
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "VQATS_TRANSCODER" => config.transcoder = PathBuf::from(value),
            "VQATS_SCORER" => config.scorer = PathBuf::from(value),
            "VQATS_RESIZE" => {
                config.resize = parse_resize(value)
                    .with_context(|| format!("Line {}: invalid VQATS_RESIZE", number + 1))?
            }
            "VQATS_RESIZE_SUFFIX" => {
                if value.is_empty() {
                    return Err(anyhow!("Line {}: VQATS_RESIZE_SUFFIX must not be empty", number + 1));
                }
                config.resize_suffix = value.to_string()
            }
            other => debug!("Ignoring unknown config key '{}'", other),
        }
    }

    Ok(config)
}

/// Writes `config` as `KEY=VALUE` lines, the format `resolve` reads back.
pub fn write_config<W: Write>(out: &mut W, config: &Config) -> Result<()> {
    writeln!(out, "VQATS_TRANSCODER={}", config.transcoder.display())?;
    writeln!(out, "VQATS_SCORER={}", config.scorer.display())?;
    writeln!(
        out,
        "VQATS_RESIZE={}",
        config.resize.map(|d| d.to_string()).unwrap_or_default()
    )?;
    writeln!(out, "VQATS_RESIZE_SUFFIX={}", config.resize_suffix)?;
    Ok(())
}

/// Writes `config` into `path`, keeping every line of an existing file that is not one of our keys.
pub fn save_to_file(path: &Path, config: &Config) -> Result<()> {
    let kept: Vec<String> = if path.is_file() {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?
            .lines()
            .filter(|line| !is_own_key(line))
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let mut file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    for line in &kept {
        writeln!(file, "{}", line)?;
    }
    write_config(&mut file, config)
}

fn is_own_key(line: &str) -> bool {
    line.split_once('=')
        .map(|(key, _)| KEYS.contains(&key.trim()))
        .unwrap_or(false)
}
