mod error;
mod eval;
mod media;
mod prepare;
mod utils;
#[cfg(test)]
mod testing;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, Level};

use crate::eval::Evaluator;
use crate::media::runner::SystemRunner;
use crate::media::transcoder::Transcoder;
use crate::utils::config::{self, Config};

const BIN: &str = "vqats-harness";

/// Printed in place of a score when the evaluation fails for any reason.
const SENTINEL_SCORE: f64 = -1.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Prepare videos as frame manifests and score them with VQATS", long_about = None)]
struct Cli {
    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract a video's frames and write their manifest into a folder
    Prepare {
        video: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        tools: ToolArgs,
    },

    /// Score a test video against a reference video
    Eval {
        refvideo: PathBuf,
        testvideo: PathBuf,

        #[command(flatten)]
        tools: ToolArgs,

        /// Path to the scorer binary
        #[arg(long)]
        scorer: Option<PathBuf>,

        /// Resize both videos to WxH first; an empty value disables resizing
        #[arg(long)]
        resize: Option<String>,

        /// Suffix appended to a video path to name its resized copy
        #[arg(long)]
        suffix: Option<String>,

        /// Print the result as a JSON object instead of `vqats = <score>`
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration as KEY=VALUE lines
    Config {
        #[command(flatten)]
        tools: ToolArgs,

        /// Also write it to .env
        #[arg(long)]
        save: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ToolArgs {
    /// KEY=VALUE configuration file (default: .env if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the ffmpeg-compatible transcoder
    #[arg(long)]
    transcoder: Option<PathBuf>,
}

#[derive(Serialize)]
struct EvalReport<'a> {
    reference: &'a Path,
    test: &'a Path,
    vqats: f64,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            eprintln!("{}", syntax_message());
            return ExitCode::from(1);
        }
    };

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    match cli.command {
        Commands::Prepare { video, output, tools } => match run_prepare(&video, &output, &tools) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Preparation failed: {:#}", e);
                ExitCode::from(1)
            }
        },
        Commands::Eval {
            refvideo,
            testvideo,
            tools,
            scorer,
            resize,
            suffix,
            json,
        } => {
            let score = run_eval(&refvideo, &testvideo, &tools, scorer, resize, suffix);
            // Always a single parseable line: failures become the sentinel.
            let line = match score {
                Ok(score) if json => report_json(&refvideo, &testvideo, score.value),
                Ok(score) => format!("vqats = {}", score),
                Err(e) => {
                    error!("Evaluation failed: {:#}", e);
                    if json {
                        report_json(&refvideo, &testvideo, SENTINEL_SCORE)
                    } else {
                        format!("vqats = {}", SENTINEL_SCORE)
                    }
                }
            };
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Commands::Config { tools, save } => match run_config(&tools, save) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{:#}", e);
                ExitCode::from(1)
            }
        },
    }
}

fn run_prepare(video: &Path, output: &Path, tools: &ToolArgs) -> Result<()> {
    let config = resolve_config(tools)?;
    let transcoder = Transcoder::new(&config.transcoder);
    let manifest = prepare::prepare(video, output, &transcoder, &SystemRunner)?;
    info!("Wrote manifest {:?} ({} frames)", manifest.path, manifest.len());
    Ok(())
}

fn run_eval(
    reference: &Path,
    test: &Path,
    tools: &ToolArgs,
    scorer: Option<PathBuf>,
    resize: Option<String>,
    suffix: Option<String>,
) -> Result<eval::score::Score> {
    let mut config = resolve_config(tools)?;
    if let Some(scorer) = scorer {
        config.scorer = scorer;
    }
    if let Some(resize) = resize {
        config.resize = config::parse_resize(&resize).context("Invalid --resize")?;
    }
    if let Some(suffix) = suffix {
        anyhow::ensure!(!suffix.is_empty(), "--suffix must not be empty");
        config.resize_suffix = suffix;
    }

    let runner = SystemRunner;
    let score = Evaluator::new(&config, &runner).evaluate(reference, test)?;
    Ok(score)
}

fn run_config(tools: &ToolArgs, save: bool) -> Result<()> {
    let config = resolve_config(tools)?;
    config::write_config(&mut io::stdout().lock(), &config)?;
    io::stdout().flush()?;
    if save {
        config::save_to_file(Path::new(config::DEFAULT_CONFIG_FILE), &config)?;
        info!("Saved configuration to {}", config::DEFAULT_CONFIG_FILE);
    }
    Ok(())
}

fn resolve_config(tools: &ToolArgs) -> Result<Config> {
    let mut config = config::resolve(tools.config.as_deref())?;
    if let Some(transcoder) = &tools.transcoder {
        config.transcoder = transcoder.clone();
    }
    Ok(config)
}

fn report_json(reference: &Path, test: &Path, vqats: f64) -> String {
    let report = EvalReport { reference, test, vqats };
    serde_json::to_string(&report).unwrap_or_else(|_| format!("{{\"vqats\":{}}}", vqats))
}

/// One-line usage for whichever subcommand the user was reaching for.
fn syntax_message() -> String {
    let subcommand = std::env::args_os()
        .skip(1)
        .filter_map(|a| a.into_string().ok())
        .find(|a| !a.starts_with('-'));
    match subcommand.as_deref() {
        Some("prepare") => format!("Syntax: {} prepare <video-file> <output-folder>", BIN),
        Some("eval") => format!("Syntax: {} eval <refvideo> <testvideo>", BIN),
        Some("config") => format!("Syntax: {} config [--save]", BIN),
        _ => format!("Syntax: {} <prepare|eval|config> ...", BIN),
    }
}
