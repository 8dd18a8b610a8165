//! Auto-buy replay tool
//!
//! Feeds recorded OCR detection batches through the rule engine at the
//! configured frame rate and prints every dispatched action as a JSON line.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use autobuy_engine::automation::{default_config_path, load_config_or_default, start_runner};
use autobuy_engine::{ActionCommand, Detection, logging, paths};

#[derive(Parser)]
#[command(name = "autobuy")]
#[command(about = "Replays OCR detection batches through the auto-buy rule engine", long_about = None)]
struct Cli {
    /// Path to the configuration file (default: config.json next to the executable)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detection batches, one JSON line per frame (default: stdin)
    input: Option<PathBuf>,
}

/// One line of replay input: a bare array or an object wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchLine {
    Bare(Vec<Detection>),
    Wrapped { detections: Vec<Detection> },
}

/// Parses one replay line. Returns `Ok(None)` for blank lines.
fn parse_batch_line(line: &str) -> Result<Option<Vec<Detection>>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let batch: BatchLine = serde_json::from_str(line).context("Invalid detection batch")?;
    Ok(Some(match batch {
        BatchLine::Bare(detections) | BatchLine::Wrapped { detections } => detections,
    }))
}

/// Writes one command as a JSON line on stdout.
fn print_command(command: ActionCommand) {
    let mut out = io::stdout().lock();
    match serde_json::to_string(&command) {
        Ok(json) => {
            if let Err(e) = writeln!(out, "{}", json) {
                warn!("Failed to write command for rule '{}': {}", command.rule_id, e);
            }
        }
        Err(e) => warn!("Failed to serialize command for rule '{}': {}", command.rule_id, e),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Cannot create logs directory: {}", e);
    }
    logging::init_logging(&paths::get_log_file())?;

    // Route panics through the log as well as stderr
    std::panic::set_hook(Box::new(|panic_info| {
        error!("[PANIC] {}", panic_info);
    }));

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = load_config_or_default(&config_path);
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(config.frames_per_second.max(1)));

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            info!("Replaying {}", path.display());
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => {
            info!("Replaying stdin");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    let runner = start_runner(config, print_command)?;

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read replay input")?;
        match parse_batch_line(&line) {
            Ok(Some(detections)) => {
                if !runner.submit(detections) {
                    warn!("Runner stopped, ending replay at line {}", number + 1);
                    break;
                }
                thread::sleep(frame_interval);
            }
            Ok(None) => {}
            Err(e) => warn!("Line {} skipped: {:#}", number + 1, e),
        }
    }

    let summary = runner.finish();
    info!("Replay complete: {}", summary);
    Ok(())
}
