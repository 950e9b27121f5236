use std::path::PathBuf;

use clap::Parser;
use ursa_core::{EngineConfig, ExecutorKind};

/// Run analysis bears over a directory.
///
/// Every result and failure is printed to stdout as one JSON object per
/// line; logs and the run summary go to stderr.
#[derive(Parser, Debug)]
#[command(name = "ursa", about = "Run analysis bears over a directory")]
pub struct CliArgs {
    /// Directory to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Bear to run (repeatable). Defaults to the config's list, else all bears.
    #[arg(short, long = "bear")]
    pub bears: Vec<String>,

    /// Bear setting as key=value (repeatable)
    #[arg(short, long = "set", value_parser = parse_setting)]
    pub settings: Vec<(String, String)>,

    /// Worker threads (0 = available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Run every unit on the calling thread
    #[arg(long)]
    pub inline: bool,

    /// Per-unit timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Stop dispatching after the first failure
    #[arg(long)]
    pub abort_on_failure: bool,

    /// Path to config file (default: ~/.config/ursa/config.toml)
    #[arg(long, env = "URSA_CONFIG")]
    pub config: Option<String>,

    /// List the built-in bears and exit
    #[arg(long)]
    pub list_bears: bool,
}

impl CliArgs {
    /// Apply command-line overrides on top of file and environment settings.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if let Some(workers) = self.workers {
            config.worker_threads = workers;
        }
        if self.inline {
            config.executor = ExecutorKind::Inline;
        }
        if let Some(timeout) = self.timeout_ms {
            config.unit_timeout_ms = Some(timeout);
        }
        if self.abort_on_failure {
            config.abort_on_failure = true;
        }
    }
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
