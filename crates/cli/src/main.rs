mod bears;
mod cli;
mod config;
mod loader;
mod terminal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use ursa_core::BearInstance;
use ursa_engine::Engine;

use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::terminal::Terminal;

fn main() -> Result<()> {
    ursa_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();
    let registry = bears::registry();

    if args.list_bears {
        terminal.print_bears(&registry)?;
        return Ok(());
    }

    let config = CliConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    let mut engine_config = config.engine.clone();
    args.apply_to(&mut engine_config);
    engine_config.log_summary();

    let names: Vec<String> = if !args.bears.is_empty() {
        args.bears.clone()
    } else if !config.bears.is_empty() {
        config.bears.clone()
    } else {
        registry.names().into_iter().map(String::from).collect()
    };

    let files = Arc::new(loader::load_dir(&args.path)?);
    let section = Arc::new(config.section(&args.settings));

    let instances = names
        .iter()
        .map(|name| {
            let bear = registry
                .get(name)
                .with_context(|| format!("unknown bear '{name}' (try --list-bears)"))?;
            BearInstance::new(Arc::clone(bear), Arc::clone(&section), Arc::clone(&files))
                .with_context(|| format!("failed to configure {name}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let engine = Engine::new(engine_config, registry).context("failed to start engine")?;
    info!(bears = ?names, files = files.len(), "starting run");

    let mut stdout = io::stdout().lock();
    let mut write_error: Option<io::Error> = None;
    let report = engine.run_with(instances, |output| {
        if write_error.is_some() {
            return;
        }
        let written = serde_json::to_writer(&mut stdout, output)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(stdout));
        if let Err(e) = written {
            write_error = Some(e);
        }
    })?;
    if let Some(e) = write_error {
        return Err(e).context("failed to write results");
    }
    stdout.flush()?;

    terminal.print_summary(&report)?;
    if report.aborted {
        bail!("run aborted after a failure");
    }
    Ok(())
}
