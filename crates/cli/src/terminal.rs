use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use ursa_engine::{BearRegistry, RunReport};

/// Color scheme for stderr output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const OK: Color = Color::Green;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Human-facing output on stderr; stdout stays machine-readable.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// List registered bears with their granularity and parameters.
    pub fn print_bears(&self, registry: &BearRegistry) -> Result<()> {
        let mut stderr = io::stderr();
        for name in registry.names() {
            let Some(bear) = registry.get(name) else {
                continue;
            };
            let spec = bear.spec();
            let params: Vec<&str> = spec.params().iter().map(|p| p.name.as_str()).collect();
            execute!(
                stderr,
                SetForegroundColor(Colors::HEADER),
                Print(format!("{name:<20}")),
                ResetColor,
                Print(format!(" {:<10}", spec.granularity().tag())),
                SetForegroundColor(Colors::DIM),
                Print(format!(" params: [{}]\n", params.join(", "))),
                ResetColor,
            )?;
        }
        stderr.flush()?;
        Ok(())
    }

    /// Print failures and run statistics.
    pub fn print_summary(&self, report: &RunReport) -> Result<()> {
        let mut stderr = io::stderr();
        for failure in report.failures() {
            execute!(
                stderr,
                SetForegroundColor(Colors::ERROR),
                Print(format!("[failed] {}: {}\n", failure.unit, failure.error)),
                ResetColor,
            )?;
        }

        let stats = &report.stats;
        let (color, status) = if report.aborted {
            (Colors::ERROR, "aborted")
        } else if stats.failures > 0 {
            (Colors::ERROR, "finished with failures")
        } else {
            (Colors::OK, "ok")
        };
        execute!(
            stderr,
            SetForegroundColor(color),
            Print(format!("run {status}")),
            ResetColor,
            SetForegroundColor(Colors::DIM),
            Print(format!(
                " | {} results, {} failures, {} units, {} cache hits, {:.1?}\n",
                report.results().count(),
                stats.failures,
                stats.units_dispatched,
                stats.cache_hits,
                stats.elapsed,
            )),
            ResetColor,
        )?;
        if !report.unfinished.is_empty() {
            execute!(
                stderr,
                SetForegroundColor(Colors::DIM),
                Print(format!("never ran: {}\n", report.unfinished.join(", "))),
                ResetColor,
            )?;
        }
        stderr.flush()?;
        Ok(())
    }
}
