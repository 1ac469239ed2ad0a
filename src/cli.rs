use std::path::PathBuf;

use clap::Parser;

use crate::config::settings::{ReportFormat, Settings};

/// Score source addresses in web access logs for bot, scraper and
/// rate-limit risk.
#[derive(Debug, Parser)]
#[command(name = "logwarden", version, about)]
pub struct Cli {
    /// Access log files to read; `-` reads stdin.
    #[arg(required = true, value_name = "LOG")]
    pub logs: Vec<PathBuf>,

    /// TOML configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, env = "LOGWARDEN_CONFIG", value_name = "PATH")]
    pub config: Option<String>,

    /// Report format; overrides `report.format`.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Rows to print, 0 for all; overrides `report.top`.
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Hide profiles scoring below this; overrides `report.min_score`.
    #[arg(long)]
    pub min_score: Option<u32>,

    /// Write the report here instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Fold command-line overrides into the loaded report settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(format) = self.format {
            settings.report.format = format;
        }
        if let Some(top) = self.top {
            settings.report.top = top;
        }
        if let Some(min_score) = self.min_score {
            settings.report.min_score = min_score;
        }
    }
}
