use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, trace, warn};

use crate::analytics::collector::IngestStats;

use super::line_parser::parse_line;
use super::profile_builder::ProfileBuilder;

/// Parse-error share above which a warning is logged once reading ends.
const PARSE_ERROR_WARN_RATE: f64 = 0.10;

/// Feed every line of `reader` through the parser into `builder`.
///
/// Unparseable lines are skipped and counted. Bytes that are not valid
/// UTF-8 are replaced rather than aborting the read.
pub async fn read_log<R>(reader: R, builder: &mut ProfileBuilder) -> Result<IngestStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = reader;
    let mut stats = IngestStats::default();
    let mut buf = Vec::with_capacity(512);

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read log input")?;
        if n == 0 {
            break;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);

        if line.trim().is_empty() {
            stats.record_blank();
            continue;
        }

        match parse_line(line) {
            Some(record) => {
                trace!(
                    ip = %record.source_ip,
                    request = %record.request_line,
                    status = %record.status_code,
                    size = %record.response_size,
                    referer = %record.referer,
                    "Parsed record"
                );
                stats.record_parsed(record.has_offset());
                builder.push(&record);
            }
            None => {
                stats.record_skipped();
                trace!(line_no = stats.lines, "Skipping unparseable line");
            }
        }
    }

    Ok(stats)
}

/// Read a log file from disk; `-` reads stdin.
pub async fn read_log_file(path: &Path, builder: &mut ProfileBuilder) -> Result<IngestStats> {
    let stats = if path.as_os_str() == "-" {
        read_log(BufReader::new(tokio::io::stdin()), builder).await?
    } else {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        read_log(BufReader::new(file), builder)
            .await
            .with_context(|| format!("Failed to read log file: {}", path.display()))?
    };

    info!(
        path = %path.display(),
        lines = stats.lines,
        parsed = stats.parsed,
        skipped = stats.skipped,
        "Log ingested"
    );
    if stats.parse_error_rate() > PARSE_ERROR_WARN_RATE {
        warn!(
            path = %path.display(),
            rate = format!("{:.1}%", stats.parse_error_rate() * 100.0),
            "High share of unparseable lines; check the log format"
        );
    }

    Ok(stats)
}
