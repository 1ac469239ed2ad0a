use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::analytics::collector::IngestStats;
use crate::config::settings::{ReportConfig, ReportFormat};
use crate::models::profile::{IpProfile, RiskComponents};

/// One ranked line of the risk report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub rank: usize,
    pub address: String,
    pub prefix: String,
    pub country: Option<String>,
    pub requests: u64,
    pub score: u32,
    pub components: RiskComponents,
    pub volume: u32,
    pub suspicious: bool,
    pub limit_exceeded: bool,
}

/// Ranked risk report over scored profiles.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub window_end: DateTime<FixedOffset>,
    pub ingest: IngestStats,
    pub parse_error_rate: f64,
    pub profiles_total: usize,
    pub profiles_flagged: usize,
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Build from profiles already ranked highest risk first.
    ///
    /// Profiles below `min_score` are dropped, then the list is cut to `top`
    /// rows (0 keeps everything). Unscored profiles count as score 0.
    pub fn build(
        ranked: &[IpProfile],
        ingest: IngestStats,
        window_end: DateTime<FixedOffset>,
        config: &ReportConfig,
    ) -> Self {
        let limit = if config.top == 0 { usize::MAX } else { config.top };
        let flagged = ranked.iter().filter(|p| p.risk_score() > 0).count();

        let rows = ranked
            .iter()
            .filter(|p| p.risk_score() >= config.min_score)
            .take(limit)
            .enumerate()
            .map(|(i, p)| {
                let risk = p.risk.unwrap_or_default();
                ReportRow {
                    rank: i + 1,
                    address: p.address.clone(),
                    prefix: p.prefix.clone(),
                    country: p.country.clone(),
                    requests: p.request_count,
                    score: risk.score,
                    components: risk.components,
                    volume: risk.volume,
                    suspicious: p.is_suspicious,
                    limit_exceeded: p.is_limit_exceeded,
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            window_end,
            ingest,
            parse_error_rate: ingest.parse_error_rate(),
            profiles_total: ranked.len(),
            profiles_flagged: flagged,
            rows,
        }
    }

    pub fn write<W: Write>(&self, out: &mut W, format: ReportFormat) -> Result<()> {
        match format {
            ReportFormat::Text => self.write_text(out),
            ReportFormat::Json => self.write_json(out),
        }
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self).context("Failed to serialize report")?;
        writeln!(out).context("Failed to write report")?;
        Ok(())
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        self.render_text(out).context("Failed to write report")
    }

    fn render_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(
            out,
            "lines={} parsed={} skipped={} blank={} parse_errors={:.1}%",
            self.ingest.lines,
            self.ingest.parsed,
            self.ingest.skipped,
            self.ingest.blank,
            self.parse_error_rate * 100.0
        )?;
        writeln!(
            out,
            "profiles={} flagged={} window_end={}",
            self.profiles_total,
            self.profiles_flagged,
            self.window_end.to_rfc3339()
        )?;
        writeln!(out)?;

        writeln!(
            out,
            "{:>4}  {:<39}  {:<4}  {:>8}  {:>5}  {:>4}  {:>4}  {:>4}  {:>4}  {:>4}  {:>4}  {}",
            "#", "address", "cc", "requests", "score", "bot", "susp", "rate", "pfx", "loc", "vol", "flags"
        )?;

        for row in &self.rows {
            let c = &row.components;
            writeln!(
                out,
                "{:>4}  {:<39}  {:<4}  {:>8}  {:>5}  {:>4}  {:>4}  {:>4}  {:>4}  {:>4}  {:>4}  {}",
                row.rank,
                row.address,
                row.country.as_deref().unwrap_or("-"),
                row.requests,
                row.score,
                c.bot,
                c.suspicious,
                c.rate_limit,
                c.prefix,
                c.location,
                row.volume,
                flags(row),
            )?;
        }

        if self.rows.is_empty() {
            writeln!(out, "(no profiles at or above the score threshold)")?;
        }
        Ok(())
    }
}

fn flags(row: &ReportRow) -> String {
    let mut flags = Vec::new();
    if row.suspicious {
        flags.push("suspicious");
    }
    if row.limit_exceeded {
        flags.push("rate_limited");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_report_config;
    use crate::models::profile::RiskAssessment;

    fn scored(addr: &str, bot: u32, suspicious: bool) -> IpProfile {
        let mut p = IpProfile::new(addr, "10.0.0.0/24");
        p.request_count = 3;
        p.is_suspicious = suspicious;
        let components = RiskComponents {
            bot,
            suspicious: if suspicious { 30 } else { 0 },
            ..Default::default()
        };
        p.risk = Some(RiskAssessment::new(components, 0));
        p
    }

    fn window_end() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-07-14T08:00:00+00:00").unwrap()
    }

    fn ranked() -> Vec<IpProfile> {
        vec![scored("10.0.0.1", 40, true), scored("10.0.0.2", 10, false), scored("10.0.0.3", 0, false)]
    }

    #[test]
    fn test_build_filters_and_ranks() {
        let mut config = default_report_config();
        config.min_score = 10;
        let report = Report::build(&ranked(), IngestStats::default(), window_end(), &config);
        assert_eq!(report.profiles_total, 3);
        assert_eq!(report.profiles_flagged, 2);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].rank, 1);
        assert_eq!(report.rows[0].score, 70);
        assert_eq!(report.rows[1].address, "10.0.0.2");
    }

    #[test]
    fn test_top_limits_rows() {
        let mut config = default_report_config();
        config.top = 1;
        let report = Report::build(&ranked(), IngestStats::default(), window_end(), &config);
        assert_eq!(report.rows.len(), 1);

        config.top = 0;
        let report = Report::build(&ranked(), IngestStats::default(), window_end(), &config);
        assert_eq!(report.rows.len(), 3);
    }

    #[test]
    fn test_text_output() {
        let report = Report::build(&ranked(), IngestStats::default(), window_end(), &default_report_config());
        let mut out = Vec::new();
        report.write(&mut out, ReportFormat::Text).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("profiles=3 flagged=2"));
        assert!(text.contains("10.0.0.1"));
        assert!(text.contains("suspicious"));
        assert_eq!(text.lines().count(), 3 + 1 + 3);
    }

    #[test]
    fn test_json_output() {
        let report = Report::build(&ranked(), IngestStats::default(), window_end(), &default_report_config());
        let mut out = Vec::new();
        report.write(&mut out, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["profiles_total"], 3);
        assert_eq!(value["rows"][0]["address"], "10.0.0.1");
        assert_eq!(value["rows"][0]["components"]["bot"], 40);
        assert_eq!(value["rows"][0]["components"]["suspicious"], 30);
        assert_eq!(value["rows"][0]["score"], 70);
        assert_eq!(value["rows"][2]["country"], serde_json::Value::Null);
    }

    #[test]
    fn test_empty_report_text() {
        let report = Report::build(&[], IngestStats::default(), window_end(), &default_report_config());
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("no profiles"));
    }
}
