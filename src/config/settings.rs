use std::collections::BTreeMap;
use std::fs;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::defaults;

/// Top-level configuration for logwarden.
/// Deserializes from a TOML configuration file; every section is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,

    #[serde(default = "defaults::default_ingest_config")]
    pub ingest: IngestConfig,

    #[serde(default = "defaults::default_suspicion_config")]
    pub suspicion: SuspicionConfig,

    #[serde(default = "defaults::default_rate_limit_config")]
    pub rate_limit: RateLimitConfig,

    #[serde(default = "defaults::default_bot_config")]
    pub bot: BotConfig,

    #[serde(default = "defaults::default_volume_config")]
    pub volume: VolumeConfig,

    #[serde(default = "defaults::default_scoring_config")]
    pub scoring: ScoringConfig,

    #[serde(default = "defaults::default_prefix_config")]
    pub prefix: PrefixConfig,

    #[serde(default = "defaults::default_location_config")]
    pub location: LocationConfig,

    #[serde(default)]
    pub geo: GeoConfig,

    #[serde(default = "defaults::default_report_config")]
    pub report: ReportConfig,
}

impl Settings {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        settings
            .validate()
            .with_context(|| format!("Invalid config file: {}", path))?;
        Ok(settings)
    }

    /// Reject values that would make the scoring stages meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.window_secs == 0 {
            bail!("rate_limit.window_secs must be greater than zero");
        }
        if self.ingest.ipv4_prefix_len > 32 {
            bail!("ingest.ipv4_prefix_len must be at most 32, got {}", self.ingest.ipv4_prefix_len);
        }
        if self.ingest.ipv6_prefix_len > 128 {
            bail!("ingest.ipv6_prefix_len must be at most 128, got {}", self.ingest.ipv6_prefix_len);
        }
        let v = &self.volume;
        if !(v.low_bound < v.medium_bound && v.medium_bound < v.high_bound) {
            bail!(
                "volume bounds must be strictly increasing ({} < {} < {})",
                v.low_bound,
                v.medium_bound,
                v.high_bound
            );
        }
        for network in self.geo.countries.keys() {
            if network.parse::<ipnet::IpNet>().is_err() && network.parse::<std::net::IpAddr>().is_err() {
                bail!("geo.countries key is neither an address nor a CIDR block: {}", network);
            }
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: defaults::default_logging_config(),
            ingest: defaults::default_ingest_config(),
            suspicion: defaults::default_suspicion_config(),
            rate_limit: defaults::default_rate_limit_config(),
            bot: defaults::default_bot_config(),
            volume: defaults::default_volume_config(),
            scoring: defaults::default_scoring_config(),
            prefix: defaults::default_prefix_config(),
            location: defaults::default_location_config(),
            geo: GeoConfig::default(),
            report: defaults::default_report_config(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    pub level: String,

    /// Optional log file; stderr is always written.
    #[serde(default)]
    pub file: Option<String>,
}

/// Ingestion and profile-construction configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "defaults::default_workers")]
    pub workers: usize,

    #[serde(default = "defaults::default_ipv4_prefix_len")]
    pub ipv4_prefix_len: u8,

    #[serde(default = "defaults::default_ipv6_prefix_len")]
    pub ipv6_prefix_len: u8,
}

/// A-priori suspicion rule applied while profiles are built.
#[derive(Debug, Clone, Deserialize)]
pub struct SuspicionConfig {
    /// Profiles with more requests than this are suspicious.
    #[serde(default = "defaults::default_suspicion_request_threshold")]
    pub request_threshold: u64,

    /// Any agent containing one of these (case-insensitive) marks the profile suspicious.
    #[serde(default = "defaults::default_suspicion_agent_markers")]
    pub agent_markers: Vec<String>,
}

/// Which instant the sliding rate-limit window ends at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
    /// Latest timestamp seen anywhere in the log.
    LatestRecord,
    /// Current wall-clock time.
    WallClock,
}

/// Sliding-window rate-limit check configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "defaults::default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "defaults::default_max_requests")]
    pub max_requests: usize,

    #[serde(default = "defaults::default_window_anchor")]
    pub anchor: WindowAnchor,
}

/// User-agent classification markers and point values.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    #[serde(default = "defaults::default_safe_bot_markers")]
    pub safe_bot_markers: Vec<String>,

    #[serde(default = "defaults::default_tool_markers")]
    pub tool_markers: Vec<String>,

    #[serde(default = "defaults::default_unknown_bot_markers")]
    pub unknown_bot_markers: Vec<String>,

    #[serde(default = "defaults::default_min_agent_len")]
    pub min_agent_len: usize,

    /// Distinct agent count above which the diversity bonus applies.
    #[serde(default = "defaults::default_diversity_threshold")]
    pub diversity_threshold: usize,

    #[serde(default = "defaults::default_tool_score")]
    pub tool_score: u32,

    #[serde(default = "defaults::default_unknown_bot_score")]
    pub unknown_bot_score: u32,

    #[serde(default = "defaults::default_safe_bot_score")]
    pub safe_bot_score: u32,

    #[serde(default = "defaults::default_weird_agent_score")]
    pub weird_agent_score: u32,

    #[serde(default = "defaults::default_diversity_score")]
    pub diversity_score: u32,
}

/// Traffic-volume buckets (request count upper bounds, exclusive).
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeConfig {
    #[serde(default = "defaults::default_volume_low_bound")]
    pub low_bound: u64,

    #[serde(default = "defaults::default_volume_medium_bound")]
    pub medium_bound: u64,

    #[serde(default = "defaults::default_volume_high_bound")]
    pub high_bound: u64,

    #[serde(default = "defaults::default_volume_scores")]
    pub scores: [u32; 4],
}

/// Flag-driven signal scores.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "defaults::default_suspicious_score")]
    pub suspicious_score: u32,

    #[serde(default = "defaults::default_rate_limit_score")]
    pub rate_limit_score: u32,
}

/// Prefix-anomaly signal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefixConfig {
    #[serde(default = "defaults::default_prefix_threshold")]
    pub threshold: u64,

    #[serde(default = "defaults::default_prefix_penalty")]
    pub penalty: u32,
}

/// Geolocation signal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "defaults::default_high_risk_countries")]
    pub high_risk_countries: Vec<String>,

    #[serde(default = "defaults::default_unresolved_score")]
    pub unresolved_score: u32,

    #[serde(default = "defaults::default_high_risk_score")]
    pub high_risk_score: u32,
}

/// Static country table: address or CIDR block -> ISO country code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeoConfig {
    #[serde(default)]
    pub countries: BTreeMap<String, String>,
}

/// Output format of the risk report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Text,
    Json,
}

/// Risk report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Number of rows to print; 0 prints every profile.
    #[serde(default = "defaults::default_report_top")]
    pub top: usize,

    #[serde(default)]
    pub min_score: u32,

    #[serde(default = "defaults::default_report_format")]
    pub format: ReportFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.rate_limit.window_secs, 60);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.prefix.threshold, 500);
        assert_eq!(settings.prefix.penalty, 10);
        assert_eq!(settings.bot.tool_score, 40);
        assert_eq!(settings.rate_limit.anchor, WindowAnchor::LatestRecord);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [prefix]
            threshold = 1000

            [geo.countries]
            "203.0.113.0/24" = "RU"
            "198.51.100.7" = "us"
            "#,
        )
        .unwrap();
        assert_eq!(settings.prefix.threshold, 1000);
        assert_eq!(settings.prefix.penalty, 10);
        assert_eq!(settings.geo.countries.len(), 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut settings = Settings::default();
        settings.rate_limit.window_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_ipv4_prefix() {
        let mut settings = Settings::default();
        settings.ingest.ipv4_prefix_len = 32;
        assert!(settings.validate().is_ok());
        settings.ingest.ipv4_prefix_len = 33;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_ipv6_prefix() {
        let mut settings = Settings::default();
        settings.ingest.ipv6_prefix_len = 128;
        assert!(settings.validate().is_ok());
        settings.ingest.ipv6_prefix_len = 129;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_volume_bounds() {
        let mut settings = Settings::default();
        settings.volume.medium_bound = settings.volume.low_bound;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.volume.high_bound = settings.volume.low_bound - 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_geo_key() {
        let mut settings = Settings::default();
        settings.geo.countries.insert("not-a-network".into(), "RU".into());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Settings::load("/nonexistent/logwarden.toml").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logwarden.toml");
        std::fs::write(&path, "[report]\nformat = \"json\"\ntop = 5\n").unwrap();
        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.report.format, ReportFormat::Json);
        assert_eq!(settings.report.top, 5);
    }
}
