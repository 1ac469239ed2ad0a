use super::settings::{
    BotConfig, IngestConfig, LocationConfig, LoggingConfig, PrefixConfig, RateLimitConfig,
    ReportConfig, ReportFormat, ScoringConfig, SuspicionConfig, VolumeConfig, WindowAnchor,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// LoggingConfig defaults
// ---------------------------------------------------------------------------

pub fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file: None,
    }
}

pub fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// IngestConfig defaults
// ---------------------------------------------------------------------------

pub fn default_ingest_config() -> IngestConfig {
    IngestConfig {
        workers: default_workers(),
        ipv4_prefix_len: default_ipv4_prefix_len(),
        ipv6_prefix_len: default_ipv6_prefix_len(),
    }
}

pub fn default_workers() -> usize {
    num_cpus()
}

pub fn default_ipv4_prefix_len() -> u8 { 24 }
pub fn default_ipv6_prefix_len() -> u8 { 48 }

// ---------------------------------------------------------------------------
// SuspicionConfig defaults
// ---------------------------------------------------------------------------

pub fn default_suspicion_config() -> SuspicionConfig {
    SuspicionConfig {
        request_threshold: default_suspicion_request_threshold(),
        agent_markers: default_suspicion_agent_markers(),
    }
}

pub fn default_suspicion_request_threshold() -> u64 { 10_000 }

pub fn default_suspicion_agent_markers() -> Vec<String> {
    strings(&["bot", "crawl", "spider", "slurp", "archive", "checker"])
}

// ---------------------------------------------------------------------------
// RateLimitConfig defaults
// ---------------------------------------------------------------------------

pub fn default_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        window_secs: default_window_secs(),
        max_requests: default_max_requests(),
        anchor: default_window_anchor(),
    }
}

pub fn default_window_secs() -> u64 { 60 }
pub fn default_max_requests() -> usize { 100 }
pub fn default_window_anchor() -> WindowAnchor { WindowAnchor::LatestRecord }

// ---------------------------------------------------------------------------
// BotConfig defaults
// ---------------------------------------------------------------------------

pub fn default_bot_config() -> BotConfig {
    BotConfig {
        safe_bot_markers: default_safe_bot_markers(),
        tool_markers: default_tool_markers(),
        unknown_bot_markers: default_unknown_bot_markers(),
        min_agent_len: default_min_agent_len(),
        diversity_threshold: default_diversity_threshold(),
        tool_score: default_tool_score(),
        unknown_bot_score: default_unknown_bot_score(),
        safe_bot_score: default_safe_bot_score(),
        weird_agent_score: default_weird_agent_score(),
        diversity_score: default_diversity_score(),
    }
}

pub fn default_safe_bot_markers() -> Vec<String> {
    strings(&["google", "bing", "yandex", "baiduspider"])
}

pub fn default_tool_markers() -> Vec<String> {
    strings(&["python", "curl", "wget", "requests", "scrapy", "aiohttp"])
}

pub fn default_unknown_bot_markers() -> Vec<String> {
    strings(&["bot", "spider", "crawl"])
}

pub fn default_min_agent_len() -> usize { 10 }
pub fn default_diversity_threshold() -> usize { 10 }
pub fn default_tool_score() -> u32 { 40 }
pub fn default_unknown_bot_score() -> u32 { 25 }
pub fn default_safe_bot_score() -> u32 { 10 }
pub fn default_weird_agent_score() -> u32 { 20 }
pub fn default_diversity_score() -> u32 { 15 }

// ---------------------------------------------------------------------------
// VolumeConfig defaults
// ---------------------------------------------------------------------------

pub fn default_volume_config() -> VolumeConfig {
    VolumeConfig {
        low_bound: default_volume_low_bound(),
        medium_bound: default_volume_medium_bound(),
        high_bound: default_volume_high_bound(),
        scores: default_volume_scores(),
    }
}

pub fn default_volume_low_bound() -> u64 { 1_000 }
pub fn default_volume_medium_bound() -> u64 { 5_000 }
pub fn default_volume_high_bound() -> u64 { 10_000 }
pub fn default_volume_scores() -> [u32; 4] { [0, 10, 20, 40] }

// ---------------------------------------------------------------------------
// ScoringConfig / PrefixConfig / LocationConfig defaults
// ---------------------------------------------------------------------------

pub fn default_scoring_config() -> ScoringConfig {
    ScoringConfig {
        suspicious_score: default_suspicious_score(),
        rate_limit_score: default_rate_limit_score(),
    }
}

pub fn default_suspicious_score() -> u32 { 30 }
pub fn default_rate_limit_score() -> u32 { 30 }

pub fn default_prefix_config() -> PrefixConfig {
    PrefixConfig {
        threshold: default_prefix_threshold(),
        penalty: default_prefix_penalty(),
    }
}

pub fn default_prefix_threshold() -> u64 { 500 }
pub fn default_prefix_penalty() -> u32 { 10 }

pub fn default_location_config() -> LocationConfig {
    LocationConfig {
        high_risk_countries: default_high_risk_countries(),
        unresolved_score: default_unresolved_score(),
        high_risk_score: default_high_risk_score(),
    }
}

pub fn default_high_risk_countries() -> Vec<String> {
    strings(&["RU", "CN", "KP", "IR", "NG", "BR", "VN"])
}

pub fn default_unresolved_score() -> u32 { 20 }
pub fn default_high_risk_score() -> u32 { 25 }

// ---------------------------------------------------------------------------
// ReportConfig defaults
// ---------------------------------------------------------------------------

pub fn default_report_config() -> ReportConfig {
    ReportConfig {
        top: default_report_top(),
        min_score: 0,
        format: default_report_format(),
    }
}

pub fn default_report_top() -> usize { 25 }
pub fn default_report_format() -> ReportFormat { ReportFormat::Text }

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Return the number of logical CPUs, falling back to 4 if detection fails.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
