use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Itemized risk sub-scores, one named field per signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskComponents {
    pub bot: u32,
    pub suspicious: u32,
    pub rate_limit: u32,
    pub prefix: u32,
    pub location: u32,
}

impl RiskComponents {
    /// Sum of all five components, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        [self.suspicious, self.rate_limit, self.prefix, self.location]
            .into_iter()
            .fold(self.bot, u32::saturating_add)
    }
}

/// Result of one aggregator run over a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskAssessment {
    pub components: RiskComponents,

    /// Always `components.total()`.
    pub score: u32,

    /// Traffic-volume signal. Reported, never part of `score`.
    pub volume: u32,
}

impl RiskAssessment {
    pub fn new(components: RiskComponents, volume: u32) -> Self {
        Self {
            score: components.total(),
            components,
            volume,
        }
    }
}

/// Per-source-IP aggregate of request records plus resolved metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct IpProfile {
    pub address: String,

    /// Network block the address belongs to (e.g. `172.18.0.0/24`).
    pub prefix: String,

    pub request_count: u64,

    /// Observation order.
    pub request_times: Vec<DateTime<FixedOffset>>,

    /// Observation order, duplicates kept.
    pub user_agents: Vec<String>,

    pub is_suspicious: bool,

    pub is_limit_exceeded: bool,

    /// Upper-case country code; `None` when unresolved.
    pub country: Option<String>,

    /// Written only by the aggregator.
    pub risk: Option<RiskAssessment>,
}

impl IpProfile {
    pub fn new(address: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            prefix: prefix.into(),
            request_count: 0,
            request_times: Vec::new(),
            user_agents: Vec::new(),
            is_suspicious: false,
            is_limit_exceeded: false,
            country: None,
            risk: None,
        }
    }

    /// Record one observed request.
    pub fn observe(&mut self, at: DateTime<FixedOffset>, user_agent: &str) {
        self.request_count += 1;
        self.request_times.push(at);
        self.user_agents.push(user_agent.to_string());
    }

    /// Set the country, normalizing blank values to `None` and codes to upper case.
    pub fn set_country(&mut self, country: Option<&str>) {
        self.country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);
    }

    /// Final score, or 0 for a profile the aggregator has not seen.
    pub fn risk_score(&self) -> u32 {
        self.risk.map(|r| r.score).unwrap_or(0)
    }
}
