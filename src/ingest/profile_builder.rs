use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, Utc};
use ipnet::IpNet;
use tracing::{debug, info};

use crate::config::settings::{RateLimitConfig, Settings, SuspicionConfig, WindowAnchor};
use crate::models::profile::IpProfile;
use crate::models::request::RequestRecord;
use crate::scoring::prefix::PrefixCounter;
use crate::scoring::rate_limit::SlidingWindow;

use super::geo::CountryTable;

/// Network block for an address literal, e.g. `172.18.0.0/24`.
///
/// Addresses that do not parse are their own prefix.
pub fn derive_prefix(address: &str, ipv4_len: u8, ipv6_len: u8) -> String {
    let ip: IpAddr = match address.parse() {
        Ok(ip) => ip,
        Err(_) => return address.to_string(),
    };
    let len = match ip {
        IpAddr::V4(_) => ipv4_len,
        IpAddr::V6(_) => ipv6_len,
    };
    IpNet::new(ip, len)
        .map(|net| net.trunc().to_string())
        .unwrap_or_else(|_| address.to_string())
}

/// Profiles ready for scoring plus the prefix totals they share.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub profiles: Vec<IpProfile>,
    pub prefix_counter: PrefixCounter,
    /// Instant the rate-limit window ended at.
    pub evaluated_at: DateTime<FixedOffset>,
}

/// Groups request records into one profile per source address.
///
/// Profiles keep first-seen order; timestamps and agents keep observation
/// order. Derived fields (prefix, country, suspicion, rate-limit flag) are
/// resolved once in `finish`.
pub struct ProfileBuilder {
    index: HashMap<String, usize>,
    profiles: Vec<IpProfile>,
    latest: Option<DateTime<FixedOffset>>,
    ipv4_prefix_len: u8,
    ipv6_prefix_len: u8,
    suspicion: SuspicionConfig,
    rate_limit: RateLimitConfig,
    countries: CountryTable,
}

impl ProfileBuilder {
    pub fn new(settings: &Settings, countries: CountryTable) -> Self {
        let mut suspicion = settings.suspicion.clone();
        suspicion.agent_markers = suspicion
            .agent_markers
            .iter()
            .map(|m| m.to_lowercase())
            .collect();

        Self {
            index: HashMap::new(),
            profiles: Vec::new(),
            latest: None,
            ipv4_prefix_len: settings.ingest.ipv4_prefix_len,
            ipv6_prefix_len: settings.ingest.ipv6_prefix_len,
            suspicion,
            rate_limit: settings.rate_limit.clone(),
            countries,
        }
    }

    pub fn push(&mut self, record: &RequestRecord) {
        let idx = match self.index.get(&record.source_ip) {
            Some(&idx) => idx,
            None => {
                let prefix = derive_prefix(&record.source_ip, self.ipv4_prefix_len, self.ipv6_prefix_len);
                self.profiles.push(IpProfile::new(record.source_ip.clone(), prefix));
                self.index.insert(record.source_ip.clone(), self.profiles.len() - 1);
                self.profiles.len() - 1
            }
        };

        self.profiles[idx].observe(record.timestamp, &record.user_agent);

        if self.latest.map_or(true, |latest| record.timestamp > latest) {
            self.latest = Some(record.timestamp);
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Resolve derived fields and build the prefix totals.
    pub fn finish(self) -> ProfileSet {
        let evaluated_at = match self.rate_limit.anchor {
            WindowAnchor::LatestRecord => self.latest.unwrap_or_else(|| Utc::now().fixed_offset()),
            WindowAnchor::WallClock => Utc::now().fixed_offset(),
        };
        self.finish_at(evaluated_at)
    }

    /// Same as `finish` with an explicit rate-limit evaluation instant.
    pub fn finish_at(mut self, evaluated_at: DateTime<FixedOffset>) -> ProfileSet {
        let window = SlidingWindow::from_config(&self.rate_limit);
        let mut suspicious = 0usize;
        let mut limited = 0usize;

        for profile in self.profiles.iter_mut() {
            profile.set_country(self.countries.lookup_country(&profile.address));
            profile.is_suspicious = is_suspicious(profile, &self.suspicion);
            window.apply(profile, evaluated_at);

            if profile.is_suspicious {
                suspicious += 1;
                debug!(ip = %profile.address, requests = profile.request_count, "Profile flagged suspicious");
            }
            if profile.is_limit_exceeded {
                limited += 1;
            }
        }

        let prefix_counter = PrefixCounter::from_profiles(&self.profiles);

        info!(
            profiles = self.profiles.len(),
            prefixes = prefix_counter.len(),
            suspicious,
            rate_limited = limited,
            evaluated_at = %evaluated_at,
            "Profiles built"
        );

        ProfileSet {
            profiles: self.profiles,
            prefix_counter,
            evaluated_at,
        }
    }
}

/// A-priori suspicion: very busy, or announcing itself as automated.
/// `markers` are expected in lower case.
fn is_suspicious(profile: &IpProfile, config: &SuspicionConfig) -> bool {
    if profile.request_count > config.request_threshold {
        return true;
    }
    profile.user_agents.iter().any(|ua| {
        let lower = ua.to_lowercase();
        config.agent_markers.iter().any(|m| lower.contains(m.as_str()))
    })
}
