use std::collections::HashMap;

use crate::config::settings::PrefixConfig;
use crate::models::profile::IpProfile;

/// Aggregate request count per address prefix across all profiles.
///
/// Built once before scoring starts and only read afterwards, so it can be
/// shared between scoring workers behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixCounter {
    counts: HashMap<String, u64>,
}

impl PrefixCounter {
    /// Sum `request_count` per prefix.
    pub fn from_profiles<'a>(profiles: impl IntoIterator<Item = &'a IpProfile>) -> Self {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for profile in profiles {
            *counts.entry(profile.prefix.clone()).or_insert(0) += profile.request_count;
        }
        Self { counts }
    }

    pub fn get(&self, prefix: &str) -> Option<u64> {
        self.counts.get(prefix).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

impl FromIterator<(String, u64)> for PrefixCounter {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}

/// Prefix-anomaly signal.
///
/// Penalizes a profile whose prefix carries heavy traffic that this address
/// alone does not account for. The comparison is a literal inequality
/// between the profile count and the prefix aggregate.
pub fn prefix_risk(profile: &IpProfile, counter: &PrefixCounter, config: &PrefixConfig) -> u32 {
    match counter.get(&profile.prefix) {
        Some(aggregate) if profile.request_count != aggregate && aggregate > config.threshold => {
            config.penalty
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_prefix_config;

    fn profile(addr: &str, prefix: &str, count: u64) -> IpProfile {
        let mut p = IpProfile::new(addr, prefix);
        p.request_count = count;
        p
    }

    #[test]
    fn test_counter_sums_per_prefix() {
        let profiles = vec![
            profile("10.0.0.1", "10.0.0.0/24", 300),
            profile("10.0.0.2", "10.0.0.0/24", 250),
            profile("10.9.0.1", "10.9.0.0/24", 7),
        ];
        let counter = PrefixCounter::from_profiles(&profiles);
        assert_eq!(counter.len(), 2);
        assert_eq!(counter.get("10.0.0.0/24"), Some(550));
        assert_eq!(counter.get("10.9.0.0/24"), Some(7));
        assert_eq!(counter.get("10.1.0.0/24"), None);
    }

    #[test]
    fn test_shared_busy_prefix_penalized() {
        let cfg = default_prefix_config();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 550)].into_iter().collect();
        assert_eq!(prefix_risk(&profile("10.0.0.1", "10.0.0.0/24", 300), &counter, &cfg), 10);
    }

    #[test]
    fn test_sole_contributor_not_penalized() {
        let cfg = default_prefix_config();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 900)].into_iter().collect();
        assert_eq!(prefix_risk(&profile("10.0.0.1", "10.0.0.0/24", 900), &counter, &cfg), 0);
    }

    #[test]
    fn test_quiet_prefix_not_penalized() {
        let cfg = default_prefix_config();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 500)].into_iter().collect();
        assert_eq!(prefix_risk(&profile("10.0.0.1", "10.0.0.0/24", 10), &counter, &cfg), 0);
    }

    #[test]
    fn test_unknown_prefix_not_penalized() {
        let cfg = default_prefix_config();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 9_000)].into_iter().collect();
        assert_eq!(prefix_risk(&profile("10.5.0.1", "10.5.0.0/24", 10), &counter, &cfg), 0);
        assert_eq!(prefix_risk(&profile("10.5.0.1", "10.5.0.0/24", 10), &PrefixCounter::default(), &cfg), 0);
    }
}
