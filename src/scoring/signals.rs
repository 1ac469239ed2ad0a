use crate::config::settings::{LocationConfig, ScoringConfig, VolumeConfig};
use crate::models::profile::IpProfile;

/// Traffic-volume signal, bucketed by total request count.
pub fn volume_risk(profile: &IpProfile, config: &VolumeConfig) -> u32 {
    let count = profile.request_count;
    let [low, medium, high, extreme] = config.scores;
    if count < config.low_bound {
        low
    } else if count < config.medium_bound {
        medium
    } else if count < config.high_bound {
        high
    } else {
        extreme
    }
}

pub fn suspicious_risk(profile: &IpProfile, config: &ScoringConfig) -> u32 {
    if profile.is_suspicious {
        config.suspicious_score
    } else {
        0
    }
}

pub fn rate_limit_risk(profile: &IpProfile, config: &ScoringConfig) -> u32 {
    if profile.is_limit_exceeded {
        config.rate_limit_score
    } else {
        0
    }
}

/// Geolocation signal. Only corroborates an already suspicious profile.
pub fn location_risk(profile: &IpProfile, config: &LocationConfig) -> u32 {
    if !profile.is_suspicious {
        return 0;
    }

    let country = match profile.country.as_deref().map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return config.unresolved_score,
    };

    if config
        .high_risk_countries
        .iter()
        .any(|code| code.eq_ignore_ascii_case(country))
    {
        config.high_risk_score
    } else {
        0
    }
}
