use tracing::debug;

use crate::config::settings::{LocationConfig, PrefixConfig, ScoringConfig, Settings, VolumeConfig};
use crate::models::profile::{IpProfile, RiskAssessment, RiskComponents};

use super::bot::BotClassifier;
use super::prefix::{prefix_risk, PrefixCounter};
use super::signals::{location_risk, rate_limit_risk, suspicious_risk, volume_risk};

/// Combines every signal into one itemized assessment per profile.
///
/// Holds only immutable configuration, so one instance can be shared by
/// any number of scoring workers.
pub struct RiskAggregator {
    bot: BotClassifier,
    scoring: ScoringConfig,
    prefix: PrefixConfig,
    location: LocationConfig,
    volume: VolumeConfig,
}

impl RiskAggregator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            bot: BotClassifier::new(&settings.bot),
            scoring: settings.scoring.clone(),
            prefix: settings.prefix.clone(),
            location: settings.location.clone(),
            volume: settings.volume.clone(),
        }
    }

    /// Compute every signal for the profile without touching it.
    ///
    /// The prefix signal is 0 when no counter is supplied.
    pub fn assess(&self, profile: &IpProfile, prefix_counter: Option<&PrefixCounter>) -> RiskAssessment {
        let components = RiskComponents {
            bot: self.bot.risk(profile),
            suspicious: suspicious_risk(profile, &self.scoring),
            rate_limit: rate_limit_risk(profile, &self.scoring),
            prefix: prefix_counter
                .map(|counter| prefix_risk(profile, counter, &self.prefix))
                .unwrap_or(0),
            location: location_risk(profile, &self.location),
        };
        RiskAssessment::new(components, volume_risk(profile, &self.volume))
    }

    /// Score the profile in place, overwriting any earlier assessment.
    pub fn aggregate(&self, profile: &mut IpProfile, prefix_counter: Option<&PrefixCounter>) {
        let assessment = self.assess(profile, prefix_counter);

        debug!(
            ip = %profile.address,
            score = assessment.score,
            bot = assessment.components.bot,
            suspicious = assessment.components.suspicious,
            rate_limit = assessment.components.rate_limit,
            prefix = assessment.components.prefix,
            location = assessment.components.location,
            volume = assessment.volume,
            "Risk assessment complete"
        );

        profile.risk = Some(assessment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> RiskAggregator {
        RiskAggregator::new(&Settings::default())
    }

    fn noisy_profile() -> IpProfile {
        let mut p = IpProfile::new("10.0.0.1", "10.0.0.0/24");
        p.request_count = 12_000;
        p.user_agents = vec!["python-requests/2.28".into(), "MJ12bot/v1.4.8".into()];
        p.is_suspicious = true;
        p.is_limit_exceeded = true;
        p.country = Some("RU".into());
        p
    }

    #[test]
    fn test_full_breakdown() {
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 20_000)].into_iter().collect();
        let mut profile = noisy_profile();
        aggregator().aggregate(&mut profile, Some(&counter));

        let risk = profile.risk.unwrap();
        assert_eq!(
            risk.components,
            RiskComponents {
                bot: 65,
                suspicious: 30,
                rate_limit: 30,
                prefix: 10,
                location: 25,
            }
        );
        assert_eq!(risk.score, 160);
        assert_eq!(risk.volume, 40);
    }

    #[test]
    fn test_volume_excluded_from_score() {
        let mut profile = IpProfile::new("10.0.0.9", "10.0.0.0/24");
        profile.request_count = 50_000;
        profile.user_agents = vec!["Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0".into()];
        aggregator().aggregate(&mut profile, None);
        let risk = profile.risk.unwrap();
        assert_eq!(risk.volume, 40);
        assert_eq!(risk.score, 0);
    }

    #[test]
    fn test_score_equals_component_sum() {
        let agg = aggregator();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 700)].into_iter().collect();
        for suspicious in [false, true] {
            for limited in [false, true] {
                for country in [None, Some("RU"), Some("US")] {
                    let mut p = noisy_profile();
                    p.is_suspicious = suspicious;
                    p.is_limit_exceeded = limited;
                    p.country = country.map(str::to_string);
                    agg.aggregate(&mut p, Some(&counter));
                    let risk = p.risk.unwrap();
                    assert_eq!(risk.score, risk.components.total());
                    let c = risk.components;
                    assert_eq!(risk.score, c.bot + c.suspicious + c.rate_limit + c.prefix + c.location);
                }
            }
        }
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let agg = aggregator();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 20_000)].into_iter().collect();
        let mut profile = noisy_profile();
        agg.aggregate(&mut profile, Some(&counter));
        let first = profile.clone();
        agg.aggregate(&mut profile, Some(&counter));
        assert_eq!(profile, first);
    }

    #[test]
    fn test_rescoring_overwrites_previous_result() {
        let agg = aggregator();
        let counter: PrefixCounter = [("10.0.0.0/24".to_string(), 20_000)].into_iter().collect();
        let mut profile = noisy_profile();
        agg.aggregate(&mut profile, Some(&counter));
        agg.aggregate(&mut profile, None);
        assert_eq!(profile.risk.unwrap().components.prefix, 0);
        assert_eq!(profile.risk.unwrap().score, 150);
    }

    #[test]
    fn test_huge_configured_scores_saturate() {
        let settings: Settings = toml::from_str(
            "[scoring]\nsuspicious_score = 4000000000\nrate_limit_score = 4000000000\n",
        )
        .unwrap();
        settings.validate().unwrap();

        let mut profile = noisy_profile();
        RiskAggregator::new(&settings).aggregate(&mut profile, None);
        let risk = profile.risk.unwrap();
        assert_eq!(risk.components.suspicious, 4_000_000_000);
        assert_eq!(risk.components.rate_limit, 4_000_000_000);
        assert_eq!(risk.score, u32::MAX);
        assert_eq!(risk.score, risk.components.total());
    }

    #[test]
    fn test_prefix_zero_without_counter() {
        let mut profile = noisy_profile();
        aggregator().aggregate(&mut profile, None);
        assert_eq!(profile.risk.unwrap().components.prefix, 0);
    }
}
