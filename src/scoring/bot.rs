use std::collections::HashSet;

use crate::config::settings::BotConfig;
use crate::models::profile::IpProfile;

/// Mutually exclusive user-agent categories, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentCategory {
    /// Recognized search-engine crawler.
    SafeBot,
    /// Scripting language or HTTP client library.
    Tool,
    /// Generic bot/spider/crawler token without a safe-bot marker.
    UnknownBot,
    /// Empty, placeholder, too short, or no letters at all.
    Weird,
}

/// Which categories appeared at least once across a profile's agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentFlags {
    pub safe_bot: bool,
    pub tool: bool,
    pub unknown_bot: bool,
    pub weird: bool,
}

/// Case-insensitive substring classifier for user-agent strings.
///
/// Markers are lower-cased once at construction. The first matching
/// category wins, so a safe-bot marker hides every other check for that
/// agent string.
pub struct BotClassifier {
    safe_bot_markers: Vec<String>,
    tool_markers: Vec<String>,
    unknown_bot_markers: Vec<String>,
    config: BotConfig,
}

impl BotClassifier {
    pub fn new(config: &BotConfig) -> Self {
        let lower = |markers: &[String]| -> Vec<String> {
            markers.iter().map(|m| m.to_lowercase()).collect()
        };
        Self {
            safe_bot_markers: lower(&config.safe_bot_markers),
            tool_markers: lower(&config.tool_markers),
            unknown_bot_markers: lower(&config.unknown_bot_markers),
            config: config.clone(),
        }
    }

    /// Classify one agent string; `None` when it looks like an ordinary client.
    pub fn classify(&self, user_agent: &str) -> Option<AgentCategory> {
        let lower = user_agent.to_lowercase();
        let has_any = |markers: &[String]| markers.iter().any(|m| lower.contains(m.as_str()));

        if has_any(&self.safe_bot_markers) {
            Some(AgentCategory::SafeBot)
        } else if has_any(&self.tool_markers) {
            Some(AgentCategory::Tool)
        } else if has_any(&self.unknown_bot_markers) {
            Some(AgentCategory::UnknownBot)
        } else if self.is_weird(&lower) {
            Some(AgentCategory::Weird)
        } else {
            None
        }
    }

    fn is_weird(&self, user_agent: &str) -> bool {
        let ua = user_agent.trim();
        ua.is_empty()
            || ua == "-"
            || ua.chars().count() < self.config.min_agent_len
            || !ua.chars().any(char::is_alphabetic)
    }

    /// Presence flags over every agent observed for the profile.
    pub fn flags(&self, profile: &IpProfile) -> AgentFlags {
        let mut flags = AgentFlags::default();
        for ua in &profile.user_agents {
            match self.classify(ua) {
                Some(AgentCategory::SafeBot) => flags.safe_bot = true,
                Some(AgentCategory::Tool) => flags.tool = true,
                Some(AgentCategory::UnknownBot) => flags.unknown_bot = true,
                Some(AgentCategory::Weird) => flags.weird = true,
                None => {}
            }
        }
        flags
    }

    /// Bot / user-agent signal. Saturates at `u32::MAX`.
    pub fn risk(&self, profile: &IpProfile) -> u32 {
        let flags = self.flags(profile);
        let cfg = &self.config;
        let distinct: HashSet<&str> = profile.user_agents.iter().map(String::as_str).collect();

        [
            (flags.tool, cfg.tool_score),
            (flags.unknown_bot, cfg.unknown_bot_score),
            (flags.safe_bot, cfg.safe_bot_score),
            (flags.weird, cfg.weird_agent_score),
            (distinct.len() > cfg.diversity_threshold, cfg.diversity_score),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .fold(0u32, |risk, (_, points)| risk.saturating_add(points))
    }
}
