use chrono::{DateTime, FixedOffset};

/// One parsed access-log entry.
///
/// Status and size are kept as the digit strings found in the log, padding
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    /// Address literal exactly as logged.
    pub source_ip: String,

    /// Request time. Offset-naive stamps are pinned at `+00:00`.
    pub timestamp: DateTime<FixedOffset>,

    /// Offset token as logged (`+0000`), empty when the stamp had none.
    pub utc_offset: String,

    /// `METHOD PATH PROTO` as logged.
    pub request_line: String,

    pub status_code: String,

    pub response_size: String,

    /// May be empty or `-`.
    pub referer: String,

    /// May be empty or `-`.
    pub user_agent: String,
}

impl RequestRecord {
    /// True when the logged timestamp carried an explicit offset.
    pub fn has_offset(&self) -> bool {
        !self.utc_offset.is_empty()
    }
}
