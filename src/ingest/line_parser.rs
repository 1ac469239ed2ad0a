use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;

use crate::models::request::RequestRecord;

/// `<ip> - - [<stamp>] "<request>" <status> <size> "<referer>" "<agent>"`
///
/// Anchored at the start only; anything after the agent group is ignored.
static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) - - \[([^\]]+)\] "([^"]+)" (\d+) (\d+) "([^"]*)" "([^"]*)""#)
        .expect("access log pattern is valid")
});

const STAMP_WITH_OFFSET: &str = "%d/%b/%Y:%H:%M:%S %z";
const STAMP_NAIVE: &str = "%d/%b/%Y:%H:%M:%S";

/// Parse one access-log line.
///
/// Returns `None` for anything that does not match the grammar, including a
/// bracketed stamp that fits neither accepted format. A failed line is a
/// normal outcome; callers skip or count it.
pub fn parse_line(line: &str) -> Option<RequestRecord> {
    let caps = LINE_PATTERN.captures(line)?;
    let stamp = caps.get(2)?.as_str();
    let (timestamp, utc_offset) = parse_stamp(stamp)?;

    Some(RequestRecord {
        source_ip: caps[1].to_string(),
        timestamp,
        utc_offset,
        request_line: caps[3].to_string(),
        status_code: caps[4].to_string(),
        response_size: caps[5].to_string(),
        referer: caps[6].to_string(),
        user_agent: caps[7].to_string(),
    })
}

/// Offset-qualified form first, then the offset-naive form pinned at UTC.
fn parse_stamp(stamp: &str) -> Option<(DateTime<FixedOffset>, String)> {
    if let Ok(ts) = DateTime::parse_from_str(stamp, STAMP_WITH_OFFSET) {
        let offset = stamp
            .split_once(' ')
            .map(|(_, off)| off.to_string())
            .unwrap_or_default();
        return Some((ts, offset));
    }

    NaiveDateTime::parse_from_str(stamp, STAMP_NAIVE)
        .ok()
        .map(|naive| (naive.and_utc().fixed_offset(), String::new()))
}
