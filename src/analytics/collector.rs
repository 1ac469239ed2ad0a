use serde::Serialize;

/// Line counters gathered while a log is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Every line read, including blank ones.
    pub lines: u64,
    pub parsed: u64,
    /// Empty or whitespace-only lines; not counted as parse errors.
    pub blank: u64,
    /// Non-blank lines that did not match the log grammar.
    pub skipped: u64,
    /// Parsed lines whose timestamp carried no UTC offset.
    pub naive_stamps: u64,
}

impl IngestStats {
    pub fn record_parsed(&mut self, has_offset: bool) {
        self.lines += 1;
        self.parsed += 1;
        if !has_offset {
            self.naive_stamps += 1;
        }
    }

    pub fn record_blank(&mut self) {
        self.lines += 1;
        self.blank += 1;
    }

    pub fn record_skipped(&mut self) {
        self.lines += 1;
        self.skipped += 1;
    }

    /// Share of non-blank lines that failed to parse, in `[0.0, 1.0]`.
    pub fn parse_error_rate(&self) -> f64 {
        let considered = self.parsed + self.skipped;
        if considered == 0 {
            return 0.0;
        }
        self.skipped as f64 / considered as f64
    }

    /// Fold counters from another source (e.g. a second log file).
    pub fn merge(&mut self, other: &IngestStats) {
        self.lines += other.lines;
        self.parsed += other.parsed;
        self.blank += other.blank;
        self.skipped += other.skipped;
        self.naive_stamps += other.naive_stamps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rate_ignores_blank_lines() {
        let mut stats = IngestStats::default();
        stats.record_parsed(true);
        stats.record_parsed(true);
        stats.record_parsed(false);
        stats.record_skipped();
        stats.record_blank();
        assert_eq!(stats.lines, 5);
        assert_eq!(stats.naive_stamps, 1);
        assert!((stats.parse_error_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_error_rate_empty() {
        assert_eq!(IngestStats::default().parse_error_rate(), 0.0);
    }

    #[test]
    fn test_merge() {
        let mut a = IngestStats::default();
        a.record_parsed(false);
        let mut b = IngestStats::default();
        b.record_skipped();
        b.record_blank();
        a.merge(&b);
        assert_eq!(a, IngestStats { lines: 3, parsed: 1, blank: 1, skipped: 1, naive_stamps: 1 });
    }
}
