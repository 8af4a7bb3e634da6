//! Per-record-type write statistics.

use crate::models::RecordType;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Key under which the sum over every record type is kept.
pub const TOTALS: &str = "totals";

/// Counters kept for one record type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub records: u64,
    /// Body bytes written.
    pub content_bytes: u64,
    /// Header, body and framing bytes before compression.
    pub total_bytes: u64,
    /// Bytes actually emitted to the output target.
    pub size_on_disk: u64,
}
impl Counters {
    fn add(&mut self, other: &Counters) {
        self.records += other.records;
        self.content_bytes += other.content_bytes;
        self.total_bytes += other.total_bytes;
        self.size_on_disk += other.size_on_disk;
    }
}

/// Write statistics keyed by record type name, plus [`TOTALS`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatTally {
    entries: BTreeMap<String, Counters>,
}
impl StatTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successfully written record.
    pub fn record(&mut self, kind: RecordType, content_bytes: u64, total_bytes: u64, size_on_disk: u64) {
        let delta = Counters { records: 1, content_bytes, total_bytes, size_on_disk };
        self.entries.entry(kind.as_str().to_string()).or_default().add(&delta);
        self.entries.entry(TOTALS.to_string()).or_default().add(&delta);
    }

    /// Counters for a record type name or [`TOTALS`]; zero when unknown.
    pub fn get(&self, key: &str) -> Counters {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub fn of(&self, kind: RecordType) -> Counters {
        self.get(kind.as_str())
    }

    pub fn totals(&self) -> Counters {
        self.get(TOTALS)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Counters)> {
        self.entries.iter().map(|(key, counters)| (key.as_str(), counters))
    }

    pub fn is_empty(&self) -> bool {
        self.totals().records == 0
    }

    /// Add every counter of `other` into this tally.
    pub fn merge(&mut self, other: &StatTally) {
        for (key, counters) in &other.entries {
            self.entries.entry(key.clone()).or_default().add(counters);
        }
    }

    /// Take a snapshot and reset every counter to zero. Keys already seen are
    /// kept, so later reports list the same record types.
    pub fn drain(&mut self) -> StatTally {
        let snapshot = self.clone();
        for counters in self.entries.values_mut() {
            *counters = Counters::default();
        }
        snapshot
    }

    /// One line per key: `name records content_bytes total_bytes size_on_disk`.
    pub fn report(&self) -> String {
        let mut report = String::new();
        for (key, counters) in self.iter() {
            let _ = writeln!(
                report,
                "{key:<13} {:>10} {:>14} {:>14} {:>14}",
                counters.records, counters.content_bytes, counters.total_bytes, counters.size_on_disk
            );
        }
        report
    }
}

/// Long-lived accumulator that absorbs tallies drained from writers.
///
/// Safe to share between threads. Draining a writer's tally is the caller's
/// responsibility and must happen while no write is in progress on it.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<StatTally>,
}
impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain `tally` and add its counters to the aggregate.
    pub fn absorb(&self, tally: &mut StatTally) {
        let drained = tally.drain();
        self.inner.lock().merge(&drained);
    }

    pub fn snapshot(&self) -> StatTally {
        self.inner.lock().clone()
    }

    pub fn report(&self) -> String {
        self.inner.lock().report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_per_type_and_totals() {
        let mut tally = StatTally::new();
        tally.record(RecordType::Resource, 500, 700, 700);
        tally.record(RecordType::Resource, 300, 500, 500);
        tally.record(RecordType::Warcinfo, 0, 200, 120);

        let resource = tally.of(RecordType::Resource);
        assert_eq!(resource.records, 2);
        assert_eq!(resource.content_bytes, 800);
        assert_eq!(resource.total_bytes, 1200);
        assert_eq!(tally.totals(), Counters { records: 3, content_bytes: 800, total_bytes: 1400, size_on_disk: 1320 });
        assert_eq!(tally.of(RecordType::Revisit), Counters::default());
    }

    #[test]
    fn drain_zeroes_but_keeps_keys() {
        let mut tally = StatTally::new();
        tally.record(RecordType::Response, 10, 20, 20);
        let snapshot = tally.drain();
        assert_eq!(snapshot.of(RecordType::Response).records, 1);
        assert_eq!(tally.keys().collect::<Vec<_>>(), vec!["response", TOTALS]);
        assert!(tally.iter().all(|(_, counters)| *counters == Counters::default()));
        assert!(tally.is_empty());
    }

    #[test]
    fn merge_adds_counters() {
        let mut left = StatTally::new();
        left.record(RecordType::Request, 1, 2, 3);
        let mut right = StatTally::new();
        right.record(RecordType::Request, 10, 20, 30);
        right.record(RecordType::Metadata, 5, 5, 5);
        left.merge(&right);
        assert_eq!(left.of(RecordType::Request), Counters { records: 2, content_bytes: 11, total_bytes: 22, size_on_disk: 33 });
        assert_eq!(left.totals().records, 3);
    }

    #[test]
    fn aggregator_absorbs_and_resets() {
        let aggregator = StatsAggregator::new();
        let mut tally = StatTally::new();
        tally.record(RecordType::Resource, 4, 8, 8);
        aggregator.absorb(&mut tally);
        tally.record(RecordType::Resource, 4, 8, 8);
        aggregator.absorb(&mut tally);
        assert!(tally.is_empty());
        assert_eq!(aggregator.snapshot().of(RecordType::Resource).records, 2);
        assert!(aggregator.report().starts_with("resource"));
    }
}
