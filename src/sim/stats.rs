/// Per-run statistics. Records are appended on level clear only;
/// totals are folded on demand.

#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub level: usize,
    pub elapsed_secs: f64,
    pub attempts: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AggregateStats {
    pub levels_cleared: usize,
    pub total_secs: f64,
    pub total_attempts: u32,
}

impl AggregateStats {
    /// Mean time per cleared level (0 when nothing was cleared).
    pub fn average_secs(&self) -> f64 {
        if self.levels_cleared == 0 {
            0.0
        } else {
            self.total_secs / self.levels_cleared as f64
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatsTracker {
    records: Vec<RunRecord>,
}

impl StatsTracker {
    pub fn new() -> Self {
        StatsTracker::default()
    }

    pub fn record(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn aggregate(&self) -> AggregateStats {
        self.records.iter().fold(AggregateStats::default(), |acc, r| AggregateStats {
            levels_cleared: acc.levels_cleared + 1,
            total_secs: acc.total_secs + r.elapsed_secs,
            total_attempts: acc.total_attempts + r.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(level: usize, elapsed_secs: f64, attempts: u32) -> RunRecord {
        RunRecord { level, elapsed_secs, attempts }
    }

    #[test]
    fn empty_tracker_aggregates_to_zero() {
        let t = StatsTracker::new();
        assert!(t.is_empty());
        let agg = t.aggregate();
        assert_eq!(agg, AggregateStats::default());
        assert_eq!(agg.average_secs(), 0.0);
    }

    #[test]
    fn records_keep_order_and_sum() {
        let mut t = StatsTracker::new();
        t.record(rec(1, 12.5, 1));
        t.record(rec(2, 30.0, 4));
        t.record(rec(3, 7.5, 2));

        let levels: Vec<usize> = t.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);

        let agg = t.aggregate();
        assert_eq!(agg.levels_cleared, 3);
        assert_eq!(agg.total_attempts, 7);
        assert!((agg.total_secs - 50.0).abs() < 1e-9);
        assert!((agg.average_secs() - 50.0 / 3.0).abs() < 1e-9);
    }
}
