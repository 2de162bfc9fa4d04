
use std::collections::{HashMap, VecDeque};

/// Default retention window: the last 2 hours of samples.
pub const RETENTION_WINDOW_SECS: f64 = 7200.0;

/// The metrics tracked over time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Temperature,
    RelativeAltitude,
}

#[derive(Debug, Default)]
struct Series {
    points: VecDeque<(f64, f64)>,
}

/// Rolling time-windowed series of `(epoch_seconds, value)` pairs, one per
/// tracked metric. Entries are only appended at the tail (the sampler's
/// timestamps are non-decreasing) and trimmed from the head by `prune`;
/// nothing is ever reordered or mutated in place. Readers get copies via
/// `snapshot`, never a live reference.
#[derive(Debug)]
pub struct HistoryStore {
    window: f64,
    series: HashMap<SeriesId, Series>,
}

impl HistoryStore {
    pub fn new(window_secs: f64) -> Self {
        Self {
            window: window_secs,
            series: HashMap::new(),
        }
    }

    pub fn append(&mut self, id: SeriesId, timestamp: f64, value: f64) {
        self.series
            .entry(id)
            .or_default()
            .points
            .push_back((timestamp, value));
    }

    /// Drops every head entry older than `now - window`. Runs every tick so
    /// retained data never exceeds the window even under irregular timing.
    pub fn prune(&mut self, id: SeriesId, now: f64) {
        let cutoff = now - self.window;
        if let Some(series) = self.series.get_mut(&id) {
            while let Some(&(t, _)) = series.points.front() {
                if t >= cutoff {
                    break;
                }
                series.points.pop_front();
            }
        }
    }

    pub fn prune_all(&mut self, now: f64) {
        let ids: Vec<SeriesId> = self.series.keys().copied().collect();
        for id in ids {
            self.prune(id, now);
        }
    }

    /// Independent copy of a series, oldest first. Safe to hand to another
    /// task while the store keeps mutating.
    pub fn snapshot(&self, id: SeriesId) -> Vec<(f64, f64)> {
        self.series
            .get(&id)
            .map(|s| s.points.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, id: SeriesId) -> usize {
        self.series.get(&id).map_or(0, |s| s.points.len())
    }
}
