use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Counters accumulated over one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub channels_integrated: usize,
    pub empty_cells: usize,
    pub rows_assembled: usize,
    pub sentinel_rows: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_channel(&self, empty_cells: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.channels_integrated += 1;
            metrics.empty_cells += empty_cells;
        }
    }

    pub fn record_rows(&self, assembled: usize, sentinels: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rows_assembled += assembled;
            metrics.sentinel_rows += sentinels;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_accumulates_counts() {
        let recorder = MetricsRecorder::new();
        recorder.record_channel(3);
        recorder.record_channel(1);
        recorder.record_rows(10, 2);
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.channels_integrated, 2);
        assert_eq!(snapshot.empty_cells, 4);
        assert_eq!(snapshot.sentinel_rows, 2);
    }
}
