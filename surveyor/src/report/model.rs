use echocore::telemetry::Metrics;
use serde::Serialize;
use std::fmt;

/// Summary of one integration run, printed and logged after the table is written.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub channels: Vec<String>,
    pub rows: usize,
    pub metrics: Metrics,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channels={} rows={} empty_cells={} sentinel_rows={}",
            self.channels.join("|"),
            self.rows,
            self.metrics.empty_cells,
            self.metrics.sentinel_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_lists_channels_and_counts() {
        let summary = RunSummary {
            channels: vec!["18k".into(), "38k".into()],
            rows: 40,
            metrics: Metrics {
                channels_integrated: 2,
                empty_cells: 3,
                rows_assembled: 30,
                sentinel_rows: 10,
            },
        };
        assert_eq!(
            summary.to_string(),
            "channels=18k|38k rows=40 empty_cells=3 sentinel_rows=10"
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["metrics"]["rows_assembled"], 30);
    }
}
