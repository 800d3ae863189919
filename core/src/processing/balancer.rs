use crate::processing::assembler::TableRow;
use crate::telemetry::log::LogManager;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Frequency ordering key: numeric frequencies ascending, missing last.
#[derive(Debug, Clone, Copy)]
struct FrequencyKey(Option<f64>);

impl PartialEq for FrequencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrequencyKey {}

impl PartialOrd for FrequencyKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrequencyKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Interval → present layer indices, per frequency.
type Coverage = BTreeMap<FrequencyKey, BTreeMap<usize, BTreeSet<usize>>>;

/// Pads frequencies with missing-value rows so that they share the same
/// layer indices in every interval they cover.
pub struct LayerBalancer {
    logger: LogManager,
}

impl LayerBalancer {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new(),
        }
    }

    /// When frequencies differ in layer coverage, each (frequency, interval)
    /// present is padded to layers `0..=max_layer`. The table is always
    /// sorted by (frequency, interval, layer). Existing rows are never altered.
    pub fn balance(&self, rows: Vec<TableRow>) -> Vec<TableRow> {
        let coverage = Self::coverage(&rows);

        let layer_sets: Vec<BTreeSet<usize>> = coverage
            .values()
            .map(|intervals| intervals.values().flatten().copied().collect())
            .collect();
        let mut balanced = rows;
        if layer_sets.windows(2).all(|pair| pair[0] == pair[1]) {
            Self::sort(&mut balanced);
            return balanced;
        }

        let max_layer = layer_sets
            .iter()
            .filter_map(|layers| layers.iter().next_back())
            .copied()
            .max()
            .unwrap_or(0);

        let original = balanced.len();
        for (frequency, intervals) in &coverage {
            for (&interval, layers) in intervals {
                balanced.extend((0..=max_layer).filter(|l| !layers.contains(l)).map(|layer| {
                    TableRow {
                        interval,
                        layer,
                        frequency: frequency.0,
                        mean_value: None,
                    }
                }));
            }
        }
        Self::sort(&mut balanced);

        self.logger.record(&format!(
            "Balanced {} frequencies to layer {} with {} missing-value rows",
            coverage.len(),
            max_layer,
            balanced.len() - original
        ));
        balanced
    }

    /// Stable, so duplicate keys from different channels keep their order.
    fn sort(rows: &mut [TableRow]) {
        rows.sort_by(|a, b| {
            FrequencyKey(a.frequency)
                .cmp(&FrequencyKey(b.frequency))
                .then(a.interval.cmp(&b.interval))
                .then(a.layer.cmp(&b.layer))
        });
    }

    fn coverage(rows: &[TableRow]) -> Coverage {
        let mut coverage = Coverage::new();
        for row in rows {
            coverage
                .entry(FrequencyKey(row.frequency))
                .or_default()
                .entry(row.interval)
                .or_default()
                .insert(row.layer);
        }
        coverage
    }
}

impl Default for LayerBalancer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_rows(frequency: Option<f64>, intervals: usize, layers: usize) -> Vec<TableRow> {
        let mut rows = Vec::new();
        for interval in 0..intervals {
            for layer in 0..layers {
                rows.push(TableRow {
                    interval,
                    layer,
                    frequency,
                    mean_value: Some((interval * 100 + layer) as f64),
                });
            }
        }
        rows
    }

    fn layers_for(rows: &[TableRow], frequency: Option<f64>, interval: usize) -> BTreeSet<usize> {
        rows.iter()
            .filter(|r| FrequencyKey(r.frequency) == FrequencyKey(frequency) && r.interval == interval)
            .map(|r| r.layer)
            .collect()
    }

    #[test]
    fn matching_layer_sets_gain_no_rows_but_are_sorted() {
        let mut rows = grid_rows(Some(38000.0), 2, 3);
        rows.extend(grid_rows(Some(18000.0), 2, 3));
        let balanced = LayerBalancer::new().balance(rows.clone());

        let mut expected = grid_rows(Some(18000.0), 2, 3);
        expected.extend(grid_rows(Some(38000.0), 2, 3));
        assert_eq!(balanced, expected);
    }

    #[test]
    fn interleaved_components_are_grouped_by_frequency() {
        let mut rows = Vec::new();
        for layer in 0..2 {
            for frequency in [34000.0, 36000.0, 38000.0] {
                rows.push(TableRow {
                    interval: 0,
                    layer,
                    frequency: Some(frequency),
                    mean_value: Some(1.0),
                });
            }
        }
        let keys: Vec<(Option<f64>, usize)> = LayerBalancer::new()
            .balance(rows)
            .iter()
            .map(|r| (r.frequency, r.layer))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Some(34000.0), 0),
                (Some(34000.0), 1),
                (Some(36000.0), 0),
                (Some(36000.0), 1),
                (Some(38000.0), 0),
                (Some(38000.0), 1),
            ]
        );
    }

    #[test]
    fn shorter_frequency_is_padded_with_missing_values() {
        let mut rows = grid_rows(Some(38000.0), 2, 15);
        rows.extend(grid_rows(Some(18000.0), 2, 10));
        let balanced = LayerBalancer::new().balance(rows);

        assert_eq!(balanced.len(), 2 * 15 * 2);
        // 18 kHz now sorts first
        assert_eq!(balanced[0].frequency, Some(18000.0));
        for interval in 0..2 {
            assert_eq!(
                layers_for(&balanced, Some(18000.0), interval),
                layers_for(&balanced, Some(38000.0), interval)
            );
        }
        let padded: Vec<&TableRow> = balanced
            .iter()
            .filter(|r| r.frequency == Some(18000.0) && r.layer >= 10)
            .collect();
        assert_eq!(padded.len(), 10);
        assert!(padded.iter().all(|r| r.mean_value.is_none()));
        assert!(balanced
            .iter()
            .filter(|r| r.frequency == Some(38000.0))
            .all(|r| r.mean_value == Some((r.interval * 100 + r.layer) as f64)));
    }

    #[test]
    fn balancing_is_idempotent() {
        let mut rows = grid_rows(None, 1, 2);
        rows.extend(grid_rows(Some(120000.0), 3, 4));
        rows.extend(grid_rows(Some(38000.0), 2, 6));
        let balancer = LayerBalancer::new();
        let once = balancer.balance(rows);
        let twice = balancer.balance(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn output_is_sorted_with_missing_frequency_last() {
        let mut rows = grid_rows(None, 1, 1);
        rows.extend(grid_rows(Some(38000.0), 1, 2));
        rows.extend(grid_rows(Some(18000.0), 1, 3));
        let balanced = LayerBalancer::new().balance(rows);
        let keys: Vec<(Option<f64>, usize, usize)> = balanced
            .iter()
            .map(|r| (r.frequency, r.interval, r.layer))
            .collect();
        assert_eq!(keys.first(), Some(&(Some(18000.0), 0, 0)));
        assert_eq!(keys.last(), Some(&(None, 0, 2)));
        assert_eq!(keys.len(), 9);
    }

    #[test]
    fn interior_gaps_are_filled() {
        let mut rows = grid_rows(Some(38000.0), 1, 3);
        rows.push(TableRow {
            interval: 0,
            layer: 0,
            frequency: Some(18000.0),
            mean_value: Some(1.0),
        });
        rows.push(TableRow {
            interval: 0,
            layer: 2,
            frequency: Some(18000.0),
            mean_value: Some(2.0),
        });
        let balanced = LayerBalancer::new().balance(rows);
        assert_eq!(
            balanced[1],
            TableRow {
                interval: 0,
                layer: 1,
                frequency: Some(18000.0),
                mean_value: None
            }
        );
    }

    #[test]
    fn empty_table_stays_empty() {
        assert!(LayerBalancer::new().balance(Vec::new()).is_empty());
    }
}
