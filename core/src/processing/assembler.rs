use crate::acquisition::channel::Channel;
use crate::math::stats::StatsHelper;
use crate::prelude::{PipelineError, PipelineResult};
use crate::processing::integrator::IntegrationResult;
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};

/// One row of the long-format integration table.
///
/// `frequency` is `None` when the channel did not report a single frequency
/// for the component; `mean_value` is `None` for cells without valid samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub interval: usize,
    pub layer: usize,
    pub frequency: Option<f64>,
    pub mean_value: Option<f64>,
}

/// Integration result paired with the frequency label of each component.
#[derive(Debug, Clone)]
pub struct ChannelTable {
    pub result: IntegrationResult,
    pub frequencies: Vec<Option<f64>>,
}

/// Flattens per-channel results into table rows.
pub struct TableAssembler {
    logger: LogManager,
}

impl TableAssembler {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new(),
        }
    }

    /// Frequency of every component, or `None` for a component whose
    /// frequency varies between pings.
    pub fn frequency_labels(&self, channel: &Channel) -> Vec<Option<f64>> {
        channel
            .frequency
            .columns()
            .into_iter()
            .enumerate()
            .map(|(component, column)| {
                let label = StatsHelper::uniform_value(column.iter().copied());
                if label.is_none() {
                    self.logger.flag(&format!(
                        "channel {} component {} reports more than one frequency; \
                         its rows carry no frequency",
                        channel.id, component
                    ));
                }
                label
            })
            .collect()
    }

    /// Rows of every channel in order: interval, then layer, then component.
    /// Channels sharing a frequency are not deduplicated.
    pub fn assemble(&self, tables: &[ChannelTable]) -> PipelineResult<Vec<TableRow>> {
        let capacity = tables
            .iter()
            .map(|t| t.result.cells.len() * t.frequencies.len())
            .sum();
        let mut rows = Vec::with_capacity(capacity);

        for table in tables {
            for ((interval, layer), cell) in table.result.cells.indexed_iter() {
                let values = cell.components();
                if values.len() != table.frequencies.len() {
                    return Err(PipelineError::InvalidInput(format!(
                        "channel {}: {} frequency labels for {} components",
                        table.result.channel_id,
                        table.frequencies.len(),
                        values.len()
                    )));
                }
                rows.extend(
                    values
                        .into_iter()
                        .zip(&table.frequencies)
                        .map(|(mean_value, frequency)| TableRow {
                            interval,
                            layer,
                            frequency: *frequency,
                            mean_value,
                        }),
                );
            }
        }

        self.logger.record(&format!(
            "Assembled {} rows from {} channels",
            rows.len(),
            tables.len()
        ));
        Ok(rows)
    }
}

impl Default for TableAssembler {
    fn default() -> Self {
        Self::new()
    }
}
