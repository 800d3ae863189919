use crate::acquisition::channel::Channel;
use crate::math::stats::StatsHelper;
use crate::prelude::{PipelineError, PipelineResult, PulseType};
use crate::processing::exclusion::ExclusionWindow;
use crate::processing::grid::Grid;
use crate::telemetry::log::LogManager;
use ndarray::{Array2, Array3};

/// Mean of one interval × layer cell. `None` marks a cell without valid samples.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Scalar(Option<f64>),
    /// One mean per frequency component of an FM channel.
    Spectrum(Vec<Option<f64>>),
}

impl CellValue {
    pub fn components(&self) -> Vec<Option<f64>> {
        match self {
            CellValue::Scalar(value) => vec![*value],
            CellValue::Spectrum(values) => values.clone(),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Scalar(value) => value.is_none(),
            CellValue::Spectrum(values) => values.iter().all(Option::is_none),
        }
    }
}

/// Integrated cells of one channel, indexed `[interval, layer]`.
#[derive(Debug, Clone)]
pub struct IntegrationResult {
    pub channel_id: String,
    pub cells: Array2<CellValue>,
    /// Samples that fell inside each cell's exclusion window.
    pub sample_counts: Array2<usize>,
}

impl IntegrationResult {
    pub fn n_intervals(&self) -> usize {
        self.cells.dim().0
    }

    pub fn n_layers(&self) -> usize {
        self.cells.dim().1
    }

    pub fn empty_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_missing()).count()
    }
}

/// Averages linear samples per cell. No minimum-sample threshold is applied.
pub struct Integrator {
    logger: LogManager,
}

impl Integrator {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new(),
        }
    }

    pub fn integrate(
        &self,
        channel: &Channel,
        pulse: PulseType,
        grid: &Grid,
        windows: &[ExclusionWindow],
    ) -> PipelineResult<IntegrationResult> {
        let (components, pings, ranges) = channel.samples.dim();
        if grid.interval_of_ping.len() != pings
            || grid.layer_of_sample.len() != ranges
            || windows.len() != pings
        {
            return Err(PipelineError::InvalidInput(format!(
                "channel {}: grid/exclusion do not match {} pings x {} samples",
                channel.id, pings, ranges
            )));
        }
        if pulse == PulseType::Cw && components != 1 {
            return Err(PipelineError::InvalidInput(format!(
                "CW channel {} carries {} components",
                channel.id, components
            )));
        }

        let n_layers = Self::layers_above_floor(grid, windows);
        let shape = (components, grid.n_intervals(), n_layers);
        let mut sums = Array3::<f64>::zeros(shape);
        let mut counts = Array3::<usize>::zeros(shape);
        let mut sample_counts = Array2::<usize>::zeros((grid.n_intervals(), n_layers));

        for (ping, window) in windows.iter().enumerate() {
            if window.is_empty() {
                continue;
            }
            let interval = grid.interval_of_ping[ping];
            for (sample, &position) in grid.sample_positions.iter().enumerate() {
                if !window.contains(position) {
                    continue;
                }
                let layer = grid.layer_of_sample[sample];
                if layer >= n_layers {
                    continue;
                }
                sample_counts[[interval, layer]] += 1;
                for component in 0..components {
                    let value = channel.samples[[component, ping, sample]];
                    if value.is_finite() {
                        sums[[component, interval, layer]] += value;
                        counts[[component, interval, layer]] += 1;
                    }
                }
            }
        }

        let cells = Array2::from_shape_fn((grid.n_intervals(), n_layers), |(i, l)| {
            let mut means = (0..components)
                .map(|c| StatsHelper::mean_of(sums[[c, i, l]], counts[[c, i, l]]));
            match pulse {
                PulseType::Cw => CellValue::Scalar(means.next().flatten()),
                PulseType::Fm => CellValue::Spectrum(means.collect()),
            }
        });

        let result = IntegrationResult {
            channel_id: channel.id.clone(),
            cells,
            sample_counts,
        };
        self.logger.record(&format!(
            "Integrated {} into {}x{} cells ({} empty)",
            channel.id,
            result.n_intervals(),
            result.n_layers(),
            result.empty_cells()
        ));
        Ok(result)
    }

    /// Layers starting above the deepest window bound of any ping. Trailing
    /// layers wholly below the bottom of every ping are not part of the result.
    fn layers_above_floor(grid: &Grid, windows: &[ExclusionWindow]) -> usize {
        let floor = windows
            .iter()
            .map(|w| w.upper)
            .fold(f64::NEG_INFINITY, f64::max);
        if windows.is_empty() || floor == f64::INFINITY {
            return grid.n_layers();
        }
        grid.layer_edges
            .iter()
            .take(grid.n_layers())
            .take_while(|&&edge| edge < floor)
            .count()
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new()
    }
}
