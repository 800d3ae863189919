use crate::prelude::{IntervalAxis, PipelineError, PipelineResult};

/// Interval × layer partition of one channel's samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Interval index of every ping.
    pub interval_of_ping: Vec<usize>,
    /// Layer index of every range sample.
    pub layer_of_sample: Vec<usize>,
    /// Axis value at which each interval starts.
    pub interval_edges: Vec<f64>,
    /// Layer boundaries; layer `k` spans `layer_edges[k]..layer_edges[k + 1]`.
    pub layer_edges: Vec<f64>,
    /// Vertical position of every range sample.
    pub sample_positions: Vec<f64>,
}

impl Grid {
    pub fn n_intervals(&self) -> usize {
        self.interval_edges.len()
    }

    pub fn n_layers(&self) -> usize {
        self.layer_edges.len().saturating_sub(1)
    }
}

/// Buckets pings into intervals and range samples into layers.
#[derive(Debug, Clone, Copy)]
pub struct GridPartitioner {
    interval_axis: IntervalAxis,
    interval_length: f64,
    layer_thickness: f64,
}

impl GridPartitioner {
    pub fn new(
        interval_axis: IntervalAxis,
        interval_length: f64,
        layer_thickness: f64,
    ) -> PipelineResult<Self> {
        if !(interval_length.is_finite() && interval_length > 0.0) {
            return Err(PipelineError::InvalidGridParameter(format!(
                "interval length must be positive, got {}",
                interval_length
            )));
        }
        if !(layer_thickness.is_finite() && layer_thickness > 0.0) {
            return Err(PipelineError::InvalidGridParameter(format!(
                "layer thickness must be positive, got {}",
                layer_thickness
            )));
        }
        Ok(Self {
            interval_axis,
            interval_length,
            layer_thickness,
        })
    }

    /// `interval_values` holds one along-track value per ping, `vertical_values`
    /// one range/depth value per sample.
    pub fn partition(&self, interval_values: &[f64], vertical_values: &[f64]) -> PipelineResult<Grid> {
        let (interval_of_ping, interval_edges) = self.partition_intervals(interval_values)?;
        let (layer_of_sample, layer_edges) = self.partition_layers(vertical_values)?;
        Ok(Grid {
            interval_of_ping,
            layer_of_sample,
            interval_edges,
            layer_edges,
            sample_positions: vertical_values.to_vec(),
        })
    }

    fn partition_intervals(&self, values: &[f64]) -> PipelineResult<(Vec<usize>, Vec<f64>)> {
        let Some(&origin) = values.first() else {
            return Ok((Vec::new(), Vec::new()));
        };
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidInput(format!(
                "{:?} axis contains non-finite values",
                self.interval_axis
            )));
        }
        if values.windows(2).any(|w| w[1] < w[0]) {
            return Err(PipelineError::InvalidInput(format!(
                "{:?} axis is not monotonically increasing",
                self.interval_axis
            )));
        }

        // Physical axes can skip whole buckets across data gaps; indices are
        // compacted so intervals stay contiguous.
        let mut assignment = Vec::with_capacity(values.len());
        let mut edges = Vec::new();
        let mut last_bucket = None;
        for &value in values {
            let bucket = ((value - origin) / self.interval_length).floor() as i64;
            if last_bucket != Some(bucket) {
                edges.push(origin + bucket as f64 * self.interval_length);
                last_bucket = Some(bucket);
            }
            assignment.push(edges.len() - 1);
        }
        Ok((assignment, edges))
    }

    fn partition_layers(&self, values: &[f64]) -> PipelineResult<(Vec<usize>, Vec<f64>)> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "vertical axis contains non-finite values".into(),
            ));
        }
        let Some(axis_min) = values.iter().copied().reduce(f64::min) else {
            return Ok((Vec::new(), Vec::new()));
        };

        let assignment: Vec<usize> = values
            .iter()
            .map(|v| ((v - axis_min) / self.layer_thickness).floor() as usize)
            .collect();
        let n_layers = assignment.iter().max().map_or(0, |max| max + 1);
        let edges = (0..=n_layers)
            .map(|k| axis_min + k as f64 * self.layer_thickness)
            .collect();
        Ok((assignment, edges))
    }
}
