use crate::acquisition::calibration::Calibration;
use crate::prelude::{IntervalAxis, LayerAxis, PipelineError, PipelineResult};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

/// Per-channel flags reported by the raw-file reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelMetadata {
    pub id: String,
    pub passive: bool,
    pub fm: bool,
}

/// Sample series of a single sonar channel.
///
/// `samples` is indexed `(component, ping, range)`; CW channels carry a single
/// component, FM channels one component per entry of their frequency list.
/// `frequency` is indexed `(ping, component)`.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub ping_time: Vec<f64>,
    pub distance: Option<Vec<f64>>,
    pub range: Vec<f64>,
    pub transducer_depth: f64,
    pub frequency: Array2<f64>,
    pub samples: Array3<f64>,
    pub bottom_line: Option<Vec<f64>>,
}

impl Channel {
    pub fn new(
        id: impl Into<String>,
        ping_time: Vec<f64>,
        range: Vec<f64>,
        frequency: Array2<f64>,
        samples: Array3<f64>,
    ) -> PipelineResult<Self> {
        let channel = Self {
            id: id.into(),
            ping_time,
            distance: None,
            range,
            transducer_depth: 0.0,
            frequency,
            samples,
            bottom_line: None,
        };
        channel.validate()?;
        Ok(channel)
    }

    pub fn with_distance(mut self, distance: Vec<f64>) -> PipelineResult<Self> {
        self.distance = Some(distance);
        self.validate()?;
        Ok(self)
    }

    pub fn with_bottom_line(mut self, bottom_line: Vec<f64>) -> PipelineResult<Self> {
        self.bottom_line = Some(bottom_line);
        self.validate()?;
        Ok(self)
    }

    pub fn with_transducer_depth(mut self, depth: f64) -> Self {
        self.transducer_depth = depth;
        self
    }

    pub fn ping_count(&self) -> usize {
        self.ping_time.len()
    }

    pub fn component_count(&self) -> usize {
        self.samples.dim().0
    }

    fn validate(&self) -> PipelineResult<()> {
        let (components, pings, ranges) = self.samples.dim();
        if pings != self.ping_time.len() || ranges != self.range.len() {
            return Err(PipelineError::InvalidInput(format!(
                "channel {}: samples are {}x{} but axes are {}x{}",
                self.id,
                pings,
                ranges,
                self.ping_time.len(),
                self.range.len()
            )));
        }
        if components == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "channel {} has no sample components",
                self.id
            )));
        }
        if self.frequency.dim() != (pings, components) {
            return Err(PipelineError::InvalidInput(format!(
                "channel {}: frequency rows {:?} do not match {} pings of {} components",
                self.id,
                self.frequency.dim(),
                pings,
                components
            )));
        }
        check_per_ping(&self.id, "distance", self.distance.as_deref(), pings)?;
        check_per_ping(&self.id, "bottom line", self.bottom_line.as_deref(), pings)?;
        Ok(())
    }

    /// Values of the along-track axis, one per ping.
    pub fn interval_axis(&self, axis: IntervalAxis) -> PipelineResult<Vec<f64>> {
        match axis {
            IntervalAxis::PingNumber => Ok((0..self.ping_count()).map(|p| p as f64).collect()),
            IntervalAxis::PingTime => Ok(self.ping_time.clone()),
            IntervalAxis::Distance => self.distance.clone().ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "channel {} has no distance series for distance intervals",
                    self.id
                ))
            }),
        }
    }

    /// Values of the vertical axis, one per range sample.
    pub fn vertical_axis(&self, axis: LayerAxis) -> Vec<f64> {
        match axis {
            LayerAxis::Range => self.range.clone(),
            LayerAxis::Depth => self
                .range
                .iter()
                .map(|r| r + self.transducer_depth)
                .collect(),
        }
    }

    /// Bottom line (recorded as depth) expressed on the given vertical axis.
    pub fn bottom_on(&self, axis: LayerAxis) -> Option<Vec<f64>> {
        let bottom = self.bottom_line.as_ref()?;
        Some(match axis {
            LayerAxis::Depth => bottom.clone(),
            LayerAxis::Range => bottom.iter().map(|d| d - self.transducer_depth).collect(),
        })
    }

    /// Returns a copy of this channel with every sample scaled by the calibration.
    pub fn calibrated(&self, calibration: &Calibration) -> Channel {
        let factor = calibration.linear_factor();
        let mut channel = self.clone();
        channel.samples.mapv_inplace(|v| v * factor);
        channel
    }
}

fn check_per_ping(id: &str, what: &str, values: Option<&[f64]>, pings: usize) -> PipelineResult<()> {
    match values {
        Some(values) if values.len() != pings => Err(PipelineError::InvalidInput(format!(
            "channel {}: {} has {} values for {} pings",
            id,
            what,
            values.len(),
            pings
        ))),
        _ => Ok(()),
    }
}
