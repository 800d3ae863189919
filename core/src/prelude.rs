use serde::{Deserialize, Serialize};

/// Along-track axis used to bucket pings into intervals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntervalAxis {
    /// Every `interval_length` consecutive pings.
    PingNumber,
    /// Seconds elapsed since the first ping.
    PingTime,
    /// Along-track distance, in the units of the channel's distance series.
    Distance,
}

/// Vertical axis used to bucket samples into layers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayerAxis {
    Range,
    /// Range plus transducer depth.
    Depth,
}

/// Transmit/receive mode of a channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    Active,
    Passive,
}

/// Pulse shape of a channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PulseType {
    #[serde(rename = "CW")]
    Cw,
    #[serde(rename = "FM")]
    Fm,
}

impl std::fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelMode::Active => write!(f, "Active"),
            ChannelMode::Passive => write!(f, "Passive"),
        }
    }
}

impl std::fmt::Display for PulseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PulseType::Cw => write!(f, "CW"),
            PulseType::Fm => write!(f, "FM"),
        }
    }
}

/// Surface exclusion setting: a constant depth offset or the name of an
/// externally supplied per-ping profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SurfaceOffset {
    Constant(f64),
    Profile(String),
}

/// Settings shared by every stage of one integration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub interval_axis: IntervalAxis,
    pub interval_length: f64,
    pub layer_axis: LayerAxis,
    pub layer_thickness: f64,
    pub surf_offset: SurfaceOffset,
    pub bot_offset: f64,
    pub mode: ChannelMode,
    pub pulse: PulseType,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            interval_axis: IntervalAxis::PingNumber,
            interval_length: 50.0,
            layer_axis: LayerAxis::Range,
            layer_thickness: 5.0,
            surf_offset: SurfaceOffset::Constant(2.0),
            bot_offset: 0.5,
            mode: ChannelMode::Active,
            pulse: PulseType::Cw,
        }
    }
}

/// Common error type for pipeline execution.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid grid parameter: {0}")]
    InvalidGridParameter(String),
    #[error("unsupported surface exclusion mode: {0}")]
    UnsupportedExclusionMode(String),
    #[error("no {mode} {pulse} channels selected")]
    NoChannelsSelected { mode: ChannelMode, pulse: PulseType },
    #[error("calibration unavailable for channel {channel}: {reason}")]
    CalibrationUnavailable { channel: String, reason: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
