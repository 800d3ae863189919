use crate::math::stats::StatsHelper;
use crate::prelude::{PipelineError, PipelineResult};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gain parameters applied to a channel's linear samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Calibration {
    pub gain_db: f64,
    #[serde(default)]
    pub sa_correction_db: f64,
}

impl Calibration {
    /// Two-way gain correction as a linear multiplier.
    pub fn linear_factor(&self) -> f64 {
        StatsHelper::db_to_linear(-2.0 * (self.gain_db + self.sa_correction_db))
    }

    fn check(self, channel: &str) -> Result<Self, CalibrationError> {
        if self.gain_db.is_finite() && self.sa_correction_db.is_finite() {
            Ok(self)
        } else {
            Err(CalibrationError::Invalid {
                channel: channel.to_string(),
                reason: "non-finite gain".into(),
            })
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("no entry for channel {0}")]
    MissingChannel(String),
    #[error("invalid calibration for {channel}: {reason}")]
    Invalid { channel: String, reason: String },
}

/// A place calibration parameters can be looked up from.
pub trait CalibrationSource {
    fn name(&self) -> &str;
    fn lookup(&self, channel_id: &str) -> Result<Calibration, CalibrationError>;
}

/// Calibration entries keyed by channel id, loaded from a calibration file
/// or carried inside the survey payload.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    name: String,
    entries: Result<BTreeMap<String, Calibration>, String>,
}

impl CalibrationTable {
    pub fn new(name: impl Into<String>, entries: BTreeMap<String, Calibration>) -> Self {
        Self {
            name: name.into(),
            entries: Ok(entries),
        }
    }

    /// A source whose every lookup fails, e.g. an unreadable calibration file.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Err(reason.into()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CalibrationSource for CalibrationTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, channel_id: &str) -> Result<Calibration, CalibrationError> {
        let entries = self
            .entries
            .as_ref()
            .map_err(|reason| CalibrationError::SourceUnavailable(reason.clone()))?;
        entries
            .get(channel_id)
            .copied()
            .ok_or_else(|| CalibrationError::MissingChannel(channel_id.to_string()))?
            .check(channel_id)
    }
}

/// Ordered calibration sources; the first successful lookup wins.
pub struct CalibrationChain {
    sources: Vec<Box<dyn CalibrationSource>>,
    logger: LogManager,
}

impl CalibrationChain {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            logger: LogManager::new(),
        }
    }

    pub fn with_source<S: CalibrationSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn resolve(&self, channel_id: &str) -> PipelineResult<Calibration> {
        let mut reason = String::from("no calibration sources configured");
        for source in &self.sources {
            match source.lookup(channel_id) {
                Ok(calibration) => {
                    self.logger.record(&format!(
                        "calibration for {} from {}",
                        channel_id,
                        source.name()
                    ));
                    return Ok(calibration);
                }
                Err(err) => {
                    self.logger.flag(&format!(
                        "calibration source {} failed for {}: {}",
                        source.name(),
                        channel_id,
                        err
                    ));
                    reason = format!("{}: {}", source.name(), err);
                }
            }
        }
        Err(PipelineError::CalibrationUnavailable {
            channel: channel_id.to_string(),
            reason,
        })
    }
}

impl Default for CalibrationChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, id: &str, gain_db: f64) -> CalibrationTable {
        let mut entries = BTreeMap::new();
        entries.insert(
            id.to_string(),
            Calibration {
                gain_db,
                sa_correction_db: 0.0,
            },
        );
        CalibrationTable::new(name, entries)
    }

    #[test]
    fn chain_prefers_first_source() {
        let chain = CalibrationChain::new()
            .with_source(table("file", "38k", 25.0))
            .with_source(table("embedded", "38k", 20.0));
        assert_eq!(chain.resolve("38k").unwrap().gain_db, 25.0);
    }

    #[test]
    fn chain_falls_back_when_file_unreadable() {
        let chain = CalibrationChain::new()
            .with_source(CalibrationTable::unavailable("file", "not found"))
            .with_source(table("embedded", "38k", 20.0));
        assert_eq!(chain.resolve("38k").unwrap().gain_db, 20.0);
    }

    #[test]
    fn chain_reports_unavailable_when_all_fail() {
        let chain = CalibrationChain::new()
            .with_source(CalibrationTable::unavailable("file", "not found"))
            .with_source(table("embedded", "18k", 20.0));
        let err = chain.resolve("38k").unwrap_err();
        assert!(matches!(err, PipelineError::CalibrationUnavailable { ref channel, .. } if channel == "38k"));
    }

    #[test]
    fn non_finite_gain_is_rejected() {
        let source = table("file", "38k", f64::NAN);
        assert!(matches!(
            source.lookup("38k"),
            Err(CalibrationError::Invalid { .. })
        ));
    }
}
