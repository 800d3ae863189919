use crate::acquisition::calibration::{Calibration, CalibrationTable};
use crate::acquisition::channel::{Channel, ChannelMetadata};
use crate::prelude::{PipelineError, PipelineResult};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One channel as delivered by the raw-file reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    #[serde(default)]
    pub passive: bool,
    #[serde(default)]
    pub fm: bool,
    pub ping_time: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<Vec<f64>>,
    pub range: Vec<f64>,
    #[serde(default)]
    pub transducer_depth: f64,
    /// Per ping: one value for CW, the component list for FM.
    pub frequency: Vec<Vec<f64>>,
    /// Indexed `[component][ping][range]`.
    pub samples: Vec<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_line: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<Calibration>,
}

impl ChannelRecord {
    pub fn metadata(&self) -> ChannelMetadata {
        ChannelMetadata {
            id: self.id.clone(),
            passive: self.passive,
            fm: self.fm,
        }
    }

    pub fn to_channel(&self) -> PipelineResult<Channel> {
        let pings = self.ping_time.len();
        let ranges = self.range.len();
        let components = self.samples.len();

        let mut flat_samples = Vec::with_capacity(components * pings * ranges);
        for (c, component) in self.samples.iter().enumerate() {
            if component.len() != pings {
                return Err(self.shape_error(format!(
                    "component {} has {} pings, expected {}",
                    c,
                    component.len(),
                    pings
                )));
            }
            for (p, ping) in component.iter().enumerate() {
                if ping.len() != ranges {
                    return Err(self.shape_error(format!(
                        "ping {} of component {} has {} samples, expected {}",
                        p,
                        c,
                        ping.len(),
                        ranges
                    )));
                }
                flat_samples.extend_from_slice(ping);
            }
        }
        let samples = Array3::from_shape_vec((components, pings, ranges), flat_samples)
            .map_err(|err| self.shape_error(err.to_string()))?;

        let width = self.frequency.first().map(Vec::len).unwrap_or(components);
        if self.frequency.iter().any(|row| row.len() != width) {
            return Err(self.shape_error("frequency rows differ in length".into()));
        }
        let flat_frequency: Vec<f64> = self.frequency.iter().flatten().copied().collect();
        let frequency = Array2::from_shape_vec((self.frequency.len(), width), flat_frequency)
            .map_err(|err| self.shape_error(err.to_string()))?;

        let mut channel = Channel::new(
            self.id.clone(),
            self.ping_time.clone(),
            self.range.clone(),
            frequency,
            samples,
        )?
        .with_transducer_depth(self.transducer_depth);
        if let Some(distance) = &self.distance {
            channel = channel.with_distance(distance.clone())?;
        }
        if let Some(bottom) = &self.bottom_line {
            channel = channel.with_bottom_line(bottom.clone())?;
        }
        Ok(channel)
    }

    /// Appends the pings of a later record for the same channel.
    fn append(&mut self, other: ChannelRecord) -> PipelineResult<()> {
        if other.range != self.range || other.samples.len() != self.samples.len() {
            return Err(self.shape_error(
                "cannot append pings with a different range axis or component count".into(),
            ));
        }
        if self.distance.is_some() != other.distance.is_some()
            || self.bottom_line.is_some() != other.bottom_line.is_some()
        {
            return Err(self.shape_error(
                "cannot append pings with a different set of per-ping lines".into(),
            ));
        }
        self.ping_time.extend(other.ping_time);
        self.frequency.extend(other.frequency);
        for (mine, theirs) in self.samples.iter_mut().zip(other.samples) {
            mine.extend(theirs);
        }
        if let (Some(mine), Some(theirs)) = (self.distance.as_mut(), other.distance) {
            mine.extend(theirs);
        }
        if let (Some(mine), Some(theirs)) = (self.bottom_line.as_mut(), other.bottom_line) {
            mine.extend(theirs);
        }
        if self.calibration.is_none() {
            self.calibration = other.calibration;
        }
        Ok(())
    }

    fn shape_error(&self, detail: String) -> PipelineError {
        PipelineError::InvalidInput(format!("channel {}: {}", self.id, detail))
    }
}

/// Everything the raw-file reader hands to the pipeline for one survey.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyPayload {
    pub channels: Vec<ChannelRecord>,
    /// Named per-ping surface exclusion profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<f64>>,
}

impl SurveyPayload {
    pub fn from_json(text: &str) -> PipelineResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| PipelineError::InvalidInput(format!("survey payload: {}", err)))
    }

    /// Folds a subsequent file of the same survey into this one.
    /// Profiles must be present on both sides once both carry pings, or the
    /// merged profile would no longer line up with the merged pings.
    pub fn merge(&mut self, other: SurveyPayload) -> PipelineResult<()> {
        if self.ping_count() > 0 && other.ping_count() > 0 {
            let missing = self
                .profiles
                .keys()
                .filter(|name| !other.profiles.contains_key(*name))
                .map(|name| (name, "is missing from the added payload"))
                .chain(
                    other
                        .profiles
                        .keys()
                        .filter(|name| !self.profiles.contains_key(*name))
                        .map(|name| (name, "was absent from earlier payloads")),
                )
                .next();
            if let Some((name, detail)) = missing {
                return Err(PipelineError::InvalidInput(format!(
                    "surface profile '{}' {}",
                    name, detail
                )));
            }
        }
        for record in other.channels {
            match self.channels.iter_mut().find(|c| c.id == record.id) {
                Some(existing) => existing.append(record)?,
                None => self.channels.push(record),
            }
        }
        for (name, values) in other.profiles {
            self.profiles.entry(name).or_default().extend(values);
        }
        Ok(())
    }

    fn ping_count(&self) -> usize {
        self.channels.first().map(|c| c.ping_time.len()).unwrap_or(0)
    }

    pub fn metadata(&self) -> Vec<ChannelMetadata> {
        self.channels.iter().map(ChannelRecord::metadata).collect()
    }

    pub fn channel(&self, id: &str) -> Option<&ChannelRecord> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Calibration parameters stored alongside the samples.
    pub fn embedded_calibration(&self) -> CalibrationTable {
        let entries = self
            .channels
            .iter()
            .filter_map(|c| c.calibration.map(|cal| (c.id.clone(), cal)))
            .collect();
        CalibrationTable::new("embedded", entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "channels": [{
            "id": "GPT 38 kHz",
            "ping_time": [0.0, 1.0],
            "range": [0.0, 1.0, 2.0],
            "frequency": [[38000.0], [38000.0]],
            "samples": [[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]],
            "bottom_line": [1.5, 1.5],
            "calibration": {"gain_db": 25.0}
        }],
        "profiles": {"xyz": [1.0, 1.0]}
    }"#;

    #[test]
    fn payload_converts_into_channel_arrays() {
        let payload = SurveyPayload::from_json(PAYLOAD).unwrap();
        let channel = payload.channels[0].to_channel().unwrap();
        assert_eq!(channel.samples.dim(), (1, 2, 3));
        assert_eq!(channel.samples[[0, 1, 2]], 6.0);
        assert_eq!(channel.frequency.dim(), (2, 1));
        assert_eq!(payload.embedded_calibration().len(), 1);
        assert!(!payload.metadata()[0].fm);
    }

    #[test]
    fn ragged_samples_are_rejected() {
        let mut payload = SurveyPayload::from_json(PAYLOAD).unwrap();
        payload.channels[0].samples[0][1].pop();
        assert!(matches!(
            payload.channels[0].to_channel(),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn merge_appends_pings_of_matching_channels() {
        let mut first = SurveyPayload::from_json(PAYLOAD).unwrap();
        let second = SurveyPayload::from_json(PAYLOAD).unwrap();
        first.merge(second).unwrap();
        assert_eq!(first.channels.len(), 1);
        let channel = first.channels[0].to_channel().unwrap();
        assert_eq!(channel.ping_count(), 4);
        assert_eq!(first.profiles["xyz"].len(), 4);
    }

    #[test]
    fn profile_missing_from_earlier_payload_is_rejected() {
        let mut first = SurveyPayload::from_json(PAYLOAD).unwrap();
        first.profiles.clear();
        let second = SurveyPayload::from_json(PAYLOAD).unwrap();
        let err = first.merge(second).unwrap_err();
        assert!(matches!(&err, PipelineError::InvalidInput(msg) if msg.contains("'xyz'")));
        // nothing was appended
        assert_eq!(first.channels[0].ping_time.len(), 2);

        let mut first = SurveyPayload::from_json(PAYLOAD).unwrap();
        let mut second = SurveyPayload::from_json(PAYLOAD).unwrap();
        second.profiles.clear();
        assert!(first.merge(second).is_err());
    }

    #[test]
    fn first_payload_into_empty_survey_keeps_profiles() {
        let mut survey = SurveyPayload::default();
        survey.merge(SurveyPayload::from_json(PAYLOAD).unwrap()).unwrap();
        assert_eq!(survey.profiles["xyz"], vec![1.0, 1.0]);
    }
}
