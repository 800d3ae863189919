use crate::workflow::config::WorkflowConfig;
use crate::workflow::files::file_list;
use anyhow::Context;
use echocore::acquisition::{Calibration, CalibrationChain, CalibrationTable, SurveyPayload};
use echocore::processing::{IntegrationPipeline, TableRow};
use echocore::telemetry::Metrics;
use log::warn;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub struct WorkflowResult {
    pub rows: Vec<TableRow>,
    pub channels: Vec<String>,
    pub metrics: Metrics,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Reads and merges every survey payload under `input`.
    pub fn load_survey(&self, input: &Path) -> anyhow::Result<SurveyPayload> {
        let mut survey = SurveyPayload::default();
        for path in file_list(input, "json")? {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading survey payload {}", path.display()))?;
            let payload = SurveyPayload::from_json(&text)
                .with_context(|| format!("parsing survey payload {}", path.display()))?;
            survey
                .merge(payload)
                .with_context(|| format!("merging survey payload {}", path.display()))?;
        }
        Ok(survey)
    }

    /// Calibration file first, then whatever the payload carries.
    pub fn calibration_chain(&self, survey: &SurveyPayload) -> CalibrationChain {
        let file_source = match self.config.calibration.as_deref() {
            Some(path) => load_calibration_files(path).unwrap_or_else(|err| {
                warn!("calibration file unusable, falling back to embedded: {:#}", err);
                CalibrationTable::unavailable("calibration file", format!("{:#}", err))
            }),
            None => CalibrationTable::unavailable("calibration file", "none given"),
        };
        CalibrationChain::new()
            .with_source(file_source)
            .with_source(survey.embedded_calibration())
    }

    pub fn execute(&self, survey: &SurveyPayload) -> anyhow::Result<WorkflowResult> {
        let pipeline = IntegrationPipeline::new(self.config.integration.clone())
            .context("configuring integration grid")?;
        let calibration = self.calibration_chain(survey);
        let output = pipeline
            .run(survey, &calibration)
            .context("running echo integration")?;

        Ok(WorkflowResult {
            rows: output.rows,
            channels: output.channels,
            metrics: output.metrics,
        })
    }
}

fn load_calibration_files(path: &Path) -> anyhow::Result<CalibrationTable> {
    let mut entries: BTreeMap<String, Calibration> = BTreeMap::new();
    let mut files = file_list(path, "yaml")?;
    if path.is_dir() {
        files.extend(file_list(path, "json")?);
    }
    for file in files {
        let contents = fs::read_to_string(&file)
            .with_context(|| format!("reading calibration {}", file.display()))?;
        let parsed: BTreeMap<String, Calibration> = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing calibration {}", file.display()))?;
        entries.extend(parsed);
    }
    Ok(CalibrationTable::new("calibration file", entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_survey_payload, GeneratorConfig};
    use echocore::acquisition::CalibrationSource;

    #[test]
    fn runner_executes_workflow() {
        let survey = build_survey_payload(&GeneratorConfig::default()).unwrap();
        let runner = Runner::new(WorkflowConfig::default());
        let result = runner.execute(&survey).unwrap();
        assert_eq!(result.channels.len(), 2);
        assert!(!result.rows.is_empty());
        assert!(result.metrics.sentinel_rows > 0);
    }

    #[test]
    fn calibration_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.yaml");
        fs::write(&path, "\"GPT 38 kHz\":\n  gain_db: 30.0\n").unwrap();
        let table = load_calibration_files(&path).unwrap();
        assert_eq!(table.lookup("GPT 38 kHz").unwrap().gain_db, 30.0);

        let config = WorkflowConfig {
            calibration: Some(path),
            ..Default::default()
        };
        let survey = build_survey_payload(&GeneratorConfig::default()).unwrap();
        let chain = Runner::new(config).calibration_chain(&survey);
        assert_eq!(chain.resolve("GPT 38 kHz").unwrap().gain_db, 30.0);
    }

    #[test]
    fn survey_files_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let survey = build_survey_payload(&GeneratorConfig::default()).unwrap();
        let text = serde_json::to_string(&survey).unwrap();
        fs::write(dir.path().join("D20240101-T000000.json"), &text).unwrap();
        fs::write(dir.path().join("D20240101-T001000.json"), &text).unwrap();

        let runner = Runner::new(WorkflowConfig::default());
        let merged = runner.load_survey(dir.path()).unwrap();
        assert_eq!(merged.channels.len(), survey.channels.len());
        assert_eq!(
            merged.channels[0].ping_time.len(),
            2 * survey.channels[0].ping_time.len()
        );
    }

    #[test]
    fn profile_mismatch_names_the_offending_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            pings: 4,
            ..Default::default()
        };
        let mut survey = build_survey_payload(&config).unwrap();
        let first = serde_json::to_string(&survey).unwrap();
        survey.profiles.clear();
        let second = serde_json::to_string(&survey).unwrap();
        fs::write(dir.path().join("a.json"), first).unwrap();
        fs::write(dir.path().join("b.json"), second).unwrap();

        let err = Runner::new(WorkflowConfig::default())
            .load_survey(dir.path())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("b.json"));
    }
}
