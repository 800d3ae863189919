use anyhow::Context;
use echocore::prelude::{IntegrationConfig, SurfaceOffset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    #[serde(flatten)]
    pub integration: IntegrationConfig,
    /// Calibration file, or directory of calibration files.
    pub calibration: Option<PathBuf>,
    /// Write mean values in dB instead of the linear domain.
    pub db_output: bool,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Flags given on the command line win over the file or the defaults.
    pub fn apply_overrides(&mut self, overrides: &GridOverrides) {
        let integration = &mut self.integration;
        if let Some(length) = overrides.interval_length {
            integration.interval_length = length;
        }
        if let Some(thickness) = overrides.layer_thickness {
            integration.layer_thickness = thickness;
        }
        if let Some(offset) = overrides.surf_offset.as_deref() {
            integration.surf_offset = parse_surface_offset(offset);
        }
        if let Some(offset) = overrides.bot_offset {
            integration.bot_offset = offset;
        }
    }
}

/// Grid sizing and offsets passed explicitly on the command line.
#[derive(Clone, Debug, Default)]
pub struct GridOverrides {
    pub interval_length: Option<f64>,
    pub layer_thickness: Option<f64>,
    pub surf_offset: Option<String>,
    pub bot_offset: Option<f64>,
}

/// Numbers become constant offsets; anything else names an external profile.
pub fn parse_surface_offset(value: &str) -> SurfaceOffset {
    match value.trim().parse::<f64>() {
        Ok(offset) => SurfaceOffset::Constant(offset),
        Err(_) => SurfaceOffset::Profile(value.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echocore::prelude::{IntervalAxis, LayerAxis, PulseType};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn overrides_replace_only_given_values() {
        let mut cfg = WorkflowConfig::default();
        cfg.apply_overrides(&GridOverrides {
            interval_length: Some(25.0),
            surf_offset: Some("3".into()),
            ..Default::default()
        });
        assert_eq!(cfg.integration.interval_length, 25.0);
        assert_eq!(cfg.integration.surf_offset, SurfaceOffset::Constant(3.0));
        assert_eq!(cfg.integration.layer_thickness, 5.0);
        assert_eq!(cfg.integration.bot_offset, 0.5);
        assert!(!cfg.db_output);
    }

    #[test]
    fn overrides_win_over_loaded_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"interval_length: 10.0\nlayer_thickness: 2.0\nbot_offset: 1.0\n")
            .unwrap();
        let path = temp.into_temp_path();
        let mut cfg = WorkflowConfig::load(&path).unwrap();
        cfg.apply_overrides(&GridOverrides {
            layer_thickness: Some(8.0),
            bot_offset: Some(0.25),
            ..Default::default()
        });
        assert_eq!(cfg.integration.interval_length, 10.0);
        assert_eq!(cfg.integration.layer_thickness, 8.0);
        assert_eq!(cfg.integration.bot_offset, 0.25);
    }

    #[test]
    fn surface_offset_names_select_profiles() {
        assert_eq!(
            parse_surface_offset("xyz"),
            SurfaceOffset::Profile("xyz".into())
        );
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"interval_axis: distance\ninterval_length: 0.5\nlayer_axis: depth\nsurf_offset: xyz\npulse: FM\ndb_output: true\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.integration.interval_axis, IntervalAxis::Distance);
        assert_eq!(cfg.integration.layer_axis, LayerAxis::Depth);
        assert_eq!(cfg.integration.surf_offset, SurfaceOffset::Profile("xyz".into()));
        assert_eq!(cfg.integration.pulse, PulseType::Fm);
        assert_eq!(cfg.integration.layer_thickness, 5.0);
        assert!(cfg.db_output);
    }
}
