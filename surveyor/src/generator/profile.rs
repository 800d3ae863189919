use crate::generator::template::{scattering_layer, seafloor_depth};
use echocore::acquisition::{Calibration, ChannelRecord, SurveyPayload};
use echocore::math::StatsHelper;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for generating a synthetic multi-channel survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub pings: usize,
    pub ping_interval_s: f64,
    pub speed_mps: f64,
    pub transducer_depth: f64,
    pub bottom_depth: f64,
    pub layer_depth: f64,
    pub noise: f64,
    pub seed: u64,
    pub include_fm: bool,
    pub include_passive: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            pings: 120,
            ping_interval_s: 1.0,
            speed_mps: 5.0,
            transducer_depth: 5.0,
            bottom_depth: 60.0,
            layer_depth: 25.0,
            noise: 0.2,
            seed: 0,
            include_fm: true,
            include_passive: true,
        }
    }
}

struct ChannelTemplate {
    id: &'static str,
    frequencies: &'static [f64],
    max_range: f64,
    sample_spacing: f64,
    gain_db: f64,
    passive: bool,
    with_bottom: bool,
}

const CW_18: ChannelTemplate = ChannelTemplate {
    id: "GPT 18 kHz",
    frequencies: &[18000.0],
    max_range: 75.0,
    sample_spacing: 0.5,
    gain_db: 22.9,
    passive: false,
    with_bottom: true,
};

const CW_38: ChannelTemplate = ChannelTemplate {
    id: "GPT 38 kHz",
    frequencies: &[38000.0],
    max_range: 100.0,
    sample_spacing: 0.5,
    gain_db: 26.5,
    passive: false,
    with_bottom: false,
};

const PASSIVE_70: ChannelTemplate = ChannelTemplate {
    id: "WBT 70 kHz passive",
    frequencies: &[70000.0],
    max_range: 50.0,
    sample_spacing: 0.5,
    gain_db: 27.0,
    passive: true,
    with_bottom: false,
};

const FM_38: ChannelTemplate = ChannelTemplate {
    id: "WBT 38 kHz FM",
    frequencies: &[34000.0, 36000.0, 38000.0],
    max_range: 80.0,
    sample_spacing: 0.5,
    gain_db: 26.0,
    passive: false,
    with_bottom: true,
};

fn build_channel(
    template: &ChannelTemplate,
    config: &GeneratorConfig,
    rng: &mut StdRng,
) -> anyhow::Result<ChannelRecord> {
    let pings = config.pings.max(1);
    let samples_per_ping = (template.max_range / template.sample_spacing).floor() as usize;
    anyhow::ensure!(samples_per_ping > 0, "{} has no range samples", template.id);
    let range: Vec<f64> = (0..samples_per_ping)
        .map(|r| r as f64 * template.sample_spacing)
        .collect();
    let bottom: Vec<f64> = (0..pings)
        .map(|p| seafloor_depth(p, config.bottom_depth, 2.0))
        .collect();
    // Raw samples carry the two-way gain that calibration removes again.
    let gain = StatsHelper::db_to_linear(2.0 * template.gain_db);

    let mut samples = Vec::with_capacity(template.frequencies.len());
    for component in 0..template.frequencies.len() {
        let peak_db = -65.0 + 2.0 * component as f64;
        let mut pings_out = Vec::with_capacity(pings);
        for ping in 0..pings {
            let row = range
                .iter()
                .map(|&r| {
                    let depth = r + config.transducer_depth;
                    let background = StatsHelper::db_to_linear(-90.0);
                    let echo = if template.passive {
                        background
                    } else if depth >= bottom[ping] {
                        StatsHelper::db_to_linear(-20.0)
                    } else {
                        background + scattering_layer(depth, config.layer_depth, 3.0, peak_db)
                    };
                    let jitter = 1.0 + rng.gen_range(-config.noise..=config.noise);
                    echo * jitter * gain
                })
                .collect();
            pings_out.push(row);
        }
        samples.push(pings_out);
    }

    Ok(ChannelRecord {
        id: template.id.to_string(),
        passive: template.passive,
        fm: template.frequencies.len() > 1,
        ping_time: (0..pings).map(|p| p as f64 * config.ping_interval_s).collect(),
        distance: Some(
            (0..pings)
                .map(|p| p as f64 * config.ping_interval_s * config.speed_mps)
                .collect(),
        ),
        range,
        transducer_depth: config.transducer_depth,
        frequency: vec![template.frequencies.to_vec(); pings],
        samples,
        bottom_line: template.with_bottom.then(|| bottom.clone()),
        calibration: Some(Calibration {
            gain_db: template.gain_db,
            sa_correction_db: 0.0,
        }),
    })
}

pub fn build_survey_payload(config: &GeneratorConfig) -> anyhow::Result<SurveyPayload> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut templates = vec![&CW_18, &CW_38];
    if config.include_passive {
        templates.push(&PASSIVE_70);
    }
    if config.include_fm {
        templates.push(&FM_38);
    }

    let channels = templates
        .into_iter()
        .map(|template| build_channel(template, config, &mut rng))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut profiles = BTreeMap::new();
    profiles.insert(
        "xyz".to_string(),
        (0..config.pings.max(1))
            .map(|p| 3.0 + 0.5 * (p as f64 / 10.0).cos())
            .collect(),
    );

    Ok(SurveyPayload { channels, profiles })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_channels() {
        let survey = build_survey_payload(&GeneratorConfig::default()).unwrap();
        assert_eq!(survey.channels.len(), 4);
        let fm = survey.channel("WBT 38 kHz FM").unwrap();
        assert!(fm.fm);
        assert_eq!(fm.samples.len(), 3);
        assert_eq!(fm.frequency[0], vec![34000.0, 36000.0, 38000.0]);
        for record in &survey.channels {
            let channel = record.to_channel().unwrap();
            assert_eq!(channel.ping_count(), 120);
        }
        assert_eq!(survey.profiles["xyz"].len(), 120);
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let config = GeneratorConfig {
            pings: 10,
            seed: 13,
            include_fm: false,
            include_passive: false,
            ..Default::default()
        };
        let a = build_survey_payload(&config).unwrap();
        let b = build_survey_payload(&config).unwrap();
        assert_eq!(a.channels.len(), 2);
        assert_eq!(a.channels[0].samples, b.channels[0].samples);
    }
}
