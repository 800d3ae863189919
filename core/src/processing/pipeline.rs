use crate::acquisition::calibration::CalibrationChain;
use crate::acquisition::channel::Channel;
use crate::acquisition::survey::SurveyPayload;
use crate::prelude::{IntegrationConfig, PipelineError, PipelineResult, PulseType};
use crate::processing::assembler::{ChannelTable, TableAssembler, TableRow};
use crate::processing::balancer::LayerBalancer;
use crate::processing::classifier::Classification;
use crate::processing::exclusion::ExclusionResolver;
use crate::processing::grid::GridPartitioner;
use crate::processing::integrator::{IntegrationResult, Integrator};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{Metrics, MetricsRecorder};

/// Balanced table plus what went into it.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub rows: Vec<TableRow>,
    pub channels: Vec<String>,
    pub metrics: Metrics,
}

/// Classify → select → calibrate → grid/exclude/integrate → assemble → balance.
pub struct IntegrationPipeline {
    config: IntegrationConfig,
    partitioner: GridPartitioner,
    logger: LogManager,
}

impl IntegrationPipeline {
    /// Fails early on grid sizing that can never be satisfied.
    pub fn new(config: IntegrationConfig) -> PipelineResult<Self> {
        let partitioner = GridPartitioner::new(
            config.interval_axis,
            config.interval_length,
            config.layer_thickness,
        )?;
        Ok(Self {
            config,
            partitioner,
            logger: LogManager::new(),
        })
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    pub fn run(&self, survey: &SurveyPayload, calibration: &CalibrationChain) -> PipelineResult<PipelineOutput> {
        let resolver = ExclusionResolver::new(
            &self.config.surf_offset,
            &survey.profiles,
            self.config.bot_offset,
        )?;

        let classification = Classification::classify(&survey.metadata());
        let selected = classification.select(self.config.mode, self.config.pulse)?;
        self.logger.record(&format!(
            "Selected {} of {} channels ({} {})",
            selected.len(),
            classification.len(),
            self.config.mode,
            self.config.pulse
        ));

        let mut channels = Vec::with_capacity(selected.len());
        for id in &selected {
            let record = survey
                .channel(id)
                .ok_or_else(|| PipelineError::InvalidInput(format!("channel {} vanished", id)))?;
            let cal = calibration.resolve(id)?;
            channels.push(record.to_channel()?.calibrated(&cal));
        }

        self.run_channels(&channels, &resolver)
    }

    /// Runs already calibrated channels through integration and balancing.
    pub fn run_channels(&self, channels: &[Channel], resolver: &ExclusionResolver) -> PipelineResult<PipelineOutput> {
        let metrics = MetricsRecorder::new();
        let integrator = Integrator::new();
        let assembler = TableAssembler::new();

        let mut tables = Vec::with_capacity(channels.len());
        for channel in channels {
            let result = self.integrate_channel(&integrator, channel, resolver)?;
            metrics.record_channel(result.empty_cells());
            tables.push(ChannelTable {
                frequencies: assembler.frequency_labels(channel),
                result,
            });
        }

        let assembled = assembler.assemble(&tables)?;
        let assembled_len = assembled.len();
        let rows = LayerBalancer::new().balance(assembled);
        metrics.record_rows(assembled_len, rows.len() - assembled_len);

        Ok(PipelineOutput {
            rows,
            channels: channels.iter().map(|c| c.id.clone()).collect(),
            metrics: metrics.snapshot(),
        })
    }

    fn integrate_channel(
        &self,
        integrator: &Integrator,
        channel: &Channel,
        resolver: &ExclusionResolver,
    ) -> PipelineResult<IntegrationResult> {
        let along_track = channel.interval_axis(self.config.interval_axis)?;
        let vertical = channel.vertical_axis(self.config.layer_axis);
        let grid = self.partitioner.partition(&along_track, &vertical)?;
        let bottom = channel.bottom_on(self.config.layer_axis);
        let windows = resolver.resolve(channel.ping_count(), bottom.as_deref())?;
        integrator.integrate(channel, self.pulse_of(channel), &grid, &windows)
    }

    fn pulse_of(&self, channel: &Channel) -> PulseType {
        match self.config.pulse {
            PulseType::Fm => PulseType::Fm,
            PulseType::Cw if channel.component_count() > 1 => PulseType::Fm,
            PulseType::Cw => PulseType::Cw,
        }
    }
}
