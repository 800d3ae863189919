use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use echocore::prelude::PulseType;
use generator::profile::{build_survey_payload, GeneratorConfig};
use log::info;
use report::model::RunSummary;
use report::writer::write_table_file;
use std::fs;
use std::path::PathBuf;
use workflow::config::{GridOverrides, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Clone, Copy, ValueEnum)]
enum PulseArg {
    Cw,
    Fm,
}

#[derive(Parser)]
#[command(author, version, about = "Echo-integration table builder for hydroacoustic surveys")]
struct Args {
    /// Survey payload file, or directory of payload files
    #[arg(long)]
    input: Option<PathBuf>,
    /// Integrate a generated survey instead of reading payloads
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Calibration file or directory; embedded calibration is the fallback
    #[arg(long)]
    calibration: Option<PathBuf>,
    #[arg(long, default_value = "integration_table.csv")]
    output: PathBuf,
    /// Interval length on the interval axis [default: 50]
    #[arg(long)]
    interval_length: Option<f64>,
    /// Layer thickness on the layer axis [default: 5]
    #[arg(long)]
    layer_thickness: Option<f64>,
    /// Constant offset, or the name of a surface profile in the payload [default: 2]
    #[arg(long)]
    surf_offset: Option<String>,
    /// Distance kept above the bottom line [default: 0.5]
    #[arg(long)]
    bot_offset: Option<f64>,
    #[arg(long, value_enum)]
    pulse: Option<PulseArg>,
    /// Write mean values in dB
    #[arg(long, default_value_t = false)]
    db: bool,
    /// Also write the run summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::default()
    };
    workflow_config.apply_overrides(&GridOverrides {
        interval_length: args.interval_length,
        layer_thickness: args.layer_thickness,
        surf_offset: args.surf_offset,
        bot_offset: args.bot_offset,
    });
    if let Some(path) = args.calibration {
        workflow_config.calibration = Some(path);
    }
    if let Some(pulse) = args.pulse {
        workflow_config.integration.pulse = match pulse {
            PulseArg::Cw => PulseType::Cw,
            PulseArg::Fm => PulseType::Fm,
        };
    }
    workflow_config.db_output |= args.db;

    let runner = Runner::new(workflow_config.clone());
    let survey = match (args.input.as_ref(), args.synthetic) {
        (_, true) => build_survey_payload(&GeneratorConfig {
            seed: args.seed,
            ..Default::default()
        })?,
        (Some(input), false) => runner.load_survey(input)?,
        (None, false) => bail!("either --input or --synthetic is required"),
    };

    let result = runner.execute(&survey)?;
    write_table_file(&args.output, &result.rows, workflow_config.db_output)?;

    let summary = RunSummary {
        channels: result.channels,
        rows: result.rows.len(),
        metrics: result.metrics,
    };
    info!("Wrote {} -> {}", args.output.display(), summary);
    println!("Integration table {} -> {}", args.output.display(), summary);

    if let Some(path) = args.summary {
        let json = serde_json::to_string_pretty(&summary).context("serializing run summary")?;
        fs::write(&path, json).with_context(|| format!("writing summary {}", path.display()))?;
    }

    Ok(())
}
