//! `heka convert`: run the converter and report what each output would hold.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use heka_reader::convert::{
    ConversionOutput, ConvertOptions, Converter, ExportSink, Partitioning, Result,
};
use serde::Serialize;

use crate::output::{self, OutputFormat};

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Path to the PatchMaster .dat bundle
    pub bundle: PathBuf,

    /// Requested output file; per-group outputs get a `-{group}` suffix
    #[arg(short, long, default_value = "recording.nwb")]
    pub output: PathBuf,

    /// Write every group into a single output
    #[arg(long)]
    pub all_groups: bool,

    /// Do not produce stimulus series
    #[arg(long, env = "HEKA_SKIP_STIMULUS")]
    pub skip_stimulus: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

impl From<&ConvertArgs> for ConvertOptions {
    fn from(args: &ConvertArgs) -> Self {
        ConvertOptions {
            partitioning: if args.all_groups {
                Partitioning::AllGroups
            } else {
                Partitioning::PerGroup
            },
            skip_stimulus: args.skip_stimulus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPreview {
    pub name: String,
    pub cycle_id: u64,
    pub electrode: usize,
    pub clamp_mode: String,
    pub unit: String,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionPreview {
    pub path: PathBuf,
    pub group: Option<i64>,
    pub identifier: String,
    pub device: String,
    pub electrodes: Vec<String>,
    pub acquisition: Vec<SeriesPreview>,
    pub stimulus: Vec<SeriesPreview>,
}

/// Sink that records where each partition would be written and what it
/// contains.
#[derive(Debug)]
pub struct PreviewSink {
    requested: PathBuf,
    pub partitions: Vec<PartitionPreview>,
}

impl PreviewSink {
    pub fn new(requested: PathBuf) -> Self {
        PreviewSink {
            requested,
            partitions: Vec::new(),
        }
    }
}

impl ExportSink for PreviewSink {
    fn write(&mut self, output: &ConversionOutput) -> Result<()> {
        let preview = |series: &heka_reader::convert::NormalizedSeries| SeriesPreview {
            name: series.name.clone(),
            cycle_id: series.cycle_id,
            electrode: series.electrode,
            clamp_mode: format!("{:?}", series.clamp_mode),
            unit: series.unit.clone(),
            samples: series.samples,
        };

        self.partitions.push(PartitionPreview {
            path: output.output_path(&self.requested),
            group: output.group,
            identifier: output.session.identifier.clone(),
            device: output.device.clone(),
            electrodes: output.electrodes.iter().map(|key| key.to_string()).collect(),
            acquisition: output.acquisition.iter().map(preview).collect(),
            stimulus: output.stimulus.iter().map(preview).collect(),
        });
        Ok(())
    }
}

pub fn run(args: &ConvertArgs) -> anyhow::Result<()> {
    let bundle = crate::open(&args.bundle)?;
    let mut sink = PreviewSink::new(args.output.clone());

    Converter::new(&bundle, ConvertOptions::from(args))
        .run(&mut sink)
        .with_context(|| format!("failed to convert {}", args.bundle.display()))?;

    println!("{}", output::format_conversion(&sink.partitions, args.format));
    Ok(())
}
