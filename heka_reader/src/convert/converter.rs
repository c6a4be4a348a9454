use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::bundle::{time, Bundle, Record, TreeFile, TreeNode};

use super::amplifier::{clamp_mode, current_clamp_fields, gain, resolve_state, voltage_clamp_fields};
use super::electrode::{ElectrodeKey, ElectrodeMap};
use super::error::{ConvertError, Result};
use super::series::{parse_unit, series_name, ClampMode, NormalizedSeries, SeriesExtras};
use super::validate::{preflight, Preflight};

/// Receives one converted partition at a time.
pub trait ExportSink {
    fn write(&mut self, output: &ConversionOutput) -> Result<()>;
}

/// Reconstructs the stimulus waveform applied during a sweep.
pub trait StimulusGenerator {
    /// Samples for `trace` in `sweep`; empty when the stimulus cannot be
    /// rebuilt.
    fn fetch(&self, sweep: TreeNode<'_>, trace: TreeNode<'_>) -> Vec<f64>;
}

/// Generator that never produces a stimulus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStimulus;

impl StimulusGenerator for NoStimulus {
    fn fetch(&self, _sweep: TreeNode<'_>, _trace: TreeNode<'_>) -> Vec<f64> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// One output per group.
    #[default]
    PerGroup,
    /// A single output holding every group.
    AllGroups,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub partitioning: Partitioning,
    pub skip_stimulus: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub identifier: String,
    pub start_time: Option<DateTime<Utc>>,
    pub creator: String,
    pub source_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutput {
    /// `GroupCount` of the converted group, or `None` for all groups.
    pub group: Option<i64>,
    pub session: SessionInfo,
    pub device: String,
    pub electrodes: Vec<ElectrodeKey>,
    pub acquisition: Vec<NormalizedSeries>,
    pub stimulus: Vec<NormalizedSeries>,
}

impl ConversionOutput {
    /// Where this partition should be written, given the requested output
    /// path: per-group outputs get `-{GroupCount}` before the extension.
    pub fn output_path(&self, requested: &Path) -> PathBuf {
        let Some(group) = self.group else {
            return requested.to_path_buf();
        };
        let stem = requested
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match requested.extension() {
            Some(ext) => format!("{stem}-{group}.{}", ext.to_string_lossy()),
            None => format!("{stem}-{group}"),
        };
        requested.with_file_name(name)
    }
}

/// Maps a bundle's pulse tree onto normalized series.
pub struct Converter<'a, G = NoStimulus> {
    bundle: &'a Bundle,
    options: ConvertOptions,
    generator: G,
}

impl<'a> Converter<'a, NoStimulus> {
    pub fn new(bundle: &'a Bundle, options: ConvertOptions) -> Self {
        Converter {
            bundle,
            options,
            generator: NoStimulus,
        }
    }
}

impl<'a, G: StimulusGenerator> Converter<'a, G> {
    pub fn with_generator<H: StimulusGenerator>(self, generator: H) -> Converter<'a, H> {
        Converter {
            bundle: self.bundle,
            options: self.options,
            generator,
        }
    }

    /// Validate the bundle and build every partition.
    ///
    /// Nothing is returned unless every partition converts.
    pub fn convert(&self) -> Result<Vec<ConversionOutput>> {
        let pre = preflight(self.bundle)?;
        let stimulus = self.stimulus_tree()?;

        let root = pre.pulsed.root();
        let numbering = Numbering::new(root);
        let session = self.session();

        let groups: Vec<TreeNode<'_>> = root.children().collect();
        let partitions = match self.options.partitioning {
            Partitioning::AllGroups => vec![(None, groups)],
            Partitioning::PerGroup => groups
                .into_iter()
                .map(|group| -> Result<_> {
                    Ok((Some(group.record().i64("GroupCount")?), vec![group]))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let partition = Partition {
            converter: self,
            pre: &pre,
            stimulus,
            numbering: &numbering,
        };
        let outputs = partitions
            .into_iter()
            .map(|(group, nodes)| partition.build(group, &nodes, session.clone()))
            .collect::<Result<Vec<_>>>()?;

        info!(
            file = %self.bundle.file_name(),
            partitions = outputs.len(),
            acquisition = outputs.iter().map(|o| o.acquisition.len()).sum::<usize>(),
            stimulus = outputs.iter().map(|o| o.stimulus.len()).sum::<usize>(),
            "converted bundle"
        );
        Ok(outputs)
    }

    /// Convert, then hand every partition to `sink` in order.
    pub fn run(&self, sink: &mut dyn ExportSink) -> Result<usize> {
        let outputs = self.convert()?;
        for output in &outputs {
            sink.write(output)?;
        }
        Ok(outputs.len())
    }

    fn stimulus_tree(&self) -> Result<Option<&'a TreeFile>> {
        if self.options.skip_stimulus {
            return Ok(None);
        }
        let tree = self.bundle.stimulus()?;
        if tree.is_none() {
            warn!(file = %self.bundle.file_name(), "no stimulus tree, stimulus series skipped");
        }
        Ok(tree)
    }

    fn session(&self) -> SessionInfo {
        let header = self.bundle.header();
        let source_file = self.bundle.file_name();

        let mut hasher = Sha256::new();
        hasher.update(format!("{}_{}", header.time, source_file).as_bytes());
        let identifier = format!("{:x}", hasher.finalize());

        SessionInfo {
            identifier,
            start_time: time::to_datetime(header.time),
            creator: format!("PatchMaster {}", header.version.trim()),
            source_file,
        }
    }
}

/// File-wide numbering, independent of partitioning.
struct Numbering {
    /// Cycle id per sweep node, in pre-order over (group, series, sweep).
    cycles: HashMap<usize, u64>,
    total_traces: usize,
}

impl Numbering {
    fn new(root: TreeNode<'_>) -> Self {
        let mut cycles = HashMap::new();
        let mut total_traces = 0;
        for group in root.children() {
            for series in group.children() {
                for sweep in series.children() {
                    cycles.insert(sweep.id(), cycles.len() as u64);
                    total_traces += sweep.len();
                }
            }
        }
        Numbering {
            cycles,
            total_traces,
        }
    }

    fn cycle_id(&self, sweep: TreeNode<'_>) -> u64 {
        self.cycles.get(&sweep.id()).copied().unwrap_or_default()
    }
}

/// Position of a trace within the pulse tree.
#[derive(Clone, Copy)]
struct TraceContext<'t> {
    group: &'t Record,
    series: &'t Record,
    sweep: TreeNode<'t>,
    trace: TreeNode<'t>,
    trace_index: usize,
    cycle_id: u64,
}

struct Partition<'c, 'a, G> {
    converter: &'c Converter<'a, G>,
    pre: &'c Preflight<'a>,
    stimulus: Option<&'a TreeFile>,
    numbering: &'c Numbering,
}

impl<'a, G: StimulusGenerator> Partition<'_, 'a, G> {
    fn build(
        &self,
        group: Option<i64>,
        groups: &[TreeNode<'a>],
        session: SessionInfo,
    ) -> Result<ConversionOutput> {
        let electrodes = ElectrodeMap::from_groups(groups.iter().copied())?;
        let mut acquisition = Vec::new();
        let mut stimulus = Vec::new();

        for context in traces(groups, self.numbering) {
            let series = self.acquired(&context, &electrodes, acquisition.len())?;
            acquisition.push(series);
        }

        if let Some(stimulus_tree) = self.stimulus {
            for context in traces(groups, self.numbering) {
                if let Some(series) =
                    self.stimulus_series(&context, stimulus_tree, &electrodes, stimulus.len())?
                {
                    stimulus.push(series);
                }
            }
        }

        Ok(ConversionOutput {
            group,
            session,
            device: self.pre.device.clone(),
            electrodes: electrodes.keys().to_vec(),
            acquisition,
            stimulus,
        })
    }

    fn acquired(
        &self,
        context: &TraceContext<'a>,
        electrodes: &ElectrodeMap,
        counter: usize,
    ) -> Result<NormalizedSeries> {
        let trace = context.trace.record();
        let state = resolve_state(
            context.series,
            Some(self.pre.amplifier.root()),
            context.trace_index,
        )?;
        let mode = clamp_mode(state, trace)?;
        let extras = match mode {
            ClampMode::VoltageClamp => SeriesExtras::VoltageClamp(voltage_clamp_fields(state)?),
            ClampMode::CurrentClamp => {
                SeriesExtras::CurrentClamp(current_clamp_fields(state, trace)?)
            }
        };

        let data = self.pre.samples.read(trace)?;
        let (conversion, unit) = parse_unit(trace.text("YUnit")?);

        Ok(NormalizedSeries {
            name: series_name(counter, self.numbering.total_traces),
            samples: data.len(),
            data,
            cycle_id: context.cycle_id,
            unit,
            conversion,
            electrode: electrode_index(electrodes, trace)?,
            gain: gain(state)?,
            resolution: None,
            rate: 1.0 / trace.f64("XInterval")?,
            starting_time: self.starting_time(context)?,
            stimulus_description: context.series.text("Label")?.to_string(),
            description: self.description(context)?,
            clamp_mode: mode,
            extras,
        })
    }

    fn stimulus_series(
        &self,
        context: &TraceContext<'a>,
        stimulus_tree: &'a TreeFile,
        electrodes: &ElectrodeMap,
        counter: usize,
    ) -> Result<Option<NormalizedSeries>> {
        let sweep = context.sweep.record();
        let trace = context.trace.record();

        let data = self.converter.generator.fetch(context.sweep, context.trace);
        if data.is_empty() {
            warn!(
                series = context.series.text("Label").unwrap_or_default(),
                sweep = sweep.text("Label").unwrap_or_default(),
                "stimulus cannot be recreated, series skipped"
            );
            return Ok(None);
        }

        let stim_count = sweep.i64("StimCount")?;
        let stimulation = usize::try_from(stim_count - 1)
            .ok()
            .and_then(|index| stimulus_tree.root().child(index))
            .ok_or_else(|| {
                ConvertError::validation(format!(
                    "sweep {:?} refers to missing stimulation record {stim_count}",
                    sweep.text("Label").unwrap_or_default()
                ))
            })?;

        let dac = trace.i64("LinkDAChannel")?;
        let mut channels = stimulation.children();
        if !channels.any(|channel| channel.record().i64("DacChannel").ok() == Some(dac)) {
            return Err(ConvertError::validation(format!(
                "stimulation {:?} has no channel for DAC {dac}",
                stimulation.record().text("EntryName").unwrap_or_default()
            )));
        }

        let state = resolve_state(
            context.series,
            Some(self.pre.amplifier.root()),
            context.trace_index,
        )?;
        let mode = clamp_mode(state, trace)?;
        let (conversion, unit) = match mode {
            ClampMode::VoltageClamp => (1e-3, "V"),
            ClampMode::CurrentClamp => (1e-12, "A"),
        };

        Ok(Some(NormalizedSeries {
            name: series_name(counter, self.numbering.total_traces),
            samples: data.len(),
            data,
            cycle_id: context.cycle_id,
            unit: unit.to_string(),
            conversion,
            electrode: electrode_index(electrodes, trace)?,
            gain: Some(1.0),
            resolution: None,
            rate: 1.0 / stimulation.record().f64("SampleInterval")?,
            starting_time: self.starting_time(context)?,
            stimulus_description: context.series.text("Label")?.to_string(),
            description: self.description(context)?,
            clamp_mode: mode,
            extras: SeriesExtras::Stimulus,
        }))
    }

    fn starting_time(&self, context: &TraceContext<'_>) -> Result<f64> {
        let start = self.converter.bundle.header().time;
        Ok(time::elapsed(start, context.sweep.record().f64("Time")?))
    }

    fn description(&self, context: &TraceContext<'_>) -> Result<String> {
        let value = serde_json::json!({
            "cycle_id": context.cycle_id,
            "file": self.converter.bundle.file_name(),
            "group_label": context.group.text("Label")?,
            "series_label": context.series.text("Label")?,
            "sweep_label": context.sweep.record().text("Label")?,
        });
        to_indented_json(&value)
    }
}

/// Every trace below `groups`, in pre-order.
fn traces<'g, 'a>(
    groups: &'g [TreeNode<'a>],
    numbering: &'g Numbering,
) -> impl Iterator<Item = TraceContext<'a>> + 'g {
    groups.iter().flat_map(move |group| {
        group.children().flat_map(move |series| {
            series.children().flat_map(move |sweep| {
                let cycle_id = numbering.cycle_id(sweep);
                sweep
                    .children()
                    .enumerate()
                    .map(move |(trace_index, trace)| TraceContext {
                        group: group.record(),
                        series: series.record(),
                        sweep,
                        trace,
                        trace_index,
                        cycle_id,
                    })
            })
        })
    })
}

fn electrode_index(electrodes: &ElectrodeMap, trace: &Record) -> Result<usize> {
    let key = ElectrodeKey::from_trace(trace)?;
    electrodes
        .index_of(&key)
        .ok_or_else(|| ConvertError::validation(format!("no electrode for {key}")))
}

/// JSON with sorted keys and four-space indentation.
fn to_indented_json(value: &serde_json::Value) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|err| ConvertError::Json(serde::ser::Error::custom(err)))
}
