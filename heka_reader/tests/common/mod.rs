//! Synthetic PatchMaster bundles for integration tests.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use heka_reader::bundle::layouts::{
    AMPLIFIER_ROOT, AMPLIFIER_SERIES, AMPLIFIER_STATE, AMPLIFIER_STATE_RECORD, BUNDLE_HEADER,
    BUNDLE_ITEM, CHANNEL, GROUP, MARKER_ROOT, PULSED_ROOT, SERIES, STIMULATION, STIMULUS_ROOT,
    STIM_SEGMENT, SWEEP, TRACE,
};
use heka_reader::bundle::{Endian, Schema};
use tempfile::NamedTempFile;

pub const HEADER_TIME: f64 = 3_700_000_000.0;

// ===== Record and tree encoding =====

/// Zeroed record bytes with setters addressed by field name.
#[derive(Debug, Clone)]
pub struct RecordBytes {
    schema: &'static Schema,
    endian: Endian,
    bytes: Vec<u8>,
}

impl RecordBytes {
    pub fn new(schema: &'static Schema, endian: Endian) -> Self {
        RecordBytes {
            schema,
            endian,
            bytes: vec![0u8; schema.required_size],
        }
    }

    fn at(&self, name: &str) -> usize {
        self.schema
            .offset_of(name)
            .unwrap_or_else(|| panic!("{} has no field {name}", self.schema.name))
    }

    pub fn i32(mut self, name: &str, value: i32) -> Self {
        let at = self.at(name);
        match self.endian {
            Endian::Little => LittleEndian::write_i32(&mut self.bytes[at..at + 4], value),
            Endian::Big => BigEndian::write_i32(&mut self.bytes[at..at + 4], value),
        }
        self
    }

    pub fn i16(mut self, name: &str, value: i16) -> Self {
        let at = self.at(name);
        match self.endian {
            Endian::Little => LittleEndian::write_i16(&mut self.bytes[at..at + 2], value),
            Endian::Big => BigEndian::write_i16(&mut self.bytes[at..at + 2], value),
        }
        self
    }

    pub fn u16(mut self, name: &str, value: u16) -> Self {
        let at = self.at(name);
        match self.endian {
            Endian::Little => LittleEndian::write_u16(&mut self.bytes[at..at + 2], value),
            Endian::Big => BigEndian::write_u16(&mut self.bytes[at..at + 2], value),
        }
        self
    }

    pub fn f64(mut self, name: &str, value: f64) -> Self {
        let at = self.at(name);
        match self.endian {
            Endian::Little => LittleEndian::write_f64(&mut self.bytes[at..at + 8], value),
            Endian::Big => BigEndian::write_f64(&mut self.bytes[at..at + 8], value),
        }
        self
    }

    pub fn byte(mut self, name: &str, value: u8) -> Self {
        let at = self.at(name);
        self.bytes[at] = value;
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        let at = self.at(name);
        self.bytes[at..at + value.len()].copy_from_slice(value.as_bytes());
        self
    }

    pub fn nested(mut self, name: &str, record: RecordBytes) -> Self {
        let at = self.at(name);
        self.bytes[at..at + record.bytes.len()].copy_from_slice(&record.bytes);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub struct Node {
    pub record: RecordBytes,
    pub children: Vec<Node>,
}

pub fn node(record: RecordBytes, children: Vec<Node>) -> Node {
    Node { record, children }
}

fn put_i32(out: &mut Vec<u8>, endian: Endian, value: i32) {
    let mut raw = [0u8; 4];
    match endian {
        Endian::Little => LittleEndian::write_i32(&mut raw, value),
        Endian::Big => BigEndian::write_i32(&mut raw, value),
    }
    out.extend_from_slice(&raw);
}

fn write_node(out: &mut Vec<u8>, endian: Endian, node: &Node) {
    out.extend_from_slice(&node.record.bytes);
    put_i32(out, endian, node.children.len() as i32);
    for child in &node.children {
        write_node(out, endian, child);
    }
}

/// A complete tree sub-stream: tag, level table and nodes.
pub fn tree_stream(endian: Endian, levels: &[&Schema], root: &Node) -> Vec<u8> {
    let mut out = endian.tag().to_vec();
    put_i32(&mut out, endian, levels.len() as i32);
    for schema in levels {
        put_i32(&mut out, endian, schema.required_size as i32);
    }
    write_node(&mut out, endian, root);
    out
}

// ===== Bundle container =====

pub struct BundleBuilder {
    endian: Endian,
    time: f64,
    streams: Vec<(String, Vec<u8>)>,
}

impl BundleBuilder {
    pub fn new(endian: Endian) -> Self {
        BundleBuilder {
            endian,
            time: HEADER_TIME,
            streams: Vec::new(),
        }
    }

    pub fn time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Streams are laid out in insertion order right after the header.
    pub fn stream(mut self, extension: &str, bytes: Vec<u8>) -> Self {
        self.streams.push((extension.to_string(), bytes));
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        let item = BUNDLE_ITEM.required_size;
        let mut header = RecordBytes::new(&BUNDLE_HEADER, self.endian)
            .text("Signature", "DAT2")
            .text("Version", "v2x90.2")
            .f64("Time", self.time)
            .i32("Items", self.streams.len() as i32)
            .byte("IsLittleEndian", u8::from(self.endian == Endian::Little))
            .into_bytes();

        let base = BUNDLE_HEADER.offset_of("BundleItems").unwrap_or(64);
        let mut body = Vec::new();
        for (i, (extension, bytes)) in self.streams.iter().enumerate() {
            let start = (header.len() + body.len()) as i32;
            let slot = RecordBytes::new(&BUNDLE_ITEM, self.endian)
                .i32("Start", start)
                .i32("Length", bytes.len() as i32)
                .text("Extension", extension)
                .into_bytes();
            header[base + i * item..base + (i + 1) * item].copy_from_slice(&slot);
            body.extend_from_slice(bytes);
        }

        header.extend_from_slice(&body);
        header
    }

    pub fn write(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&self.bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}

// ===== Recordings =====

#[derive(Debug, Clone)]
pub struct StateSpec {
    pub valid: bool,
    pub mode: u8,
    pub ampl_kind: u8,
    pub e9_boards: i16,
    pub is_epc9n: u8,
    pub ad_board: u8,
    pub gain: u8,
    pub rs_on: u8,
    pub rs_value: f64,
    pub rs_fraction: f64,
    pub auto_c_fast: u8,
    pub c_fast: f64,
}

impl Default for StateSpec {
    fn default() -> Self {
        StateSpec {
            valid: true,
            mode: 1,
            ampl_kind: 3,
            e9_boards: 1,
            is_epc9n: 0,
            ad_board: 2,
            gain: 7,
            rs_on: 1,
            rs_value: 4e6,
            rs_fraction: 0.6,
            auto_c_fast: 1,
            c_fast: 2e-12,
        }
    }
}

impl StateSpec {
    pub fn record(&self) -> RecordBytes {
        let record = RecordBytes::new(&AMPLIFIER_STATE, Endian::Little)
            .byte("Mode", self.mode)
            .byte("AmplKind", self.ampl_kind)
            .i16("E9Boards", self.e9_boards)
            .byte("IsEpc9N", self.is_epc9n)
            .byte("ADBoard", self.ad_board)
            .byte("Gain", self.gain)
            .byte("RsOn", self.rs_on)
            .f64("RsValue", self.rs_value)
            .f64("RsFraction", self.rs_fraction)
            .byte("AutoCFast", self.auto_c_fast)
            .f64("CFastAmp1", self.c_fast)
            .f64("CFastAmp2", 0.0);
        if self.valid {
            record.text("StateVersion", "2.0")
        } else {
            record
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceSpec {
    pub label: String,
    pub dac: i32,
    pub adc: i32,
    pub y_unit: &'static str,
    pub x_unit: &'static str,
    pub samples: Vec<i16>,
    pub scale: f64,
    pub zero: f64,
    pub x_interval: f64,
    pub average_count: i32,
    pub data_kind: i16,
    pub data_format: u8,
    pub holding: f64,
}

impl Default for TraceSpec {
    fn default() -> Self {
        TraceSpec {
            label: "Imon-1".to_string(),
            dac: 0,
            adc: 1,
            y_unit: "A",
            x_unit: "s",
            samples: vec![10, 20, 30],
            scale: 1e-12,
            zero: 0.0,
            x_interval: 5e-5,
            average_count: 1,
            data_kind: 0b0100,
            data_format: 0,
            holding: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepSpec {
    pub label: String,
    pub time_offset: f64,
    pub stim_count: i32,
    pub traces: Vec<TraceSpec>,
}

impl SweepSpec {
    pub fn new(label: &str, time_offset: f64, traces: Vec<TraceSpec>) -> Self {
        SweepSpec {
            label: label.to_string(),
            time_offset,
            stim_count: 1,
            traces,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesSpec {
    pub label: String,
    pub state: Option<StateSpec>,
    pub ampl_state_series: i32,
    pub sweeps: Vec<SweepSpec>,
}

impl SeriesSpec {
    pub fn new(label: &str, sweeps: Vec<SweepSpec>) -> Self {
        SeriesSpec {
            label: label.to_string(),
            state: Some(StateSpec::default()),
            ampl_state_series: 1,
            sweeps,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub label: String,
    pub group_count: i32,
    pub series: Vec<SeriesSpec>,
}

impl GroupSpec {
    pub fn new(label: &str, group_count: i32, series: Vec<SeriesSpec>) -> Self {
        GroupSpec {
            label: label.to_string(),
            group_count,
            series,
        }
    }
}

/// One stimulation record with a channel per DAC.
#[derive(Debug, Clone)]
pub struct StimulationSpec {
    pub name: String,
    pub sample_interval: f64,
    pub dacs: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct RecordingSpec {
    pub groups: Vec<GroupSpec>,
    /// Amplifier tree: series of states.
    pub amplifier: Vec<Vec<StateSpec>>,
    pub stimulations: Option<Vec<StimulationSpec>>,
    pub with_raw_data: bool,
    pub with_amplifier: bool,
}

impl RecordingSpec {
    pub fn new(groups: Vec<GroupSpec>) -> Self {
        RecordingSpec {
            groups,
            amplifier: vec![vec![StateSpec::default()]],
            stimulations: Some(vec![StimulationSpec {
                name: "IV".to_string(),
                sample_interval: 5e-5,
                dacs: vec![0],
            }]),
            with_raw_data: true,
            with_amplifier: true,
        }
    }

    pub fn bundle(&self) -> BundleBuilder {
        let endian = Endian::Little;
        let data_start = (BUNDLE_HEADER.required_size) as i32;

        // Raw samples go first, so trace offsets are known up front.
        let mut raw = Vec::new();
        let mut groups = Vec::new();
        for group in &self.groups {
            let mut series_nodes = Vec::new();
            for (series_index, series) in group.series.iter().enumerate() {
                let mut sweep_nodes = Vec::new();
                for (sweep_index, sweep) in series.sweeps.iter().enumerate() {
                    let mut trace_nodes = Vec::new();
                    for (trace_index, trace) in sweep.traces.iter().enumerate() {
                        let offset = data_start + raw.len() as i32;
                        for sample in &trace.samples {
                            raw.extend_from_slice(&sample.to_le_bytes());
                        }
                        let record = RecordBytes::new(&TRACE, endian)
                            .text("Label", &trace.label)
                            .i32("TraceCount", trace_index as i32 + 1)
                            .i32("Data", offset)
                            .i32("DataPoints", trace.samples.len() as i32)
                            .i32("AverageCount", trace.average_count)
                            .i16("DataKind", trace.data_kind)
                            .byte("DataFormat", trace.data_format)
                            .f64("DataScaler", trace.scale)
                            .f64("ZeroData", trace.zero)
                            .text("YUnit", trace.y_unit)
                            .f64("XInterval", trace.x_interval)
                            .text("XUnit", trace.x_unit)
                            .i32("LinkDAChannel", trace.dac)
                            .i32("SourceChannel", trace.adc)
                            .f64("TrTrHolding", trace.holding);
                        trace_nodes.push(node(record, Vec::new()));
                    }
                    let record = RecordBytes::new(&SWEEP, endian)
                        .text("Label", &sweep.label)
                        .i32("StimCount", sweep.stim_count)
                        .i32("SweepCount", sweep_index as i32 + 1)
                        .f64("Time", HEADER_TIME + sweep.time_offset);
                    sweep_nodes.push(node(record, trace_nodes));
                }
                let mut record = RecordBytes::new(&SERIES, endian)
                    .text("Label", &series.label)
                    .i32("SeriesCount", series_index as i32 + 1)
                    .i32("NumberSweeps", series.sweeps.len() as i32)
                    .i32("AmplStateSeries", series.ampl_state_series);
                if let Some(state) = &series.state {
                    record = record.nested("AmplifierState", state.record());
                }
                series_nodes.push(node(record, sweep_nodes));
            }
            let record = RecordBytes::new(&GROUP, endian)
                .text("Label", &group.label)
                .i32("GroupCount", group.group_count);
            groups.push(node(record, series_nodes));
        }

        let pulsed = node(
            RecordBytes::new(&PULSED_ROOT, endian)
                .i32("Version", 9)
                .text("VersionName", "v2x90.2"),
            groups,
        );

        let mut builder = BundleBuilder::new(endian);
        if self.with_raw_data {
            builder = builder.stream(".dat", raw);
        }
        builder = builder.stream(
            ".pul",
            tree_stream(endian, &[&PULSED_ROOT, &GROUP, &SERIES, &SWEEP, &TRACE], &pulsed),
        );

        if let Some(stimulations) = &self.stimulations {
            let stim_nodes = stimulations
                .iter()
                .map(|stim| {
                    let channels = stim
                        .dacs
                        .iter()
                        .map(|dac| {
                            let segment = node(
                                RecordBytes::new(&STIM_SEGMENT, endian).f64("Duration", 0.1),
                                Vec::new(),
                            );
                            node(
                                RecordBytes::new(&CHANNEL, endian).u16("DacChannel", *dac),
                                vec![segment],
                            )
                        })
                        .collect();
                    node(
                        RecordBytes::new(&STIMULATION, endian)
                            .text("EntryName", &stim.name)
                            .f64("SampleInterval", stim.sample_interval),
                        channels,
                    )
                })
                .collect();
            let root = node(RecordBytes::new(&STIMULUS_ROOT, endian).i32("Version", 9), stim_nodes);
            builder = builder.stream(
                ".pgf",
                tree_stream(endian, &[&STIMULUS_ROOT, &STIMULATION, &CHANNEL, &STIM_SEGMENT], &root),
            );
        }

        if self.with_amplifier {
            let series = self
                .amplifier
                .iter()
                .enumerate()
                .map(|(series_index, states)| {
                    let records = states
                        .iter()
                        .enumerate()
                        .map(|(state_index, state)| {
                            node(
                                RecordBytes::new(&AMPLIFIER_STATE_RECORD, endian)
                                    .i32("StateCount", state_index as i32 + 1)
                                    .nested("AmplifierState", state.record()),
                                Vec::new(),
                            )
                        })
                        .collect();
                    node(
                        RecordBytes::new(&AMPLIFIER_SERIES, endian)
                            .i32("SeriesCount", series_index as i32 + 1),
                        records,
                    )
                })
                .collect();
            let root = node(
                RecordBytes::new(&AMPLIFIER_ROOT, endian).text("AmplifierName", "EPC10"),
                series,
            );
            builder = builder.stream(
                ".amp",
                tree_stream(
                    endian,
                    &[&AMPLIFIER_ROOT, &AMPLIFIER_SERIES, &AMPLIFIER_STATE_RECORD],
                    &root,
                ),
            );
        }

        builder.stream(
            ".mrk",
            tree_stream(
                endian,
                &[&MARKER_ROOT],
                &node(RecordBytes::new(&MARKER_ROOT, endian).i32("Version", 1), Vec::new()),
            ),
        )
    }

    pub fn write(&self) -> NamedTempFile {
        self.bundle().write()
    }
}

/// One group, one series, `sweeps` sweeps of a single voltage-clamp trace.
pub fn single_series(sweeps: usize) -> RecordingSpec {
    let sweeps = (0..sweeps)
        .map(|i| SweepSpec::new(&format!("Sweep{}", i + 1), i as f64 * 2.0, vec![TraceSpec::default()]))
        .collect();
    RecordingSpec::new(vec![GroupSpec::new(
        "Cell1",
        1,
        vec![SeriesSpec::new("IV", sweeps)],
    )])
}
