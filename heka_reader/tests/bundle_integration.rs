//! Bundle decoding against synthetic PatchMaster files.
//!
//! Tests cover:
//! - Header and catalog parsing
//! - Lazy decoding of every tree sub-stream
//! - Trace sample access
//! - Big-endian bundles
//! - Corrupt and truncated inputs
//! - Metadata reports

mod common;

use common::{node, tree_stream, BundleBuilder, RecordBytes, HEADER_TIME};
use heka_reader::bundle::dump::write_report;
use heka_reader::bundle::layouts::{MARKER_ROOT, TRACE};
use heka_reader::bundle::{
    Bundle, BundleError, Endian, SampleFormat, StreamKind, TraceLayout,
};

fn two_sweep_recording() -> tempfile::NamedTempFile {
    common::single_series(2).write()
}

// ===== Header and catalog =====

#[test]
fn test_open__synthetic_recording__then_header_and_catalog() {
    let file = two_sweep_recording();

    let bundle = Bundle::open(file.path()).unwrap();

    let header = bundle.header();
    assert_eq!(header.signature, "DAT2");
    assert_eq!(header.version, "v2x90.2");
    assert_eq!(header.time, HEADER_TIME);
    assert!(header.is_little_endian);
    assert_eq!(bundle.endian(), Endian::Little);

    let extensions: Vec<&str> = bundle.catalog().iter().map(|e| e.extension.as_str()).collect();
    assert_eq!(extensions, vec![".dat", ".pul", ".pgf", ".amp", ".mrk"]);
    assert_eq!(bundle.catalog()[0].start, 256);
    for pair in bundle.catalog().windows(2) {
        assert_eq!(pair[0].end(), pair[1].start);
    }
}

#[test]
fn test_open__not_a_bundle__then_endian_detection_failure() {
    let mut bytes = BundleBuilder::new(Endian::Little).bytes();
    bytes[..3].copy_from_slice(b"XYZ");
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), &bytes).unwrap();

    let err = Bundle::open(file.path()).unwrap_err();

    assert!(matches!(err, BundleError::EndianDetectionFailure { offset: 0, .. }));
}

#[test]
fn test_open__shorter_than_header__then_error() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"DAT2").unwrap();

    assert!(Bundle::open(file.path()).is_err());
}

// ===== Tree sub-streams =====

#[test]
fn test_pulsed__two_sweeps__then_hierarchy_in_file_order() {
    let file = two_sweep_recording();
    let bundle = Bundle::open(file.path()).unwrap();
    assert!(!bundle.is_loaded(StreamKind::Pulsed));

    let pulsed = bundle.pulsed().unwrap().unwrap();

    assert!(bundle.is_loaded(StreamKind::Pulsed));
    assert_eq!(pulsed.tree().level_sizes(), &[640, 144, 1408, 288, 512]);
    let root = pulsed.root();
    assert_eq!(root.record().text("VersionName").unwrap(), "v2x90.2");
    let group = root.child(0).unwrap();
    assert_eq!(group.record().text("Label").unwrap(), "Cell1");
    let series = group.child(0).unwrap();
    assert_eq!(series.record().text("Label").unwrap(), "IV");
    let sweeps: Vec<&str> = series
        .children()
        .map(|sweep| sweep.record().text("Label").unwrap())
        .collect();
    assert_eq!(sweeps, vec!["Sweep1", "Sweep2"]);
    assert_eq!(pulsed.tree().len(), 1 + 1 + 1 + 2 + 2);
}

#[test]
fn test_streams__every_kind__then_root_schema_matches_level_zero() {
    let file = two_sweep_recording();
    let bundle = Bundle::open(file.path()).unwrap();

    for kind in StreamKind::ALL {
        let Some(stream) = bundle.stream(kind).unwrap() else {
            continue;
        };
        assert_eq!(stream.kind(), kind);
        assert_eq!(stream.root().level(), 0);
        assert_eq!(stream.root().record().schema_name(), kind.levels()[0].name);
    }
    assert!(bundle.method().unwrap().is_none());
    assert!(bundle.solutions().unwrap().is_none());
}

#[test]
fn test_amplifier__state_record__then_nested_state_decoded() {
    let file = two_sweep_recording();
    let bundle = Bundle::open(file.path()).unwrap();

    let amplifier = bundle.amplifier().unwrap().unwrap();
    let record = amplifier.root().child(0).unwrap().child(0).unwrap().record();
    let state = record.record("AmplifierState").unwrap();

    assert_eq!(state.text("StateVersion").unwrap(), "2.0");
    assert_eq!(state.text("AmplKind").unwrap(), "EPC10");
    assert_eq!(state.text("Mode").unwrap(), "VCMode");
    assert_eq!(state.f64("RsValue").unwrap(), 4e6);
}

#[test]
fn test_stimulus__channel_record__then_one_byte_filler_consumed() {
    let file = two_sweep_recording();
    let bundle = Bundle::open(file.path()).unwrap();

    let stimulus = bundle.stimulus().unwrap().unwrap();
    let stimulation = stimulus.root().child(0).unwrap();
    let channel = stimulation.child(0).unwrap();
    let segment = channel.child(0).unwrap();

    assert_eq!(stimulation.record().text("EntryName").unwrap(), "IV");
    assert_eq!(channel.record().i64("DacChannel").unwrap(), 0);
    assert_eq!(segment.record().f64("Duration").unwrap(), 0.1);
}

#[test]
fn test_stream__bad_tree_tag__then_failure_names_sub_stream() {
    let mut stream = tree_stream(
        Endian::Little,
        &[&MARKER_ROOT],
        &node(RecordBytes::new(&MARKER_ROOT, Endian::Little), Vec::new()),
    );
    stream[..4].copy_from_slice(b"oops");
    let file = BundleBuilder::new(Endian::Little).stream(".mrk", stream).write();
    let bundle = Bundle::open(file.path()).unwrap();

    let err = bundle.marker().unwrap_err();

    match err {
        BundleError::EndianDetectionFailure { location, offset, found } => {
            assert_eq!(location, ".mrk");
            assert_eq!(offset, 256);
            assert_eq!(found, b"oops".to_vec());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!bundle.is_loaded(StreamKind::Marker));
}

#[test]
fn test_stream__truncated_tree__then_truncated_error() {
    let mut stream = common::single_series(1).bundle().bytes();
    let full = stream.len();
    stream.truncate(full - 100);
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), &stream).unwrap();
    let bundle = Bundle::open(file.path()).unwrap();

    assert!(matches!(bundle.marker(), Err(BundleError::Truncated { .. })));
}

#[test]
fn test_stream__corrupt_level_count__then_invalid_tree() {
    let mut stream = tree_stream(
        Endian::Little,
        &[&MARKER_ROOT],
        &node(RecordBytes::new(&MARKER_ROOT, Endian::Little), Vec::new()),
    );
    stream[4..8].copy_from_slice(&40i32.to_le_bytes());
    let file = BundleBuilder::new(Endian::Little).stream(".mrk", stream).write();
    let bundle = Bundle::open(file.path()).unwrap();

    assert!(matches!(bundle.marker(), Err(BundleError::InvalidTree { .. })));
}

// ===== Samples =====

#[test]
fn test_samples__int16_trace__then_calibrated_values() {
    let file = two_sweep_recording();
    let bundle = Bundle::open(file.path()).unwrap();
    let pulsed = bundle.pulsed().unwrap().unwrap();
    let trace = pulsed
        .root()
        .child(0)
        .and_then(|group| group.child(0))
        .and_then(|series| series.child(1))
        .and_then(|sweep| sweep.child(0))
        .unwrap();

    let layout = TraceLayout::from_trace(trace.record()).unwrap();
    let values = bundle.samples().unwrap().read(trace.record()).unwrap();

    assert_eq!(trace.record().schema_name(), TRACE.name);
    assert_eq!(layout.format, SampleFormat::Int16);
    assert_eq!(layout.points, 3);
    assert_eq!(layout.offset, 256 + 6);
    assert_eq!(values.len(), 3);
    for (value, raw) in values.iter().zip([10.0, 20.0, 30.0]) {
        assert!((value - raw * 1e-12).abs() < 1e-24);
    }
}

#[test]
fn test_samples__trace_beyond_data__then_truncated() {
    let bundle_bytes = common::single_series(1).bundle().bytes();
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), &bundle_bytes).unwrap();
    let bundle = Bundle::open(file.path()).unwrap();
    let layout = TraceLayout {
        offset: bundle_bytes.len() as u64 - 2,
        points: 4,
        format: SampleFormat::Int16,
        scale: 1.0,
        zero: 0.0,
    };

    let err = bundle.samples().unwrap().read_layout(&layout).unwrap_err();

    assert!(matches!(err, BundleError::Truncated { needed: 8, available: 2, .. }));
}

// ===== Byte order =====

#[test]
fn test_open__big_endian_bundle__then_fields_decoded_big_endian() {
    let root = node(
        RecordBytes::new(&MARKER_ROOT, Endian::Big).i32("Version", 77).i32("CRC", -5),
        Vec::new(),
    );
    let file = BundleBuilder::new(Endian::Big)
        .time(123.5)
        .stream(".mrk", tree_stream(Endian::Big, &[&MARKER_ROOT], &root))
        .write();

    let bundle = Bundle::open(file.path()).unwrap();

    assert_eq!(bundle.endian(), Endian::Big);
    assert!(!bundle.header().is_little_endian);
    assert_eq!(bundle.header().time, 123.5);
    let marker = bundle.marker().unwrap().unwrap();
    assert_eq!(marker.endian(), Endian::Big);
    assert_eq!(marker.root().record().i64("Version").unwrap(), 77);
    assert_eq!(marker.root().record().i64("CRC").unwrap(), -5);
}

// ===== Reports =====

#[test]
fn test_write_report__recording__then_every_stream_listed() {
    let file = two_sweep_recording();
    let bundle = Bundle::open(file.path()).unwrap();

    let mut out = Vec::new();
    write_report(&bundle, &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    assert!(report.contains("Signature: DAT2"));
    for extension in [".pul", ".pgf", ".amp", ".mrk"] {
        assert!(report.contains(&format!("{extension} (Little")), "{extension}");
    }
    assert!(report.contains("Label = \"Sweep2\""));
    assert!(report.contains("AmplifierState:"));
    assert!(!report.contains(".mth ("));
}
