//! PatchMaster record layouts.
//!
//! Every record is packed with no padding. Field names follow the PatchMaster
//! file format documentation so that dumps can be compared with HEKA's own
//! tools. Each layout's declared size is checked at compile time.

use super::schema::{Field, Schema, Transform};

pub const CLAMP_MODES: &[&str] = &["TestMode", "VCMode", "CCMode", "NoMode"];
pub const AMPLIFIER_KINDS: &[&str] = &["EPC7", "EPC8", "EPC9", "EPC10", "EPC10Plus"];
pub const AD_BOARDS: &[&str] = &["ITC16", "ITC18", "LIH1600"];
pub const DATA_KIND_FLAGS: &[&str] = &["IsLeak", "IsVirtual", "IsImon", "IsVmon", "Clip"];

// Bundle header

const BUNDLE_ITEM_FIELDS: &[Field] = &[
    Field::i32("Start"),
    Field::i32("Length"),
    Field::text("Extension", 8),
];
pub const BUNDLE_ITEM: Schema = Schema::new("BundleItem", 16, BUNDLE_ITEM_FIELDS);

/// Number of catalog slots in the bundle header.
pub const BUNDLE_ITEM_SLOTS: usize = 12;

const BUNDLE_HEADER_FIELDS: &[Field] = &[
    Field::text("Signature", 8),
    Field::text("Version", 32),
    Field::f64("Time"),
    Field::i32("Items"),
    Field::boolean("IsLittleEndian"),
    Field::bytes("Reserved", 11).omit(),
    Field::nested_array("BundleItems", &BUNDLE_ITEM, BUNDLE_ITEM_SLOTS),
];
pub const BUNDLE_HEADER: Schema = Schema::new("BundleHeader", 256, BUNDLE_HEADER_FIELDS);

// Single-record streams

const MARKER_FIELDS: &[Field] = &[Field::i32("Version"), Field::i32("CRC")];
pub const MARKER_ROOT: Schema = Schema::new("MarkerRoot", 8, MARKER_FIELDS);

const SOLUTIONS_FIELDS: &[Field] = &[
    Field::u16("RoVersion"),
    Field::text("RoDataBaseName", 80),
    Field::u16("RoSpare1").omit(),
    Field::i32("RoCRC"),
];
pub const SOLUTIONS_ROOT: Schema = Schema::new("SolutionsRoot", 88, SOLUTIONS_FIELDS);

const METHOD_FIELDS: &[Field] = &[
    Field::i32("Version"),
    Field::i32("Mark"),
    Field::text("VersionName", 32),
    Field::i32("MaxSamples"),
    Field::i32("Filler1").omit(),
    Field::text("Params", 10),
    Field::text("ParamText", 320),
    Field::bytes("Reserved", 128).omit(),
    Field::i32("Filler2").omit(),
    Field::i32("CRC"),
];
pub const METHOD_ROOT: Schema = Schema::new("ProtocolMethodRoot", 514, METHOD_FIELDS);

// Amplifier

const USER_PARAM_DESCR_FIELDS: &[Field] = &[Field::text("Name", 32), Field::text("Unit", 8)];
pub const USER_PARAM_DESCR: Schema = Schema::new("UserParamDescr", 40, USER_PARAM_DESCR_FIELDS);

const LOCK_IN_PARAMS_FIELDS: &[Field] = &[
    Field::f64("ExtCalPhase"),
    Field::f64("ExtCalAtten"),
    Field::f64("PLPhase"),
    Field::f64("PLPhaseY1"),
    Field::f64("PLPhaseY2"),
    Field::f64("UsedPhaseShift"),
    Field::f64("UsedAttenuation"),
    Field::f64("Spares2").omit(),
    Field::boolean("ExtCalValid"),
    Field::boolean("PLPhaseValid"),
    Field::byte("LockInMode"),
    Field::byte("CalMode"),
    Field::bytes("Spares", 28).omit(),
];
pub const LOCK_IN_PARAMS: Schema = Schema::new("LockInParams", 96, LOCK_IN_PARAMS_FIELDS);

const AMPLIFIER_STATE_FIELDS: &[Field] = &[
    Field::text("StateVersion", 8),
    Field::f64("RealCurrentGain"),
    Field::f64("RealF2Bandwidth"),
    Field::f64("F2Frequency"),
    Field::f64("RsValue"),
    Field::f64("RsFraction"),
    Field::f64("GLeak"),
    Field::f64("CFastAmp1"),
    Field::f64("CFastAmp2"),
    Field::f64("CFastTau"),
    Field::f64("CSlow"),
    Field::f64("GSeries"),
    Field::f64("StimDacScale"),
    Field::f64("CCStimScale"),
    Field::f64("VHold"),
    Field::f64("LastVHold"),
    Field::f64("VpOffset"),
    Field::f64("VLiquidJunction"),
    Field::f64("CCIHold"),
    Field::f64("CSlowStimVolts"),
    Field::f64("CCTrackVHold"),
    Field::f64("TimeoutLength"),
    Field::f64("SearchDelay"),
    Field::f64("MConductance"),
    Field::f64("MCapacitance"),
    Field::text("SerialNumber", 8),
    Field::i16("E9Boards"),
    Field::i16("CSlowCycles"),
    Field::i16("IMonAdc"),
    Field::i16("VMonAdc"),
    Field::i16("MuxAdc"),
    Field::i16("TstDac"),
    Field::i16("StimDac"),
    Field::i16("StimDacOffset"),
    Field::i16("MaxDigitalBit"),
    Field::byte("HasCFastHigh"),
    Field::byte("CFastHigh"),
    Field::byte("HasBathSense"),
    Field::byte("BathSense"),
    Field::byte("HasF2Bypass"),
    Field::byte("F2Mode"),
    Field::byte("AmplKind").with(Transform::Named(AMPLIFIER_KINDS)),
    Field::byte("IsEpc9N"),
    Field::byte("ADBoard").with(Transform::Named(AD_BOARDS)),
    Field::byte("BoardVersion"),
    Field::byte("ActiveE9Board"),
    Field::byte("Mode").with(Transform::Named(CLAMP_MODES)),
    Field::byte("Range"),
    Field::byte("F2Response"),
    Field::byte("RsOn"),
    Field::byte("CSlowRange"),
    Field::byte("CCRange"),
    Field::byte("CCGain"),
    Field::byte("CSlowToTstDac"),
    Field::byte("StimPath"),
    Field::byte("CCTrackTau"),
    Field::byte("WasClipping"),
    Field::byte("RepetitiveCSlow"),
    Field::byte("LastCSlowRange"),
    Field::byte("Old2").omit(),
    Field::byte("CanCCFast"),
    Field::byte("CanLowCCRange"),
    Field::byte("CanHighCCRange"),
    Field::byte("CanCCTracking"),
    Field::byte("HasVmonPath"),
    Field::byte("HasNewCCMode"),
    Field::byte("Selector"),
    Field::byte("HoldInverted"),
    Field::byte("AutoCFast"),
    Field::byte("AutoCSlow"),
    Field::byte("HasVmonX100"),
    Field::byte("TestDacOn"),
    Field::byte("QMuxAdcOn"),
    Field::f64("Imon1Bandwidth"),
    Field::f64("StimScale"),
    Field::byte("Gain"),
    Field::byte("Filter1"),
    Field::byte("StimFilterOn"),
    Field::byte("RsSlow"),
    Field::byte("Old1"),
    Field::byte("CCCFastOn"),
    Field::byte("CCFastSpeed"),
    Field::byte("F2Source"),
    Field::byte("TestRange"),
    Field::byte("TestDacPath"),
    Field::byte("MuxChannel"),
    Field::byte("MuxGain64"),
    Field::byte("VmonX100"),
    Field::byte("IsQuadro"),
    Field::byte("F1Mode"),
    Field::byte("Old3").omit(),
    Field::f64("StimFilterHz"),
    Field::f64("RsTau"),
    Field::f64("DacToAdcDelay"),
    Field::f64("InputFilterTau"),
    Field::f64("OutputFilterTau"),
    Field::f64("vMonFactor").omit(),
    Field::text("CalibDate", 16),
    Field::f64("VmonOffset"),
    Field::byte("EEPROMKind"),
    Field::byte("VrefX2"),
    Field::byte("HasVrefX2AndF2Vmon"),
    Field::byte("sSpare1"),
    Field::byte("sSpare2"),
    Field::byte("sSpare3"),
    Field::byte("sSpare4"),
    Field::byte("sSpare5"),
    Field::f64("CCStimDacScale"),
    Field::f64("VmonFiltBandwidth"),
    Field::f64("VmonFiltFrequency"),
];
pub const AMPLIFIER_STATE: Schema = Schema::new("AmplifierState", 400, AMPLIFIER_STATE_FIELDS);

const AMPLIFIER_ROOT_FIELDS: &[Field] = &[
    Field::i32("Version"),
    Field::i32("Mark"),
    Field::text("VersionName", 32),
    Field::text("AmplifierName", 32),
    Field::byte("Amplifier"),
    Field::byte("ADBoard"),
    Field::byte("Creator"),
    Field::byte("Filler1").omit(),
    Field::i32("CRC"),
];
pub const AMPLIFIER_ROOT: Schema = Schema::new("AmplifierRoot", 80, AMPLIFIER_ROOT_FIELDS);

const AMPLIFIER_SERIES_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::i32("SeriesCount"),
    Field::i32("Filler1").omit(),
    Field::i32("CRC"),
];
pub const AMPLIFIER_SERIES: Schema = Schema::new("AmplifierSeries", 16, AMPLIFIER_SERIES_FIELDS);

const AMPLIFIER_STATE_RECORD_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::i32("StateCount"),
    Field::byte("StateVersion"),
    Field::byte("Filler1").omit(),
    Field::byte("Filler2").omit(),
    Field::byte("Filler3").omit(),
    Field::i32("Filler4").omit(),
    Field::nested("LockInParams", &LOCK_IN_PARAMS),
    Field::nested("AmplifierState", &AMPLIFIER_STATE),
    Field::i32("IntSol"),
    Field::i32("ExtSol"),
    Field::bytes("Filler5", 36).omit(),
    Field::i32("CRC"),
];
pub const AMPLIFIER_STATE_RECORD: Schema =
    Schema::new("AmplifierStateRecord", 560, AMPLIFIER_STATE_RECORD_FIELDS);

// Pulse tree

const PULSED_ROOT_FIELDS: &[Field] = &[
    Field::i32("Version"),
    Field::i32("Mark"),
    Field::text("VersionName", 32),
    Field::text("AuxFileName", 80),
    Field::text("RootText", 400),
    Field::f64("StartTime"),
    Field::i32("MaxSamples"),
    Field::i32("CRC"),
    Field::i16("Features"),
    Field::i16("Filler1").omit(),
    Field::i32("Filler2").omit(),
    Field::i16s("RoTcEnumerator", 32),
    Field::text("RoTcKind", 32),
];
pub const PULSED_ROOT: Schema = Schema::new("PulsedRoot", 640, PULSED_ROOT_FIELDS);

const GROUP_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::text("Label", 32),
    Field::text("Text", 80),
    Field::i32("ExperimentNumber"),
    Field::i32("GroupCount"),
    Field::i32("CRC"),
    Field::f64("MatrixWidth"),
    Field::f64("MatrixHeight"),
];
pub const GROUP: Schema = Schema::new("Group", 144, GROUP_FIELDS);

const SERIES_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::text("Label", 32),
    Field::text("Comment", 80),
    Field::i32("SeriesCount"),
    Field::i32("NumberSweeps"),
    Field::i32("AmplStateOffset"),
    Field::i32("AmplStateSeries"),
    Field::i32("MethodTag"),
    Field::f64("Time"),
    Field::f64("PageWidth"),
    Field::nested_array("SwUserParamDescr", &USER_PARAM_DESCR, 4),
    Field::text("MethodName", 32).omit(),
    Field::f64s("UserParams", 4),
    Field::nested("LockInParams", &LOCK_IN_PARAMS),
    Field::nested("AmplifierState", &AMPLIFIER_STATE),
    Field::text("Username", 80),
    Field::nested_array("SeUserParamDescr1", &USER_PARAM_DESCR, 4),
    Field::i32("Filler1").omit(),
    Field::i32("CRC"),
    Field::f64s("SeUserParams2", 4),
    Field::nested_array("SeUserParamDescr2", &USER_PARAM_DESCR, 4),
    Field::text("ScanParams", 96),
];
pub const SERIES: Schema = Schema::new("Series", 1408, SERIES_FIELDS);

const SWEEP_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::text("Label", 32),
    Field::i32("AuxDataFileOffset"),
    Field::i32("StimCount"),
    Field::i32("SweepCount"),
    Field::f64("Time"),
    Field::f64("Timer"),
    Field::f64s("SwUserParams", 4),
    Field::f64("Temperature"),
    Field::i32("OldIntSol"),
    Field::i32("OldExtSol"),
    Field::i16("DigitalIn"),
    Field::i16("SweepKind"),
    Field::i16("DigitalOut"),
    Field::i16("Filler1").omit(),
    Field::f64s("Markers", 4),
    Field::i32("Filler2").omit(),
    Field::i32("CRC"),
    Field::f64s("SwHolding", 16),
];
pub const SWEEP: Schema = Schema::new("Sweep", 288, SWEEP_FIELDS);

const TRACE_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::text("Label", 32),
    Field::i32("TraceCount"),
    Field::i32("Data"),
    Field::i32("DataPoints"),
    Field::i32("InternalSolution"),
    Field::i32("AverageCount"),
    Field::i32("LeakCount"),
    Field::i32("LeakTraces"),
    Field::i16("DataKind").with(Transform::Flags(DATA_KIND_FLAGS)),
    Field::byte("UseXStart"),
    Field::byte("TcKind"),
    Field::byte("RecordingMode"),
    Field::byte("AmplIndex"),
    Field::byte("DataFormat"),
    Field::byte("DataAbscissa"),
    Field::f64("DataScaler"),
    Field::f64("TimeOffset"),
    Field::f64("ZeroData"),
    Field::text("YUnit", 8),
    Field::f64("XInterval"),
    Field::f64("XStart"),
    Field::text("XUnit", 8),
    Field::f64("YRange"),
    Field::f64("YOffset"),
    Field::f64("Bandwidth"),
    Field::f64("PipetteResistance"),
    Field::f64("CellPotential"),
    Field::f64("SealResistance"),
    Field::f64("CSlow"),
    Field::f64("GSeries"),
    Field::f64("RsValue"),
    Field::f64("GLeak"),
    Field::f64("MConductance"),
    Field::i32("LinkDAChannel"),
    Field::byte("ValidYrange"),
    Field::byte("AdcMode"),
    Field::i16("AdcChannel"),
    Field::f64("Ymin"),
    Field::f64("Ymax"),
    Field::i32("SourceChannel"),
    Field::i32("ExternalSolution"),
    Field::f64("CM"),
    Field::f64("GM"),
    Field::f64("Phase"),
    Field::i32("DataCRC"),
    Field::i32("CRC"),
    Field::f64("GS"),
    Field::i32("SelfChannel"),
    Field::i32("TrInterleaveSize"),
    Field::i32("TrInterleaveSkip"),
    Field::i32("TrImageIndex"),
    Field::f64s("TrTrMarkers", 10),
    Field::f64("TrSECM_X"),
    Field::f64("TrSECM_Y"),
    Field::f64("TrSECM_Z"),
    Field::f64("TrTrHolding"),
    Field::i32("TrTcEnumerator"),
    Field::i32("TrXTrace"),
    Field::f64("TrIntSolValue"),
    Field::f64("TrExtSolValue"),
    Field::text("TrIntSolName", 32),
    Field::text("TrExtSolName", 32),
    Field::f64("TrDataPedestal"),
];
pub const TRACE: Schema = Schema::new("Trace", 512, TRACE_FIELDS);

// Stimulus tree

const STIMULUS_ROOT_FIELDS: &[Field] = &[
    Field::i32("Version"),
    Field::i32("Mark"),
    Field::text("VersionName", 32),
    Field::i32("MaxSamples"),
    Field::i32("roFiller1").omit(),
    Field::f64s("Params", 10),
    Field::text("ParamText", 320),
    Field::bytes("Reserved", 128).omit(),
    Field::i32("roFiller2").omit(),
    Field::i32("CRC"),
];
pub const STIMULUS_ROOT: Schema = Schema::new("StimulusRoot", 584, STIMULUS_ROOT_FIELDS);

const STIMULATION_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::text("EntryName", 32),
    Field::text("FileName", 32),
    Field::text("AnalName", 32),
    Field::i32("DataStartSegment"),
    Field::f64("DataStartTime"),
    Field::f64("SampleInterval"),
    Field::f64("SweepInterval"),
    Field::f64("LeakDelay"),
    Field::f64("FilterFactor"),
    Field::i32("NumberSweeps"),
    Field::i32("NumberLeaks"),
    Field::i32("NumberAverages"),
    Field::i32("ActualAdcChannels"),
    Field::i32("ActualDacChannels"),
    Field::byte("ExtTrigger"),
    Field::boolean("NoStartWait"),
    Field::boolean("UseScanRates"),
    Field::boolean("NoContAq"),
    Field::boolean("HasLockIn"),
    Field::byte("OldStartMacKind"),
    Field::boolean("OldEndMacKind"),
    Field::byte("AutoRange"),
    Field::boolean("BreakNext"),
    Field::boolean("IsExpanded"),
    Field::boolean("LeakCompMode"),
    Field::boolean("HasChirp"),
    Field::text("OldStartMacro", 32),
    Field::text("OldEndMacro", 32),
    Field::boolean("IsGapFree"),
    Field::boolean("HandledExternally"),
    Field::boolean("Filler1").omit(),
    Field::boolean("Filler2").omit(),
    Field::i32("CRC"),
];
pub const STIMULATION: Schema = Schema::new("Stimulation", 248, STIMULATION_FIELDS);

const CHANNEL_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::i32("LinkedChannel"),
    Field::i32("CompressionFactor"),
    Field::text("YUnit", 8),
    Field::u16("AdcChannel"),
    Field::byte("AdcMode"),
    Field::boolean("DoWrite"),
    Field::byte("LeakStore"),
    Field::byte("AmplMode"),
    Field::boolean("OwnSegTime"),
    Field::boolean("SetLastSegVmemb"),
    Field::u16("DacChannel"),
    Field::byte("DacMode"),
    Field::byte("HasLockInSquare"),
    Field::i32("RelevantXSegment"),
    Field::i32("RelevantYSegment"),
    Field::text("DacUnit", 8),
    Field::f64("Holding"),
    Field::f64("LeakHolding"),
    Field::f64("LeakSize"),
    Field::byte("LeakHoldMode"),
    Field::boolean("LeakAlternate"),
    Field::boolean("AltLeakAveraging"),
    Field::boolean("LeakPulseOn"),
    Field::u16("StimToDacID"),
    Field::u16("CompressionMode"),
    Field::i32("CompressionSkip"),
    Field::u16("DacBit"),
    Field::boolean("HasLockInSine"),
    Field::byte("BreakMode"),
    Field::i32("ZeroSeg"),
    Field::i32("StimSweep"),
    Field::f64("Sine_Cycle"),
    Field::f64("Sine_Amplitude"),
    Field::f64("LockIn_VReversal"),
    Field::f64("Chirp_StartFreq"),
    Field::f64("Chirp_EndFreq"),
    Field::f64("Chirp_MinPoints"),
    Field::f64("Square_NegAmpl"),
    Field::f64("Square_DurFactor"),
    Field::i32("LockIn_Skip"),
    Field::i32("Photo_MaxCycles"),
    Field::i32("Photo_SegmentNo"),
    Field::i32("LockIn_AvgCycles"),
    Field::i32("Imaging_RoiNo"),
    Field::i32("Chirp_Skip"),
    Field::f64("Chirp_Amplitude"),
    Field::byte("Photo_Adapt"),
    Field::byte("Sine_Kind"),
    Field::byte("Chirp_PreChirp"),
    Field::byte("Sine_Source"),
    Field::byte("Square_NegSource"),
    Field::byte("Square_PosSource"),
    Field::byte("Chirp_Kind"),
    Field::byte("Chirp_Source"),
    Field::f64("DacOffset"),
    Field::f64("AdcOffset"),
    Field::byte("TraceMathFormat"),
    Field::boolean("HasChirp"),
    Field::byte("Square_Kind"),
    Field::text("Filler1", 5),
    Field::f64("Square_BaseIncr"),
    Field::f64("Square_Cycle"),
    Field::f64("Square_PosAmpl"),
    Field::i32("CompressionOffset"),
    Field::i32("PhotoMode"),
    Field::f64("BreakLevel"),
    Field::text("TraceMath", 128),
    Field::i32("Filler2").omit(),
    Field::i32("CRC"),
    // Files on disk carry one byte beyond the documented 400-byte layout.
    Field::boolean("UnknownFiller"),
];
pub const CHANNEL: Schema = Schema::new("Channel", 401, CHANNEL_FIELDS);

const STIM_SEGMENT_FIELDS: &[Field] = &[
    Field::i32("Mark"),
    Field::byte("Class"),
    Field::byte("StoreKind"),
    Field::byte("VoltageIncMode"),
    Field::byte("DurationIncMode"),
    Field::f64("Voltage"),
    Field::i32("VoltageSource"),
    Field::f64("DeltaVFactor"),
    Field::f64("DeltaVIncrement"),
    Field::f64("Duration"),
    Field::i32("DurationSource"),
    Field::f64("DeltaTFactor"),
    Field::f64("DeltaTIncrement"),
    Field::i32("Filler1").omit(),
    Field::i32("CRC"),
    Field::f64("ScanRate"),
];
pub const STIM_SEGMENT: Schema = Schema::new("StimSegment", 80, STIM_SEGMENT_FIELDS);

/// Every layout, for registration checks and dumps.
pub const ALL: &[&Schema] = &[
    &BUNDLE_ITEM,
    &BUNDLE_HEADER,
    &MARKER_ROOT,
    &SOLUTIONS_ROOT,
    &METHOD_ROOT,
    &USER_PARAM_DESCR,
    &LOCK_IN_PARAMS,
    &AMPLIFIER_STATE,
    &AMPLIFIER_ROOT,
    &AMPLIFIER_SERIES,
    &AMPLIFIER_STATE_RECORD,
    &PULSED_ROOT,
    &GROUP,
    &SERIES,
    &SWEEP,
    &TRACE,
    &STIMULUS_ROOT,
    &STIMULATION,
    &CHANNEL,
    &STIM_SEGMENT,
];

const _: () = {
    let mut i = 0;
    while i < ALL.len() {
        assert!(ALL[i].is_consistent());
        i += 1;
    }
};
