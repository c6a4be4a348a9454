//! Mapping of decoded bundles onto normalized, calibrated series.

pub mod amplifier;
pub mod converter;
pub mod electrode;
pub mod error;
pub mod series;
pub mod validate;

pub use converter::{
    ConversionOutput, ConvertOptions, Converter, ExportSink, NoStimulus, Partitioning,
    SessionInfo, StimulusGenerator,
};
pub use electrode::{ElectrodeKey, ElectrodeMap};
pub use error::{ConvertError, Result};
pub use series::{
    ClampMode, CurrentClampFields, NormalizedSeries, SeriesExtras, VoltageClampFields,
};
pub use validate::{preflight, Preflight};
