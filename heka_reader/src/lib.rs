//! Reader for HEKA PatchMaster bundle files.
//!
//! [`bundle`] decodes the container: header, catalog, tree sub-streams and
//! raw samples. [`convert`] validates a decoded bundle and maps its pulse
//! tree onto normalized series for export.

pub mod bundle;
pub mod convert;

pub use bundle::{Bundle, BundleError};
pub use convert::{ConvertError, ConvertOptions, Converter, Partitioning};
