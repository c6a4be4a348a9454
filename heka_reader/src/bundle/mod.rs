//! Decoding of PatchMaster bundle files.

pub mod dump;
pub mod error;
pub mod header;
pub mod layouts;
pub mod reader;
pub mod record;
pub mod samples;
pub mod schema;
pub mod stream;
pub mod time;
pub mod tree;

pub use error::{BundleError, Result};
pub use header::{BundleHeader, CatalogEntry};
pub use reader::{Bundle, RAW_DATA_EXTENSION};
pub use record::{decode, Flags, Record, Value};
pub use samples::{SampleFormat, SampleReader, TraceLayout};
pub use schema::{Endian, Field, FieldKind, Prim, Schema, Transform};
pub use stream::{StreamKind, TreeFile};
pub use tree::{Children, Tree, TreeNode};
