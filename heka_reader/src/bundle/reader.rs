use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use super::error::{BundleError, Result};
use super::header::{BundleHeader, CatalogEntry};
use super::samples::SampleReader;
use super::schema::Endian;
use super::stream::{StreamKind, TreeFile};

/// Extension of the raw sample sub-stream.
pub const RAW_DATA_EXTENSION: &str = ".dat";

/// An open PatchMaster bundle file.
///
/// Sub-stream trees are decoded on first access and cached for the lifetime
/// of the bundle. All reads go through one file handle.
#[derive(Debug)]
pub struct Bundle {
    path: PathBuf,
    file: Mutex<File>,
    file_len: u64,
    header: BundleHeader,
    endian: Endian,
    streams: HashMap<StreamKind, OnceCell<TreeFile>>,
}

impl Bundle {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|e| BundleError::io(&path, e))?;
        let file_len = file
            .metadata()
            .map_err(|e| BundleError::io(&path, e))?
            .len();

        let mut raw = vec![0u8; BundleHeader::SIZE.min(file_len as usize)];
        file.read_exact(&mut raw)
            .map_err(|e| BundleError::io(&path, e))?;
        let (header, endian) = BundleHeader::parse(&raw)?;

        let streams = header
            .entries
            .iter()
            .filter_map(|entry| StreamKind::from_extension(&entry.extension))
            .map(|kind| (kind, OnceCell::new()))
            .collect();

        debug!(
            path = %path.display(),
            signature = %header.signature,
            ?endian,
            entries = header.entries.len(),
            "opened bundle"
        );

        Ok(Bundle {
            path,
            file: Mutex::new(file),
            file_len,
            header,
            endian,
            streams,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories, used to label exports.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn header(&self) -> &BundleHeader {
        &self.header
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.header.entries
    }

    /// The decoded tree for `extension`, or `None` when the bundle has no
    /// such sub-stream.
    pub fn get(&self, extension: &str) -> Result<Option<&TreeFile>> {
        let Some(kind) = StreamKind::from_extension(extension) else {
            return Ok(None);
        };
        self.stream(kind)
    }

    pub fn stream(&self, kind: StreamKind) -> Result<Option<&TreeFile>> {
        let (Some(cell), Some(entry)) = (self.streams.get(&kind), self.header.entry(kind.extension()))
        else {
            return Ok(None);
        };

        cell.get_or_try_init(|| {
            let bytes = self.read_at(entry.start, entry.length as usize)?;
            TreeFile::parse(kind, entry, &bytes)
        })
        .map(Some)
    }

    pub fn pulsed(&self) -> Result<Option<&TreeFile>> {
        self.stream(StreamKind::Pulsed)
    }

    pub fn stimulus(&self) -> Result<Option<&TreeFile>> {
        self.stream(StreamKind::Stimulus)
    }

    pub fn amplifier(&self) -> Result<Option<&TreeFile>> {
        self.stream(StreamKind::Amplifier)
    }

    pub fn method(&self) -> Result<Option<&TreeFile>> {
        self.stream(StreamKind::Method)
    }

    pub fn solutions(&self) -> Result<Option<&TreeFile>> {
        self.stream(StreamKind::Solutions)
    }

    pub fn marker(&self) -> Result<Option<&TreeFile>> {
        self.stream(StreamKind::Marker)
    }

    /// Whether the tree for `kind` has been decoded and cached.
    pub fn is_loaded(&self, kind: StreamKind) -> bool {
        self.streams
            .get(&kind)
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Accessor for trace samples, when the bundle has a raw data stream.
    pub fn samples(&self) -> Option<SampleReader<'_>> {
        self.header
            .entry(RAW_DATA_EXTENSION)
            .map(|_| SampleReader::new(self))
    }

    /// Read `len` bytes at an absolute file offset.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let available = self.file_len.saturating_sub(offset);
        if (len as u64) > available {
            return Err(BundleError::Truncated {
                offset,
                needed: len,
                available: available as usize,
            });
        }

        let mut buf = vec![0u8; len];
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => BundleError::Truncated {
                offset,
                needed: len,
                available: 0,
            },
            _ => BundleError::Read(e),
        })?;
        Ok(buf)
    }

    /// Release the file handle.
    pub fn close(self) {
        debug!(path = %self.path.display(), "closing bundle");
    }
}
