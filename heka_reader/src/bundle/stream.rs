use serde::Serialize;
use tracing::debug;

use super::error::{BundleError, Result};
use super::header::CatalogEntry;
use super::layouts::{
    AMPLIFIER_ROOT, AMPLIFIER_SERIES, AMPLIFIER_STATE_RECORD, CHANNEL, GROUP, MARKER_ROOT,
    METHOD_ROOT, PULSED_ROOT, SERIES, SOLUTIONS_ROOT, STIMULATION, STIMULUS_ROOT, STIM_SEGMENT,
    SWEEP, TRACE,
};
use super::schema::{Endian, Schema};
use super::tree::{Tree, TreeNode};

/// The tree-structured sub-streams of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StreamKind {
    Pulsed,
    Stimulus,
    Amplifier,
    Method,
    Solutions,
    Marker,
}

const PULSED_LEVELS: &[&Schema] = &[&PULSED_ROOT, &GROUP, &SERIES, &SWEEP, &TRACE];
const STIMULUS_LEVELS: &[&Schema] = &[&STIMULUS_ROOT, &STIMULATION, &CHANNEL, &STIM_SEGMENT];
const AMPLIFIER_LEVELS: &[&Schema] = &[&AMPLIFIER_ROOT, &AMPLIFIER_SERIES, &AMPLIFIER_STATE_RECORD];
const METHOD_LEVELS: &[&Schema] = &[&METHOD_ROOT];
const SOLUTIONS_LEVELS: &[&Schema] = &[&SOLUTIONS_ROOT];
const MARKER_LEVELS: &[&Schema] = &[&MARKER_ROOT];

impl StreamKind {
    pub const ALL: [StreamKind; 6] = [
        StreamKind::Pulsed,
        StreamKind::Stimulus,
        StreamKind::Amplifier,
        StreamKind::Method,
        StreamKind::Solutions,
        StreamKind::Marker,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            StreamKind::Pulsed => ".pul",
            StreamKind::Stimulus => ".pgf",
            StreamKind::Amplifier => ".amp",
            StreamKind::Method => ".mth",
            StreamKind::Solutions => ".sol",
            StreamKind::Marker => ".mrk",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension() == extension)
    }

    /// Record schema for each tree level, root first.
    pub fn levels(self) -> &'static [&'static Schema] {
        match self {
            StreamKind::Pulsed => PULSED_LEVELS,
            StreamKind::Stimulus => STIMULUS_LEVELS,
            StreamKind::Amplifier => AMPLIFIER_LEVELS,
            StreamKind::Method => METHOD_LEVELS,
            StreamKind::Solutions => SOLUTIONS_LEVELS,
            StreamKind::Marker => MARKER_LEVELS,
        }
    }

    fn register(self) -> Result<()> {
        self.levels().iter().try_for_each(|schema| schema.validate())
    }
}

/// A decoded tree sub-stream.
#[derive(Debug, Clone)]
pub struct TreeFile {
    kind: StreamKind,
    endian: Endian,
    entry: CatalogEntry,
    tree: Tree,
}

impl TreeFile {
    /// Decode a sub-stream region that was read from `entry`.
    pub fn parse(kind: StreamKind, entry: &CatalogEntry, bytes: &[u8]) -> Result<Self> {
        kind.register()?;

        let tag = bytes.get(..4).unwrap_or(bytes);
        let endian = Endian::from_tag(tag).ok_or_else(|| BundleError::EndianDetectionFailure {
            location: kind.extension().to_string(),
            offset: entry.start,
            found: tag.to_vec(),
        })?;

        let tree = Tree::parse(kind.extension(), kind.levels(), &bytes[4..], entry.start + 4, endian)?;
        debug!(
            extension = kind.extension(),
            ?endian,
            nodes = tree.len(),
            "decoded sub-stream"
        );

        Ok(TreeFile {
            kind,
            endian,
            entry: entry.clone(),
            tree,
        })
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> TreeNode<'_> {
        self.tree.root()
    }
}
