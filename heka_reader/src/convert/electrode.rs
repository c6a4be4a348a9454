use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::bundle::{Record, TreeNode};

use super::error::Result;

/// A recording electrode, identified by its stimulus DAC channel and its
/// acquisition ADC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElectrodeKey {
    pub dac: i64,
    pub adc: i64,
}

impl ElectrodeKey {
    pub fn from_trace(trace: &Record) -> Result<Self> {
        Ok(ElectrodeKey {
            dac: trace.i64("LinkDAChannel")?,
            adc: trace.i64("SourceChannel")?,
        })
    }
}

impl fmt::Display for ElectrodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.dac, self.adc)
    }
}

/// Electrode indices in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ElectrodeMap {
    indices: HashMap<ElectrodeKey, usize>,
    keys: Vec<ElectrodeKey>,
}

impl ElectrodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every trace's key below the given groups, in traversal order.
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = TreeNode<'a>>) -> Result<Self> {
        let mut map = Self::new();
        for group in groups {
            for series in group.children() {
                for sweep in series.children() {
                    for trace in sweep.children() {
                        map.insert(ElectrodeKey::from_trace(trace.record())?);
                    }
                }
            }
        }
        Ok(map)
    }

    /// Index of `key`, assigning the next free one on first sight.
    pub fn insert(&mut self, key: ElectrodeKey) -> usize {
        if let Some(&index) = self.indices.get(&key) {
            return index;
        }
        let index = self.keys.len();
        self.indices.insert(key, index);
        self.keys.push(key);
        index
    }

    pub fn index_of(&self, key: &ElectrodeKey) -> Option<usize> {
        self.indices.get(key).copied()
    }

    pub fn keys(&self) -> &[ElectrodeKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
