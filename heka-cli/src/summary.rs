//! Recording overview for `heka summary`.

use heka_reader::bundle::{time, Bundle, CatalogEntry, StreamKind};
use heka_reader::convert::amplifier::{amplifier_states, device_name, is_valid_state};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeCounts {
    pub groups: usize,
    pub series: usize,
    pub sweeps: usize,
    pub traces: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleSummary {
    pub file: String,
    pub signature: String,
    pub version: String,
    pub start_time: Option<String>,
    pub little_endian: bool,
    pub catalog: Vec<CatalogEntry>,
    pub streams: Vec<&'static str>,
    pub counts: Option<TreeCounts>,
    pub devices: Vec<String>,
}

impl BundleSummary {
    pub fn collect(bundle: &Bundle) -> heka_reader::bundle::Result<Self> {
        let header = bundle.header();

        let mut streams = Vec::new();
        for kind in StreamKind::ALL {
            if bundle.stream(kind)?.is_some() {
                streams.push(kind.extension());
            }
        }

        let counts = bundle.pulsed()?.map(|pulsed| {
            let mut counts = TreeCounts::default();
            for group in pulsed.root().children() {
                counts.groups += 1;
                for series in group.children() {
                    counts.series += 1;
                    for sweep in series.children() {
                        counts.sweeps += 1;
                        counts.traces += sweep.len();
                    }
                }
            }
            counts
        });

        let mut devices = Vec::new();
        if let Some(amplifier) = bundle.amplifier()? {
            for state in amplifier_states(amplifier.root()).filter(|state| is_valid_state(state)) {
                // Unreadable states are reported by `convert`, not here.
                if let Ok(name) = device_name(state) {
                    if !devices.contains(&name) {
                        devices.push(name);
                    }
                }
            }
        }

        Ok(BundleSummary {
            file: bundle.file_name(),
            signature: header.signature.clone(),
            version: header.version.clone(),
            start_time: time::to_datetime(header.time).map(|when| when.to_rfc3339()),
            little_endian: header.is_little_endian,
            catalog: bundle.catalog().to_vec(),
            streams,
            counts,
            devices,
        })
    }
}
