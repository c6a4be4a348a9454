//! Pre-flight checks run before any series is produced.

use crate::bundle::{Bundle, Endian, Record, SampleReader, TreeFile, TreeNode};

use super::amplifier::{amplifier_states, device_name, is_valid_state};
use super::error::{ConvertError, Result};

/// The sub-streams a conversion needs, checked and decoded.
#[derive(Debug, Clone)]
pub struct Preflight<'a> {
    pub pulsed: &'a TreeFile,
    pub amplifier: &'a TreeFile,
    pub samples: SampleReader<'a>,
    pub device: String,
}

/// Check the whole file before conversion.
pub fn preflight(bundle: &Bundle) -> Result<Preflight<'_>> {
    if bundle.endian() != Endian::Little {
        return Err(ConvertError::validation("only little-endian bundles can be converted"));
    }

    let amplifier = bundle
        .amplifier()?
        .ok_or_else(|| ConvertError::validation("bundle has no amplifier stream (.amp)"))?;
    let pulsed = bundle
        .pulsed()?
        .ok_or_else(|| ConvertError::validation("bundle has no pulse tree (.pul)"))?;
    let samples = bundle
        .samples()
        .ok_or_else(|| ConvertError::validation("bundle has no raw data stream (.dat)"))?;

    let device = check_device(amplifier.root())?;
    check_traces(pulsed.root())?;

    Ok(Preflight {
        pulsed,
        amplifier,
        samples,
        device,
    })
}

/// All valid amplifier states must describe the same device.
pub fn check_device(amp_root: TreeNode<'_>) -> Result<String> {
    let first_state = amp_root
        .child(0)
        .and_then(|series| series.child(0))
        .ok_or_else(|| ConvertError::validation("amplifier tree has no states"))?;

    let mut reference: Option<String> = None;
    for state in amplifier_states(amp_root).filter(|state| is_valid_state(state)) {
        let name = device_name(state)?;
        match &reference {
            None => reference = Some(name),
            Some(expected) if *expected != name => {
                return Err(ConvertError::validation(format!(
                    "amplifier states disagree on the device: {expected:?} vs {name:?}"
                )));
            }
            Some(_) => {}
        }
    }

    match reference {
        Some(name) => Ok(name),
        None => device_name(first_state.record().record("AmplifierState")?),
    }
}

/// Every trace in the file must be a plain, time-based recording.
pub fn check_traces(pul_root: TreeNode<'_>) -> Result<()> {
    for group in pul_root.children() {
        for series in group.children() {
            for sweep in series.children() {
                for trace in sweep.children() {
                    check_trace(trace.record())?;
                }
            }
        }
    }
    Ok(())
}

pub fn check_trace(trace: &Record) -> Result<()> {
    let label = trace.text("Label")?;

    let x_unit = trace.text("XUnit")?;
    if x_unit != "s" {
        return Err(ConvertError::validation(format!(
            "trace {label:?} has x unit {x_unit:?}, expected \"s\""
        )));
    }

    let averages = trace.i64("AverageCount")?;
    if averages != 1 {
        return Err(ConvertError::validation(format!(
            "trace {label:?} is an average of {averages} sweeps"
        )));
    }

    if trace.flag("DataKind", "IsLeak")? {
        return Err(ConvertError::validation(format!("trace {label:?} is a leak trace")));
    }
    if trace.flag("DataKind", "IsVirtual")? {
        return Err(ConvertError::validation(format!("trace {label:?} is a virtual trace")));
    }

    Ok(())
}
