//! Amplifier state resolution and clamp-mode calibration.

use tracing::{debug, warn};

use crate::bundle::{Record, TreeNode};

use super::error::{ConvertError, Result};
use super::series::{ClampMode, CurrentClampFields, VoltageClampFields};

/// Whether an amplifier state record was actually written.
pub fn is_valid_state(state: &Record) -> bool {
    state
        .text("StateVersion")
        .map(|version| !version.is_empty())
        .unwrap_or(false)
}

/// `"{AmplKind}-{E9Boards}-{IsEpc9N} with {ADBoard}"`.
pub fn device_name(state: &Record) -> Result<String> {
    Ok(format!(
        "{}-{}-{} with {}",
        state.text("AmplKind")?,
        state.i64("E9Boards")?,
        state.byte("IsEpc9N")?,
        state.text("ADBoard")?
    ))
}

/// Every state record in the amplifier tree, valid or not.
pub fn amplifier_states<'a>(amp_root: TreeNode<'a>) -> impl Iterator<Item = &'a Record> + 'a {
    amp_root
        .children()
        .flat_map(|series| series.children())
        .filter_map(|state| state.record().record("AmplifierState").ok())
}

/// The amplifier state that applies to a trace.
///
/// Newer files embed the state in the series record; older ones keep it in
/// the amplifier tree under `AmplStateSeries - 1`, one state per trace.
pub fn resolve_state<'a>(
    series: &'a Record,
    amp_root: Option<TreeNode<'a>>,
    trace_index: usize,
) -> Result<Option<&'a Record>> {
    let embedded = series.record("AmplifierState")?;
    if is_valid_state(embedded) {
        return Ok(Some(embedded));
    }

    let amp_series = series.i64("AmplStateSeries")?;
    let state = usize::try_from(amp_series - 1)
        .ok()
        .and_then(|index| amp_root?.child(index))
        .and_then(|amp_series| amp_series.child(trace_index))
        .map(|node| node.record().record("AmplifierState"))
        .transpose()?
        .filter(|state| is_valid_state(state));

    if state.is_none() {
        debug!(
            series = series.text("Label").unwrap_or_default(),
            amp_series,
            trace_index,
            "no amplifier state for trace"
        );
    }
    Ok(state)
}

/// Clamp mode from the amplifier state, or from the trace unit when no state
/// is available.
pub fn clamp_mode(state: Option<&Record>, trace: &Record) -> Result<ClampMode> {
    if let Some(state) = state {
        return match state.text("Mode")? {
            "VCMode" => Ok(ClampMode::VoltageClamp),
            "CCMode" => Ok(ClampMode::CurrentClamp),
            other => Err(ConvertError::UnknownClampMode(other.to_string())),
        };
    }

    let unit = trace.text("YUnit")?;
    let mode = match unit {
        "A" => ClampMode::VoltageClamp,
        "V" => ClampMode::CurrentClamp,
        other => return Err(ConvertError::UnknownUnit(other.to_string())),
    };
    warn!(
        trace = trace.text("Label").unwrap_or_default(),
        unit, ?mode, "clamp mode inferred from trace unit"
    );
    Ok(mode)
}

/// Amplifier gain setting code.
pub fn gain(state: Option<&Record>) -> Result<Option<f64>> {
    state
        .map(|state| state.byte("Gain").map(f64::from))
        .transpose()
        .map_err(Into::into)
}

fn fast_compensation(state: &Record) -> Result<bool> {
    Ok(state.is_set("AutoCFast")?
        || (state.is_set("CanCCFast")? && state.is_set("CCCFastOn")?))
}

fn slow_compensation(state: &Record) -> Result<bool> {
    Ok(state.is_set("AutoCSlow")?
        || (state.is_set("CanCCFast")? && !state.is_set("CCCFastOn")?))
}

fn compensated_capacitance(state: &Record) -> Result<Option<f64>> {
    if fast_compensation(state)? {
        Ok(Some(state.f64("CFastAmp1")? + state.f64("CFastAmp2")?))
    } else if slow_compensation(state)? {
        Ok(Some(state.f64("CSlow")?))
    } else {
        Ok(None)
    }
}

pub fn voltage_clamp_fields(state: Option<&Record>) -> Result<VoltageClampFields> {
    let mut fields = VoltageClampFields::default();
    let Some(state) = state else {
        return Ok(fields);
    };

    if state.is_set("RsOn")? {
        fields.resistance_comp_correction = Some(state.f64("RsFraction")?);
        fields.whole_cell_series_resistance_comp = Some(state.f64("RsValue")?);
    }
    if fast_compensation(state)? {
        fields.capacitance_fast = Some(state.f64("CFastAmp1")? + state.f64("CFastAmp2")?);
    }
    if slow_compensation(state)? {
        fields.capacitance_slow = Some(state.f64("CSlow")?);
    }
    Ok(fields)
}

pub fn current_clamp_fields(state: Option<&Record>, trace: &Record) -> Result<CurrentClampFields> {
    let mut fields = CurrentClampFields {
        bias_current: Some(trace.f64("TrTrHolding")?),
        ..Default::default()
    };
    if let Some(state) = state {
        fields.bridge_balance = Some(state.f64("RsValue")? * state.f64("RsFraction")?);
        fields.capacitance_compensation = compensated_capacitance(state)?;
    }
    Ok(fields)
}
