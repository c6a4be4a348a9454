//! Output formatters for command results
//!
//! Supports text and JSON output formats.

use crate::convert::PartitionPreview;
use crate::summary::BundleSummary;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format '{}'. Use 'text' or 'json'", s)),
        }
    }
}

/// Format a bundle summary
pub fn format_summary(summary: &BundleSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_summary_text(summary),
        OutputFormat::Json => {
            serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

fn format_summary_text(summary: &BundleSummary) -> String {
    let mut output = String::new();

    output.push_str(&format!("Bundle:    {}\n", summary.file));
    output.push_str(&format!("Signature: {}\n", summary.signature));
    output.push_str(&format!("Version:   {}\n", summary.version));
    if let Some(ref start) = summary.start_time {
        output.push_str(&format!("Started:   {}\n", start));
    }
    output.push_str(&format!(
        "Byte order: {}\n",
        if summary.little_endian { "little-endian" } else { "big-endian" }
    ));

    output.push_str(&format!("\nCatalog ({}):\n", summary.catalog.len()));
    for item in &summary.catalog {
        output.push_str(&format!(
            "  {:<6} {:>10} bytes at {}\n",
            item.extension,
            format_number(item.length as usize),
            item.start
        ));
    }

    if let Some(ref counts) = summary.counts {
        output.push_str(&format!(
            "\nGroups: {}  Series: {}  Sweeps: {}  Traces: {}\n",
            counts.groups, counts.series, counts.sweeps, counts.traces
        ));
    }

    for device in &summary.devices {
        output.push_str(&format!("Amplifier: {}\n", device));
    }

    output
}

/// Format the partitions a conversion produced
pub fn format_conversion(partitions: &[PartitionPreview], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_conversion_text(partitions),
        OutputFormat::Json => {
            serde_json::to_string_pretty(partitions).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

fn format_conversion_text(partitions: &[PartitionPreview]) -> String {
    let mut output = String::new();

    for partition in partitions {
        output.push_str(&format!("{}\n", partition.path.display()));
        output.push_str(&format!("  Device:     {}\n", partition.device));
        output.push_str(&format!("  Identifier: {}\n", partition.identifier));
        output.push_str(&format!("  Electrodes: {}\n", partition.electrodes.join(", ")));
        output.push_str(&format!(
            "  Series:     {} acquisition, {} stimulus\n",
            partition.acquisition.len(),
            partition.stimulus.len()
        ));
        for series in &partition.acquisition {
            output.push_str(&format!(
                "    {} cycle={} electrode={} {} [{}] {} samples\n",
                series.name,
                series.cycle_id,
                series.electrode,
                series.clamp_mode,
                series.unit,
                format_number(series.samples)
            ));
        }
    }

    output
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
