//! Human-readable metadata report.

use std::io::Write;

use super::error::Result;
use super::reader::Bundle;
use super::record::{Record, Value};
use super::stream::StreamKind;
use super::time;
use super::tree::TreeNode;

const RULE: &str = "################################################################################";

/// Write the bundle header, every sub-stream root and the complete trees.
pub fn write_report(bundle: &Bundle, out: &mut dyn Write) -> Result<()> {
    let header = bundle.header();
    writeln!(out, "Bundle: {}", bundle.path().display())?;
    writeln!(out, "  Signature: {}", header.signature)?;
    writeln!(out, "  Version: {}", header.version)?;
    match time::to_datetime(header.time) {
        Some(when) => writeln!(out, "  Time: {} ({})", header.time, when.to_rfc3339())?,
        None => writeln!(out, "  Time: {}", header.time)?,
    }
    writeln!(out, "  Byte order: {:?}", bundle.endian())?;
    writeln!(out, "  Items: {}", header.items)?;
    for entry in bundle.catalog() {
        writeln!(
            out,
            "    {:<6} start={:<10} length={}",
            entry.extension, entry.start, entry.length
        )?;
    }

    for kind in StreamKind::ALL {
        let Some(file) = bundle.stream(kind)? else {
            continue;
        };

        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "{} ({:?}, {} nodes, level sizes {:?})",
            kind.extension(),
            file.endian(),
            file.tree().len(),
            file.tree().level_sizes()
        )?;
        for node in file.tree().walk() {
            write_node(out, node)?;
        }
    }

    Ok(())
}

fn write_node(out: &mut dyn Write, node: TreeNode<'_>) -> Result<()> {
    let indent = node.level() * 2;
    writeln!(
        out,
        "{:indent$}{} [{} children]",
        "",
        node.record().schema_name(),
        node.len()
    )?;
    write_record(out, node.record(), indent + 2)
}

/// Write every field of `record`, one per line, nested records indented.
pub fn write_record(out: &mut dyn Write, record: &Record, indent: usize) -> Result<()> {
    for (name, value) in record.iter() {
        match value {
            Value::Record(nested) => {
                writeln!(out, "{:indent$}{name}:", "")?;
                write_record(out, nested, indent + 2)?;
            }
            Value::Records(nested) => {
                for (i, item) in nested.iter().enumerate() {
                    writeln!(out, "{:indent$}{name}[{i}]:", "")?;
                    write_record(out, item, indent + 2)?;
                }
            }
            other => writeln!(out, "{:indent$}{name} = {other}", "")?,
        }
    }
    Ok(())
}
