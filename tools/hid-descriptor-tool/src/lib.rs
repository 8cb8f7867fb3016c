//! Command implementations behind the `hid_descriptor` binary.
//!
//! Each `run_*` function reads its descriptor file(s), runs one analysis from the
//! `hid-descriptor` crate, and renders the result as text or JSON into `out`.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use hid_descriptor::{
    analyze_importance_with_limits, capture_snapshots_with_limits, compare_snapshots, hex,
    split_items, AttributeTable, Equivalence, ItemImportance, ItemReader, ItemType, RawItem,
    Snapshot, StateLimits, SuppressionReason,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Limits from `HID_DESCRIPTOR_MAX_STACK_DEPTH`, with the command-line value taking precedence.
pub fn resolve_limits(max_stack_depth: Option<usize>) -> Result<StateLimits> {
    let mut limits = StateLimits::from_env()?;
    if let Some(depth) = max_stack_depth {
        anyhow::ensure!(depth > 0, "--max-stack-depth must be at least 1");
        limits.max_stack_depth = depth;
    }
    Ok(limits)
}

pub fn load_items(path: &Path) -> Result<Vec<RawItem>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let items =
        split_items(&bytes).with_context(|| format!("split items of {}", path.display()))?;
    tracing::info!(path = %path.display(), items = items.len(), "loaded HID report descriptor");
    Ok(items)
}

#[derive(Debug, Serialize)]
struct ItemView {
    index: usize,
    offset: usize,
    bytes: Vec<u8>,
    item_type: ItemType,
    tag: u8,
    name: Option<&'static str>,
    data: Vec<u8>,
    long: bool,
}

pub fn item_line(raw: &RawItem) -> Result<String> {
    let item = raw.decode()?;
    let mut line = format!(
        "{:>3} [{:04x}] {:<14} {} {:#04x} {}",
        raw.index,
        raw.offset,
        hex(&raw.bytes),
        item.item_type,
        item.tag,
        item.name().unwrap_or("Unknown"),
    );
    if !item.data.is_empty() {
        match item.unsigned_value() {
            Some(value) if !item.long => line.push_str(&format!(" ({value:#x})")),
            _ => line.push_str(&format!(" [{}]", hex(&item.data))),
        }
    }
    Ok(line)
}

/// Lists every item in the file.
///
/// Items before a truncation point are still written, in either format, before the error is
/// returned.
pub fn run_items(path: &Path, format: OutputFormat, out: &mut dyn Write) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut views = Vec::new();

    for raw in ItemReader::new(std::io::BufReader::new(file)) {
        let raw = match raw {
            Ok(raw) => raw,
            Err(err) => {
                if format == OutputFormat::Json {
                    write_json(out, &views)?;
                }
                return Err(err).with_context(|| format!("read items of {}", path.display()));
            }
        };
        match format {
            OutputFormat::Text => writeln!(out, "{}", item_line(&raw)?)?,
            OutputFormat::Json => {
                let item = raw.decode()?;
                views.push(ItemView {
                    index: raw.index,
                    offset: raw.offset,
                    bytes: raw.bytes,
                    item_type: item.item_type,
                    tag: item.tag,
                    name: item.name(),
                    data: item.data,
                    long: item.long,
                });
            }
        }
    }

    if format == OutputFormat::Json {
        write_json(out, &views)?;
    }
    Ok(())
}

fn reason_label(reason: SuppressionReason) -> &'static str {
    match reason {
        SuppressionReason::Redundant => "redundant",
        SuppressionReason::Superseded => "superseded",
    }
}

pub fn importance_line(raw: &RawItem, importance: &ItemImportance) -> String {
    let mut line = format!("{}: {} {}", raw.index, hex(&raw.bytes), importance.keep);
    if let Some(reason) = importance.reason {
        line.push_str(&format!(" ({})", reason_label(reason)));
    }
    line
}

pub fn run_importance(
    path: &Path,
    format: OutputFormat,
    limits: StateLimits,
    out: &mut dyn Write,
) -> Result<()> {
    let items = load_items(path)?;
    let analysis = analyze_importance_with_limits(&items, limits)
        .with_context(|| format!("analyze {}", path.display()))?;

    match format {
        OutputFormat::Text => {
            for (raw, importance) in items.iter().zip(&analysis) {
                writeln!(out, "{}", importance_line(raw, importance))?;
            }
        }
        OutputFormat::Json => write_json(out, &analysis)?,
    }
    Ok(())
}

pub fn table_text(table: &AttributeTable) -> String {
    let entries: Vec<String> = table
        .iter()
        .map(|(key, entry)| {
            format!(
                "{:?} {:#04x} {}: [{}]",
                key.scope,
                key.tag,
                key.name().unwrap_or("Unknown"),
                hex(&entry.value)
            )
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

pub fn snapshot_line(snapshot: &Snapshot) -> String {
    format!(
        "{}: {} {}",
        snapshot.index,
        hex(&snapshot.bytes),
        table_text(&snapshot.table)
    )
}

pub fn run_states(
    path: &Path,
    format: OutputFormat,
    limits: StateLimits,
    out: &mut dyn Write,
) -> Result<()> {
    let items = load_items(path)?;
    let snapshots = capture_snapshots_with_limits(&items, limits)
        .with_context(|| format!("replay {}", path.display()))?;

    match format {
        OutputFormat::Text => {
            for snapshot in &snapshots {
                writeln!(out, "{}", snapshot_line(snapshot))?;
            }
        }
        OutputFormat::Json => write_json(out, &snapshots)?,
    }
    Ok(())
}

/// Compares two descriptor files. Returns whether they are equivalent.
pub fn run_compare(
    left: &Path,
    right: &Path,
    format: OutputFormat,
    limits: StateLimits,
    out: &mut dyn Write,
) -> Result<bool> {
    let left_snapshots = capture_snapshots_with_limits(&load_items(left)?, limits)
        .with_context(|| format!("replay left descriptor {}", left.display()))?;
    let right_snapshots = capture_snapshots_with_limits(&load_items(right)?, limits)
        .with_context(|| format!("replay right descriptor {}", right.display()))?;
    let result = compare_snapshots(&left_snapshots, &right_snapshots);

    match (&result, format) {
        (_, OutputFormat::Json) => write_json(out, &result)?,
        (Equivalence::Equivalent { .. }, OutputFormat::Text) => {
            writeln!(out, "Descriptors are equivalent")?
        }
        (Equivalence::Different(mismatch), OutputFormat::Text) => writeln!(out, "{mismatch}")?,
    }
    Ok(result.is_equivalent())
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("serialize JSON output")?;
    writeln!(out)?;
    Ok(())
}
