use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fmtsel_core::FormatDescriptor;
use serde_json::Value;

pub fn read_formats(path: &Path) -> Result<Vec<FormatDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading format list from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {} as a format list", path.display()))
}

pub fn read_info_dict(path: &Path) -> Result<BTreeMap<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading info dict from {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {} as an info dict", path.display()))
}

/// Which format ids `check_format` should treat as reachable when
/// `--check-formats` is set: every format whose entry doesn't explicitly
/// carry `"reachable": false`. There is no real prober behind this demo
/// CLI, so the JSON input doubles as the fixture for that opt-in path.
pub fn reachable_format_ids(formats: &[FormatDescriptor]) -> Vec<String> {
    formats
        .iter()
        .filter(|f| {
            f.extra
                .get("reachable")
                .and_then(Value::as_bool)
                .unwrap_or(true)
        })
        .filter_map(|f| f.format_id.clone())
        .collect()
}

pub fn print_result(result: &[FormatDescriptor], verbose: bool) {
    if result.is_empty() {
        println!(":: no format matched the selector");
        return;
    }
    if verbose {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!(":: failed to render result as json: {e}"),
        }
        return;
    }
    for format in result {
        println!(
            "{:<12} {:<6} {}",
            format.format_id.as_deref().unwrap_or("-"),
            format.ext.as_deref().unwrap_or("-"),
            fmtsel_core::format_resolution(format, "unknown"),
        );
    }
}
