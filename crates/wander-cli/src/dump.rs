//! JSON files written and read by the CLI.
//!
//! Output is pretty-printed with object keys sorted, so dumps of the same data
//! diff cleanly.

use std::path::Path;

use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};

/// Writes `value` to `path` as pretty, key-sorted JSON.
///
/// # Errors
///
/// Returns an error if serialization or the file write fails.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    // `serde_json::Value` objects are BTreeMap-backed, which sorts the keys.
    let sorted = serde_json::to_value(value)?;
    let mut text = serde_json::to_string_pretty(&sorted)?;
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Reads a JSON file written by [`write_json`] (or by hand).
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse as `T`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
