//! Single-operation commands.

use super::{display_bytes, CommandResult, EngineChoice};
use lmdbx_core::{Entry, RangeOptions};
use serde::Serialize;
use std::path::Path;

/// A scanned entry as printed in JSON output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScanEntry {
    /// Key, lossily decoded as UTF-8.
    pub key: String,
    /// Value, lossily decoded as UTF-8.
    pub value: String,
}

impl From<&Entry> for ScanEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            key: display_bytes(&entry.key),
            value: display_bytes(&entry.value),
        }
    }
}

/// Runs the get command.
pub fn get(engine: &EngineChoice, path: &Path, key: &str) -> CommandResult {
    let mut db = engine.open(path)?;
    match db.get(key)? {
        Some(value) => println!("{}", display_bytes(&value)),
        None => return Err(format!("key {key:?} not found").into()),
    }
    Ok(())
}

/// Runs the put command.
pub fn put(engine: &EngineChoice, path: &Path, key: &str, value: &str) -> CommandResult {
    let mut db = engine.open(path)?;
    db.put(key, value)?;
    db.flush()?;
    println!("OK");
    Ok(())
}

/// Runs the delete command.
pub fn delete(engine: &EngineChoice, path: &Path, key: &str) -> CommandResult {
    let mut db = engine.open(path)?;
    db.delete(key)?;
    db.flush()?;
    println!("OK");
    Ok(())
}

/// Builds scan options from command-line arguments.
pub fn scan_options(
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
    reverse: bool,
) -> RangeOptions {
    RangeOptions {
        start: start.map(String::into_bytes),
        end: end.map(String::into_bytes),
        limit,
        reverse,
    }
}

/// Runs the scan command.
pub fn scan(
    engine: &EngineChoice,
    path: &Path,
    options: &RangeOptions,
    format: &str,
) -> CommandResult {
    let mut db = engine.open(path)?;
    let entries = db.get_range(options)?;
    print!("{}", render(&entries, format)?);
    Ok(())
}

/// Formats scan results as `text` (one `key: value` per line) or `json`.
pub fn render(entries: &[Entry], format: &str) -> CommandResult<String> {
    match format {
        "json" => {
            let rows: Vec<ScanEntry> = entries.iter().map(ScanEntry::from).collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&rows)?))
        }
        "text" => Ok(entries
            .iter()
            .map(|e| format!("{}: {}\n", display_bytes(&e.key), display_bytes(&e.value)))
            .collect()),
        other => Err(format!("unknown output format {other:?} (expected text or json)").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Entry> {
        vec![Entry::new("a", "1"), Entry::new("b", "2")]
    }

    #[test]
    fn render_text() {
        assert_eq!(render(&sample(), "text").unwrap(), "a: 1\nb: 2\n");
    }

    #[test]
    fn render_json() {
        let out = render(&sample(), "json").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[1]["key"], "b");
        assert_eq!(parsed[1]["value"], "2");
    }

    #[test]
    fn render_rejects_unknown_format() {
        assert!(render(&sample(), "yaml").is_err());
    }

    #[test]
    fn scan_options_from_args() {
        let options = scan_options(Some("a".into()), None, Some(5), true);
        assert_eq!(options, RangeOptions::new().start("a").limit(5).reverse(true));
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(get(&EngineChoice::Memory, Path::new("ops.db"), "nope").is_err());
    }
}
