//! Range demo command implementation.

use super::{display_bytes, CommandResult, EngineChoice};
use lmdbx_core::{Database, Entry, RangeOptions};
use std::path::Path;

/// Seed keys and values written before the scans.
pub const SEED: [(&str, &str); 7] = [
    ("key001", "value1"),
    ("key005", "value5"),
    ("key010", "value10"),
    ("key015", "value15"),
    ("key020", "value20"),
    ("key025", "value25"),
    ("key030", "value30"),
];

/// The scans the demo prints, with their headings.
pub fn queries() -> Vec<(&'static str, RangeOptions)> {
    vec![
        ("All keys", RangeOptions::new()),
        ("First 3 keys", RangeOptions::new().limit(3)),
        (
            "Range key010 - key020",
            RangeOptions::new().start("key010").end("key020"),
        ),
        (
            "Reverse order (last 3)",
            RangeOptions::new().reverse(true).limit(3),
        ),
        ("From key015 (limit 3)", RangeOptions::new().start("key015").limit(3)),
    ]
}

/// Writes [`SEED`] in a single transaction.
pub fn seed(db: &mut Database) -> lmdbx_core::Result<()> {
    db.transaction(|db| {
        for (key, value) in SEED {
            db.put(key, value)?;
        }
        Ok(())
    })
}

/// Runs the range demo command.
pub fn run(engine: &EngineChoice, path: &Path) -> CommandResult {
    let mut db = engine.open(path)?;
    seed(&mut db)?;

    for (title, options) in queries() {
        println!("\n=== {title} ===");
        for entry in db.get_range(&options)? {
            print_entry(&entry);
        }
    }

    db.close();
    println!("\nAll range queries completed");
    Ok(())
}

fn print_entry(entry: &Entry) {
    println!("{}: {}", display_bytes(&entry.key), display_bytes(&entry.value));
}
