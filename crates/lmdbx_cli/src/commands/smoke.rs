//! Smoke command implementation.

use super::{display_bytes, CommandResult, EngineChoice};
use std::path::Path;

/// Runs the smoke command.
pub fn run(engine: &EngineChoice, path: &Path) -> CommandResult {
    let mut db = engine.open(path)?;

    db.put("hello", "world")?;
    println!("Put: OK");

    let value = db.get("hello")?;
    println!(
        "Get: {}",
        value.as_deref().map_or_else(|| "<missing>".to_string(), display_bytes)
    );

    db.delete("hello")?;
    println!("Delete: OK");

    db.close();
    println!("Closed!");
    Ok(())
}
