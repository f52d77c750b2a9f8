//! Perf command implementation.

use super::{CommandResult, EngineChoice};
use rand::Rng;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::info;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of every generated key and value.
pub const STRING_LEN: usize = 32;

/// Timing for one perf run.
#[derive(Debug, Serialize)]
pub struct PerfResult {
    /// Number of keys written and read back.
    pub count: usize,
    /// Wall time for all puts and gets.
    pub elapsed_ms: f64,
    /// Total operations per second.
    pub ops_per_sec: f64,
}

/// Returns a random lowercase alphanumeric string.
pub fn random_string(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Runs the perf command.
pub fn run(engine: &EngineChoice, path: &Path, count: usize, format: &str) -> CommandResult {
    info!(count, path = %path.display(), "starting perf run");
    let result = measure(engine, path, count)?;
    print!("{}", render(&result, format)?);
    Ok(())
}

/// Formats a perf result as `text` or `json`.
pub fn render(result: &PerfResult, format: &str) -> CommandResult<String> {
    match format {
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(result)?)),
        "text" => Ok(format!(
            "{n} put + {n} get: {:.2}ms\nOperations/sec: {:.0}\n",
            result.elapsed_ms,
            result.ops_per_sec,
            n = result.count,
        )),
        other => Err(format!("unknown output format {other:?} (expected text or json)").into()),
    }
}

/// Writes `count` random pairs, reads them back, and times both phases together.
pub fn measure(engine: &EngineChoice, path: &Path, count: usize) -> CommandResult<PerfResult> {
    let mut rng = rand::thread_rng();
    let pairs: Vec<(String, String)> = (0..count)
        .map(|_| {
            (
                random_string(&mut rng, STRING_LEN),
                random_string(&mut rng, STRING_LEN),
            )
        })
        .collect();

    let mut db = engine.open(path)?;

    let start = Instant::now();
    for (key, value) in &pairs {
        db.put(key, value)?;
    }
    for (key, _) in &pairs {
        db.get(key)?;
    }
    let elapsed = start.elapsed();

    db.close();

    let secs = elapsed.as_secs_f64();
    let ops_per_sec = if secs > 0.0 {
        (count * 2) as f64 / secs
    } else {
        0.0
    };
    Ok(PerfResult {
        count,
        elapsed_ms: secs * 1000.0,
        ops_per_sec,
    })
}
