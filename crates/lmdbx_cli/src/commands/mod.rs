//! CLI command implementations.

pub mod ops;
pub mod perf;
pub mod range_demo;
pub mod resolve;
pub mod smoke;

use lmdbx_core::{load_native, Database, InMemoryEngine, LoaderConfig, RawApi};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Result type shared by every command.
pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Which engine backs the sessions a command opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineChoice {
    /// The native library, resolved from the environment.
    Native,
    /// A throwaway in-memory engine.
    Memory,
}

impl EngineChoice {
    /// Maps the `--memory` flag.
    pub fn from_flag(memory: bool) -> Self {
        if memory {
            Self::Memory
        } else {
            Self::Native
        }
    }

    /// Builds the binding surface.
    pub fn api(self) -> CommandResult<Arc<dyn RawApi>> {
        match self {
            Self::Native => {
                let config = LoaderConfig::from_env();
                info!(base_dir = ?config.base_dir, "using native lmdbx engine");
                Ok(load_native(&config)?)
            }
            Self::Memory => {
                info!("using in-memory engine");
                Ok(Arc::new(InMemoryEngine::new()))
            }
        }
    }

    /// Opens a session on `path`.
    pub fn open(self, path: &Path) -> CommandResult<Database> {
        let db = Database::open(self.api()?, path)?;
        info!(path = %path.display(), "opened database");
        Ok(db)
    }
}

/// Renders bytes for terminal output.
pub fn display_bytes(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
