//! Loader configuration.

use std::path::PathBuf;

/// Environment variable naming the directory that holds the native artifacts.
pub const ENV_BIN_LIBS_PATH: &str = "BIN_LIBS_PATH";

/// Environment variable naming an exact artifact path, bypassing resolution.
pub const ENV_LIB_OVERRIDE: &str = "LMDBX_LIBRARY";

/// Environment variable declaring the C-runtime variant (`gnu` or `musl`).
pub const ENV_LIBC_VARIANT: &str = "LIBC_VARIANT";

/// Secondary C-runtime variant variable, consulted when `LIBC_VARIANT` is unset.
pub const ENV_LIBC: &str = "LIBC";

/// File-name prefix shared by every artifact.
pub const DEFAULT_PREFIX: &str = "liblmdbx";

/// Dynamic library suffix for the running platform.
pub const DEFAULT_EXTENSION: &str = std::env::consts::DLL_SUFFIX;

/// Upper bound on entries returned by a range scan when the caller sets none.
pub const DEFAULT_SCAN_LIMIT: usize = 1_000_000;

/// Configuration for locating and loading the native library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Directory searched for `<prefix>-<arch>-<variant><extension>` candidates.
    pub base_dir: Option<PathBuf>,

    /// Exact artifact to load. When set, no other path is tried.
    pub override_path: Option<PathBuf>,

    /// Raw C-runtime variant declaration, normalized during resolution.
    pub libc_variant: Option<String>,

    /// Artifact file-name prefix.
    pub prefix: String,

    /// Artifact file-name extension, including the dot.
    pub extension: String,

    /// Raw CPU architecture string.
    pub arch: String,

    /// Raw operating system string.
    pub platform: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            override_path: None,
            libc_variant: None,
            prefix: DEFAULT_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        Self {
            base_dir: get(ENV_BIN_LIBS_PATH).map(PathBuf::from),
            override_path: get(ENV_LIB_OVERRIDE).map(PathBuf::from),
            libc_variant: get(ENV_LIBC_VARIANT).or_else(|| get(ENV_LIBC)),
            ..Self::default()
        }
    }

    /// Sets the artifact directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Sets an exact artifact path.
    #[must_use]
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    /// Declares the C-runtime variant.
    #[must_use]
    pub fn with_libc_variant(mut self, variant: impl Into<String>) -> Self {
        self.libc_variant = Some(variant.into());
        self
    }

    /// Sets the artifact file-name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the artifact file-name extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Overrides the detected CPU architecture.
    #[must_use]
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// Overrides the detected operating system.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Scan bound used when [`crate::RangeOptions::limit`] is unset.
    pub scan_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

impl SessionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default scan bound.
    #[must_use]
    pub const fn scan_limit(mut self, limit: usize) -> Self {
        self.scan_limit = limit;
        self
    }
}
