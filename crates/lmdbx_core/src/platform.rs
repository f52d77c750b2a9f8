//! Platform identification for artifact selection.
//!
//! Maps the running CPU architecture and C runtime to the tokens used in
//! artifact file names. C-runtime detection is a heuristic, so the result
//! is an ordered preference list rather than a single answer.

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loader paths whose presence indicates a musl-based system.
pub const MUSL_LOADER_MARKERS: [&str; 3] = [
    "/lib/ld-musl-x86_64.so.1",
    "/lib/ld-musl-aarch64.so.1",
    "/lib/ld-musl.so.1",
];

/// Supported CPU architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86.
    X86_64,
    /// 64-bit ARM.
    Aarch64,
}

impl Arch {
    /// Parses a raw architecture string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for any architecture without a published artifact.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "x86_64" | "x64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            _ => Err(Error::configuration(format!(
                "unsupported architecture '{raw}' for lmdbx native bindings"
            ))),
        }
    }

    /// Returns the token used in artifact names.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// C-runtime flavor an artifact was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LibcVariant {
    /// glibc.
    Gnu,
    /// musl.
    Musl,
}

impl LibcVariant {
    /// Normalizes a free-form declaration such as `glibc` or `x86_64-linux-musl`.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let value = raw.to_ascii_lowercase();
        if value.contains("musl") {
            Some(Self::Musl)
        } else if value.contains("gnu") || value.contains("glibc") {
            Some(Self::Gnu)
        } else {
            None
        }
    }

    /// Returns the token used in artifact names.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Gnu => "gnu",
            Self::Musl => "musl",
        }
    }

    /// Returns the alternate variant.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Gnu => Self::Musl,
            Self::Musl => Self::Gnu,
        }
    }
}

impl fmt::Display for LibcVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Evidence about which C runtime the process is using.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibcEvidence {
    /// Set when this binary was built against glibc. Compile-time, not
    /// read from the running system.
    pub glibc_marker: Option<String>,
    /// A musl loader path that exists on this system.
    pub musl_loader: Option<PathBuf>,
}

impl LibcEvidence {
    /// Gathers evidence for `platform`.
    ///
    /// The glibc marker is build-time evidence: it is present exactly when
    /// this binary was compiled for `target_env = "gnu"`. The musl loader is
    /// looked up on the running filesystem. Returns empty evidence on
    /// anything other than Linux.
    #[must_use]
    pub fn probe(platform: &str) -> Self {
        if platform != "linux" {
            return Self::default();
        }

        let glibc_marker = cfg!(target_env = "gnu").then(|| "target_env=gnu".to_string());
        let musl_loader = MUSL_LOADER_MARKERS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf);

        Self {
            glibc_marker,
            musl_loader,
        }
    }

    /// Returns the variant the evidence points to, if it is conclusive.
    #[must_use]
    pub fn detected(&self) -> Option<LibcVariant> {
        if self.glibc_marker.as_deref().is_some_and(|m| !m.is_empty()) {
            Some(LibcVariant::Gnu)
        } else if self.musl_loader.is_some() {
            Some(LibcVariant::Musl)
        } else {
            None
        }
    }
}

/// Computes the ordered list of C-runtime variants to try.
///
/// - a recognised override yields exactly that variant;
/// - otherwise conclusive evidence yields the detected variant, then the other;
/// - otherwise `gnu` then `musl`.
///
/// An override that names neither variant is ignored.
#[must_use]
pub fn libc_preference(
    override_variant: Option<&str>,
    platform: &str,
    evidence: &LibcEvidence,
) -> Vec<LibcVariant> {
    if let Some(raw) = override_variant {
        match LibcVariant::normalize(raw) {
            Some(variant) => return vec![variant],
            None => warn!(value = raw, "ignoring unrecognised C-runtime variant"),
        }
    }

    let detected = if platform == "linux" {
        evidence.detected()
    } else {
        None
    };

    match detected {
        Some(variant) => {
            debug!(%variant, "detected C runtime");
            vec![variant, variant.other()]
        }
        None => vec![LibcVariant::Gnu, LibcVariant::Musl],
    }
}

/// The resolved platform identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// CPU architecture.
    pub arch: Arch,
    /// C-runtime variants in the order they should be tried.
    pub libc_preference: Vec<LibcVariant>,
}

impl Platform {
    /// Identifies the platform using live system evidence.
    pub fn detect(config: &LoaderConfig) -> Result<Self> {
        let evidence = LibcEvidence::probe(&config.platform);
        Self::identify(config, &evidence)
    }

    /// Identifies the platform from the configuration and given evidence.
    pub fn identify(config: &LoaderConfig, evidence: &LibcEvidence) -> Result<Self> {
        let arch = Arch::parse(&config.arch)?;
        let libc_preference =
            libc_preference(config.libc_variant.as_deref(), &config.platform, evidence);
        Ok(Self {
            arch,
            libc_preference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn glibc() -> LibcEvidence {
        LibcEvidence {
            glibc_marker: Some("2.35".into()),
            musl_loader: None,
        }
    }

    fn musl() -> LibcEvidence {
        LibcEvidence {
            glibc_marker: None,
            musl_loader: Some(PathBuf::from("/lib/ld-musl-x86_64.so.1")),
        }
    }

    #[test]
    fn arch_aliases() {
        assert_eq!(Arch::parse("x86_64").unwrap(), Arch::X86_64);
        assert_eq!(Arch::parse("x64").unwrap(), Arch::X86_64);
        assert_eq!(Arch::parse("arm64").unwrap(), Arch::Aarch64);
        assert_eq!(Arch::parse("aarch64").unwrap(), Arch::Aarch64);
    }

    #[test]
    fn unsupported_arch_is_configuration_error() {
        let err = Arch::parse("riscv64").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("riscv64"));
    }

    #[test]
    fn normalize_variants() {
        assert_eq!(LibcVariant::normalize("MUSL"), Some(LibcVariant::Musl));
        assert_eq!(LibcVariant::normalize("glibc"), Some(LibcVariant::Gnu));
        assert_eq!(LibcVariant::normalize("x86_64-linux-gnu"), Some(LibcVariant::Gnu));
        assert_eq!(LibcVariant::normalize("bionic"), None);
    }

    #[test]
    fn override_is_single_entry() {
        let prefs = libc_preference(Some("musl"), "linux", &glibc());
        assert_eq!(prefs, vec![LibcVariant::Musl]);
    }

    #[test]
    fn unrecognised_override_is_ignored() {
        let prefs = libc_preference(Some("uclibc"), "linux", &musl());
        assert_eq!(prefs, vec![LibcVariant::Musl, LibcVariant::Gnu]);
    }

    #[test]
    fn detected_variant_goes_first() {
        assert_eq!(
            libc_preference(None, "linux", &glibc()),
            vec![LibcVariant::Gnu, LibcVariant::Musl]
        );
        assert_eq!(
            libc_preference(None, "linux", &musl()),
            vec![LibcVariant::Musl, LibcVariant::Gnu]
        );
    }

    #[test]
    fn glibc_marker_wins_over_musl_loader() {
        let both = LibcEvidence {
            glibc_marker: Some("2.31".into()),
            musl_loader: Some(PathBuf::from("/lib/ld-musl.so.1")),
        };
        assert_eq!(both.detected(), Some(LibcVariant::Gnu));
    }

    #[test]
    fn inconclusive_uses_default_order() {
        let prefs = libc_preference(None, "linux", &LibcEvidence::default());
        assert_eq!(prefs, vec![LibcVariant::Gnu, LibcVariant::Musl]);
    }

    #[test]
    fn non_linux_ignores_evidence() {
        let prefs = libc_preference(None, "macos", &musl());
        assert_eq!(prefs, vec![LibcVariant::Gnu, LibcVariant::Musl]);
        assert_eq!(LibcEvidence::probe("windows"), LibcEvidence::default());
    }

    #[test]
    fn glibc_marker_follows_build_target() {
        let evidence = LibcEvidence::probe("linux");
        assert_eq!(evidence.glibc_marker.is_some(), cfg!(target_env = "gnu"));
    }

    #[test]
    fn identify_platform() {
        let config = LoaderConfig::new().with_arch("arm64").with_platform("linux");
        let platform = Platform::identify(&config, &musl()).unwrap();
        assert_eq!(platform.arch, Arch::Aarch64);
        assert_eq!(
            platform.libc_preference,
            vec![LibcVariant::Musl, LibcVariant::Gnu]
        );
    }

    proptest! {
        #[test]
        fn preference_is_never_empty_or_repeated(
            raw in prop::option::of("[a-zA-Z0-9_-]{0,12}"),
            glibc_marker in prop::option::of("[0-9.]{1,6}"),
            has_musl in any::<bool>(),
        ) {
            let evidence = LibcEvidence {
                glibc_marker,
                musl_loader: has_musl.then(|| PathBuf::from("/lib/ld-musl.so.1")),
            };
            let prefs = libc_preference(raw.as_deref(), "linux", &evidence);
            prop_assert!(!prefs.is_empty() && prefs.len() <= 2);
            if prefs.len() == 2 {
                prop_assert_ne!(prefs[0], prefs[1]);
            }
        }
    }
}
