//! Native library resolution.
//!
//! Turns a [`LoaderConfig`] into a loaded binding surface. Resolution is
//! either a single override path (terminal, no fallback) or an ordered walk
//! over per-variant candidates in the base directory, ending with a bare
//! `<prefix><extension>` fallback. Every failure is kept so the final error
//! shows the whole story.

use crate::config::{LoaderConfig, ENV_BIN_LIBS_PATH};
use crate::error::{Error, LibraryLoadError, LoadAttempt, Result};
use crate::native::{DylibLoader, NativeLibrary};
use crate::platform::Platform;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something that can turn a path into a loaded library.
///
/// Errors are plain strings: the resolver only records and reports them.
pub trait Loader {
    /// The loaded library type.
    type Library;

    /// Attempts to load the artifact at `path`.
    fn load(&self, path: &Path) -> std::result::Result<Self::Library, String>;
}

/// A successfully loaded library and the path it came from.
#[derive(Debug)]
pub struct ResolvedLibrary<L> {
    /// The loaded library.
    pub library: L,
    /// The path that loaded.
    pub path: PathBuf,
}

/// Walks candidate artifacts until one loads.
#[derive(Debug, Clone)]
pub struct Resolver<Ld> {
    config: LoaderConfig,
    loader: Ld,
}

impl<Ld: Loader> Resolver<Ld> {
    /// Creates a resolver for `config` using `loader`.
    pub fn new(config: LoaderConfig, loader: Ld) -> Self {
        Self { config, loader }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Returns the candidate paths in the order they will be tried.
    ///
    /// With an override this is just the override path.
    ///
    /// # Errors
    ///
    /// `Error::Configuration` if there is neither an override nor a base directory.
    pub fn candidates(&self, platform: &Platform) -> Result<Vec<PathBuf>> {
        if let Some(path) = &self.config.override_path {
            return Ok(vec![path.clone()]);
        }

        let base = self.base_dir()?;
        let prefix = &self.config.prefix;
        let ext = &self.config.extension;

        let mut paths: Vec<PathBuf> = platform
            .libc_preference
            .iter()
            .map(|variant| base.join(format!("{prefix}-{}-{variant}{ext}", platform.arch)))
            .collect();
        paths.push(base.join(format!("{prefix}{ext}")));
        Ok(paths)
    }

    /// Resolves using live platform detection.
    pub fn resolve(&self) -> Result<ResolvedLibrary<Ld::Library>> {
        if self.config.override_path.is_some() {
            return self.resolve_override();
        }
        let platform = Platform::detect(&self.config)?;
        self.resolve_for(&platform)
    }

    /// Resolves for an already identified platform.
    ///
    /// # Errors
    ///
    /// - `Error::Configuration` when no location is configured
    /// - `Error::LibraryLoad` listing every attempt when nothing loads
    pub fn resolve_for(&self, platform: &Platform) -> Result<ResolvedLibrary<Ld::Library>> {
        if self.config.override_path.is_some() {
            return self.resolve_override();
        }

        let base = self.base_dir()?;
        list_directory(base);

        let mut attempts = Vec::new();
        for path in self.candidates(platform)? {
            debug!(path = %path.display(), "trying lmdbx candidate");
            match self.loader.load(&path) {
                Ok(library) => {
                    info!(path = %path.display(), "loaded lmdbx library");
                    return Ok(ResolvedLibrary { library, path });
                }
                Err(error) => {
                    debug!(path = %path.display(), %error, "candidate failed to load");
                    attempts.push(LoadAttempt { path, error });
                }
            }
        }

        Err(LibraryLoadError { attempts }.into())
    }

    fn resolve_override(&self) -> Result<ResolvedLibrary<Ld::Library>> {
        let path = self
            .config
            .override_path
            .clone()
            .ok_or_else(|| Error::configuration("no override path configured"))?;

        debug!(path = %path.display(), "loading lmdbx override");
        match self.loader.load(&path) {
            Ok(library) => {
                info!(path = %path.display(), "loaded lmdbx library from override");
                Ok(ResolvedLibrary { library, path })
            }
            Err(error) => Err(LibraryLoadError {
                attempts: vec![LoadAttempt { path, error }],
            }
            .into()),
        }
    }

    fn base_dir(&self) -> Result<&Path> {
        self.config.base_dir.as_deref().ok_or_else(|| {
            Error::configuration(format!(
                "environment variable {ENV_BIN_LIBS_PATH} is not set; cannot determine lmdbx library location"
            ))
        })
    }
}

/// Logs the artifact directory's contents. Failures only warn.
fn list_directory(dir: &Path) {
    match std::fs::read_dir(dir) {
        Ok(entries) => {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            info!(dir = %dir.display(), ?names, "available lmdbx libraries");
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to list lmdbx libraries");
        }
    }
}

/// Resolves and loads the native library described by `config`.
///
/// The returned value is meant to be created once and handed to every
/// [`crate::Database`] the process opens.
pub fn load_native(config: &LoaderConfig) -> Result<Arc<NativeLibrary>> {
    let resolved = Resolver::new(config.clone(), DylibLoader).resolve()?;
    Ok(Arc::new(resolved.library))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, LibcVariant};
    use std::cell::RefCell;

    /// Records every path and succeeds only for `accept`.
    struct RecordingLoader {
        accept: Option<PathBuf>,
        tried: RefCell<Vec<PathBuf>>,
    }

    impl RecordingLoader {
        fn accepting(path: Option<PathBuf>) -> Self {
            Self {
                accept: path,
                tried: RefCell::new(Vec::new()),
            }
        }
    }

    impl Loader for &RecordingLoader {
        type Library = PathBuf;

        fn load(&self, path: &Path) -> std::result::Result<PathBuf, String> {
            self.tried.borrow_mut().push(path.to_path_buf());
            if self.accept.as_deref() == Some(path) {
                Ok(path.to_path_buf())
            } else {
                Err(format!("cannot open {}", path.display()))
            }
        }
    }

    fn linux_x86(prefs: Vec<LibcVariant>) -> Platform {
        Platform {
            arch: Arch::X86_64,
            libc_preference: prefs,
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig::new()
            .with_base_dir("/opt/libs")
            .with_extension(".so")
    }

    #[test]
    fn candidate_order_follows_preference() {
        let loader = RecordingLoader::accepting(None);
        let resolver = Resolver::new(config(), &loader);
        let paths = resolver
            .candidates(&linux_x86(vec![LibcVariant::Musl, LibcVariant::Gnu]))
            .unwrap();

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/opt/libs/liblmdbx-x86_64-musl.so"),
                PathBuf::from("/opt/libs/liblmdbx-x86_64-gnu.so"),
                PathBuf::from("/opt/libs/liblmdbx.so"),
            ]
        );
    }

    #[test]
    fn first_loadable_candidate_wins() {
        let target = PathBuf::from("/opt/libs/liblmdbx-x86_64-musl.so");
        let loader = RecordingLoader::accepting(Some(target.clone()));
        let resolver = Resolver::new(config(), &loader);

        let resolved = resolver
            .resolve_for(&linux_x86(vec![LibcVariant::Gnu, LibcVariant::Musl]))
            .unwrap();

        assert_eq!(resolved.path, target);
        assert_eq!(loader.tried.borrow().len(), 2);
    }

    #[test]
    fn bare_fallback_is_tried_last() {
        let fallback = PathBuf::from("/opt/libs/liblmdbx.so");
        let loader = RecordingLoader::accepting(Some(fallback.clone()));
        let resolver = Resolver::new(config(), &loader);

        let resolved = resolver
            .resolve_for(&linux_x86(vec![LibcVariant::Gnu, LibcVariant::Musl]))
            .unwrap();

        assert_eq!(resolved.path, fallback);
        assert_eq!(loader.tried.borrow().last(), Some(&fallback));
    }

    #[test]
    fn failure_lists_every_attempt() {
        let loader = RecordingLoader::accepting(None);
        let resolver = Resolver::new(config(), &loader);

        let err = resolver
            .resolve_for(&linux_x86(vec![LibcVariant::Gnu, LibcVariant::Musl]))
            .unwrap_err();

        let Error::LibraryLoad(load) = err else {
            panic!("expected LibraryLoad");
        };
        assert_eq!(load.attempts.len(), 3);
        assert_eq!(
            load.attempts[0].path,
            PathBuf::from("/opt/libs/liblmdbx-x86_64-gnu.so")
        );
        assert!(load.attempts[0].error.contains("liblmdbx-x86_64-gnu.so"));
        assert_eq!(load.attempts[2].path, PathBuf::from("/opt/libs/liblmdbx.so"));
    }

    #[test]
    fn override_is_terminal() {
        let loader = RecordingLoader::accepting(None);
        let resolver = Resolver::new(config().with_override_path("/custom/liblmdbx.so"), &loader);

        let err = resolver.resolve().unwrap_err();
        let Error::LibraryLoad(load) = err else {
            panic!("expected LibraryLoad");
        };
        assert_eq!(load.attempts.len(), 1);
        assert_eq!(*loader.tried.borrow(), vec![PathBuf::from("/custom/liblmdbx.so")]);
    }

    #[test]
    fn override_needs_no_base_dir_or_arch() {
        let path = PathBuf::from("/custom/liblmdbx.so");
        let loader = RecordingLoader::accepting(Some(path.clone()));
        let config = LoaderConfig::new()
            .with_override_path(&path)
            .with_arch("sparc");

        let resolved = Resolver::new(config, &loader).resolve().unwrap();
        assert_eq!(resolved.path, path);
    }

    #[test]
    fn missing_base_dir_is_configuration_error() {
        let loader = RecordingLoader::accepting(None);
        let resolver = Resolver::new(LoaderConfig::new(), &loader);

        let err = resolver
            .resolve_for(&linux_x86(vec![LibcVariant::Gnu]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("BIN_LIBS_PATH"));
        assert!(loader.tried.borrow().is_empty());
    }

    #[test]
    fn unlistable_directory_still_resolves() {
        let fallback = PathBuf::from("/does/not/exist/liblmdbx.so");
        let loader = RecordingLoader::accepting(Some(fallback.clone()));
        let config = LoaderConfig::new()
            .with_base_dir("/does/not/exist")
            .with_extension(".so");

        let resolved = Resolver::new(config, &loader)
            .resolve_for(&linux_x86(vec![LibcVariant::Gnu, LibcVariant::Musl]))
            .unwrap();
        assert_eq!(resolved.path, fallback);
    }
}
