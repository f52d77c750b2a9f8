//! Resolve command implementation.

use super::CommandResult;
use lmdbx_core::{DylibLoader, LoaderConfig, Platform, Resolver};

/// Runs the resolve command.
///
/// Prints what the loader sees in the environment, the candidates in the
/// order they are tried, and the artifact that loaded.
pub fn run() -> CommandResult {
    let config = LoaderConfig::from_env();
    print_config(&config);

    let resolver = Resolver::new(config, DylibLoader);
    if resolver.config().override_path.is_none() {
        let platform = Platform::detect(resolver.config())?;
        println!("Architecture: {}", platform.arch);
        let variants: Vec<String> = platform
            .libc_preference
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("C runtime preference: {}", variants.join(", "));

        println!("Candidates:");
        for path in resolver.candidates(&platform)? {
            println!("  {}", path.display());
        }
    }

    let resolved = resolver.resolve()?;
    println!("Loaded: {}", resolved.path.display());
    Ok(())
}

fn print_config(config: &LoaderConfig) {
    println!("Platform: {}", config.platform);
    println!(
        "Base directory: {}",
        config
            .base_dir
            .as_ref()
            .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string())
    );
    if let Some(path) = &config.override_path {
        println!("Override: {}", path.display());
    }
    if let Some(variant) = &config.libc_variant {
        println!("Declared C runtime: {variant}");
    }
}
