use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing::warn;
use wrldgen_core::GeneratorConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/wrldgen.toml";

/// Load generator configuration from the default path.
pub fn load() -> GeneratorConfig {
    load_from_path(Path::new(DEFAULT_CONFIG_PATH))
}

/// Load configuration from an explicit path, falling back to defaults on errors.
pub fn load_from_path(path: &Path) -> GeneratorConfig {
    let config = match fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<GeneratorConfig>(&contents) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!("Failed to parse {}: {err}. Using defaults", path.display());
                return GeneratorConfig::default();
            }
        },
        Err(err) => {
            if path != Path::new(DEFAULT_CONFIG_PATH)
                || err.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
            }
            return GeneratorConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => config,
        Err(err) => {
            warn!("Invalid config {}: {err}. Using defaults", path.display());
            GeneratorConfig::default()
        }
    }
}

/// Load and validate configuration, failing on any problem.
pub fn load_strict(path: &Path) -> Result<GeneratorConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: GeneratorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

/// Resolve the configuration for a command: strict when a path was given.
pub fn resolve(path: Option<&Path>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => load_strict(path),
        None => Ok(load()),
    }
}

/// Save configuration to an explicit path.
pub fn save_to_path(config: &GeneratorConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}
