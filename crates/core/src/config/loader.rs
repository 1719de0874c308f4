//! Settings loader for `config.toml` in the application data directory.

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppSettings;
use crate::config::paths::AppPaths;
use std::path::Path;

/// Loads settings from `<data_dir>/config.toml`.
///
/// A missing file yields [`AppSettings::default`]; every field is optional so
/// a partial file only overrides what it names.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The file is not valid TOML
/// - A value is unusable (empty interpreter list, empty script name)
///
/// # Example
///
/// ```rust,no_run
/// use vfm_core::config::loader::load_settings;
/// use vfm_core::config::paths::AppPaths;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = load_settings(&AppPaths::resolve(None))?;
/// println!("default codec: {}", settings.run.default_codec);
/// # Ok(())
/// # }
/// ```
pub fn load_settings(paths: &AppPaths) -> ConfigResult<AppSettings> {
    load_settings_from(&paths.config_file())
}

pub fn load_settings_from(config_path: &Path) -> ConfigResult<AppSettings> {
    if !config_path.exists() {
        return Ok(AppSettings::default());
    }

    let content =
        std::fs::read_to_string(config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.to_path_buf(),
            source,
        })?;

    let settings: AppSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.to_path_buf(),
            source,
        })?;

    validate(&settings, config_path)?;
    Ok(settings)
}

fn validate(settings: &AppSettings, config_path: &Path) -> ConfigResult<()> {
    let invalid = |reason: &str| ConfigError::InvalidConfig {
        path: config_path.to_path_buf(),
        reason: reason.to_string(),
    };

    if settings.worker.interpreters.iter().all(|i| i.trim().is_empty()) {
        return Err(invalid("worker.interpreters must name at least one interpreter"));
    }
    if settings.worker.script.as_os_str().is_empty() {
        return Err(invalid("worker.script must not be empty"));
    }
    if settings.run.default_codec.trim().is_empty() {
        return Err(invalid("run.default-codec must not be empty"));
    }
    Ok(())
}
