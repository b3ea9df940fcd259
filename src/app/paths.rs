// SPDX-License-Identifier: MPL-2.0
//! Centralized path management for application directories.
//!
//! # Path Resolution Order
//!
//! 1. **Explicit override** - parameter to the `_with_override()` functions (for tests)
//! 2. **Environment variables** (`IMAGE_HD_DATA_DIR`, `IMAGE_HD_CONFIG_DIR`)
//! 3. **Platform default** - via `dirs` crate
//!
//! The data directory holds downloaded models (`models/`) and may hold the
//! Real-ESRGAN executable (`bin/`). The config directory holds `settings.toml`.

use std::path::PathBuf;

/// Application name used for directory naming.
const APP_NAME: &str = "ImageHD";

/// Environment variable to override the data directory.
pub const ENV_DATA_DIR: &str = "IMAGE_HD_DATA_DIR";

/// Environment variable to override the config directory.
pub const ENV_CONFIG_DIR: &str = "IMAGE_HD_CONFIG_DIR";

fn resolve(
    override_path: Option<PathBuf>,
    env_var: &str,
    platform: fn() -> Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path);
    }

    if let Ok(env_path) = std::env::var(env_var) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    platform().map(|path| path.join(APP_NAME))
}

/// Returns the application data directory path.
///
/// Returns `None` if the data directory cannot be determined.
pub fn get_app_data_dir() -> Option<PathBuf> {
    get_app_data_dir_with_override(None)
}

/// Returns the application data directory path with an optional override.
pub fn get_app_data_dir_with_override(override_path: Option<PathBuf>) -> Option<PathBuf> {
    resolve(override_path, ENV_DATA_DIR, dirs::data_dir)
}

/// Returns the application config directory path.
///
/// Returns `None` if the config directory cannot be determined.
pub fn get_app_config_dir() -> Option<PathBuf> {
    get_app_config_dir_with_override(None)
}

/// Returns the application config directory path with an optional override.
pub fn get_app_config_dir_with_override(override_path: Option<PathBuf>) -> Option<PathBuf> {
    resolve(override_path, ENV_CONFIG_DIR, dirs::config_dir)
}

/// Directory downloaded colorization models are stored in.
///
/// Falls back to a relative `models` folder when no data directory exists.
#[must_use]
pub fn models_dir() -> PathBuf {
    get_app_data_dir().map_or_else(|| PathBuf::from("models"), |path| path.join("models"))
}

/// Directory searched for helper executables.
#[must_use]
pub fn bin_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|path| path.join("bin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to prevent parallel tests from interfering with each other's env vars
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn app_data_dir_contains_app_name() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::remove_var(ENV_DATA_DIR);

        if let Some(path) = get_app_data_dir() {
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }

    #[test]
    fn override_path_takes_precedence_over_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_DATA_DIR, "/env/path");

        let override_path = PathBuf::from("/override/path");
        let result = get_app_data_dir_with_override(Some(override_path.clone()));
        assert_eq!(result, Some(override_path));

        std::env::remove_var(ENV_DATA_DIR);
    }

    #[test]
    fn env_var_overrides_default_dirs() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_DATA_DIR, "/test/data/dir");
        std::env::set_var(ENV_CONFIG_DIR, "/test/config/dir");

        assert_eq!(get_app_data_dir(), Some(PathBuf::from("/test/data/dir")));
        assert_eq!(get_app_config_dir(), Some(PathBuf::from("/test/config/dir")));
        assert_eq!(models_dir(), PathBuf::from("/test/data/dir/models"));
        assert_eq!(bin_dir(), Some(PathBuf::from("/test/data/dir/bin")));

        std::env::remove_var(ENV_DATA_DIR);
        std::env::remove_var(ENV_CONFIG_DIR);
    }

    #[test]
    fn empty_env_var_uses_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        std::env::set_var(ENV_CONFIG_DIR, "");

        if let Some(path) = get_app_config_dir() {
            assert!(path.to_string_lossy().contains(APP_NAME));
        }

        std::env::remove_var(ENV_CONFIG_DIR);
    }
}
