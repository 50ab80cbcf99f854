/// Centralized platform-specific path computation
///
/// Follows the XDG Base Directory specification on Unix-like systems and the
/// native conventions on Windows and macOS.
use std::path::{Path, PathBuf};

/// Folder name used under the platform data/cache/config directories
pub const APP_DIR_NAME: &str = "code-rag";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate cache directory for the current platform
    ///
    /// - Windows: %LOCALAPPDATA%
    /// - macOS: ~/Library/Caches
    /// - Linux/Unix: $XDG_CACHE_HOME or ~/.cache
    pub fn cache_dir() -> PathBuf {
        dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {cache_dir}/code-rag
    pub fn project_cache_dir() -> PathBuf {
        Self::cache_dir().join(APP_DIR_NAME)
    }

    /// Returns: {config_dir}/code-rag
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR_NAME)
    }

    /// Where downloaded embedding models are kept between runs
    ///
    /// Returns: {cache_dir}/code-rag/models
    pub fn default_model_cache_path() -> PathBuf {
        Self::project_cache_dir().join("models")
    }

    /// Returns: {config_dir}/code-rag/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }

    /// Absolute, canonical form of a user-supplied root directory
    pub fn normalize_path(path: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}
