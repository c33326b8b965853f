//! Default configuration file location.
//!
//! - **Working directory**: `config.yaml` in the current directory wins, which
//!   keeps `cargo run` next to a project config working.
//! - **User config dir** (default): `~/.config/mouse-bridge/config.yaml` on
//!   Linux, `%APPDATA%\mouse-bridge\config.yaml` on Windows, etc.
//!
//! A missing file is not an error; everything can be given on the command line.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for the per-user config directory
const APP_NAME: &str = "mouse-bridge";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file (may not exist)
    pub config: PathBuf,
}

impl AppPaths {
    /// Detect the config location from the environment.
    pub fn detect() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::detect_from(&cwd, dirs::config_dir())
    }

    fn detect_from(cwd: &Path, user_config_dir: Option<PathBuf>) -> Self {
        let cwd_config = cwd.join(CONFIG_FILE);
        if cwd_config.exists() {
            debug!("Using config from working directory: {}", cwd_config.display());
            return Self { config: cwd_config };
        }

        let config = user_config_dir
            .map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
            .unwrap_or(cwd_config);
        debug!("Default config location: {}", config.display());

        Self { config }
    }
}
