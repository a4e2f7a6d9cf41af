//! Startup wiring: config path resolution, logging, and the UI state file.

use std::path::{Path, PathBuf};

/// Priority: `--config` CLI flag > `PARLEY_CONFIG` env > platform config dir.
pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }
    if let Ok(path) = std::env::var("PARLEY_CONFIG") {
        return PathBuf::from(path);
    }
    config_dir().join("config.toml")
}

/// Theme flag and other UI state live next to the config.
pub fn ui_state_path() -> PathBuf {
    config_dir().join("ui.toml")
}

fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(dir).join("parley");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("parley");
    }
    PathBuf::from(".parley")
}

/// When the TUI owns the terminal, tracing goes to a log file instead of
/// stdout so rendering is not corrupted.
pub fn init_subscriber(tui_active: bool, log_path: &Path) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if tui_active {
        if let Ok(file) = std::fs::File::create(log_path) {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();
            return;
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        // Env-dependent prefix; only the file name is stable.
        let path = resolve_config_path(None);
        assert!(path.ends_with("config.toml") || path.to_string_lossy().contains("parley"));
    }

    #[test]
    fn ui_state_lives_beside_config() {
        assert!(ui_state_path().ends_with("ui.toml"));
    }
}
