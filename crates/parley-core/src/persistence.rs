use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Capability for the single persisted client preference: the theme flag.
/// Sessions and transcripts are memory-only by design.
pub trait Persistence: Send + Sync {
    fn load_dark_mode(&self) -> bool;

    /// Best-effort store; failures are logged, never surfaced.
    fn store_dark_mode(&self, dark: bool);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UiState {
    #[serde(default)]
    dark_mode: bool,
}

/// File-backed persistence: one small TOML file in the config directory.
#[derive(Debug)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_state(&self) -> UiState {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }
}

impl Persistence for FilePersistence {
    fn load_dark_mode(&self) -> bool {
        self.read_state().dark_mode
    }

    fn store_dark_mode(&self, dark: bool) {
        let state = UiState { dark_mode: dark };
        let Ok(content) = toml::to_string(&state) else {
            return;
        };
        if let Some(parent) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::warn!(error = %e, "failed to create state directory");
            return;
        }
        if let Err(e) = std::fs::write(&self.path, content) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to persist theme flag");
        }
    }
}

/// In-memory substitute for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    dark: Mutex<bool>,
}

impl Persistence for MemoryPersistence {
    fn load_dark_mode(&self) -> bool {
        *self.dark.lock().unwrap()
    }

    fn store_dark_mode(&self, dark: bool) {
        *self.dark.lock().unwrap() = dark;
    }
}
