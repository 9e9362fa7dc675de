pub mod actions;
pub mod key;
pub mod keybindings;
pub mod loader;
pub mod resolver;

use std::path::PathBuf;

pub use actions::*;
use keybindings::KeybindingsConfig;
pub use loader::load;
pub use resolver::KeyResolver;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Catppuccin Mocha".to_string(),
        }
    }
}

/// Where the stacks come from at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON seed for the in-memory store: stacks, optionally with win history.
    pub seed_file: Option<PathBuf>,
    /// Start with the enabled-only filter on.
    pub enabled_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}
