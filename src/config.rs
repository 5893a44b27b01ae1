//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/lineage/config.toml` (XDG) or platform config dir
//! 3. Project config: `.lineage.toml`
//! 4. Environment variables: `LINEAGE_*`, nested keys separated by `__`
//!    (`LINEAGE_GRAPH__LAYOUT_ANIMATION_MS=500`)
//!
//! # Example
//!
//! ```toml
//! [hierarchy]
//! count = 30
//! degree = 3
//! seed = 42
//!
//! [graph]
//! selector = "#graphComponent"
//! layout_animation_ms = 200
//! node_width = 40.0
//! node_height = 40.0
//!
//! [bridge]
//! socket = "/tmp/lineage-engine.sock"
//! ```

use std::ops::Deref;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::engine::Rect;
use crate::models::{DEFAULT_COUNT, DEFAULT_DEGREE};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Parameters of the random hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Number of people to generate.
    pub count: usize,
    /// Maximum links per person, clamped to 1..=7.
    pub degree: usize,
    /// Fixed RNG seed for reproducible hierarchies.
    pub seed: Option<u64>,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            degree: DEFAULT_DEGREE,
            seed: None,
        }
    }
}

/// How the hierarchy is drawn on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Selector of the element hosting the graph.
    pub selector: String,
    /// Duration of the animated layout transition.
    pub layout_animation_ms: u64,
    pub node_width: Option<f64>,
    pub node_height: Option<f64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            selector: "#graphComponent".to_string(),
            layout_animation_ms: 200,
            node_width: None,
            node_height: None,
        }
    }
}

impl GraphConfig {
    pub fn layout_animation(&self) -> Duration {
        Duration::from_millis(self.layout_animation_ms)
    }

    /// Bounds for new nodes. Only set when both sizes are configured; the
    /// layout pass moves nodes afterwards anyway.
    pub fn node_rect(&self) -> Option<Rect> {
        match (self.node_width, self.node_height) {
            (Some(width), Some(height)) => Some(Rect::new(0.0, 0.0, width, height)),
            _ => None,
        }
    }
}

/// Where the engine runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Unix socket of an engine runtime. Without it an in-process headless
    /// engine is used.
    pub socket: Option<PathBuf>,
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered figment behind [`Config::load`].
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(Self::user_config_path()))
            .merge(Toml::file(".lineage.toml"))
            .merge(Env::prefixed("LINEAGE_").split("__"))
    }

    /// User config path: ~/.config/lineage/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("lineage").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("lineage").join("config.toml"))
            .unwrap_or_default()
    }
}
