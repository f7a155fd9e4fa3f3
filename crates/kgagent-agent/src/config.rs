//! Agent configuration
//!
//! All episode limits in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use crate::memory::SummaryPolicy;
use kgagent_core::{Error, Result};
use kgagent_tools::{create_default_toolbox, create_policy_toolbox, Toolbox, DEFAULT_DEPTH_CAP};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Hard bound on steps per episode, rejected steps included.
    pub max_steps: usize,
    /// Consecutive rejected decisions before the episode is aborted.
    pub max_invalid_decisions: usize,
    /// Wall-clock limit per episode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_timeout_ms: Option<u64>,
    /// Prompt rendering of memory.
    pub summary: SummaryPolicy,
    /// Builtin tool parameters.
    pub tools: ToolsConfig,
    /// Which builtin tools are available.
    pub toolbox: ToolboxConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Largest `depth` accepted by get_neighbors.
    pub neighbor_depth_cap: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolboxConfig {
    /// Absent means every builtin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_invalid_decisions: 3,
            episode_timeout_ms: None,
            summary: SummaryPolicy::default(),
            tools: ToolsConfig::default(),
            toolbox: ToolboxConfig::default(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            neighbor_depth_cap: DEFAULT_DEPTH_CAP,
        }
    }
}

impl AgentConfig {
    /// Load from a TOML file, or use defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Strict parse: bad TOML or out-of-range limits are errors.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::Config("max_steps must be at least 1".into()));
        }
        if self.max_invalid_decisions == 0 {
            return Err(Error::Config("max_invalid_decisions must be at least 1".into()));
        }
        if self.tools.neighbor_depth_cap == 0 {
            return Err(Error::Config("tools.neighbor_depth_cap must be at least 1".into()));
        }
        if self.episode_timeout_ms == Some(0) {
            return Err(Error::Config("episode_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn episode_timeout(&self) -> Option<Duration> {
        self.episode_timeout_ms.map(Duration::from_millis)
    }

    /// Toolbox selected by `[toolbox] tools`.
    pub fn build_toolbox(&self) -> Result<Toolbox> {
        match &self.toolbox.tools {
            Some(names) => create_policy_toolbox(names.as_slice(), self.tools.neighbor_depth_cap),
            None => create_default_toolbox(self.tools.neighbor_depth_cap),
        }
    }
}
