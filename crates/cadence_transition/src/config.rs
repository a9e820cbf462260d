// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! Configuration is plain data in RON format. The library never reads a file
//! on its own; hosts call [`EngineConfig::load`] if they want one.

use crate::dispatch::DispatchPriority;
use crate::effect::TransitionEffect;
use crate::error::Result;
use cadence_interp::Ease;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default name of the home thread spawned by hosts
pub const DEFAULT_HOME_THREAD_NAME: &str = "cadence-home";

/// Engine-wide defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame rate of new effects
    pub default_fps: u32,
    /// Upper bound applied to every effect's frame rate
    pub max_fps: u32,
    /// Dispatch priority of new effects
    pub default_priority: DispatchPriority,
    /// Easing curve of new effects
    pub default_ease: Ease,
    /// Name given to the home thread by hosts that spawn one
    pub home_thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_fps: 60,
            max_fps: 240,
            default_priority: DispatchPriority::Render,
            default_ease: Ease::Linear,
            home_thread_name: DEFAULT_HOME_THREAD_NAME.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Clamp a frame rate into `1..=max_fps`
    pub fn clamp_fps(&self, fps: u32) -> u32 {
        fps.clamp(1, self.max_fps.max(1))
    }

    /// Effect template carrying the configured defaults
    pub fn effect(&self) -> TransitionEffect {
        TransitionEffect::new()
            .with_fps(self.clamp_fps(self.default_fps))
            .with_priority(self.default_priority)
            .with_ease(Arc::new(self.default_ease))
    }
}
