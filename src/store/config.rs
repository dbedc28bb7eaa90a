use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Result;
use crate::cards::models::OwnerId;

/// Engine configuration, read from `config.toml` in the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrsConfig {
    /// Owner id used when no identity layer supplies one
    pub owner: String,
    /// Cap on how many due contexts a single session takes on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_session_size: Option<usize>,
    /// How grading writes reach storage
    pub write_policy: WritePolicy,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            owner: "local".to_string(),
            max_session_size: None,
            write_policy: WritePolicy::default(),
        }
    }
}

impl SrsConfig {
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load the config file, falling back to defaults when it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: SrsConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.owner.clone())
    }
}

/// When scheduling writes are handed to the underlying store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum WritePolicy {
    /// Every grade is written through before the call returns
    #[default]
    Immediate,
    /// Grades are coalesced and flushed in batches
    Buffered {
        /// Flush once this many contexts have pending writes
        max_pending: usize,
        /// Flush once the oldest pending write is this old, checked when
        /// the next write arrives
        max_delay_secs: u64,
    },
}

impl WritePolicy {
    pub fn max_delay(&self) -> Option<Duration> {
        match self {
            Self::Immediate => None,
            Self::Buffered { max_delay_secs, .. } => Some(Duration::from_secs(*max_delay_secs)),
        }
    }
}
