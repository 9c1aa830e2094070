//! Static lists of channels known without a metadata lookup

use crate::chat::ChannelId;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupChannel {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl GroupChannel {
    pub fn channel_id(&self) -> ChannelId {
        ChannelId::group(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TournamentChannel {
    pub id: u64,
    pub name: String,
}

impl TournamentChannel {
    pub fn channel_id(&self) -> ChannelId {
        ChannelId::tournament(self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalChannel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl GlobalChannel {
    pub fn channel_id(&self) -> ChannelId {
        ChannelId::new(self.id.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelRegistry {
    #[serde(default)]
    pub groups: Vec<GroupChannel>,
    #[serde(default)]
    pub tournaments: Vec<TournamentChannel>,
    #[serde(default)]
    pub globals: Vec<GlobalChannel>,
}

impl ChannelRegistry {
    /// Load a registry from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let registry: Self = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            groups = registry.groups.len(),
            tournaments = registry.tournaments.len(),
            globals = registry.globals.len(),
            "Loaded channel registry"
        );
        Ok(registry)
    }

    /// Whether the channel is listed statically and needs no resolution
    ///
    /// Identifiers are matched verbatim, so `group-007` is not `group-7`.
    pub fn is_known(&self, channel: &ChannelId) -> bool {
        self.groups.iter().any(|g| g.channel_id() == *channel)
            || self.tournaments.iter().any(|t| t.channel_id() == *channel)
            || self.globals.iter().any(|g| g.id == channel.as_str())
    }
}
