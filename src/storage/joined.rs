use crate::chat::ChannelId;
use crate::error::Result;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Persistent set of channels the user has joined
///
/// Stored as `{ "<channel>": "<joined at>" }` JSON at
/// `~/.channel_sidebar/joined.json`.
pub struct JoinedChannels {
    path: PathBuf,
    channels: DashMap<ChannelId, DateTime<Utc>>,
    write_lock: Mutex<()>,
}

impl JoinedChannels {
    /// Empty store backed by `path`; nothing is written until the first change
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            channels: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the store from disk; a missing file is an empty store
    pub async fn load(path: PathBuf) -> Result<Self> {
        let store = Self::new(path);

        match fs::read_to_string(&store.path).await {
            Ok(content) => {
                let saved: BTreeMap<ChannelId, DateTime<Utc>> = serde_json::from_str(&content)?;
                for (channel, joined_at) in saved {
                    store.channels.insert(channel, joined_at);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %store.path.display(), "No joined channel file yet");
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            path = %store.path.display(),
            joined = store.channels.len(),
            "Loaded joined channels"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn joined_at(&self, channel: &ChannelId) -> Option<DateTime<Utc>> {
        self.channels.get(channel).map(|t| *t)
    }

    /// Joined channels in identifier order
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<_> = self.channels.iter().map(|e| e.key().clone()).collect();
        channels.sort();
        channels
    }

    /// Mark a channel as joined and persist; returns false if it already was
    ///
    /// The in-memory set only changes once the file has been written.
    pub async fn join(&self, channel: &ChannelId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if self.contains(channel) {
            return Ok(false);
        }

        let joined_at = Utc::now();
        let mut snapshot = self.snapshot();
        snapshot.insert(channel.clone(), joined_at);
        self.persist(&snapshot).await?;

        self.channels.insert(channel.clone(), joined_at);
        tracing::info!(channel = %channel, "Joined channel");
        Ok(true)
    }

    /// Forget a channel and persist; returns false if it was not joined
    pub async fn leave(&self, channel: &ChannelId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        if !self.contains(channel) {
            return Ok(false);
        }

        let mut snapshot = self.snapshot();
        snapshot.remove(channel);
        self.persist(&snapshot).await?;

        self.channels.remove(channel);
        tracing::info!(channel = %channel, "Left channel");
        Ok(true)
    }

    fn snapshot(&self) -> BTreeMap<ChannelId, DateTime<Utc>> {
        self.channels
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }

    // Callers hold `write_lock`
    async fn persist(&self, snapshot: &BTreeMap<ChannelId, DateTime<Utc>>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(snapshot)?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JoinedChannels::load(dir.path().join("joined.json"))
            .await
            .unwrap();
        assert!(store.channels().is_empty());
    }

    #[tokio::test]
    async fn test_join_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("joined.json");

        let store = JoinedChannels::load(path.clone()).await.unwrap();
        assert!(store.join(&ChannelId::group(12)).await.unwrap());
        assert!(!store.join(&ChannelId::group(12)).await.unwrap());
        assert!(store.join(&ChannelId::new("global-english")).await.unwrap());

        let reloaded = JoinedChannels::load(path).await.unwrap();
        assert_eq!(
            reloaded.channels(),
            vec![ChannelId::new("global-english"), ChannelId::group(12)]
        );
        assert_eq!(
            reloaded.joined_at(&ChannelId::group(12)),
            store.joined_at(&ChannelId::group(12))
        );
    }

    #[tokio::test]
    async fn test_leave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joined.json");
        let store = JoinedChannels::load(path.clone()).await.unwrap();

        store.join(&ChannelId::tournament(3)).await.unwrap();
        assert!(store.leave(&ChannelId::tournament(3)).await.unwrap());
        assert!(!store.leave(&ChannelId::tournament(3)).await.unwrap());

        let reloaded = JoinedChannels::load(path).await.unwrap();
        assert!(!reloaded.contains(&ChannelId::tournament(3)));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_membership_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, "not a directory").await.unwrap();

        let store = JoinedChannels::new(blocker.join("joined.json"));
        let channel = ChannelId::group(12);

        assert!(store.join(&channel).await.is_err());
        assert!(!store.contains(&channel));
        // A retry must attempt the write again rather than report "already joined"
        assert!(store.join(&channel).await.is_err());
        assert!(store.channels().is_empty());
    }

    #[tokio::test]
    async fn test_failed_leave_keeps_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joined.json");
        let store = JoinedChannels::load(path.clone()).await.unwrap();
        let channel = ChannelId::tournament(3);
        store.join(&channel).await.unwrap();

        // Replace the file with a directory so the next write fails
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        assert!(store.leave(&channel).await.is_err());
        assert!(store.contains(&channel));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("joined.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = JoinedChannels::load(path).await.err().unwrap();
        assert!(matches!(err, crate::error::SidebarError::Serde(_)));
    }
}
