//! Chat session provider seam and an in-memory implementation

use crate::chat::ChannelId;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::watch;

/// Unread state of a joined channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelActivity {
    pub unread_count: u32,
    pub mentioned: bool,
}

/// Handle on a joined chat channel
pub trait ChannelSession: Send + Sync {
    fn channel(&self) -> &ChannelId;

    fn activity(&self) -> ChannelActivity;

    fn mark_as_read(&self);

    /// Receiver notified whenever messages arrive or are removed
    fn watch(&self) -> watch::Receiver<ChannelActivity>;

    /// Leave the channel; further calls are no-ops
    fn part(&self);
}

pub trait ChatSessions: Send + Sync {
    fn join(&self, channel: &ChannelId) -> Arc<dyn ChannelSession>;
}

struct ChannelState {
    activity: watch::Sender<ChannelActivity>,
    members: AtomicUsize,
}

impl ChannelState {
    fn new() -> Self {
        let (activity, _) = watch::channel(ChannelActivity::default());
        Self {
            activity,
            members: AtomicUsize::new(0),
        }
    }
}

/// In-process chat hub; channel state outlives individual sessions
#[derive(Default)]
pub struct LocalChatHub {
    channels: DashMap<ChannelId, Arc<ChannelState>>,
}

impl LocalChatHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, channel: &ChannelId) -> Arc<ChannelState> {
        self.channels
            .entry(channel.clone())
            .or_insert_with(|| Arc::new(ChannelState::new()))
            .clone()
    }

    /// Record a new chat message in the channel
    pub fn post(&self, channel: &ChannelId, mentions_me: bool) {
        self.state(channel).activity.send_modify(|a| {
            a.unread_count += 1;
            a.mentioned |= mentions_me;
        });
        tracing::trace!(channel = %channel, mentions_me, "Chat message posted");
    }

    /// Record the removal of an unread message
    pub fn remove(&self, channel: &ChannelId) {
        self.state(channel).activity.send_modify(|a| {
            a.unread_count = a.unread_count.saturating_sub(1);
        });
        tracing::trace!(channel = %channel, "Chat message removed");
    }

    /// Number of sessions currently joined to the channel
    pub fn members(&self, channel: &ChannelId) -> usize {
        self.channels
            .get(channel)
            .map(|s| s.members.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

impl ChatSessions for LocalChatHub {
    fn join(&self, channel: &ChannelId) -> Arc<dyn ChannelSession> {
        let state = self.state(channel);
        let members = state.members.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(channel = %channel, members, "Joined chat channel");

        Arc::new(LocalSession {
            channel: channel.clone(),
            state,
            parted: AtomicBool::new(false),
        })
    }
}

struct LocalSession {
    channel: ChannelId,
    state: Arc<ChannelState>,
    parted: AtomicBool,
}

impl ChannelSession for LocalSession {
    fn channel(&self) -> &ChannelId {
        &self.channel
    }

    fn activity(&self) -> ChannelActivity {
        *self.state.activity.borrow()
    }

    fn mark_as_read(&self) {
        self.state.activity.send_modify(|a| *a = ChannelActivity::default());
    }

    fn watch(&self) -> watch::Receiver<ChannelActivity> {
        self.state.activity.subscribe()
    }

    fn part(&self) {
        if !self.parted.swap(true, Ordering::SeqCst) {
            self.state.members.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!(channel = %self.channel, "Parted chat channel");
        }
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        self.part();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_and_mark_as_read() {
        let hub = LocalChatHub::new();
        let channel = ChannelId::new("global-english");
        let session = hub.join(&channel);

        hub.post(&channel, false);
        hub.post(&channel, true);
        assert_eq!(
            session.activity(),
            ChannelActivity {
                unread_count: 2,
                mentioned: true
            }
        );

        hub.remove(&channel);
        assert_eq!(session.activity().unread_count, 1);

        session.mark_as_read();
        assert_eq!(session.activity(), ChannelActivity::default());
    }

    #[test]
    fn test_part_is_idempotent() {
        let hub = LocalChatHub::new();
        let channel = ChannelId::group(4);
        let a = hub.join(&channel);
        let _b = hub.join(&channel);
        assert_eq!(hub.members(&channel), 2);

        a.part();
        a.part();
        assert_eq!(hub.members(&channel), 1);

        drop(a);
        assert_eq!(hub.members(&channel), 1);
    }

    #[tokio::test]
    async fn test_watch_notifies_on_post() {
        let hub = LocalChatHub::new();
        let channel = ChannelId::tournament(2);
        let session = hub.join(&channel);
        let mut rx = session.watch();

        hub.post(&channel, false);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().unread_count, 1);
    }
}
