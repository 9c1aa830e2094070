use crate::chat::{ChannelActivity, ChannelId, ChannelSession, ChatSessions};
use std::sync::Arc;
use tokio::sync::watch;

/// Icon shown next to a channel name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelIcon {
    Trophy,
    Flag {
        country: Option<String>,
        language: Option<String>,
        user_country: String,
    },
    Image(Option<String>),
    None,
}

impl ChannelIcon {
    pub fn for_channel(
        channel: &ChannelId,
        icon: Option<String>,
        country: Option<String>,
        language: Option<String>,
        user_country: &str,
    ) -> Self {
        let id = channel.as_str();
        if id.starts_with("tournament") {
            Self::Trophy
        } else if id.starts_with("global") || id == "shadowban" {
            Self::Flag {
                country,
                language,
                user_country: user_country.to_string(),
            }
        } else if id.starts_with("group") {
            Self::Image(icon)
        } else {
            Self::None
        }
    }
}

/// One entry of the channel sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRow {
    pub channel: ChannelId,
    pub name: String,
    pub icon: ChannelIcon,
    pub active: bool,
    pub joined: bool,
}

/// Live unread state for a row
///
/// Joined rows hold a chat session for as long as the indicator lives and
/// part it on drop. The active row is kept marked as read.
pub struct ChannelIndicator {
    row: ChannelRow,
    session: Option<Arc<dyn ChannelSession>>,
    updates: Option<watch::Receiver<ChannelActivity>>,
    activity: ChannelActivity,
}

impl ChannelIndicator {
    pub fn attach(row: ChannelRow, sessions: &dyn ChatSessions) -> Self {
        let session = row.joined.then(|| sessions.join(&row.channel));
        let updates = session.as_ref().map(|s| s.watch());

        let mut indicator = Self {
            row,
            session,
            updates,
            activity: ChannelActivity::default(),
        };
        indicator.sync();
        indicator
    }

    pub fn row(&self) -> &ChannelRow {
        &self.row
    }

    pub fn unread_count(&self) -> u32 {
        self.activity.unread_count
    }

    pub fn mentioned(&self) -> bool {
        self.activity.mentioned
    }

    pub fn set_active(&mut self, active: bool) {
        self.row.active = active;
        self.sync();
    }

    /// Pull the latest activity from the session
    pub fn sync(&mut self) {
        let (Some(session), Some(updates)) = (&self.session, &mut self.updates) else {
            return;
        };

        // The watch guard must be released before the session writes to it
        let has_activity = *updates.borrow() != ChannelActivity::default();
        if self.row.active && has_activity {
            session.mark_as_read();
        }
        self.activity = *updates.borrow_and_update();
    }

    /// Wait for the next chat or chat-removed event and sync
    ///
    /// Returns false when the row has no session or the session is gone.
    pub async fn next_change(&mut self) -> bool {
        let Some(updates) = self.updates.as_mut() else {
            return false;
        };
        if updates.changed().await.is_err() {
            return false;
        }
        self.sync();
        true
    }

    /// Unread badge text, e.g. `(3)`
    pub fn unread_badge(&self) -> Option<String> {
        (self.activity.unread_count > 0).then(|| format!("({})", self.activity.unread_count))
    }

    pub fn class_names(&self) -> String {
        let mut cls = String::from("channel");
        if self.row.active {
            cls.push_str(" active");
        }
        if self.activity.mentioned {
            cls.push_str(" mentioned");
        }
        if self.activity.unread_count > 0 {
            cls.push_str(" unread");
        }
        cls.push_str(if self.row.joined { " joined" } else { " unjoined" });
        cls
    }
}

impl Drop for ChannelIndicator {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.part();
        }
    }
}
