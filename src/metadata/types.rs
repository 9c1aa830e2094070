//! Metadata types for channels resolved over the network

use crate::chat::ChannelId;
use serde::{Deserialize, Serialize};

/// Display name given to channels that could not be resolved
pub const ERROR_DISPLAY_NAME: &str = "<Error>";

/// Display metadata for a channel that is not listed statically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedChannel {
    /// Channel identifier (e.g., "group-42")
    pub identifier: ChannelId,

    /// Human-readable channel name
    pub display_name: String,

    /// Icon URL (optional)
    pub icon_ref: Option<String>,

    /// Banner URL (optional)
    pub banner_ref: Option<String>,

    /// Set only on values built by [`ResolvedChannel::placeholder`]
    #[serde(skip)]
    placeholder: bool,
}

impl ResolvedChannel {
    pub fn new(identifier: ChannelId, display_name: impl Into<String>) -> Self {
        Self {
            identifier,
            display_name: display_name.into(),
            icon_ref: None,
            banner_ref: None,
            placeholder: false,
        }
    }

    /// Placeholder handed out when a channel cannot be resolved
    pub fn placeholder(identifier: ChannelId) -> Self {
        Self {
            placeholder: true,
            ..Self::new(identifier, ERROR_DISPLAY_NAME)
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon_ref = Some(icon.into());
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner_ref = Some(banner.into());
        self
    }
}
