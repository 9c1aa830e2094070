use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn group(id: u64) -> Self {
        Self(format!("group-{}", id))
    }

    pub fn tournament(id: u64) -> Self {
        Self(format!("tournament-{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ChannelKind {
        ChannelKind::of(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Channel family, derived from the identifier prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Group(u64),
    Tournament(u64),
    /// `global-*` channels and the moderation channel `shadowban`
    Global,
    Other,
}

impl ChannelKind {
    pub fn of(id: &str) -> Self {
        if let Some(rest) = id.strip_prefix("group-") {
            if let Some(n) = parse_numeric(rest) {
                return Self::Group(n);
            }
        } else if let Some(rest) = id.strip_prefix("tournament-") {
            if let Some(n) = parse_numeric(rest) {
                return Self::Tournament(n);
            }
        } else if id.starts_with("global-") || id == "shadowban" {
            return Self::Global;
        }
        Self::Other
    }
}

// Digits only: `u64::from_str` would also accept a leading `+`
fn parse_numeric(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
