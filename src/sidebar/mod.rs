//! Chat channel sidebar model
//!
//! Framework-agnostic state behind the channel list: which rows to show, the
//! "more channels" expander, per-row unread indicators and click handling.

mod list;
mod navigation;
mod row;

pub use list::{ChannelList, JOINING_PLACEHOLDER};
pub use navigation::{chat_path, slugify};
pub use row::{ChannelIcon, ChannelIndicator, ChannelRow};
