mod registry;
mod session;
mod types;

pub use registry::{ChannelRegistry, GlobalChannel, GroupChannel, TournamentChannel};
pub use session::{ChannelActivity, ChannelSession, ChatSessions, LocalChatHub};
pub use types::{ChannelId, ChannelKind};
