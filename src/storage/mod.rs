mod joined;

pub use joined::JoinedChannels;
