//! Channel metadata resolution
//!
//! Channels missing from the static registry (for example a group the user
//! navigated to by URL) are resolved through the metadata API.
//!
//! Key features:
//! - Request coalescing: one fetch per identifier, however many callers
//! - Permanent cache: a resolved identifier is never fetched again
//! - Graceful degradation: unknown shapes and failed fetches yield `"<Error>"`

mod cache;
mod types;

pub use cache::{CacheStats, ChannelResolver, Resolution, Subscription};
pub use types::{ERROR_DISPLAY_NAME, ResolvedChannel};
