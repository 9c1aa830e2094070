pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod sidebar;
pub mod storage;

pub use error::{Result, SidebarError};
