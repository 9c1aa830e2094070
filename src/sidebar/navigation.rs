use crate::chat::ChannelId;
use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// URL-friendly form of a channel name
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_SLUG
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Route for a chat channel: `/chat/{channel}/{slug}`, or `/chat/{channel}`
/// when the name gives no slug
pub fn chat_path(channel: &ChannelId, name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("/chat/{}", channel)
    } else {
        format!("/chat/{}/{}", channel, slug)
    }
}
