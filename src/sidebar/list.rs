use crate::chat::{ChannelId, ChannelRegistry};
use crate::error::Result;
use crate::metadata::{ChannelResolver, ResolvedChannel, Subscription};
use crate::sidebar::navigation::chat_path;
use crate::sidebar::row::{ChannelIcon, ChannelRow};
use crate::storage::JoinedChannels;
use std::sync::Arc;

/// Name shown for the current channel until its metadata arrives
pub const JOINING_PLACEHOLDER: &str = "Joining...";

/// Sidebar of joined channels plus the searchable "more channels" expander
pub struct ChannelList {
    current: ChannelId,
    registry: Arc<ChannelRegistry>,
    joined: Arc<JoinedChannels>,
    resolver: Arc<ChannelResolver>,
    user_country: String,
    expanded: bool,
    search: String,
    subscription: Option<Subscription>,
}

impl ChannelList {
    pub fn new(
        current: ChannelId,
        registry: Arc<ChannelRegistry>,
        joined: Arc<JoinedChannels>,
        resolver: Arc<ChannelResolver>,
        user_country: impl Into<String>,
    ) -> Self {
        let mut list = Self {
            current: current.clone(),
            registry,
            joined,
            resolver,
            user_country: user_country.into(),
            expanded: false,
            search: String::new(),
            subscription: None,
        };
        list.set_channel(current);
        list
    }

    pub fn current(&self) -> &ChannelId {
        &self.current
    }

    /// Switch to another channel, resetting the expander and any resolution
    /// still in flight for the previous one
    pub fn set_channel(&mut self, channel: ChannelId) {
        self.expanded = false;
        self.search.clear();
        self.subscription = None;

        if !self.registry.is_known(&channel) {
            tracing::debug!(channel = %channel, "Channel not in registry, resolving");
            self.subscription = Some(self.resolver.subscribe(&channel));
        }
        self.current = channel;
    }

    /// Whether the current channel needs network resolution
    pub fn uses_resolved_channel(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn resolved_channel(&self) -> Option<&ResolvedChannel> {
        self.subscription.as_ref().and_then(|s| s.peek())
    }

    /// Wait until the current channel's metadata is available
    pub async fn wait_resolved(&self) -> Option<ResolvedChannel> {
        match &self.subscription {
            Some(subscription) => Some(subscription.resolved().await),
            None => None,
        }
    }

    pub fn expand(&mut self) {
        self.expanded = true;
    }

    pub fn collapse(&mut self) {
        self.expanded = false;
        self.search.clear();
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    fn matches_search(&self, name: &str) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty() || name.to_lowercase().contains(&needle)
    }

    /// Rows for the current (resolved) channel and every joined channel
    pub fn joined_rows(&self) -> Vec<ChannelRow> {
        let mut rows = Vec::new();

        if self.uses_resolved_channel() {
            let resolved = self.resolved_channel();
            rows.push(ChannelRow {
                channel: self.current.clone(),
                name: resolved
                    .map(|r| r.display_name.clone())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| JOINING_PLACEHOLDER.to_string()),
                icon: ChannelIcon::for_channel(
                    &self.current,
                    resolved.and_then(|r| r.icon_ref.clone()),
                    None,
                    None,
                    &self.user_country,
                ),
                active: true,
                joined: true,
            });
        }

        rows.extend(self.rows(true, |_| true));
        rows
    }

    /// Registry channels not yet joined, filtered by the search text
    ///
    /// Empty while the expander is collapsed.
    pub fn more_rows(&self) -> Vec<ChannelRow> {
        if !self.expanded {
            return Vec::new();
        }
        self.rows(false, |name| self.matches_search(name))
    }

    fn rows(&self, joined: bool, filter: impl Fn(&str) -> bool) -> Vec<ChannelRow> {
        let include = |channel: &ChannelId, name: &str| {
            self.joined.contains(channel) == joined && filter(name)
        };
        let mut rows = Vec::new();

        for group in &self.registry.groups {
            let channel = group.channel_id();
            if include(&channel, &group.name) {
                rows.push(self.row(channel, &group.name, group.icon.clone(), None, None, joined));
            }
        }

        for tournament in &self.registry.tournaments {
            let channel = tournament.channel_id();
            if include(&channel, &tournament.name) {
                rows.push(self.row(channel, &tournament.name, None, None, None, joined));
            }
        }

        for global in &self.registry.globals {
            let channel = global.channel_id();
            if include(&channel, &global.name) {
                rows.push(self.row(
                    channel,
                    &global.name,
                    None,
                    global.country.clone(),
                    global.language.clone(),
                    joined,
                ));
            }
        }

        rows
    }

    fn row(
        &self,
        channel: ChannelId,
        name: &str,
        icon: Option<String>,
        country: Option<String>,
        language: Option<String>,
        joined: bool,
    ) -> ChannelRow {
        ChannelRow {
            icon: ChannelIcon::for_channel(&channel, icon, country, language, &self.user_country),
            active: joined && channel == self.current,
            name: name.to_string(),
            channel,
            joined,
        }
    }

    /// Handle a click on a row: join it if needed and return the route to open
    pub async fn activate(&self, row: &ChannelRow) -> Result<String> {
        if !row.joined {
            self.joined.join(&row.channel).await?;
        }
        let path = chat_path(&row.channel, &row.name);
        tracing::debug!(channel = %row.channel, path = %path, "Navigating to channel");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GroupMetadataFetcher;
    use crate::chat::{GlobalChannel, GroupChannel, TournamentChannel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GroupMetadataFetcher for StubFetcher {
        async fn fetch_group(&self, group_id: u64) -> Result<ResolvedChannel> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ResolvedChannel::new(ChannelId::group(group_id), "Hidden Group").with_icon("h.png"))
        }
    }

    fn registry() -> Arc<ChannelRegistry> {
        Arc::new(ChannelRegistry {
            groups: vec![
                GroupChannel {
                    id: 1,
                    name: "Go Club".to_string(),
                    icon: Some("g1.png".to_string()),
                },
                GroupChannel {
                    id: 2,
                    name: "Dan Study".to_string(),
                    icon: None,
                },
            ],
            tournaments: vec![TournamentChannel {
                id: 10,
                name: "Spring Cup".to_string(),
            }],
            globals: vec![
                GlobalChannel {
                    id: "global-english".to_string(),
                    name: "English".to_string(),
                    language: Some("en".to_string()),
                    country: None,
                },
                GlobalChannel {
                    id: "global-deutsch".to_string(),
                    name: "Deutsch".to_string(),
                    language: Some("de".to_string()),
                    country: Some("de".to_string()),
                },
            ],
        })
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        joined: Arc<JoinedChannels>,
        resolver: Arc<ChannelResolver>,
        fetcher: Arc<StubFetcher>,
    }

    async fn fixture(joined: &[ChannelId]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JoinedChannels::new(dir.path().join("joined.json")));
        for channel in joined {
            store.join(channel).await.unwrap();
        }
        let fetcher = Arc::new(StubFetcher::default());
        Fixture {
            _dir: dir,
            joined: store,
            resolver: Arc::new(ChannelResolver::new(fetcher.clone())),
            fetcher,
        }
    }

    fn list(f: &Fixture, current: ChannelId) -> ChannelList {
        ChannelList::new(current, registry(), f.joined.clone(), f.resolver.clone(), "us")
    }

    fn names(rows: &[ChannelRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_joined_rows_in_registry_order() {
        let f = fixture(&[
            ChannelId::new("global-english"),
            ChannelId::tournament(10),
            ChannelId::group(2),
        ])
        .await;
        let list = list(&f, ChannelId::tournament(10));

        assert!(!list.uses_resolved_channel());
        let rows = list.joined_rows();
        assert_eq!(names(&rows), vec!["Dan Study", "Spring Cup", "English"]);
        assert!(rows.iter().all(|r| r.joined));
        assert_eq!(
            rows.iter().filter(|r| r.active).map(|r| &r.channel).collect::<Vec<_>>(),
            vec![&ChannelId::tournament(10)]
        );
        assert_eq!(rows[1].icon, ChannelIcon::Trophy);
        assert_eq!(f.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_channel_shows_joining_then_resolved_name() {
        let f = fixture(&[ChannelId::group(1)]).await;
        let list = list(&f, ChannelId::group(77));

        assert!(list.uses_resolved_channel());
        let rows = list.joined_rows();
        assert_eq!(names(&rows), vec![JOINING_PLACEHOLDER, "Go Club"]);
        assert!(rows[0].active && rows[0].joined);

        let resolved = list.wait_resolved().await.unwrap();
        assert_eq!(resolved.display_name, "Hidden Group");

        let rows = list.joined_rows();
        assert_eq!(names(&rows), vec!["Hidden Group", "Go Club"]);
        assert_eq!(rows[0].icon, ChannelIcon::Image(Some("h.png".to_string())));
        assert_eq!(f.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_two_lists_on_same_channel_fetch_once() {
        let f = fixture(&[]).await;
        let a = list(&f, ChannelId::group(55));
        let b = list(&f, ChannelId::group(55));
        assert_eq!(f.resolver.interest(&ChannelId::group(55)), 2);

        let (ra, rb) = tokio::join!(a.wait_resolved(), b.wait_resolved());
        assert_eq!(ra, rb);
        assert_eq!(f.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_current_channel_shows_error_marker() {
        let f = fixture(&[]).await;
        let list = list(&f, ChannelId::new("shadowban"));

        let rows = list.joined_rows();
        assert_eq!(names(&rows), vec!["<Error>"]);
        assert!(matches!(rows[0].icon, ChannelIcon::Flag { .. }));
        assert_eq!(f.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_padded_group_id_is_resolved_not_matched() {
        let f = fixture(&[ChannelId::group(1)]).await;
        let list = list(&f, ChannelId::new("group-001"));

        assert!(list.uses_resolved_channel());
        list.wait_resolved().await.unwrap();

        let rows = list.joined_rows();
        assert_eq!(names(&rows), vec!["Hidden Group", "Go Club"]);
        assert!(rows[0].active);
        assert!(!rows[1].active);
    }

    #[tokio::test]
    async fn test_set_channel_resets_expander_and_subscription() {
        let f = fixture(&[]).await;
        let mut list = list(&f, ChannelId::group(90));
        list.expand();
        list.set_search("go");
        assert_eq!(f.resolver.interest(&ChannelId::group(90)), 1);

        list.set_channel(ChannelId::new("global-english"));
        assert!(!list.is_expanded());
        assert_eq!(list.search(), "");
        assert!(!list.uses_resolved_channel());
        assert_eq!(f.resolver.interest(&ChannelId::group(90)), 0);
    }

    #[tokio::test]
    async fn test_more_rows_filters_unjoined_by_search() {
        let f = fixture(&[ChannelId::group(1)]).await;
        let mut list = list(&f, ChannelId::group(1));

        assert!(list.more_rows().is_empty());
        list.expand();
        assert_eq!(
            names(&list.more_rows()),
            vec!["Dan Study", "Spring Cup", "English", "Deutsch"]
        );

        list.set_search("  D ");
        let rows = list.more_rows();
        assert_eq!(names(&rows), vec!["Dan Study", "Deutsch"]);
        assert!(rows.iter().all(|r| !r.joined && !r.active));
        assert_eq!(
            rows[1].icon,
            ChannelIcon::Flag {
                country: Some("de".to_string()),
                language: Some("de".to_string()),
                user_country: "us".to_string()
            }
        );

        list.collapse();
        assert!(list.more_rows().is_empty());
    }

    #[tokio::test]
    async fn test_activate_joins_and_navigates() {
        let f = fixture(&[]).await;
        let mut list = list(&f, ChannelId::new("global-english"));
        list.expand();

        let row = list
            .more_rows()
            .into_iter()
            .find(|r| r.channel == ChannelId::group(1))
            .unwrap();
        let path = list.activate(&row).await.unwrap();

        assert_eq!(path, "/chat/group-1/go-club");
        assert!(f.joined.contains(&ChannelId::group(1)));
        assert!(
            !list
                .more_rows()
                .iter()
                .any(|r| r.channel == ChannelId::group(1))
        );
        assert_eq!(names(&list.joined_rows()), vec!["Go Club"]);
    }
}
