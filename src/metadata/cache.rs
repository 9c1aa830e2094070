//! Channel metadata resolver with request coalescing
//!
//! Each identifier goes absent -> pending -> resolved. Resolved entries are
//! permanent for the lifetime of the resolver. While an identifier is pending,
//! every caller attaches to the same shared future, so a channel is fetched at
//! most once at a time no matter how many views ask for it.

use crate::api::GroupMetadataFetcher;
use crate::chat::{ChannelId, ChannelKind};
use crate::error::SidebarError;
use crate::logging::{ErrorReporter, Timer, TracingReporter};
use crate::metadata::types::ResolvedChannel;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{self, BoxFuture, Shared};
use std::future::IntoFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

type SharedResolution = Shared<BoxFuture<'static, ResolvedChannel>>;

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub fetches: u64,
    pub coalesced: u64,
    pub placeholders: u64,
    pub fetch_errors: u64,
}

/// Clears a pending entry when the fetch task ends, including by panic
struct PendingSlot {
    pending: Arc<DashMap<ChannelId, SharedResolution>>,
    channel: ChannelId,
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pending.remove(&self.channel);
    }
}

#[derive(Debug, Default)]
struct StatsCounters {
    hits: AtomicU64,
    fetches: AtomicU64,
    coalesced: AtomicU64,
    placeholders: AtomicU64,
    fetch_errors: AtomicU64,
}

impl StatsCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            placeholders: self.placeholders.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
        }
    }
}

/// Outcome of a [`ChannelResolver::resolve`] call
///
/// `Ready` values are available without suspending. `Pending` values are
/// shared with every other caller waiting on the same identifier. Await the
/// resolution (it implements [`IntoFuture`]) to get the metadata.
#[derive(Clone)]
pub enum Resolution {
    Ready(ResolvedChannel),
    Pending(SharedResolution),
}

impl Resolution {
    /// The value, if already settled
    pub fn peek(&self) -> Option<&ResolvedChannel> {
        match self {
            Self::Ready(info) => Some(info),
            Self::Pending(shared) => shared.peek(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.peek().is_some()
    }
}

impl IntoFuture for Resolution {
    type Output = ResolvedChannel;
    type IntoFuture = BoxFuture<'static, ResolvedChannel>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Self::Ready(info) => future::ready(info).boxed(),
            Self::Pending(shared) => shared.boxed(),
        }
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(info) => f.debug_tuple("Ready").field(info).finish(),
            Self::Pending(shared) => f.debug_tuple("Pending").field(&shared.peek()).finish(),
        }
    }
}

/// A caller's registered interest in an identifier
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// withdraws the interest. The underlying fetch is never cancelled; it still
/// fills the cache for later callers.
pub struct Subscription {
    channel: ChannelId,
    resolution: Resolution,
    interest: Arc<DashMap<ChannelId, usize>>,
}

impl Subscription {
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn peek(&self) -> Option<&ResolvedChannel> {
        self.resolution.peek()
    }

    /// Wait for the metadata
    pub async fn resolved(&self) -> ResolvedChannel {
        self.resolution.clone().await
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Entry::Occupied(mut entry) = self.interest.entry(self.channel.clone()) {
            *entry.get_mut() -= 1;
            if *entry.get() == 0 {
                entry.remove();
            }
        }
    }
}

/// Resolver for channel display metadata
///
/// Built once at startup and shared through an `Arc`. The maps are private;
/// only the resolver and its fetch tasks mutate them.
pub struct ChannelResolver {
    fetcher: Arc<dyn GroupMetadataFetcher>,
    reporter: Arc<dyn ErrorReporter>,

    /// Permanent mapping, first value wins
    resolved: Arc<DashMap<ChannelId, ResolvedChannel>>,

    /// In-flight resolutions, at most one per identifier
    pending: Arc<DashMap<ChannelId, SharedResolution>>,

    /// Live subscription count per identifier
    interest: Arc<DashMap<ChannelId, usize>>,

    stats: Arc<StatsCounters>,
}

impl ChannelResolver {
    /// Create a resolver that reports fetch failures through tracing
    pub fn new(fetcher: Arc<dyn GroupMetadataFetcher>) -> Self {
        Self::with_reporter(fetcher, Arc::new(TracingReporter))
    }

    pub fn with_reporter(
        fetcher: Arc<dyn GroupMetadataFetcher>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        tracing::info!("Creating channel resolver");

        Self {
            fetcher,
            reporter,
            resolved: Arc::new(DashMap::new()),
            pending: Arc::new(DashMap::new()),
            interest: Arc::new(DashMap::new()),
            stats: Arc::new(StatsCounters::default()),
        }
    }

    /// Resolve display metadata for a channel
    ///
    /// Cached channels come back as [`Resolution::Ready`]. A `group-<id>`
    /// channel that is not cached is fetched once; concurrent callers share
    /// that fetch. Any other identifier gets the `"<Error>"` placeholder
    /// without touching the network. Failures never reach the caller: a
    /// failed fetch is reported and settles to the placeholder.
    ///
    /// Fetches are spawned onto the current Tokio runtime.
    pub fn resolve(&self, channel: &ChannelId) -> Resolution {
        if let Some(info) = self.resolved.get(channel) {
            StatsCounters::bump(&self.stats.hits);
            tracing::trace!(channel = %channel, "Channel cache hit");
            return Resolution::Ready(info.value().clone());
        }

        let ChannelKind::Group(group_id) = channel.kind() else {
            StatsCounters::bump(&self.stats.placeholders);
            tracing::debug!(channel = %channel, "No resolver for channel shape");
            return Resolution::Ready(ResolvedChannel::placeholder(channel.clone()));
        };

        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                let err = SidebarError::Internal(format!("no async runtime: {}", e));
                self.reporter.report("resolve_channel", &err);
                return Resolution::Ready(ResolvedChannel::placeholder(channel.clone()));
            }
        };

        let (tx, rx) = oneshot::channel();
        let shared = match self.pending.entry(channel.clone()) {
            Entry::Occupied(entry) => {
                StatsCounters::bump(&self.stats.coalesced);
                tracing::debug!(channel = %channel, "Joining in-flight resolution");
                return Resolution::Pending(entry.get().clone());
            }
            Entry::Vacant(entry) => {
                // A fetch may have settled between the first lookup and taking the entry
                if let Some(info) = self.resolved.get(channel) {
                    StatsCounters::bump(&self.stats.hits);
                    return Resolution::Ready(info.value().clone());
                }

                let key = channel.clone();
                let shared = rx
                    .map(move |result| {
                        result.unwrap_or_else(|_| ResolvedChannel::placeholder(key))
                    })
                    .boxed()
                    .shared();
                entry.insert(shared.clone());
                shared
            }
        };

        self.spawn_fetch(&runtime, channel.clone(), group_id, tx);
        Resolution::Pending(shared)
    }

    /// Resolve and register interest in the result
    pub fn subscribe(&self, channel: &ChannelId) -> Subscription {
        *self.interest.entry(channel.clone()).or_insert(0) += 1;

        Subscription {
            channel: channel.clone(),
            resolution: self.resolve(channel),
            interest: self.interest.clone(),
        }
    }

    fn spawn_fetch(
        &self,
        runtime: &Handle,
        channel: ChannelId,
        group_id: u64,
        tx: oneshot::Sender<ResolvedChannel>,
    ) {
        StatsCounters::bump(&self.stats.fetches);
        tracing::debug!(channel = %channel, group_id, "Channel cache miss, fetching metadata");

        let fetcher = self.fetcher.clone();
        let reporter = self.reporter.clone();
        let resolved = self.resolved.clone();
        let interest = self.interest.clone();
        let stats = self.stats.clone();
        let slot = PendingSlot {
            pending: self.pending.clone(),
            channel: channel.clone(),
        };

        runtime.spawn(async move {
            let _timer = Timer::new(format!("resolve_channel {}", channel));

            let info = match fetcher.fetch_group(group_id).await {
                Ok(mut info) => {
                    info.identifier = channel.clone();
                    let info = resolved
                        .entry(channel.clone())
                        .or_insert(info)
                        .value()
                        .clone();
                    tracing::info!(
                        channel = %channel,
                        name = %info.display_name,
                        "Fetched and cached channel metadata"
                    );
                    info
                }
                Err(e) => {
                    StatsCounters::bump(&stats.fetch_errors);
                    reporter.report("resolve_channel", &e);
                    ResolvedChannel::placeholder(channel.clone())
                }
            };

            // Must follow the insert above so a racing `resolve` sees the cached value
            drop(slot);

            if !interest.contains_key(&channel) {
                tracing::debug!(
                    channel = %channel,
                    "Resolution settled with no remaining subscribers"
                );
            }

            // Receivers may all be gone; the cache is already filled
            let _ = tx.send(info);
        });
    }

    /// Cached metadata, without triggering a fetch
    pub fn cached(&self, channel: &ChannelId) -> Option<ResolvedChannel> {
        self.resolved.get(channel).map(|info| info.value().clone())
    }

    pub fn is_pending(&self, channel: &ChannelId) -> bool {
        self.pending.contains_key(channel)
    }

    /// Number of live subscriptions for a channel
    pub fn interest(&self, channel: &ChannelId) -> usize {
        self.interest.get(channel).map(|n| *n).unwrap_or(0)
    }

    /// Current (resolved, pending) table sizes
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.resolved.len(), self.pending.len())
    }

    pub fn get_stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Log cache statistics (for periodic monitoring)
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        let (resolved, pending) = self.cache_sizes();

        let lookups = stats.hits + stats.fetches + stats.coalesced;
        let hit_rate = if lookups > 0 {
            ((stats.hits + stats.coalesced) as f32 / lookups as f32 * 100.0) as u32
        } else {
            0
        };

        tracing::info!(
            resolved = resolved,
            pending = pending,
            hit_rate = hit_rate,
            fetches = stats.fetches,
            coalesced = stats.coalesced,
            placeholders = stats.placeholders,
            fetch_errors = stats.fetch_errors,
            "Channel resolver statistics"
        );
    }
}
