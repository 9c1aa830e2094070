use channel_sidebar::api::TerminationApiClient;
use channel_sidebar::chat::{ChannelId, ChannelRegistry, LocalChatHub};
use channel_sidebar::config::load_settings;
use channel_sidebar::error::Result;
use channel_sidebar::metadata::ChannelResolver;
use channel_sidebar::sidebar::{ChannelIndicator, ChannelList};
use channel_sidebar::storage::JoinedChannels;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("channel_sidebar=debug")),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting channel sidebar");

    // Load configuration
    let settings = load_settings()?;
    tracing::debug!(
        "Config: api={}, data_dir={:?}",
        settings.api.base_url,
        settings.storage.data_dir
    );

    let registry = Arc::new(match &settings.storage.registry_path {
        Some(path) => ChannelRegistry::load(path).await?,
        None => {
            tracing::warn!("SIDEBAR_REGISTRY_PATH not set, using an empty channel registry");
            ChannelRegistry::default()
        }
    });

    let joined = Arc::new(JoinedChannels::load(settings.storage.joined_path()).await?);

    let client = Arc::new(TerminationApiClient::new(&settings.api)?);
    let resolver = Arc::new(ChannelResolver::new(client));
    let sessions = LocalChatHub::new();

    let channel = ChannelId::new(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "global-english".to_string()),
    );
    tracing::info!(channel = %channel, "Opening channel");

    let list = ChannelList::new(
        channel,
        registry,
        joined,
        resolver.clone(),
        settings.user.country.clone(),
    );

    if list.uses_resolved_channel() {
        let timeout = settings.api.request_timeout();
        if tokio::time::timeout(timeout, list.wait_resolved())
            .await
            .is_err()
        {
            tracing::warn!(
                channel = %list.current(),
                timeout_secs = timeout.as_secs(),
                "Channel still resolving"
            );
        }
    }

    let indicators: Vec<_> = list
        .joined_rows()
        .into_iter()
        .map(|row| ChannelIndicator::attach(row, &sessions))
        .collect();

    for indicator in &indicators {
        let row = indicator.row();
        println!(
            "{:<40} {:<24} {}",
            indicator.class_names(),
            row.name,
            indicator.unread_badge().unwrap_or_default()
        );
    }
    if indicators.is_empty() {
        println!("(no joined channels)");
    }

    resolver.log_stats();
    tracing::info!("Channel sidebar complete");
    Ok(())
}
