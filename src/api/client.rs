use crate::chat::ChannelId;
use crate::config::ApiConfig;
use crate::error::{Result, SidebarError};
use crate::metadata::ResolvedChannel;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Source of metadata for channels that are not listed statically
#[async_trait]
pub trait GroupMetadataFetcher: Send + Sync {
    async fn fetch_group(&self, group_id: u64) -> Result<ResolvedChannel>;
}

/// Group payload returned by the termination API
#[derive(Debug, Deserialize)]
struct GroupResponse {
    id: u64,
    name: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    banner: Option<String>,
}

impl From<GroupResponse> for ResolvedChannel {
    fn from(group: GroupResponse) -> Self {
        let mut info = Self::new(ChannelId::group(group.id), group.name);
        info.icon_ref = group.icon.filter(|s| !s.is_empty());
        info.banner_ref = group.banner.filter(|s| !s.is_empty());
        info
    }
}

pub struct TerminationApiClient {
    client: Client,
    base_url: String,
}

impl TerminationApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SidebarError::Api(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn group_url(&self, group_id: u64) -> String {
        format!("{}/termination-api/group/{}", self.base_url, group_id)
    }
}

#[async_trait]
impl GroupMetadataFetcher for TerminationApiClient {
    async fn fetch_group(&self, group_id: u64) -> Result<ResolvedChannel> {
        let url = self.group_url(group_id);
        tracing::debug!(group_id, url = %url, "Fetching group metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SidebarError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SidebarError::Api(format!(
                "group {} lookup failed: HTTP {}",
                group_id, status
            )));
        }

        let group: GroupResponse = response
            .json()
            .await
            .map_err(|e| SidebarError::Api(format!("invalid group payload: {}", e)))?;

        Ok(group.into())
    }
}
