use crate::error::{Result, SidebarError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub user: UserConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub registry_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Returns path to the joined channel store: ~/.channel_sidebar/joined.json
    pub fn joined_path(&self) -> PathBuf {
        self.data_dir.join("joined.json")
    }
}

#[derive(Debug, Clone)]
pub struct UserConfig {
    pub country: String,
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let api = ApiConfig {
        base_url: std::env::var("SIDEBAR_API_BASE_URL")
            .unwrap_or_else(|_| "https://online-go.com".to_string())
            .trim_end_matches('/')
            .to_string(),
        request_timeout_secs: std::env::var("SIDEBAR_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                SidebarError::Config("Invalid SIDEBAR_REQUEST_TIMEOUT_SECS".to_string())
            })?,
    };

    let storage = StorageConfig {
        data_dir: std::env::var("SIDEBAR_DATA_DIR")
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                format!("{}/.channel_sidebar", home)
            })
            .into(),
        registry_path: std::env::var("SIDEBAR_REGISTRY_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from),
    };

    let user = UserConfig {
        country: std::env::var("SIDEBAR_USER_COUNTRY").unwrap_or_else(|_| "un".to_string()),
    };

    if api.request_timeout_secs == 0 {
        return Err(SidebarError::Config(
            "SIDEBAR_REQUEST_TIMEOUT_SECS must be positive".to_string(),
        ));
    }

    Ok(Settings { api, storage, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_path_under_data_dir() {
        let storage = StorageConfig {
            data_dir: PathBuf::from("/tmp/sidebar"),
            registry_path: None,
        };
        assert_eq!(
            storage.joined_path(),
            PathBuf::from("/tmp/sidebar/joined.json")
        );
    }

    #[test]
    fn test_request_timeout() {
        let api = ApiConfig {
            base_url: "http://localhost".to_string(),
            request_timeout_secs: 5,
        };
        assert_eq!(api.request_timeout(), Duration::from_secs(5));
    }
}
