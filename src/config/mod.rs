mod settings;

pub use settings::{ApiConfig, Settings, StorageConfig, UserConfig, load_settings};
