//! Configuration and settings management
//!
//! Loads settings from config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Number of links shown per page by the list command.
pub const LIST_PAGE_SIZE: usize = 20;

/// Where the link store document is kept
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file on the local filesystem
    #[default]
    Local,
    /// Object in Cloudflare R2
    R2,
}

/// Core settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoreSettings {
    /// Persistence backend (`local` or `r2`)
    #[serde(default)]
    pub storage_backend: StorageBackend,

    /// Path of the JSON document for the local backend
    #[serde(default = "default_links_file")]
    pub links_file: String,
    /// Object key of the JSON document for the R2 backend
    #[serde(default = "default_links_object_key")]
    pub links_object_key: String,

    /// R2 Storage access key ID
    pub r2_access_key_id: Option<String>,
    /// R2 Storage secret access key
    pub r2_secret_access_key: Option<String>,
    /// R2 Storage endpoint URL
    pub r2_endpoint_url: Option<String>,
    /// R2 Storage bucket name
    pub r2_bucket_name: Option<String>,

    /// Maximum number of links in one review run (unset or 0: no limit)
    pub review_batch_limit: Option<usize>,
}

fn default_links_file() -> String {
    "saved_links.json".to_string()
}

fn default_links_object_key() -> String {
    "links/saved_links.json".to_string()
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::default(),
            links_file: default_links_file(),
            links_object_key: default_links_object_key(),
            r2_access_key_id: None,
            r2_secret_access_key: None,
            r2_endpoint_url: None,
            r2_bucket_name: None,
            review_batch_limit: None,
        }
    }
}

/// Build the layered configuration shared by all crates.
///
/// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
/// `config/local`, `APP__`-prefixed environment, plain environment.
///
/// # Errors
///
/// Returns a `ConfigError` if a source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE maps to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl CoreSettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use linkkeeper_core::config::CoreSettings;
    ///
    /// let settings = CoreSettings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Review batch cap, with `0` meaning unlimited
    #[must_use]
    pub fn review_limit(&self) -> Option<usize> {
        self.review_batch_limit.filter(|limit| *limit > 0)
    }
}
