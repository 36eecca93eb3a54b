use serde::{Deserialize, Serialize};

/// Environment variable overriding `api_base_url`.
pub const API_URL_ENV: &str = "COMPLAINT_DESK_API_URL";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    /// Lives as long as the process, like a browser tab's session storage.
    #[default]
    Session,
    /// SQLite file that survives restarts.
    Durable { path: String },
}

/// Where the complaint working set comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintSource {
    /// Kept in the session store under the `complaints` key.
    #[default]
    Local,
    /// Fetched with `GET /complaints`, updated with `PUT /complaint/{id}`.
    Remote,
}

/// Where dashboard counters come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    /// Aggregated client-side from the working set.
    #[default]
    Local,
    /// `GET /dashboard/stats`.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeskConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
    pub complaint_source: ComplaintSource,
    pub stats_source: StatsSource,
    /// Clicking the Total/Critical cards changes the status filter.
    pub stat_click_filters: bool,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
            storage: StorageBackend::Session,
            complaint_source: ComplaintSource::Local,
            stats_source: StatsSource::Local,
            stat_click_filters: true,
        }
    }
}

impl DeskConfig {
    /// Load a JSON config file. Missing fields take their defaults,
    /// then the environment override is applied.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {path}: {e}"))?;
        Ok(config.with_env_overrides())
    }

    /// Defaults plus environment override, used when no file is given.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        self
    }

    /// In-memory everything, local sources. No network or env lookups.
    pub fn default_test() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:9/api".to_string(),
            request_timeout_secs: 1,
            ..Self::default()
        }
    }
}
