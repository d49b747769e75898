use serde::Deserialize;

/// Which key-value backend holds the lists and settings
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,

    /// Allociné partner code. Without it the catalog yields no candidates.
    #[serde(default)]
    pub allocine_partner_code: Option<String>,

    /// Allociné REST v3 base URL
    #[serde(default = "default_allocine_api_url")]
    pub allocine_api_url: String,

    #[serde(default = "default_catalog_timeout_secs")]
    pub catalog_timeout_secs: u64,

    /// Number of results requested per catalog search
    #[serde(default = "default_catalog_result_count")]
    pub catalog_result_count: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Redis
}

fn default_allocine_api_url() -> String {
    "https://api.allocine.fr/rest/v3".to_string()
}

fn default_catalog_timeout_secs() -> u64 {
    8
}

fn default_catalog_result_count() -> u32 {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
