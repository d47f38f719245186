use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Without a URL the service runs on the in-memory store.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    /// Without brokers notifications go to an in-process broadcast channel.
    pub brokers: Option<String>,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: None,
            topic_prefix: default_topic_prefix(),
        }
    }
}

fn default_topic_prefix() -> String {
    "drivehub".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentsConfig {
    pub root: String,
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    #[serde(default = "default_owner_share")]
    pub default_owner_share: i64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            default_owner_share: default_owner_share(),
        }
    }
}

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_owner_share() -> i64 {
    100
}

impl BusinessRules {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. DRIVEHUB_DATABASE__URL=postgres://...
            .add_source(config::Environment::with_prefix("DRIVEHUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
