use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBackend {
    /// Process-local store; contents are lost on restart.
    Memory,
    /// SQL database through sea-orm.
    Sql,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub backend: DocumentBackend,
    /// Required when `backend = "sql"`, e.g. `postgres://...` or `sqlite://folio.db?mode=rwc`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    1
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    Memory,
    S3,
    /// No object storage: uploads are refused and cascades skip blob cleanup.
    None,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct S3Config {
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_s3_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the filesystem backend.
    pub base_path: PathBuf,
    /// URL prefix the filesystem backend publishes objects under.
    pub public_base_url: String,
    /// Maximum accepted object size in bytes.
    pub max_blob_size: u64,
    #[serde(default)]
    pub s3: S3Config,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    /// Account that can never be deleted.
    pub protected_user: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// Accounts created when the user table is empty at startup.
    pub users: Vec<SeedUser>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            users: [
                ("isabella", "password123"),
                ("studio", "firebase"),
                ("star", "supernova"),
            ]
            .into_iter()
            .map(|(name, password)| SeedUser {
                name: name.into(),
                password: password.into(),
            })
            .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TitleConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_title_timeout")]
    pub timeout_secs: u64,
}

fn default_title_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    /// AI title generation; disabled when absent.
    #[serde(default)]
    pub titles: Option<TitleConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.backend", "memory")?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.base_path", "./data/blobs")?
            .set_default("storage.public_base_url", "http://127.0.0.1:3000/blobs")?
            .set_default("storage.max_blob_size", 32 * 1024 * 1024)?
            .set_default("auth.session_ttl_hours", 24 * 7)?
            .set_default("auth.protected_user", "star")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FOLIO__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("FOLIO")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
