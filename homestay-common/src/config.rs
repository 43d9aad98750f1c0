//! Configuration loading and root folder resolution
//!
//! Configuration comes from three layers, highest priority first:
//! 1. Command-line arguments (handled by the binary)
//! 2. Environment variables (`HOMESTAY_*`)
//! 3. TOML config file
//!
//! A missing config file is never fatal: defaults are used and a warning is
//! logged. Only an explicitly requested file that does not exist is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ENV_ROOT_FOLDER: &str = "HOMESTAY_ROOT_FOLDER";
/// Environment variable selecting the storage backend (`local` or `cloud`)
pub const ENV_STORAGE_BACKEND: &str = "HOMESTAY_STORAGE_BACKEND";
pub const ENV_CLOUD_NAME: &str = "HOMESTAY_CLOUD_NAME";
pub const ENV_CLOUD_API_KEY: &str = "HOMESTAY_CLOUD_API_KEY";
pub const ENV_CLOUD_API_SECRET: &str = "HOMESTAY_CLOUD_API_SECRET";

/// Subfolder of the root folder holding uploaded photos
pub const UPLOADS_DIR: &str = "uploads";
/// Subfolder of the root folder holding house-rules PDFs
pub const RULES_DIR: &str = "rules";
/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "homestay.db";

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_CLOUD_BASE_URL: &str = "https://api.cloudinary.com";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Where uploaded files are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under the root folder, served statically
    #[default]
    Local,
    /// Files on the remote media service
    Cloud,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "cloud" => Ok(StorageBackend::Cloud),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}' (expected 'local' or 'cloud')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub cloud: Option<CloudConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            max_upload_bytes: default_max_upload_bytes(),
            cloud: None,
        }
    }
}

/// Digest used to sign media service requests
///
/// The media service fixes this per account, not per request; it must match
/// the account's signature setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    Sha1,
    #[default]
    Sha256,
}

/// Credentials and placement for the remote media service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default = "default_cloud_base_url")]
    pub base_url: String,
    #[serde(default = "default_photo_folder")]
    pub photo_folder: String,
    #[serde(default = "default_rules_folder")]
    pub rules_folder: String,
    #[serde(default = "default_photo_max_dimension")]
    pub photo_max_width: u32,
    #[serde(default = "default_photo_max_dimension")]
    pub photo_max_height: u32,
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            base_url: default_cloud_base_url(),
            photo_folder: default_photo_folder(),
            rules_folder: default_rules_folder(),
            photo_max_width: default_photo_max_dimension(),
            photo_max_height: default_photo_max_dimension(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }
}

impl CloudConfig {
    fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cloud_name.trim().is_empty() {
            missing.push("cloud_name");
        }
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        if self.api_secret.trim().is_empty() {
            missing.push("api_secret");
        }
        missing
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_ttl_hours")]
    pub ttl_hours: i64,
    /// Mark the session cookie `Secure`; enable when served over HTTPS
    #[serde(default)]
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_session_ttl_hours(),
            secure_cookie: false,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_cloud_base_url() -> String {
    DEFAULT_CLOUD_BASE_URL.to_string()
}

fn default_photo_folder() -> String {
    "airbnb/properties".to_string()
}

fn default_rules_folder() -> String {
    "airbnb/rules".to_string()
}

fn default_photo_max_dimension() -> u32 {
    1000
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply `HOMESTAY_*` environment variables on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var(ENV_STORAGE_BACKEND) {
            self.storage.backend = backend.parse()?;
        }

        let overrides = [
            (ENV_CLOUD_NAME, std::env::var(ENV_CLOUD_NAME).ok()),
            (ENV_CLOUD_API_KEY, std::env::var(ENV_CLOUD_API_KEY).ok()),
            (ENV_CLOUD_API_SECRET, std::env::var(ENV_CLOUD_API_SECRET).ok()),
        ];

        for (name, value) in overrides {
            let Some(value) = value else { continue };
            let cloud = self.storage.cloud.get_or_insert_with(CloudConfig::default);
            match name {
                ENV_CLOUD_NAME => cloud.cloud_name = value,
                ENV_CLOUD_API_KEY => cloud.api_key = value,
                _ => cloud.api_secret = value,
            }
        }

        Ok(())
    }

    /// Check cross-field requirements
    ///
    /// The cloud backend cannot start without all three credentials.
    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Cloud {
            let cloud = self.storage.cloud.as_ref().ok_or_else(|| {
                Error::Config("Cloud storage selected but [storage.cloud] is missing".to_string())
            })?;
            let missing = cloud.missing_credentials();
            if !missing.is_empty() {
                return Err(Error::Config(format!(
                    "Cloud storage credentials missing: {}",
                    missing.join(", ")
                )));
            }
        }

        if self.storage.max_upload_bytes == 0 {
            return Err(Error::Config("storage.max_upload_bytes must be > 0".to_string()));
        }

        if self.session.ttl_hours <= 0 {
            return Err(Error::Config("session.ttl_hours must be > 0".to_string()));
        }

        Ok(())
    }
}

/// Default config file location: `<config dir>/homestay/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("homestay").join("config.toml"))
}

/// Load TOML configuration, then apply environment overrides
///
/// `explicit` is a path the user asked for; if it does not exist that is an
/// error. Without it, the default location is tried and defaults are used
/// when nothing is there.
pub fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            read_config_file(path)?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            Some(path) => {
                warn!(
                    "No config file at {}, using defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        },
    };

    config.apply_env_overrides()?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `HOMESTAY_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent default
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<String>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_value: config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return PathBuf::from(path);
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("homestay"))
        .unwrap_or_else(|| PathBuf::from("./homestay_data"))
}

/// Creates the root folder layout and hands out paths inside it
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create root, `uploads/` and `rules/` if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        for dir in [self.root.clone(), self.uploads_dir(), self.rules_dir()] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.root.join(RULES_DIR)
    }
}
