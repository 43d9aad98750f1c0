//! Configuration loading and root folder resolution tests
//!
//! Tests that touch HOMESTAY_* environment variables are marked #[serial]
//! so they never race each other.

use homestay_common::config::{
    load_config, RootFolderInitializer, RootFolderResolver, StorageBackend, TomlConfig,
    ENV_CLOUD_API_KEY, ENV_CLOUD_API_SECRET, ENV_CLOUD_NAME, ENV_ROOT_FOLDER,
    ENV_STORAGE_BACKEND,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    for name in [
        ENV_ROOT_FOLDER,
        ENV_STORAGE_BACKEND,
        ENV_CLOUD_NAME,
        ENV_CLOUD_API_KEY,
        ENV_CLOUD_API_SECRET,
    ] {
        env::remove_var(name);
    }
}

#[test]
fn test_defaults_from_empty_toml() {
    let config = TomlConfig::from_toml_str("").unwrap();

    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.storage.backend, StorageBackend::Local);
    assert_eq!(config.storage.max_upload_bytes, 10 * 1024 * 1024);
    assert!(config.storage.cloud.is_none());
    assert_eq!(config.session.ttl_hours, 168);
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_toml_parses() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/homestay"

        [server]
        port = 8080

        [storage]
        backend = "cloud"

        [storage.cloud]
        cloud_name = "demo"
        api_key = "key"
        api_secret = "secret"
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder.as_deref(), Some("/srv/homestay"));
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.storage.backend, StorageBackend::Cloud);

    let cloud = config.storage.cloud.as_ref().unwrap();
    assert_eq!(cloud.photo_folder, "airbnb/properties");
    assert_eq!(cloud.rules_folder, "airbnb/rules");
    assert_eq!(cloud.photo_max_width, 1000);
    assert_eq!(cloud.base_url, "https://api.cloudinary.com");
    assert!(config.validate().is_ok());
}

#[test]
fn test_cloud_backend_without_credentials_is_rejected() {
    let config = TomlConfig::from_toml_str(
        r#"
        [storage]
        backend = "cloud"
        "#,
    )
    .unwrap();
    assert!(config.validate().is_err());

    let config = TomlConfig::from_toml_str(
        r#"
        [storage]
        backend = "cloud"

        [storage.cloud]
        cloud_name = "demo"
        "#,
    )
    .unwrap();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("api_key"));
    assert!(err.contains("api_secret"));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let result = TomlConfig::from_toml_str("server = [");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_explicit_missing_config_file_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let result = load_config(Some(&dir.path().join("nope.toml")));
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[storage]\nbackend = \"local\"\n").unwrap();

    env::set_var(ENV_STORAGE_BACKEND, "cloud");
    env::set_var(ENV_CLOUD_NAME, "env-cloud");
    env::set_var(ENV_CLOUD_API_KEY, "env-key");
    env::set_var(ENV_CLOUD_API_SECRET, "env-secret");

    let config = load_config(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.storage.backend, StorageBackend::Cloud);
    let cloud = config.storage.cloud.unwrap();
    assert_eq!(cloud.cloud_name, "env-cloud");
    assert_eq!(cloud.api_key, "env-key");
    assert_eq!(cloud.api_secret, "env-secret");
}

#[test]
#[serial]
fn test_root_folder_priority() {
    clear_env();
    let config = TomlConfig {
        root_folder: Some("/from/toml".to_string()),
        ..Default::default()
    };

    // TOML beats the compiled default
    let resolver = RootFolderResolver::new(None, &config);
    assert_eq!(resolver.resolve(), PathBuf::from("/from/toml"));

    // ENV beats TOML
    env::set_var(ENV_ROOT_FOLDER, "/from/env");
    let resolver = RootFolderResolver::new(None, &config);
    assert_eq!(resolver.resolve(), PathBuf::from("/from/env"));

    // CLI beats everything
    let resolver = RootFolderResolver::new(Some(PathBuf::from("/from/cli")), &config);
    assert_eq!(resolver.resolve(), PathBuf::from("/from/cli"));

    clear_env();
}

#[test]
#[serial]
fn test_root_folder_falls_back_to_default() {
    clear_env();
    let resolver = RootFolderResolver::new(None, &TomlConfig::default());
    let root = resolver.resolve();
    assert!(root.to_string_lossy().contains("homestay"));
}

#[test]
fn test_initializer_creates_layout() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert!(initializer.uploads_dir().is_dir());
    assert!(initializer.rules_dir().is_dir());
    assert_eq!(initializer.database_path(), root.join("homestay.db"));

    // Idempotent
    initializer.ensure_directory_exists().unwrap();
}
