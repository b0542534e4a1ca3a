// src/config.rs - Configuration management
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub inventory: InventoryConfig,
    pub flow: FlowConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: u64,
    pub client_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub max_request_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InventoryConfig {
    /// Fixed application identifier the inventory blob is stored under.
    pub storage_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FlowConfig {
    pub tick_interval_ms: u64,
    pub low_rate_threshold: f64,
    pub high_rate_threshold: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: None,
            keep_alive: 30,
            client_timeout: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:labtrack.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: 30,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            max_request_size: 1024 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            storage_key: "chemical-inventory".to_string(),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            low_rate_threshold: 5.0,
            high_rate_threshold: 50.0,
        }
    }
}

impl FlowConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

pub fn load_config() -> Result<Config> {
    load_env_file()?;

    let mut config = if let Ok(config_file) = env::var("CONFIG_FILE") {
        load_config_file(Path::new(&config_file))?
    } else {
        Config::default()
    };

    override_with_env(&mut config);

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

pub fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn override_with_env(config: &mut Config) {
    if let Ok(host) = env::var("BIND_ADDRESS") {
        config.server.host = host;
    }
    if let Some(port) = parse_env::<u16>("LABTRACK_PORT") {
        config.server.port = port;
    }
    if let Some(workers) = parse_env::<usize>("LABTRACK_WORKERS") {
        config.server.workers = Some(workers);
    }
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(max_conn) = parse_env::<u32>("DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections = max_conn;
    }
    if let Ok(origins_str) = env::var("ALLOWED_ORIGINS") {
        config.security.allowed_origins = origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if let Ok(level) = env::var("RUST_LOG") {
        config.logging.level = level;
    }
    if let Ok(key) = env::var("INVENTORY_STORAGE_KEY") {
        config.inventory.storage_key = key;
    }
    if let Some(tick) = parse_env::<u64>("FLOW_TICK_INTERVAL_MS") {
        config.flow.tick_interval_ms = tick;
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.inventory.storage_key.trim().is_empty() {
            return Err(anyhow::anyhow!("inventory.storage_key cannot be empty"));
        }

        if self.flow.tick_interval_ms == 0 {
            return Err(anyhow::anyhow!("flow.tick_interval_ms must be greater than zero"));
        }

        if self.flow.low_rate_threshold > self.flow.high_rate_threshold {
            return Err(anyhow::anyhow!(
                "flow.low_rate_threshold ({}) must be <= flow.high_rate_threshold ({})",
                self.flow.low_rate_threshold,
                self.flow.high_rate_threshold
            ));
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(anyhow::anyhow!(
                "max_connections ({}) must be >= min_connections ({})",
                self.database.max_connections,
                self.database.min_connections
            ));
        }

        Ok(())
    }

    pub fn print_startup_info(&self) {
        log::info!("🧪 labtrack starting up...");
        log::info!("🌐 Server: {}:{}", self.server.host, self.server.port);
        log::info!("💾 Database: {}", self.database.url);
        log::info!("📦 Inventory storage key: {}", self.inventory.storage_key);
        log::info!(
            "⏱️  Stopwatch tick: {}ms, flow thresholds: {} / {}",
            self.flow.tick_interval_ms,
            self.flow.low_rate_threshold,
            self.flow.high_rate_threshold
        );
        log::info!("📊 Logging: {} level", self.logging.level);
    }
}

pub fn load_env_file() -> Result<()> {
    if let Ok(env_file) = env::var("ENV_FILE") {
        dotenvy::from_filename(&env_file)
            .with_context(|| format!("Failed to load environment file: {}", env_file))?;
    } else if Path::new(".env").exists() {
        dotenvy::dotenv().context("Failed to load .env file")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.inventory.storage_key, "chemical-inventory");
        assert_eq!(config.flow.tick_interval(), Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.inventory.storage_key = "  ".to_string();
        assert!(config.validate().is_err());
        config.inventory.storage_key = "inv".to_string();

        config.flow.tick_interval_ms = 0;
        assert!(config.validate().is_err());
        config.flow.tick_interval_ms = 10;

        config.flow.low_rate_threshold = 100.0;
        assert!(config.validate().is_err());
        config.flow.low_rate_threshold = 1.0;

        config.database.max_connections = 1;
        config.database.min_connections = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_loading_keeps_defaults_for_missing_keys() -> Result<()> {
        let toml_content = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [inventory]
        storage_key = "lab-7-inventory"

        [flow]
        high_rate_threshold = 120.0
        "#;

        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(toml_content.as_bytes())?;

        let config = load_config_file(temp_file.path())?;
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.keep_alive, 30);
        assert_eq!(config.inventory.storage_key, "lab-7-inventory");
        assert_eq!(config.flow.high_rate_threshold, 120.0);
        assert_eq!(config.flow.tick_interval_ms, 10);
        assert_eq!(config.database.url, "sqlite:labtrack.db");

        Ok(())
    }

    #[test]
    fn test_malformed_toml_is_reported() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"[server\nport = ")?;

        let err = load_config_file(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        Ok(())
    }
}
