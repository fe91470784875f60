use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Which backend holds the saved string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Dynamodb,
    Memory,
    File,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(Self::Dynamodb),
            "memory" | "mem" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(anyhow!("unknown store backend `{other}` (expected dynamodb, memory or file)")),
        }
    }
}

/// Layout of the single record plus backend selection.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_key_attribute")]
    pub key_attribute: String,
    #[serde(default = "default_value_attribute")]
    pub value_attribute: String,
    #[serde(default = "default_record_key")]
    pub record_key: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_table_name() -> String { "string-table".into() }
fn default_key_attribute() -> String { "string-key".into() }
fn default_value_attribute() -> String { "string-value".into() }
fn default_record_key() -> String { "main".into() }
fn default_file_path() -> String { "data/string_store.json".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            table_name: default_table_name(),
            key_attribute: default_key_attribute(),
            value_attribute: default_value_attribute(),
            record_key: default_record_key(),
            file_path: default_file_path(),
            region: None,
            endpoint_url: None,
        }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|e| e.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), apply env overrides and validate.
    /// A missing file means defaults; a broken one is an error.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_missing_file(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env_overrides()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.server.apply_env_overrides();
        self.store.apply_env_overrides()
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.store.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StoreConfig {
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("STORE_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Ok(table) = std::env::var("STRING_TABLE") {
            self.table_name = table;
        }
        if let Ok(path) = std::env::var("STRING_STORE_FILE") {
            self.file_path = path;
        }
        // region 留空时交给 aws-config 的默认链（AWS_REGION / profile）
        if self.region.is_none() {
            self.region = std::env::var("AWS_REGION").ok().filter(|r| !r.trim().is_empty());
        }
        if let Ok(endpoint) = std::env::var("DYNAMODB_ENDPOINT_URL") {
            self.endpoint_url = Some(endpoint).filter(|e| !e.trim().is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("store.table_name", &self.table_name),
            ("store.key_attribute", &self.key_attribute),
            ("store.value_attribute", &self.value_attribute),
            ("store.record_key", &self.record_key),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{name} must not be empty"));
            }
        }
        if self.key_attribute == self.value_attribute {
            return Err(anyhow!("store.key_attribute and store.value_attribute must differ"));
        }
        if self.backend == StoreBackend::File && self.file_path.trim().is_empty() {
            return Err(anyhow!("store.file_path is required when backend = \"file\""));
        }
        if let Some(endpoint) = &self.endpoint_url {
            let lower = endpoint.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(anyhow!("store.endpoint_url must start with http:// or https://"));
            }
        }
        Ok(())
    }
}
