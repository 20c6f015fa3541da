//! Server configuration, read from a TOML file.
//!
//! ```toml
//! port = 8000
//! trace_enabled = false
//! checksum_response = true
//!
//! [files]
//! download_allowed = true
//! extensions = "html, css, js"   # or "*"
//! directory = "public"
//! ```

use {
    std::{
        collections::HashSet,
        env, fs,
        net::IpAddr,
        path::{Path, PathBuf},
    },
    serde::{Deserialize, Deserializer},
    log::{warn, Level},
    crate::error::ConfigError,
};

pub const DEFAULT_CONFIG_FILE: &str = "tidepool.toml";
pub const PORT_ENV_VAR: &str = "TIDEPOOL_HTTP_PORT";
const DEFAULT_PORT: u16 = 8000;
const MIN_PORT: u16 = 20;
const MAX_PORT: u16 = 20_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(deserialize_with = "clamped_port")]
    pub port: u16,
    pub bind_address: String,
    /// Maximum number of worker lines; defaults to twice the CPU count.
    pub workers: Option<usize>,
    pub log_level: String,
    pub trace_enabled: bool,
    pub checksum_response: bool,
    pub files: FileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub download_allowed: bool,
    /// `*` for any extension, otherwise a comma separated list.
    extensions: String,
    #[serde(skip)]
    policy: ExtensionPolicy,
    pub directory: Option<PathBuf>,
}

impl FileConfig {
    pub fn extensions(&self) -> &str {
        &self.extensions
    }

    pub fn set_extensions(&mut self, list: &str) {
        self.extensions = list.to_string();
        self.policy = ExtensionPolicy::parse(list);
    }
}

fn clamped_port<'de, D: Deserializer<'de>>(d: D) -> Result<u16, D::Error> {
    let port = i64::deserialize(d)?;
    Ok(port.clamp(MIN_PORT.into(), MAX_PORT.into()) as u16)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtensionPolicy {
    #[default]
    Nothing,
    Any,
    Only(HashSet<String>),
}

impl ExtensionPolicy {
    pub fn parse(list: &str) -> Self {
        let list = list.trim();
        if list == "*" {
            return ExtensionPolicy::Any;
        }
        let exts: HashSet<String> = list.split(',')
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if exts.is_empty() {
            ExtensionPolicy::Nothing
        } else {
            ExtensionPolicy::Only(exts)
        }
    }

    pub fn admits_any(&self) -> bool {
        !matches!(self, ExtensionPolicy::Nothing)
    }

    pub fn admits(&self, ext: &str) -> bool {
        match self {
            ExtensionPolicy::Nothing => false,
            ExtensionPolicy::Any => true,
            ExtensionPolicy::Only(exts) => exts.contains(&ext.to_ascii_lowercase()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: "127.0.0.1".to_string(),
            workers: None,
            log_level: "info".to_string(),
            trace_enabled: false,
            checksum_response: false,
            files: FileConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut cfg: Config = toml::from_str(content)?;
        cfg.files.policy = ExtensionPolicy::parse(&cfg.files.extensions);
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid(format!("bind_address '{}' is not an IP address", self.bind_address)));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Replaces the port with `TIDEPOOL_HTTP_PORT` when it is set and parses.
    pub fn apply_env(&mut self) {
        if let Ok(port_str) = env::var(PORT_ENV_VAR) {
            match port_str.parse::<u16>() {
                Ok(port) => self.port = port.clamp(MIN_PORT, MAX_PORT),
                Err(e) => warn!("{}: {}. using port {}", PORT_ENV_VAR, e, self.port),
            }
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn max_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| num_cpus::get() * 2).max(1)
    }

    pub fn log_level(&self) -> Option<Level> {
        self.log_level.parse().ok()
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    pub fn should_compute_checksum(&self) -> bool {
        self.checksum_response
    }

    pub fn file_directory(&self) -> Option<&Path> {
        self.files.directory.as_deref()
    }

    pub fn extension_policy(&self) -> &ExtensionPolicy {
        &self.files.policy
    }

    pub fn can_download_files(&self) -> bool {
        self.files.download_allowed
            && self.file_directory().is_some()
            && self.extension_policy().admits_any()
    }

    pub fn can_download_extension(&self, ext: &str) -> bool {
        self.can_download_files() && self.extension_policy().admits(ext)
    }
}
