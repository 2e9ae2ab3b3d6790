//! Server configuration: a TOML file with environment overrides on top.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use gagyebu_ocr::{DEFAULT_URL_PREFIX, KOREAN_ENGLISH};

pub const CONFIG_ENV: &str = "GAGYEBU_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "gagyebu.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("auth.jwt_secret must be set (or GAGYEBU_JWT_SECRET)")]
    MissingJwtSecret,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 3000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("data/gagyebu.db") }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory that holds uploaded receipt files.
    pub upload_dir: PathBuf,
    /// Public url prefix under which those files are addressed.
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("public/uploads/receipts"),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub language: String,
    pub timeout_secs: u64,
    /// Tesseract `tessdata` directory; only read by the `tesseract` build.
    pub tessdata_dir: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { language: KOREAN_ENGLISH.to_string(), timeout_secs: 120, tessdata_dir: None }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    /// Read `$GAGYEBU_CONFIG` (or `gagyebu.toml`), then apply environment
    /// overrides. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config = Self::from_file(Path::new(&path))?;
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path: path.to_path_buf(), source }),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn with_overrides(
        mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = get("GAGYEBU_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("GAGYEBU_PORT") {
            self.server.port = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "GAGYEBU_PORT", value: v })?;
        }
        if let Some(v) = get("GAGYEBU_DB_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = get("GAGYEBU_UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = get("GAGYEBU_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = get("GAGYEBU_OCR_TIMEOUT_SECS") {
            self.ocr.timeout_secs = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "GAGYEBU_OCR_TIMEOUT_SECS", value: v })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if !self.storage.url_prefix.starts_with('/') || !self.storage.url_prefix.ends_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "storage.url_prefix",
                value: self.storage.url_prefix.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.server.port, 3000);
        assert_eq!(c.storage.url_prefix, "/uploads/receipts/");
        assert_eq!(c.storage.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(c.ocr.language, "kor+eng");
        assert_eq!(c.ocr.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let c = Config::parse(
            r#"
            [server]
            port = 8080

            [ocr]
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(c.server.port, 8080);
        assert_eq!(c.server.host, "127.0.0.1");
        assert_eq!(c.ocr.timeout_secs, 30);
        assert_eq!(c.ocr.language, "kor+eng");
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = Config::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c.server.port, 3000);
    }

    #[test]
    fn env_overrides_file() {
        let c = Config::parse("[server]\nport = 8080")
            .unwrap()
            .with_overrides(env(&[("GAGYEBU_PORT", "9090"), ("GAGYEBU_JWT_SECRET", "s3cret")]))
            .unwrap();
        assert_eq!(c.server.port, 9090);
        assert_eq!(c.auth.jwt_secret, "s3cret");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn bad_port_override_is_reported() {
        let err = Config::default()
            .with_overrides(env(&[("GAGYEBU_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GAGYEBU_PORT", .. }));
    }

    #[test]
    fn validate_requires_secret_and_slashed_prefix() {
        assert!(matches!(Config::default().validate(), Err(ConfigError::MissingJwtSecret)));

        let mut c = Config::default();
        c.auth.jwt_secret = "x".into();
        c.storage.url_prefix = "/uploads/receipts".into();
        assert!(matches!(c.validate(), Err(ConfigError::InvalidValue { .. })));
    }
}
