//! Configuration loading and types for s3file.
//!
//! Configuration is read once at process start from a YAML file and
//! deserialized into [`Config`].  The `aws.s3` section describes the
//! object storage connection, `records` the SQLite record store and
//! `logging` the tracing subscriber.
//!
//! ```yaml
//! aws:
//!   auth_key: AKIA...
//!   auth_secret: ...
//!   s3:
//!     bucket_name: files
//!     end_point: http://127.0.0.1:9000
//!     signing_region: us-east-1
//!     with_path_style: true
//!     public_url: https://cdn.example.com
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::errors::FileError;
use crate::public_url::normalize_base;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// AWS credentials and S3 settings.
    #[serde(default)]
    pub aws: AwsConfig,

    /// Record store settings.
    #[serde(default)]
    pub records: RecordsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Shared AWS credentials plus the S3 subsection.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AwsConfig {
    /// Access key shared by every AWS service.
    #[serde(default)]
    pub auth_key: Option<String>,

    /// Secret key shared by every AWS service.
    #[serde(default)]
    pub auth_secret: Option<String>,

    #[serde(default)]
    pub s3: S3Config,
}

/// S3 connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Bucket holding every uploaded file.
    #[serde(default)]
    pub bucket_name: Option<String>,

    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub end_point: Option<String>,

    /// Region used to sign requests.
    #[serde(default = "default_region")]
    pub signing_region: String,

    /// S3-specific access key; overrides `aws.auth_key`.
    #[serde(default)]
    pub auth_key: Option<String>,

    /// S3-specific secret key; overrides `aws.auth_secret`.
    #[serde(default)]
    pub auth_secret: Option<String>,

    /// Force path-style URL addressing.
    #[serde(default)]
    pub with_path_style: bool,

    /// Send plain bodies instead of aws-chunked encoded ones.
    #[serde(default)]
    pub disable_chunked_encoding: bool,

    /// Base URL under which stored objects are publicly reachable.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket_name: None,
            end_point: None,
            signing_region: default_region(),
            auth_key: None,
            auth_secret: None,
            with_path_style: false,
            disable_chunked_encoding: false,
            public_url: default_public_url(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RecordsConfig {
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

/// SQLite-specific record store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_records_path")]
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_records_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Fully resolved settings needed to build the storage client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub signing_region: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
    pub disable_chunked_encoding: bool,
    /// Normalized to end in a single `/`.
    pub public_url: String,
}

impl Config {
    /// Resolve the storage settings, failing when the bucket name or either
    /// half of the credential pair is missing.
    pub fn storage_settings(&self) -> Result<StorageSettings, FileError> {
        let s3 = &self.aws.s3;

        let access_key = non_blank(s3.auth_key.as_ref())
            .or_else(|| non_blank(self.aws.auth_key.as_ref()))
            .ok_or_else(|| missing("aws.s3.auth_key (or aws.auth_key)"))?;
        let secret_key = non_blank(s3.auth_secret.as_ref())
            .or_else(|| non_blank(self.aws.auth_secret.as_ref()))
            .ok_or_else(|| missing("aws.s3.auth_secret (or aws.auth_secret)"))?;
        let bucket = non_blank(s3.bucket_name.as_ref()).ok_or_else(|| missing("aws.s3.bucket_name"))?;

        Ok(StorageSettings {
            bucket,
            endpoint: non_blank(s3.end_point.as_ref()),
            signing_region: s3.signing_region.trim().to_string(),
            access_key,
            secret_key,
            path_style: s3.with_path_style,
            disable_chunked_encoding: s3.disable_chunked_encoding,
            public_url: normalize_base(s3.public_url.trim()),
        })
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn missing(setting: &str) -> FileError {
    FileError::Configuration(format!("S3 storage is not properly configured: {setting} is missing"))
}

// -- Defaults ----------------------------------------------------------------

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_public_url() -> String {
    "/".to_string()
}

fn default_records_path() -> String {
    "./data/files.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load and parse configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_config(&contents)
}

/// Parse configuration from a YAML string.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
}
