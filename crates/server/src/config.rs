#![forbid(unsafe_code)]

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BUCKET: &str = "interntrack-documents";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobBackend {
    Local {
        root: PathBuf,
    },
    S3 {
        endpoint: Option<String>,
        bucket: String,
        region: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub bind: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub records_file: PathBuf,
    pub blob: BlobBackend,
    /// Whitespace-separated OCR command line; the document path is appended.
    pub ocr_command: Option<String>,
    pub ocr_timeout: Duration,
    pub session_ttl: Duration,
    pub max_upload_bytes: usize,
    pub rename_unverified: bool,
    pub cors_origin: Option<String>,
    /// Shared secret that lets an anonymous caller register a teacher.
    pub teacher_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = get("INTERNTRACK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let mut config = Self {
            bind: parse_or(&get, "INTERNTRACK_BIND", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&get, "INTERNTRACK_PORT", DEFAULT_PORT)?,
            records_file: PathBuf::new(),
            blob: BlobBackend::Local {
                root: PathBuf::new(),
            },
            ocr_command: get("INTERNTRACK_OCR_COMMAND"),
            ocr_timeout: Duration::from_secs(parse_or(&get, "INTERNTRACK_OCR_TIMEOUT_SECS", 60)?),
            session_ttl: Duration::from_secs(parse_or(
                &get,
                "INTERNTRACK_SESSION_TTL_SECS",
                86_400,
            )?),
            max_upload_bytes: parse_or(&get, "INTERNTRACK_MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            rename_unverified: parse_bool(&get, "INTERNTRACK_RENAME_UNVERIFIED")?,
            cors_origin: get("INTERNTRACK_CORS_ORIGIN"),
            teacher_secret: get("INTERNTRACK_TEACHER_SECRET"),
            data_dir,
        };
        if config.ocr_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "INTERNTRACK_OCR_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        config.records_file = get("INTERNTRACK_RECORDS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.join("student_data.csv"));

        config.blob = match get("INTERNTRACK_BLOB_BACKEND").as_deref() {
            None | Some("local") => BlobBackend::Local {
                root: get("INTERNTRACK_BLOB_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| config.data_dir.join("blobs")),
            },
            Some("s3") => BlobBackend::S3 {
                endpoint: get("S3_ENDPOINT"),
                bucket: get("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "INTERNTRACK_BLOB_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        Ok(config)
    }

    /// Re-derives paths that default to locations under the data dir.
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        if self.records_file == self.data_dir.join("student_data.csv") {
            self.records_file = data_dir.join("student_data.csv");
        }
        if let BlobBackend::Local { root } = &mut self.blob
            && *root == self.data_dir.join("blobs")
        {
            *root = data_dir.join("blobs");
        }
        self.data_dir = data_dir;
        self
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn log_summary(&self) {
        let backend = match &self.blob {
            BlobBackend::Local { .. } => "local",
            BlobBackend::S3 { .. } => "s3",
        };
        info!(
            bind = %self.bind,
            port = self.port,
            data_dir = %self.data_dir.display(),
            records_file = %self.records_file.display(),
            blob_backend = backend,
            ocr = self.ocr_command.is_some(),
            teacher_signup = self.teacher_secret.is_some(),
            "configuration loaded"
        );
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<bool, ConfigError> {
    let Some(value) = get(key) else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config.port, 5000);
        assert_eq!(config.records_file, PathBuf::from("./data/student_data.csv"));
        assert_eq!(
            config.blob,
            BlobBackend::Local {
                root: PathBuf::from("./data/blobs")
            }
        );
        assert_eq!(config.ocr_timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, 20_971_520);
        assert!(!config.rename_unverified);
        assert!(config.ocr_command.is_none());
        assert!(config.teacher_secret.is_none());
    }

    #[test]
    fn s3_backend_takes_bucket_and_region() {
        let config = config_from(&[
            ("INTERNTRACK_BLOB_BACKEND", "s3"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("S3_BUCKET", " docs "),
        ])
        .expect("config");
        assert_eq!(
            config.blob,
            BlobBackend::S3 {
                endpoint: Some("http://localhost:9000".to_string()),
                bucket: "docs".to_string(),
                region: "us-east-1".to_string(),
            }
        );
    }

    #[test]
    fn invalid_values_name_the_key() {
        assert_eq!(
            config_from(&[("INTERNTRACK_PORT", "http")]).unwrap_err(),
            ConfigError::Invalid {
                key: "INTERNTRACK_PORT",
                value: "http".to_string()
            }
        );
        assert!(matches!(
            config_from(&[("INTERNTRACK_RENAME_UNVERIFIED", "sometimes")]),
            Err(ConfigError::Invalid {
                key: "INTERNTRACK_RENAME_UNVERIFIED",
                ..
            })
        ));
        assert!(matches!(
            config_from(&[("INTERNTRACK_BLOB_BACKEND", "ftp")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config_from(&[("INTERNTRACK_OCR_TIMEOUT_SECS", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn data_dir_override_moves_derived_paths_only() {
        let config = config_from(&[("INTERNTRACK_RECORDS_FILE", "/srv/records.csv")])
            .expect("config")
            .with_data_dir(PathBuf::from("/var/lib/interntrack"));
        assert_eq!(config.records_file, PathBuf::from("/srv/records.csv"));
        assert_eq!(
            config.blob,
            BlobBackend::Local {
                root: PathBuf::from("/var/lib/interntrack/blobs")
            }
        );
        assert_eq!(
            config.upload_dir(),
            PathBuf::from("/var/lib/interntrack/uploads")
        );
    }
}
