use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;

use crate::error::AppError;
use crate::services::sheets::utils::extract_spreadsheet_id;

const DEFAULT_SHEET_NAME: &str = "Responses";
const DEFAULT_PORT: u16 = 8050;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Where the survey responses are read from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    GoogleSheets {
        spreadsheet_id: String,
        credentials_path: PathBuf,
    },
    Workbook {
        path: PathBuf,
    },
}

/// How unknown raw headers are treated by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    /// Unknown headers are dropped, missing ones are only fatal when a table needs them.
    #[default]
    Lenient,
    /// Every header of the rename table must be present.
    Strict,
}

/// What to do with yes/no answers that are neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagPolicy {
    #[default]
    Bucket,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub source: SourceConfig,
    pub sheet_name: String,
    pub fetch_timeout: Duration,
    pub header_policy: HeaderPolicy,
    pub flag_policy: FlagPolicy,
    pub avatar_path: Option<PathBuf>,
    pub contact: Contact,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let source = match get("RESPONSES_WORKBOOK") {
            Some(path) => SourceConfig::Workbook { path: path.into() },
            None => {
                let reference = get("SPREADSHEET_URL")
                    .or_else(|| get("SPREADSHEET_ID"))
                    .ok_or_else(|| {
                        AppError::Config(
                            "SPREADSHEET_URL or SPREADSHEET_ID is required unless RESPONSES_WORKBOOK is set"
                                .to_string(),
                        )
                    })?;
                let spreadsheet_id = extract_spreadsheet_id(&reference).ok_or_else(|| {
                    AppError::Config(format!("Not a spreadsheet reference: {}", reference))
                })?;
                let credentials_path = get("GOOGLE_SERVICE_ACCOUNT_FILE").ok_or_else(|| {
                    AppError::Config("GOOGLE_SERVICE_ACCOUNT_FILE is required".to_string())
                })?;
                SourceConfig::GoogleSheets {
                    spreadsheet_id,
                    credentials_path: credentials_path.into(),
                }
            }
        };

        let host = match get("HOST") {
            Some(host) => host
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid HOST {}: {}", host, e)))?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = match get("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid PORT {}: {}", port, e)))?,
            None => DEFAULT_PORT,
        };

        let fetch_timeout = match get("FETCH_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs.parse().map_err(|e| {
                    AppError::Config(format!("Invalid FETCH_TIMEOUT_SECS {}: {}", secs, e))
                })?;
                if secs == 0 {
                    return Err(AppError::Config(
                        "FETCH_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        };

        let header_policy = match get("STRICT_HEADERS").as_deref() {
            None => HeaderPolicy::Lenient,
            Some(value) => {
                if parse_bool(value)? {
                    HeaderPolicy::Strict
                } else {
                    HeaderPolicy::Lenient
                }
            }
        };

        let flag_policy = match get("FLAG_POLICY").map(|v| v.to_lowercase()).as_deref() {
            None | Some("bucket") => FlagPolicy::Bucket,
            Some("reject") => FlagPolicy::Reject,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "Invalid FLAG_POLICY {}: expected bucket or reject",
                    other
                )))
            }
        };

        Ok(Config {
            host,
            port,
            source,
            sheet_name: get("SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            fetch_timeout,
            header_policy,
            flag_policy,
            avatar_path: get("AVATAR_PATH").map(PathBuf::from),
            contact: Contact {
                name: get("CONTACT_NAME"),
                email: get("CONTACT_EMAIL"),
                phone: get("CONTACT_PHONE"),
            },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_bool(value: &str) -> Result<bool, AppError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::Config(format!("Invalid boolean value: {}", other))),
    }
}

pub fn load_config() -> Result<Config> {
    Config::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn workbook_source_uses_defaults() {
        let config = config_from(&[("RESPONSES_WORKBOOK", "data/responses.xlsx")]).unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Workbook {
                path: PathBuf::from("data/responses.xlsx")
            }
        );
        assert_eq!(config.sheet_name, "Responses");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8050");
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.header_policy, HeaderPolicy::Lenient);
        assert_eq!(config.flag_policy, FlagPolicy::Bucket);
        assert!(config.contact.is_empty());
    }

    #[test]
    fn google_source_extracts_id_from_url() {
        let config = config_from(&[
            (
                "SPREADSHEET_URL",
                "https://docs.google.com/spreadsheets/d/1SkSw85Hn0QMuDT5za4nNJmGMi2rujZqHPmq-zw28huM/edit#gid=1131511128",
            ),
            ("GOOGLE_SERVICE_ACCOUNT_FILE", "/secrets/client_secret.json"),
        ])
        .unwrap();
        assert_eq!(
            config.source,
            SourceConfig::GoogleSheets {
                spreadsheet_id: "1SkSw85Hn0QMuDT5za4nNJmGMi2rujZqHPmq-zw28huM".to_string(),
                credentials_path: PathBuf::from("/secrets/client_secret.json"),
            }
        );
    }

    #[test]
    fn google_source_requires_credentials() {
        let err = config_from(&[("SPREADSHEET_ID", "abc123")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("GOOGLE_SERVICE_ACCOUNT_FILE")));
    }

    #[test]
    fn missing_source_is_a_config_error() {
        assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
    }

    #[test]
    fn parses_overrides() {
        let config = config_from(&[
            ("RESPONSES_WORKBOOK", "r.xlsx"),
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("STRICT_HEADERS", "true"),
            ("FLAG_POLICY", "Reject"),
            ("SHEET_NAME", "Form Responses 1"),
            ("CONTACT_NAME", "Visitor Desk"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.header_policy, HeaderPolicy::Strict);
        assert_eq!(config.flag_policy, FlagPolicy::Reject);
        assert_eq!(config.sheet_name, "Form Responses 1");
        assert_eq!(config.contact.name.as_deref(), Some("Visitor Desk"));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(config_from(&[("RESPONSES_WORKBOOK", "r.xlsx"), ("PORT", "http")]).is_err());
        assert!(config_from(&[("RESPONSES_WORKBOOK", "r.xlsx"), ("FETCH_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("RESPONSES_WORKBOOK", "r.xlsx"), ("FLAG_POLICY", "drop")]).is_err());
        assert!(config_from(&[("RESPONSES_WORKBOOK", "r.xlsx"), ("STRICT_HEADERS", "maybe")]).is_err());
    }
}
