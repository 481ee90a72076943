use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Model identifier of the prebuilt text-extraction model.
pub const READ_MODEL_ID: &str = "prebuilt-read";

const DEFAULT_DOWNLOAD_BASE_DIR: &str = "/home/abbiebortz/my-project";

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub analyzer: AnalyzerConfig,
    pub download: DownloadConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    pub backend: AnalyzerBackend,
    pub azure: AzureConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerBackend {
    Azure,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.cognitiveservices.azure.com`.
    pub endpoint: String,
    pub api_key: Secret<String>,
    pub api_version: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Directory every downloaded file is written into.
    pub base_dir: PathBuf,
    /// Downloader executable, invoked without a shell.
    pub program: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub model_id: String,
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub max_wait_secs: u64,
}

impl AzureConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ExtractionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: AnalyzerBackend = get_env("ANALYZER_BACKEND", Some("azure"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The mock backend never talks to Azure, so credentials become optional.
        let credential_default = match backend {
            AnalyzerBackend::Azure => None,
            AnalyzerBackend::Mock => Some(""),
        };

        Ok(GatewayConfig {
            common: common_config,
            analyzer: AnalyzerConfig {
                backend,
                azure: AzureConfig {
                    endpoint: get_env("AZURE_ENDPOINT", credential_default, is_prod)?,
                    api_key: Secret::new(get_env("AZURE_API_KEY", credential_default, is_prod)?),
                    api_version: get_env("AZURE_API_VERSION", Some("2023-07-31"), is_prod)?,
                    request_timeout_secs: parse_env(
                        "AZURE_REQUEST_TIMEOUT_SECS",
                        Some("60"),
                        is_prod,
                    )?,
                },
            },
            download: DownloadConfig {
                base_dir: PathBuf::from(get_env(
                    "DOWNLOAD_BASE_DIR",
                    Some(DEFAULT_DOWNLOAD_BASE_DIR),
                    is_prod,
                )?),
                program: get_env("DOWNLOAD_PROGRAM", Some("wget"), is_prod)?,
                timeout_secs: parse_env("DOWNLOAD_TIMEOUT_SECS", Some("300"), is_prod)?,
            },
            extraction: ExtractionConfig {
                model_id: READ_MODEL_ID.to_string(),
                poll_interval_ms: parse_env("EXTRACT_POLL_INTERVAL_MS", Some("1000"), is_prod)?,
                max_poll_interval_ms: parse_env(
                    "EXTRACT_MAX_POLL_INTERVAL_MS",
                    Some("5000"),
                    is_prod,
                )?,
                max_wait_secs: parse_env("EXTRACT_MAX_WAIT_SECS", Some("120"), is_prod)?,
            },
        })
    }
}

impl FromStr for AnalyzerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure" => Ok(AnalyzerBackend::Azure),
            "mock" => Ok(AnalyzerBackend::Mock),
            _ => Err(format!("Invalid analyzer backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
    })
}
