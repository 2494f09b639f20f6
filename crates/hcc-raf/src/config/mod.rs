use crate::model::{ModelError, ModelName};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_MODEL: &str = "CMS-HCC Model V28";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the scoring service and CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub reference: ReferenceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            reference: ReferenceConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where reference tables live and how calculations treat sparse requests.
#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub data_dir: PathBuf,
    pub default_model: ModelName,
    pub dx_to_cc_file: Option<String>,
    pub require_diagnoses: bool,
}

impl ReferenceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let data_dir = env::var("RAF_DATA_DIR").unwrap_or_else(|_| "data".to_string());

        let default_model = env::var("RAF_DEFAULT_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string())
            .parse::<ModelName>()
            .map_err(|source| ConfigError::InvalidModel { source })?;

        let dx_to_cc_file = env::var("RAF_DX_CC_FILE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let require_diagnoses = match env::var("RAF_REQUIRE_DIAGNOSES") {
            Ok(value) => parse_bool("RAF_REQUIRE_DIAGNOSES", &value)?,
            Err(_) => false,
        };

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            default_model,
            dx_to_cc_file,
            require_diagnoses,
        })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidModel { source: ModelError },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidModel { source } => {
                write!(f, "RAF_DEFAULT_MODEL is not a valid model name: {source}")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidFlag { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidModel { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDomain;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "RAF_DATA_DIR",
            "RAF_DEFAULT_MODEL",
            "RAF_DX_CC_FILE",
            "RAF_REQUIRE_DIAGNOSES",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.reference.data_dir, PathBuf::from("data"));
        assert_eq!(
            config.reference.default_model,
            ModelName::new(ModelDomain::CmsHcc, 28)
        );
        assert!(config.reference.dx_to_cc_file.is_none());
        assert!(!config.reference.require_diagnoses);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_reference_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RAF_DATA_DIR", "/srv/raf");
        env::set_var("RAF_DEFAULT_MODEL", "CMS-HCC ESRD Model V24");
        env::set_var("RAF_DX_CC_FILE", "ra_dx_to_cc_2025.csv");
        env::set_var("RAF_REQUIRE_DIAGNOSES", "yes");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.reference.data_dir, PathBuf::from("/srv/raf"));
        assert_eq!(
            config.reference.default_model,
            ModelName::new(ModelDomain::Esrd, 24)
        );
        assert_eq!(
            config.reference.dx_to_cc_file.as_deref(),
            Some("ra_dx_to_cc_2025.csv")
        );
        assert!(config.reference.require_diagnoses);
    }

    #[test]
    fn rejects_invalid_model_and_flag() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RAF_DEFAULT_MODEL", "CMS-HCC V28");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidModel { .. })
        ));

        reset_env();
        env::set_var("RAF_REQUIRE_DIAGNOSES", "sometimes");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag { name: "RAF_REQUIRE_DIAGNOSES", .. })
        ));
        reset_env();
    }
}
