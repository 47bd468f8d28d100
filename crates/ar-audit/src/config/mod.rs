use crate::workflows::receivables::cutoff::parse_document_date;
use crate::workflows::receivables::ScoringPolicy;
use chrono::NaiveDate;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_FISCAL_YEAR_END: &str = "2024-12-31";

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub audit: AuditConfig,
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

        let audit = AuditConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            audit,
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

/// Engagement parameters shared by the cut-off test and the risk assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Inclusive upper bound of the period under audit.
    pub fiscal_year_end: NaiveDate,
    pub risk_policy: ScoringPolicy,
}

impl AuditConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_year_end = env::var("APP_FISCAL_YEAR_END")
            .unwrap_or_else(|_| DEFAULT_FISCAL_YEAR_END.to_string());
        let fiscal_year_end = parse_document_date(&raw_year_end)
            .ok_or(ConfigError::InvalidFiscalYearEnd {
                value: raw_year_end.clone(),
            })?;

        let risk_policy = match env::var("APP_RISK_POLICY") {
            Ok(raw) => ScoringPolicy::parse(&raw)
                .ok_or_else(|| ConfigError::InvalidRiskPolicy { value: raw.clone() })?,
            Err(_) => ScoringPolicy::default(),
        };

        Ok(Self {
            fiscal_year_end,
            risk_policy,
        })
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            fiscal_year_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            risk_policy: ScoringPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFiscalYearEnd { value: String },
    InvalidRiskPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFiscalYearEnd { value } => write!(
                f,
                "APP_FISCAL_YEAR_END must be a YYYY-MM-DD date, got '{value}'"
            ),
            ConfigError::InvalidRiskPolicy { value } => write!(
                f,
                "APP_RISK_POLICY must be heuristic, model_preferred or heuristic_floor, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFiscalYearEnd { .. }
            | ConfigError::InvalidRiskPolicy { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_FISCAL_YEAR_END");
        env::remove_var("APP_RISK_POLICY");
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
        assert_eq!(
            config.audit.fiscal_year_end,
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
        );
        assert_eq!(config.audit.risk_policy, ScoringPolicy::HeuristicFloor);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_audit_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FISCAL_YEAR_END", "2025-06-30");
        env::set_var("APP_RISK_POLICY", "model_preferred");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.audit.fiscal_year_end,
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
        );
        assert_eq!(config.audit.risk_policy, ScoringPolicy::ModelPreferred);
        reset_env();
    }

    #[test]
    fn rejects_malformed_audit_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_FISCAL_YEAR_END", "end of year");
        match AppConfig::load() {
            Err(ConfigError::InvalidFiscalYearEnd { value }) => assert_eq!(value, "end of year"),
            other => panic!("expected invalid fiscal year end, got {other:?}"),
        }

        reset_env();
        env::set_var("APP_RISK_POLICY", "coin_flip");
        match AppConfig::load() {
            Err(ConfigError::InvalidRiskPolicy { value }) => assert_eq!(value, "coin_flip"),
            other => panic!("expected invalid risk policy, got {other:?}"),
        }
        reset_env();
    }
}
