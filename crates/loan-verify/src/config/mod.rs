use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::verification::{MissingFieldPolicy, VerificationConfig};

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
    pub verification: VerificationConfig,
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
            verification: load_verification()?,
        })
    }
}

fn load_verification() -> Result<VerificationConfig, ConfigError> {
    let defaults = VerificationConfig::default();

    let salary_tolerance = match env::var("VERIFY_SALARY_TOLERANCE") {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0 && *value <= 1.0)
            .ok_or(ConfigError::InvalidSalaryTolerance { value: raw })?,
        Err(_) => defaults.salary_tolerance,
    };

    let annual_plausibility_floor = match env::var("VERIFY_ANNUAL_FLOOR") {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or(ConfigError::InvalidAnnualFloor { value: raw })?,
        Err(_) => defaults.annual_plausibility_floor,
    };

    let missing_ssn = match env::var("VERIFY_MISSING_SSN") {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "inconclusive" => MissingFieldPolicy::Inconclusive,
            "disqualifying" => MissingFieldPolicy::Disqualifying,
            _ => return Err(ConfigError::InvalidMissingSsnPolicy { value: raw }),
        },
        Err(_) => defaults.missing_ssn,
    };

    Ok(VerificationConfig {
        salary_tolerance,
        annual_plausibility_floor,
        missing_ssn,
    })
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSalaryTolerance { value: String },
    InvalidAnnualFloor { value: String },
    InvalidMissingSsnPolicy { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSalaryTolerance { value } => write!(
                f,
                "VERIFY_SALARY_TOLERANCE must be a fraction in (0, 1], got '{value}'"
            ),
            ConfigError::InvalidAnnualFloor { value } => write!(
                f,
                "VERIFY_ANNUAL_FLOOR must be a positive amount, got '{value}'"
            ),
            ConfigError::InvalidMissingSsnPolicy { value } => write!(
                f,
                "VERIFY_MISSING_SSN must be 'inconclusive' or 'disqualifying', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSalaryTolerance { .. }
            | ConfigError::InvalidAnnualFloor { .. }
            | ConfigError::InvalidMissingSsnPolicy { .. } => None,
        }
    }
}
