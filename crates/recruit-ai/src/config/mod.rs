use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub interview: InterviewConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            interview: InterviewConfig::from_env()?,
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

/// Limits applied to live interview sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewConfig {
    /// Upper bound on a single audio-analysis call.
    pub analysis_timeout: Duration,
    /// Capacity of the per-connection outbound frame queue.
    pub outbound_buffer: usize,
    /// Inbound frames larger than this are refused.
    pub max_frame_bytes: usize,
    /// Directory for scratch audio files; `None` uses the system temp dir.
    pub audio_tmp_dir: Option<PathBuf>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            analysis_timeout: Duration::from_secs(30),
            outbound_buffer: 64,
            max_frame_bytes: 8 * 1024 * 1024,
            audio_tmp_dir: None,
        }
    }
}

impl InterviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let analysis_timeout = match env::var("INTERVIEW_ANALYSIS_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(parse_positive(
                "INTERVIEW_ANALYSIS_TIMEOUT_SECS",
                &raw,
            )?),
            Err(_) => defaults.analysis_timeout,
        };
        let outbound_buffer = match env::var("INTERVIEW_OUTBOUND_BUFFER") {
            Ok(raw) => parse_positive("INTERVIEW_OUTBOUND_BUFFER", &raw)? as usize,
            Err(_) => defaults.outbound_buffer,
        };
        let max_frame_bytes = match env::var("INTERVIEW_MAX_FRAME_BYTES") {
            Ok(raw) => parse_positive("INTERVIEW_MAX_FRAME_BYTES", &raw)? as usize,
            Err(_) => defaults.max_frame_bytes,
        };
        let audio_tmp_dir = env::var("INTERVIEW_AUDIO_TMP_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            analysis_timeout,
            outbound_buffer,
            max_frame_bytes,
            audio_tmp_dir,
        })
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a positive integer (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
