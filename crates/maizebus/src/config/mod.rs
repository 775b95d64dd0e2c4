use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Largest resume attachment accepted by the join form, in bytes.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

const DEFAULT_EMAIL_HOST: &str = "smtp.gmail.com";
const DEFAULT_EMAIL_PORT: u16 = 587;
const DEFAULT_EMAIL_TO: &str = "contact@maizebus.com";
const DEFAULT_PORT: u16 = 3001;

/// Origins that may always call the API from a browser.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "https://mbusdev.github.io",
];

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

    fn default_host(self) -> &'static str {
        match self {
            Self::Production => "0.0.0.0",
            Self::Development | Self::Test => "127.0.0.1",
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub mail: MailConfig,
    pub cors: CorsConfig,
    pub uploads: UploadConfig,
    pub frontend: FrontendConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment =
            AppEnvironment::from_str(&var("NODE_ENV").unwrap_or_else(|| "development".into()));

        let host = var("HOST").unwrap_or_else(|| environment.default_host().to_string());
        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort)?,
            None => DEFAULT_PORT,
        };

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let email_port = match var("EMAIL_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidEmailPort)?,
            None => DEFAULT_EMAIL_PORT,
        };
        let security = match var("EMAIL_SECURITY") {
            Some(raw) => SmtpSecurity::parse(&raw)?,
            None => SmtpSecurity::default(),
        };
        let credentials = match (var("EMAIL_USER"), var("EMAIL_PASS")) {
            (Some(username), Some(password)) => Some(SmtpCredentials { username, password }),
            _ => None,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            mail: MailConfig {
                credentials,
                host: var("EMAIL_HOST").unwrap_or_else(|| DEFAULT_EMAIL_HOST.to_string()),
                port: email_port,
                security,
                recipient: var("EMAIL_TO").unwrap_or_else(|| DEFAULT_EMAIL_TO.to_string()),
            },
            cors: CorsConfig::with_frontend_url(var("FRONTEND_URL")),
            uploads: UploadConfig {
                dir: var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("uploads")),
                max_bytes: MAX_RESUME_BYTES,
            },
            frontend: FrontendConfig {
                dist_dir: var("CLIENT_DIST")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("client/dist")),
            },
        })
    }
}

/// Reads an environment variable, treating blank values as unset.
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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

/// Outbound mail settings. `credentials` decides whether a dispatcher is built at all.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub credentials: Option<SmtpCredentials>,
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub recipient: String,
}

impl MailConfig {
    /// Sender address; the authenticated SMTP user doubles as the `From` identity.
    pub fn sender(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .map(|credentials| credentials.username.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587).
    #[default]
    StartTls,
    /// Implicit TLS from the first byte (port 465).
    Tls,
    /// No encryption; only for local relays.
    None,
}

impl SmtpSecurity {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            "none" | "plain" => Ok(Self::None),
            other => Err(ConfigError::InvalidEmailSecurity(other.to_string())),
        }
    }
}

impl fmt::Display for SmtpSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SmtpSecurity::StartTls => "starttls",
            SmtpSecurity::Tls => "tls",
            SmtpSecurity::None => "none",
        };
        f.write_str(label)
    }
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn with_frontend_url(frontend_url: Option<String>) -> Self {
        let mut allowed_origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS[..2]
            .iter()
            .map(|origin| origin.to_string())
            .collect();
        if let Some(url) = frontend_url {
            allowed_origins.push(url.trim_end_matches('/').to_string());
        }
        for origin in &DEFAULT_ALLOWED_ORIGINS[2..] {
            if !allowed_origins.iter().any(|existing| existing == origin) {
                allowed_origins.push(origin.to_string());
            }
        }

        Self { allowed_origins }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::with_frontend_url(None)
    }
}

/// Where accepted resumes are written and how large they may be.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// Location of the built single-page client.
#[derive(Debug, Clone)]
pub struct FrontendConfig {
    pub dist_dir: PathBuf,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEmailPort,
    InvalidEmailSecurity(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEmailPort => write!(f, "EMAIL_PORT must be a valid u16"),
            ConfigError::InvalidEmailSecurity(value) => write!(
                f,
                "EMAIL_SECURITY must be one of starttls, tls, none (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidEmailPort
            | ConfigError::InvalidEmailSecurity(_) => None,
        }
    }
}
