use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application title shown on every page.
    pub title: String,
    pub server_host: String,
    pub server_port: u16,
    /// Domain store (users, lists, tasks).
    pub database_url: String,
    /// Session store, kept in its own file.
    pub session_database_url: String,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidPort(String),
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => write!(f, "PORT must be a number, got {:?}", value),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be true or false, got {:?}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // accept the ":3000" listen-address form as well as a bare port
        let port = var("PORT", "3000");
        let server_port = port
            .trim()
            .trim_start_matches(':')
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;

        let secure = var("COOKIE_SECURE", "true");
        let cookie_secure = match secure.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                return Err(ConfigError::InvalidFlag {
                    name: "COOKIE_SECURE",
                    value: secure,
                })
            }
        };

        Ok(Self {
            title: var("TITLE", "To-Do"),
            server_host: var("SERVER_HOST", "127.0.0.1"),
            server_port,
            database_url: var("DATABASE_URL", "sqlite://config/database/models.db"),
            session_database_url: var(
                "SESSION_DATABASE_URL",
                "sqlite://config/database/sessions.db",
            ),
            cookie_secure,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

/// Directory that must exist before SQLite can create the file named by
/// `url`. `None` for in-memory databases and bare file names.
pub fn sqlite_parent_dir(url: &str) -> Option<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
