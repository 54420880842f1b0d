//! Server configuration for the REST API.
//!
//! Configuration comes from command line arguments with environment variable
//! fallbacks, or is built programmatically.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `VSTORE_SERVER_PORT` | 8080 | Server port |
//! | `VSTORE_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `VSTORE_LOG_LEVEL` | info | Log level |
//! | `VSTORE_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `VSTORE_ENABLE_CORS` | true | Enable CORS |
//! | `VSTORE_CORS_ORIGINS` | * | Allowed origins |
//! | `VSTORE_CORS_METHODS` | GET,POST,PUT,DELETE,OPTIONS | Allowed methods |
//! | `VSTORE_CORS_HEADERS` | Content-Type,Accept,If-Match,... | Allowed headers |
//! | `VSTORE_BASE_URL` | http://localhost:8080 | Server base URL |
//! | `VSTORE_STORAGE` | memory | Storage backend (memory, sqlite) |
//! | `VSTORE_DATABASE_URL` | vstore.db | SQLite database path |
//! | `VSTORE_UPDATE_CREATE` | true | Allow PUT to create absent resources |
//! | `VSTORE_DELETE_ENABLED` | true | Allow DELETE |
//! | `VSTORE_DELETE_RETURNS_OUTCOME` | false | Answer DELETE with 200 and an OperationOutcome |
//! | `VSTORE_DEFAULT_HISTORY_COUNT` | 100 | History entries returned without `_count` |
//! | `VSTORE_MAX_HISTORY_COUNT` | 1000 | Upper bound on `_count` |
//!
//! # Example
//!
//! ```rust
//! use helios_vstore_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     delete_enabled: false,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::{ArgAction, Parser, ValueEnum};

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// Volatile in-process store.
    Memory,
    /// SQLite database file.
    Sqlite,
}

/// Server configuration for the REST API.
#[derive(Debug, Clone, Parser)]
#[command(name = "vstore")]
#[command(about = "Versioned resource store with a REST interface")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "VSTORE_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "VSTORE_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "VSTORE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "VSTORE_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "VSTORE_ENABLE_CORS", action = ArgAction::Set, default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "VSTORE_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "VSTORE_CORS_METHODS",
        default_value = "GET,POST,PUT,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "VSTORE_CORS_HEADERS",
        default_value = "Content-Type,Accept,If-Match,If-None-Match,If-Modified-Since,Prefer"
    )]
    pub cors_headers: String,

    /// Base URL for the server (used in Location headers and Bundle links).
    #[arg(long, env = "VSTORE_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Storage backend.
    #[arg(long, env = "VSTORE_STORAGE", value_enum, default_value = "memory")]
    pub storage: StorageKind,

    /// SQLite database path.
    #[arg(long, env = "VSTORE_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Allow PUT to create a resource that does not exist.
    #[arg(long, env = "VSTORE_UPDATE_CREATE", action = ArgAction::Set, default_value = "true")]
    pub update_create_enabled: bool,

    /// Allow DELETE. When disabled DELETE answers 405.
    #[arg(long, env = "VSTORE_DELETE_ENABLED", action = ArgAction::Set, default_value = "true")]
    pub delete_enabled: bool,

    /// Answer a successful DELETE with 200 and an OperationOutcome instead of 204.
    #[arg(
        long,
        env = "VSTORE_DELETE_RETURNS_OUTCOME",
        action = ArgAction::Set,
        default_value = "false"
    )]
    pub delete_returns_outcome: bool,

    /// History entries returned when `_count` is absent.
    #[arg(long, env = "VSTORE_DEFAULT_HISTORY_COUNT", default_value = "100")]
    pub default_history_count: usize,

    /// Maximum accepted `_count` for history.
    #[arg(long, env = "VSTORE_MAX_HISTORY_COUNT", default_value = "1000")]
    pub max_history_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PUT,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Accept,If-Match,If-None-Match,If-Modified-Since,Prefer"
                .to_string(),
            base_url: "http://localhost:8080".to_string(),
            storage: StorageKind::Memory,
            database_url: None,
            update_create_enabled: true,
            delete_enabled: true,
            delete_returns_outcome: false,
            default_history_count: 100,
            max_history_count: 1000,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// Parses environment variables without requiring command line arguments.
    pub fn from_env() -> Self {
        Self::try_parse_from(["vstore"]).unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns the SQLite database path.
    pub fn database_path(&self) -> &str {
        self.database_url.as_deref().unwrap_or("vstore.db")
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_history_count == 0 {
            errors.push("Default history count cannot be 0".to_string());
        }

        if self.default_history_count > self.max_history_count {
            errors.push("Default history count cannot exceed max history count".to_string());
        }

        if url::Url::parse(&self.base_url).is_err() {
            errors.push(format!("Base URL is not a valid URL: {}", self.base_url));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0 and disables features that might interfere
    /// with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            enable_cors: false,
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            base_url: "http://localhost:0".to_string(),
            default_history_count: 10,
            max_history_count: 100,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.storage, StorageKind::Memory);
        assert!(config.update_create_enabled);
        assert!(config.delete_enabled);
        assert!(!config.delete_returns_outcome);
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            port: 3000,
            host: "0.0.0.0".to_string(),
            ..Default::default()
        };
        assert_eq!(config.socket_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_base_url_trims_slash() {
        let config = ServerConfig {
            base_url: "http://example.com/fhir/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://example.com/fhir");
    }

    #[test]
    fn test_validate_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().iter().any(|e| e.contains("Port")));
    }

    #[test]
    fn test_validate_invalid_history_counts() {
        let config = ServerConfig {
            default_history_count: 100,
            max_history_count: 50,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_base_url() {
        let config = ServerConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_args() {
        let config = ServerConfig::try_parse_from([
            "vstore",
            "--storage",
            "sqlite",
            "--database-url",
            "/tmp/v.db",
            "--delete-enabled",
            "false",
        ])
        .unwrap();
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.database_path(), "/tmp/v.db");
        assert!(!config.delete_enabled);
    }

    #[test]
    fn test_for_testing() {
        let config = ServerConfig::for_testing();
        assert_eq!(config.port, 0);
        assert!(!config.enable_cors);
        assert_eq!(config.default_history_count, 10);
    }
}
