use std::{env, sync::Arc};

#[derive(Clone, Debug)]
/// Configuration struct for the server.
///
/// This struct holds all the necessary configuration parameters
/// required to initialize and run the server.
/// It includes database connection details, the session cookie secret,
/// server host and port, number of worker threads, CORS settings
/// and logging preferences.
pub struct Config {
    // environment
    pub environment: String, // development, testing or production
    /// The URL of the database to connect to.
    pub database_url: String,
    /// Configuration for the session cookie.
    pub session_config: SessionConfig,
    /// The hostname or IP address the server will bind to.
    pub server_host: String,
    /// The port number the server will listen on.
    pub server_port: u16,
    /// The number of worker threads to spawn for handling requests.
    pub num_workers: usize,
    /// The allowed origin for CORS (Cross-Origin Resource Sharing).
    pub cors_allowed_origin: String,
    /// A boolean indicating whether console logging is enabled.
    pub console_logging_enabled: bool,
    /// Path of the log file written next to console output.
    pub log_file: String,
}

#[derive(Clone, Debug)]
/// Configuration for the signed session cookie.
///
/// The secret must be at least 64 bytes long; it is used both to sign
/// and to encrypt the cookie contents.
pub struct SessionConfig {
    /// The secret key used to sign and encrypt session cookies.
    pub secret: String,
    /// How long a remembered session stays valid, in days.
    pub ttl_days: i64,
}

/// Minimum number of secret bytes the cookie key derivation accepts.
pub const MIN_SECRET_LEN: usize = 64;

impl SessionConfig {
    /// Creates a new `SessionConfig` instance from environment variables.
    ///
    /// Reads the session configuration from environment variables:
    /// - `SECRET_KEY`: Required. At least 64 bytes.
    /// - `SESSION_TTL_DAYS`: Optional. Defaults to 365 days if not provided.
    ///
    /// # Panics
    ///
    /// This function will panic if:
    /// - `SECRET_KEY` environment variable is not set or is too short
    /// - `SESSION_TTL_DAYS` is set but cannot be parsed as a valid number
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let secret = env::var("SECRET_KEY").expect("SECRET_KEY must be set");
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "SECRET_KEY must be at least {} bytes long",
            MIN_SECRET_LEN
        );

        SessionConfig {
            secret,
            ttl_days: env::var("SESSION_TTL_DAYS")
                .unwrap_or_else(|_| "365".to_string())
                .parse()
                .expect("SESSION_TTL_DAYS must be a valid number"),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    ///
    /// # Environment Variables
    ///
    /// Required:
    /// - `DATABASE_URL`: Connection string for the database
    /// - `SECRET_KEY`: Secret for the session cookie (via `SessionConfig::from_env()`)
    ///
    /// Optional (with defaults):
    /// - `ENVIRONMENT`: development, testing or production (default: "development")
    /// - `IP`: Server host (default: "127.0.0.1")
    /// - `PORT`: Server port (default: 8000)
    /// - `WORKERS`: Number of worker threads (default: 4)
    /// - `CORS_ALLOWED_ORIGIN`: Allowed CORS origin (default: "http://localhost:3000")
    /// - `ENABLE_CONSOLE_LOGGING`: Whether to enable console logging (default: true)
    /// - `LOG_FILE`: Log file path (default: "subtrack.log")
    ///
    /// # Panics
    ///
    /// This function will panic if required environment variables are missing.
    pub fn from_env() -> Arc<Self> {
        dotenvy::dotenv().ok();

        Arc::new(Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            session_config: SessionConfig::from_env(),
            server_host: env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
            num_workers: env::var("WORKERS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            console_logging_enabled: env::var("ENABLE_CONSOLE_LOGGING")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                == "true",
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "subtrack.log".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Secure cookies everywhere except local development and test runs.
    pub fn cookie_secure(&self) -> bool {
        !matches!(self.environment.as_str(), "development" | "testing")
    }
}
