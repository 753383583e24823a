use serde::{Deserialize, Serialize};
use std::env;

use crate::auth::allowlist::AdminAllowlist;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Where the guard gets the caller's role from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionSource {
    /// Trust the signed session token claims.
    Token,
    /// Verify the token, then re-read the user row for the current role.
    Database,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub admin_allowlist: AdminAllowlist,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_cookie: String,
    pub session_source: SessionSource,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("HBM_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("ADMIN_EMAILS") {
            self.security.admin_allowlist = AdminAllowlist::parse(&v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE") {
            if !v.trim().is_empty() {
                self.security.session_cookie = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("SESSION_SOURCE") {
            self.security.session_source = match v.trim().to_ascii_lowercase().as_str() {
                "database" | "db" => SessionSource::Database,
                "token" | "jwt" => SessionSource::Token,
                other => {
                    tracing::warn!("Unknown SESSION_SOURCE '{}', keeping {:?}", other, self.security.session_source);
                    self.security.session_source
                }
            };
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                admin_allowlist: AdminAllowlist::default(),
                jwt_secret: String::new(),
                session_cookie: "hbm_session".to_string(),
                session_source: SessionSource::Token,
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                admin_allowlist: AdminAllowlist::default(),
                jwt_secret: String::new(),
                session_cookie: "hbm_session".to_string(),
                session_source: SessionSource::Database,
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.hbm.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                admin_allowlist: AdminAllowlist::default(),
                jwt_secret: String::new(),
                session_cookie: "hbm_session".to_string(),
                session_source: SessionSource::Database,
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://admin.hbm.com".to_string()],
            },
        }
    }

    /// Startup problems that should stop the process before it binds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.security.session_source == SessionSource::Database && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if crate::auth::session_expiry(chrono::Utc::now(), self.security.jwt_expiry_hours).is_err() {
            return Err(ConfigError::Invalid {
                key: "SECURITY_JWT_EXPIRY_HOURS",
                reason: format!("{} hours is not a usable session lifetime", self.security.jwt_expiry_hours),
            });
        }
        if self.is_production() && self.security.enable_cors {
            if let Some(origin) = self.security.cors_origins.iter().find(|o| !o.starts_with("https://")) {
                return Err(ConfigError::Invalid {
                    key: "SECURITY_CORS_ORIGINS",
                    reason: format!("production only allows https origins, got '{}'", origin),
                });
            }
        }
        if self.security.admin_allowlist.is_empty() {
            // Not fatal: every admin route will answer 403.
            tracing::warn!("ADMIN_EMAILS is empty; no caller can pass the admin allowlist");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
