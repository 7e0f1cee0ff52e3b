//! Configuration management

use std::{env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication and session configuration
    pub auth: AuthConfig,
    /// Revocation cache configuration
    pub revocation: RevocationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Authentication and session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT signing secret.
    /// Supports: literal value, `env:VAR_NAME`, or `auto` (generates a random
    /// secret at startup — sessions do not survive restart in that mode).
    pub jwt_secret: String,

    /// Access token lifetime (default: 1 day)
    #[serde(with = "humantime_serde")]
    pub access_ttl: Duration,

    /// Refresh token lifetime (default: 30 days)
    #[serde(with = "humantime_serde")]
    pub refresh_ttl: Duration,

    /// Also issue a 30-day refresh token alongside the access token
    pub refresh_enabled: bool,

    /// Paths that bypass the session gate (exact match)
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec![
        "/api".to_string(),
        "/api/auth/login".to_string(),
        "/api/auth/signup".to_string(),
        "/api/auth/refresh".to_string(),
    ]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "auto".to_string(),
            access_ttl: Duration::from_secs(24 * 60 * 60),
            refresh_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            refresh_enabled: false,
            public_paths: default_public_paths(),
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret (expand env vars, generate if `auto`).
    #[must_use]
    pub fn resolve_jwt_secret(&self) -> String {
        if self.jwt_secret == "auto" {
            use rand::RngExt;
            let random_bytes: [u8; 32] = rand::rng().random();
            base64::Engine::encode(
                &base64::engine::general_purpose::URL_SAFE_NO_PAD,
                random_bytes,
            )
        } else if let Some(var_name) = self.jwt_secret.strip_prefix("env:") {
            env::var(var_name).unwrap_or_else(|_| self.jwt_secret.clone())
        } else {
            self.jwt_secret.clone()
        }
    }
}

/// Revocation cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevocationConfig {
    /// How often the background reaper evicts expired blacklist entries
    #[serde(with = "humantime_serde")]
    pub reap_interval: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (NOTEVAULT_ prefix)
        figment = figment.merge(Env::prefixed("NOTEVAULT_").split("__"));

        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_design() {
        // GIVEN: default config
        let config = Config::default();

        // THEN: 1-day access token, 30-day refresh, refresh off by default
        assert_eq!(config.auth.access_ttl, Duration::from_secs(86_400));
        assert_eq!(config.auth.refresh_ttl, Duration::from_secs(2_592_000));
        assert!(!config.auth.refresh_enabled);
        assert!(
            config
                .auth
                .public_paths
                .contains(&"/api/auth/login".to_string())
        );
    }

    #[test]
    fn resolve_jwt_secret_literal() {
        let auth = AuthConfig {
            jwt_secret: "my-secret".to_string(),
            ..AuthConfig::default()
        };
        assert_eq!(auth.resolve_jwt_secret(), "my-secret");
    }

    #[test]
    fn resolve_jwt_secret_auto_generates_random() {
        let auth = AuthConfig {
            jwt_secret: "auto".to_string(),
            ..AuthConfig::default()
        };
        let a = auth.resolve_jwt_secret();
        let b = auth.resolve_jwt_secret();
        assert_ne!(a, "auto");
        // Two resolutions must not collide
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_jwt_secret_unset_env_var_falls_back_to_literal() {
        let auth = AuthConfig {
            jwt_secret: "env:NOTEVAULT_UNSET_TEST_SECRET".to_string(),
            ..AuthConfig::default()
        };
        assert_eq!(
            auth.resolve_jwt_secret(),
            "env:NOTEVAULT_UNSET_TEST_SECRET"
        );
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/notevault.yaml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
