//! Environment configuration shared by the service binaries.

use std::env;
use std::time::Duration;

use log::warn;
use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "partyplanner";
pub const DEFAULT_UPLOAD_FOLDER: &str = "events";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_JWT_SECRET: &str = "partyplanner-dev-secret";
pub const DEFAULT_EDITOR_IDLE_TTL: Duration = Duration::from_secs(30 * 60);
/// Hosts card images may be fetched from besides `PUBLIC_BASE_URL`
pub const DEFAULT_IMAGE_HOSTS: &[&str] = &["res.cloudinary.com"];

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("AUTH_JWT_SECRET must be set when running in AWS Lambda")]
    MissingJwtSecret,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

impl CloudinaryConfig {
    pub fn is_complete(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `/Prod` unless `REMOVE_BASE_PATH=true`
    pub route_prefix: String,
    pub port: u16,
    pub lambda: bool,
    pub table_name: String,
    /// `None` when `AUTH_JWT_SECRET` is unset
    pub jwt_secret: Option<String>,
    pub public_base_url: String,
    /// `EDITOR_IDLE_SECS`, how long an untouched editor session is kept
    pub editor_idle_ttl: Duration,
    /// `IMAGE_HOSTS`, comma separated
    pub image_hosts: Vec<String>,
    pub cloudinary: CloudinaryConfig,
}

impl AppConfig {
    pub fn from_env(default_port: u16) -> Self {
        Self::from_lookup(default_port, |key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let remove_base_path = get("REMOVE_BASE_PATH")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let port = match get("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid PORT value '{}'", raw);
                default_port
            }),
            None => default_port,
        };

        let editor_idle_ttl = match get("EDITOR_IDLE_SECS") {
            Some(raw) => raw.parse().map(Duration::from_secs).unwrap_or_else(|_| {
                warn!("Ignoring invalid EDITOR_IDLE_SECS value '{}'", raw);
                DEFAULT_EDITOR_IDLE_TTL
            }),
            None => DEFAULT_EDITOR_IDLE_TTL,
        };

        let image_hosts = match get("IMAGE_HOSTS") {
            Some(raw) => raw
                .split(',')
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            None => DEFAULT_IMAGE_HOSTS.iter().map(|h| h.to_string()).collect(),
        };

        Self {
            route_prefix: if remove_base_path { "" } else { "/Prod" }.to_string(),
            port,
            lambda: get("AWS_LAMBDA_FUNCTION_NAME").is_some(),
            table_name: get("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            jwt_secret: get("AUTH_JWT_SECRET"),
            public_base_url: get("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            editor_idle_ttl,
            image_hosts,
            cloudinary: CloudinaryConfig {
                cloud_name: get("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                api_key: get("CLOUDINARY_API_KEY").unwrap_or_default(),
                api_secret: get("CLOUDINARY_API_SECRET").unwrap_or_default(),
                folder: get("UPLOAD_FOLDER").unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string()),
            },
        }
    }

    /// Secret for verifying bearer tokens. Outside Lambda a missing secret
    /// falls back to the development one; inside Lambda it is an error.
    pub fn jwt_secret(&self) -> Result<&str, ConfigError> {
        match (&self.jwt_secret, self.lambda) {
            (Some(secret), _) => Ok(secret.as_str()),
            (None, true) => Err(ConfigError::MissingJwtSecret),
            (None, false) => {
                warn!("AUTH_JWT_SECRET not set, using the development secret");
                Ok(DEFAULT_JWT_SECRET)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(3000, |k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.route_prefix, "/Prod");
        assert_eq!(cfg.port, 3000);
        assert!(!cfg.lambda);
        assert_eq!(cfg.table_name, "partyplanner");
        assert_eq!(cfg.jwt_secret(), Ok(DEFAULT_JWT_SECRET));
        assert_eq!(cfg.editor_idle_ttl, Duration::from_secs(1800));
        assert_eq!(cfg.image_hosts, vec!["res.cloudinary.com".to_string()]);
        assert_eq!(cfg.public_base_url, "http://localhost:3000");
        assert_eq!(cfg.cloudinary.folder, "events");
        assert!(!cfg.cloudinary.is_complete());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("REMOVE_BASE_PATH", "TRUE"),
            ("PORT", "8080"),
            ("AWS_LAMBDA_FUNCTION_NAME", "invite"),
            ("PUBLIC_BASE_URL", "https://festa.example/"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
            ("AUTH_JWT_SECRET", "s3cret"),
            ("EDITOR_IDLE_SECS", "90"),
            ("IMAGE_HOSTS", "res.cloudinary.com, CDN.Example ,"),
        ]);
        assert_eq!(cfg.route_prefix, "");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.lambda);
        assert_eq!(cfg.public_base_url, "https://festa.example");
        assert!(cfg.cloudinary.is_complete());
        assert_eq!(cfg.jwt_secret(), Ok("s3cret"));
        assert_eq!(cfg.editor_idle_ttl, Duration::from_secs(90));
        assert_eq!(cfg.image_hosts, vec!["res.cloudinary.com", "cdn.example"]);
    }

    #[test]
    fn lambda_requires_a_jwt_secret() {
        let cfg = config(&[("AWS_LAMBDA_FUNCTION_NAME", "invite")]);
        assert_eq!(cfg.jwt_secret(), Err(ConfigError::MissingJwtSecret));
    }

    #[test]
    fn bad_port_falls_back() {
        assert_eq!(config(&[("PORT", "http")]).port, 3000);
    }
}
