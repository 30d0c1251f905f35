//! Configuration management

use std::fmt;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::auth::DEFAULT_OAUTH_URL;
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving the configuration.
    /// Paths support ~ expansion. Loaded in order; later files override earlier.
    pub env_files: Vec<String>,
    /// Instance credentials
    pub credentials: Credentials,
    /// Data API settings
    pub api: ApiConfig,
    /// Endpoint catalog settings
    pub catalog: CatalogConfig,
}

/// Instance hostname and secrets
///
/// Blank values count as absent when deriving capabilities.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Instance hostname (e.g. `dev01-realm.example.com`)
    pub hostname: Option<String>,
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Business Manager user (log access)
    pub username: Option<String>,
    /// Business Manager password (log access)
    pub password: Option<String>,
    /// Default site selector for site-scoped endpoints
    pub site_id: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("site_id", &self.site_id)
            .finish()
    }
}

impl Credentials {
    /// Non-blank hostname
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        non_blank(self.hostname.as_ref())
    }

    /// Non-blank client id
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        non_blank(self.client_id.as_ref())
    }

    /// Non-blank client secret
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        non_blank(self.client_secret.as_ref())
    }

    /// Non-blank Business Manager username
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        non_blank(self.username.as_ref())
    }

    /// Non-blank Business Manager password
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        non_blank(self.password.as_ref())
    }

    /// Non-blank default site id
    #[must_use]
    pub fn site_id(&self) -> Option<&str> {
        non_blank(self.site_id.as_ref())
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Data API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OCAPI version segment (e.g. `v23_2`)
    pub version: String,
    /// OAuth2 token endpoint for the client-credentials grant
    pub oauth_url: String,
    /// Pre-issued bearer token; skips the client-credentials grant when set
    pub access_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: "v23_2".to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            access_token: None,
        }
    }
}

/// Endpoint catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file (JSON or YAML)
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/endpoints.json"),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Environment variables use the `OCAPI_TOOLS_` prefix with `__` as the
    /// nesting separator (`OCAPI_TOOLS_CREDENTIALS__HOSTNAME`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));

            // Env files can only come from the file itself; load them before
            // the environment layer is read.
            let files: Vec<String> = figment.extract_inner("env_files").unwrap_or_default();
            load_env_files(&files);
        }

        figment = figment.merge(Env::prefixed("OCAPI_TOOLS_").split("__"));

        figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

/// Load environment files into the process environment.
/// Supports ~ expansion. Files that don't exist are skipped.
fn load_env_files(files: &[String]) {
    for path_str in files {
        let expanded = if path_str.starts_with('~') {
            if let Some(home) = dirs::home_dir() {
                path_str.replacen('~', &home.display().to_string(), 1)
            } else {
                path_str.clone()
            }
        } else {
            path_str.clone()
        };

        let path = Path::new(&expanded);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(()) => {
                    tracing::info!("Loaded env file: {expanded}");
                }
                Err(e) => {
                    tracing::warn!("Failed to load env file {expanded}: {e}");
                }
            }
        } else {
            tracing::debug!("Env file not found (skipped): {expanded}");
        }
    }
}
