//! Connection file for Kinetic platform servers.
//!
//! Implements a kubeconfig-style file with named contexts:
//!
//! ```yaml
//! api-version: v1
//! kind: Connections
//!
//! current-context: dev
//!
//! defaults:
//!   log_level: warn
//!
//! contexts:
//!   - name: dev
//!     server: http://localhost:8080/kinetic
//!     space: acme
//!     auth:
//!       type: basic
//!       username: admin
//!       password-env: KINETIC_PASSWORD
//!   - name: task
//!     server: https://task.example.com/kinetic-task
//!     auth:
//!       type: bearer
//!       token-file: ~/.config/kinetic/task.token
//!     options:
//!       gateway_retry_limit: 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::options::{OptionsOverride, SdkOptions};
use crate::{ConfigError, Result};

/// API version for the connections file format.
pub const API_VERSION: &str = "v1";

/// Kind identifier for connections files.
pub const KIND: &str = "Connections";

/// Default connections filename.
const CONNECTIONS_FILE: &str = "connections.yaml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "kinetic";

/// Environment variable overriding the config directory.
const CONFIG_DIR_ENV: &str = "KINETIC_CONFIG_DIR";

// ─────────────────────────────────────────────────────────────────────────────
// Connections file
// ─────────────────────────────────────────────────────────────────────────────

/// Root connections file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionsFile {
    /// API version (always "v1" currently).
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// File kind (always "Connections").
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Name of the current/default context.
    #[serde(default)]
    pub current_context: Option<String>,

    /// Named connection contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,

    /// Options applied to every context before its own overrides.
    #[serde(default)]
    pub defaults: SdkOptions,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

impl ConnectionsFile {
    /// Create an empty connections file.
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            ..Default::default()
        }
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Get the current context, if set and valid.
    pub fn current(&self) -> Option<&Context> {
        self.current_context
            .as_ref()
            .and_then(|name| self.get_context(name))
    }

    /// Get a context by name.
    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn set_context(&mut self, context: Context) {
        if let Some(existing) = self.contexts.iter_mut().find(|c| c.name == context.name) {
            *existing = context;
        } else {
            self.contexts.push(context);
        }
    }

    /// Remove a context by name.
    pub fn remove_context(&mut self, name: &str) -> Option<Context> {
        let pos = self.contexts.iter().position(|c| c.name == name)?;
        if self.current_context.as_deref() == Some(name) {
            self.current_context = None;
        }
        Some(self.contexts.remove(pos))
    }

    /// Set the current context by name.
    pub fn use_context(&mut self, name: &str) -> Result<()> {
        if self.get_context(name).is_some() {
            self.current_context = Some(name.to_string());
            Ok(())
        } else {
            Err(ConfigError::ContextNotFound(name.to_string()))
        }
    }

    /// List all context names.
    pub fn context_names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).collect()
    }

    /// Resolve a named context into everything a client needs: server,
    /// space, credentials and merged options.
    pub fn resolve(&self, name: &str) -> Result<ResolvedConnection> {
        let context = self
            .get_context(name)
            .ok_or_else(|| ConfigError::ContextNotFound(name.to_string()))?;

        let credentials = match &context.auth {
            Some(auth) => auth.resolve()?,
            None => Credentials::None,
        };

        Ok(ResolvedConnection {
            server: context.server.clone(),
            space: context.space.clone(),
            credentials,
            options: self.defaults.clone().merged(&context.options),
        })
    }

    /// Resolve the current context.
    pub fn resolve_current(&self) -> Result<ResolvedConnection> {
        let name = self
            .current_context
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "current-context".to_string(),
                context: "connections file".to_string(),
            })?;
        self.resolve(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// A named connection context (server + space + auth bundle).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Context {
    /// Unique name for this context.
    pub name: String,

    /// Server URL (e.g., "https://kinetic.example.com/kinetic").
    pub server: String,

    /// Space slug, for space-scoped components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,

    /// Authentication configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfig>,

    /// Option overrides for this context.
    #[serde(default)]
    pub options: OptionsOverride,
}

impl Context {
    /// Create a new context with just a name and server URL.
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            space: None,
            auth: None,
            options: OptionsOverride::default(),
        }
    }

    /// Set the space slug.
    pub fn with_space(mut self, space: impl Into<String>) -> Self {
        self.space = Some(space.into());
        self
    }

    /// Set the auth configuration.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the option overrides.
    pub fn with_options(mut self, options: OptionsOverride) -> Self {
        self.options = options;
        self
    }
}

/// A context with its secrets read and its options merged.
#[derive(Debug, Clone)]
pub struct ResolvedConnection {
    pub server: String,
    pub space: Option<String>,
    pub credentials: Credentials,
    pub options: SdkOptions,
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

/// Credentials presented to the platform on every request.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

/// Authentication configuration for a context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AuthConfig {
    /// No authentication.
    None,

    /// HTTP Basic authentication.
    #[serde(rename_all = "kebab-case")]
    Basic {
        username: String,
        /// Inline password (not recommended).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        /// Path to file containing the password.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password_file: Option<PathBuf>,
        /// Environment variable containing the password.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password_env: Option<String>,
    },

    /// Bearer token authentication.
    #[serde(rename_all = "kebab-case")]
    Bearer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        /// Path to file containing the bearer token.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_file: Option<PathBuf>,
        /// Environment variable containing the token.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token_env: Option<String>,
    },
}

impl AuthConfig {
    /// Basic auth with the password read from an environment variable.
    pub fn basic_env(username: impl Into<String>, var: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: None,
            password_file: None,
            password_env: Some(var.into()),
        }
    }

    /// Bearer auth with the token read from a file.
    pub fn bearer_file(path: impl Into<PathBuf>) -> Self {
        Self::Bearer {
            token: None,
            token_file: Some(path.into()),
            token_env: None,
        }
    }

    /// Resolve the actual credential values.
    ///
    /// Secret lookup order: file, then environment variable, then inline.
    pub fn resolve(&self) -> Result<Credentials> {
        match self {
            AuthConfig::None => Ok(Credentials::None),

            AuthConfig::Basic {
                username,
                password,
                password_file,
                password_env,
            } => {
                let password = resolve_secret(
                    password_file.as_deref(),
                    password_env.as_deref(),
                    password.as_deref(),
                )?
                .ok_or_else(|| ConfigError::MissingField {
                    field: "password".to_string(),
                    context: format!("basic auth for '{}'", username),
                })?;
                Ok(Credentials::Basic {
                    username: username.clone(),
                    password,
                })
            }

            AuthConfig::Bearer {
                token,
                token_file,
                token_env,
            } => {
                let token = resolve_secret(
                    token_file.as_deref(),
                    token_env.as_deref(),
                    token.as_deref(),
                )?
                .ok_or_else(|| ConfigError::MissingField {
                    field: "token".to_string(),
                    context: "bearer auth".to_string(),
                })?;
                Ok(Credentials::Bearer { token })
            }
        }
    }
}

fn resolve_secret(
    file: Option<&Path>,
    env: Option<&str>,
    inline: Option<&str>,
) -> Result<Option<String>> {
    if let Some(path) = file {
        let expanded = expand_path(path);
        if expanded.exists() {
            let secret = std::fs::read_to_string(&expanded)
                .map_err(|e| ConfigError::ReadFile {
                    path: expanded.display().to_string(),
                    source: e,
                })?
                .trim()
                .to_string();
            return Ok(Some(secret));
        }
    }
    if let Some(var) = env
        && let Ok(value) = std::env::var(var)
        && !value.is_empty()
    {
        return Ok(Some(value));
    }
    Ok(inline.map(str::to_string))
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading / Saving
// ─────────────────────────────────────────────────────────────────────────────

/// Config directory: `$KINETIC_CONFIG_DIR`, else the platform config dir.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the path to the connections file.
pub fn connections_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONNECTIONS_FILE))
}

/// Load the connections file from its default location.
///
/// Returns an empty file if it doesn't exist.
pub fn load_connections() -> Result<ConnectionsFile> {
    load_connections_from(connections_path().as_deref())
}

/// Load connections from a specific path.
pub fn load_connections_from(path: Option<&Path>) -> Result<ConnectionsFile> {
    let Some(path) = path else {
        return Ok(ConnectionsFile::new());
    };

    if !path.exists() {
        return Ok(ConnectionsFile::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    ConnectionsFile::from_yaml(&contents)
}

/// Save connections to a specific path.
pub fn save_connections_to(config: &ConnectionsFile, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_yaml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Expand ~ to home directory in paths.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
