//! Configuration for the Kinetic platform SDK.
//!
//! Provides:
//! - [`SdkOptions`]: the options bag every client carries (logging, redirect
//!   and gateway-retry policy, TLS verification, export directory)
//! - A kubeconfig-style connections file with named contexts
//!   (server + space + auth + option overrides)
//! - Credential resolution from files, environment variables or inline values

pub mod connections;
pub mod error;
pub mod options;

pub use connections::{
    config_dir, connections_path, load_connections, load_connections_from, save_connections_to,
    AuthConfig, ConnectionsFile, Context, Credentials, ResolvedConnection,
};
pub use error::{ConfigError, Result};
pub use options::{LogLevel, LogOutput, OptionsOverride, SdkOptions, SslVerifyMode};
