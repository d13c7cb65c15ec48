//! HTTP client SDK for the Kinetic application platform.
//!
//! One [`KineticClient`] talks to one server and hands out façades for each
//! platform component. Every call goes through a shared transport that
//! follows redirects and retries gateway errors according to a [`Policy`];
//! HTTP error statuses come back as a [`Response`], not an error.
//!
//! # Example
//!
//! ```no_run
//! use kinetic_sdk::{KineticClient, Query, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = KineticClient::builder()
//!     .server("https://kinetic.example.com/kinetic")
//!     .space("acme")
//!     .basic_auth("admin", "password")
//!     .gateway_retry_limit(3)
//!     .build()?;
//!
//! // Search a form's submissions
//! let page = client
//!     .core()
//!     .submissions()
//!     .search_form("services", "intake", &Query::new().include("values").limit(25))
//!     .await?;
//! if page.is_success() {
//!     println!("{}", page.text());
//! }
//!
//! // Post to a discussion
//! client
//!     .discussions()
//!     .messages("d-123")
//!     .add("Work order approved")
//!     .await?
//!     .ensure_success()?;
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Core**: space, kapps, forms, submissions, users, teams, attribute
//!   definitions, webhooks, bridge models, security policies, space
//!   export/import
//! - **Task**: trees (XML export/import), handlers, sources, runs, engine
//! - **Discussions**: discussions, messages, invitations, participants,
//!   related items, live feed
//! - **File hub**: filestores and access keys
//! - **Integrator**: connections and operations
//! - **Agent**: bridges, handlers, filestores

pub mod api;
pub mod auth;
pub mod client;
pub mod compat;
pub mod content;
pub mod error;
pub mod export;
pub mod http;
pub mod logging;
pub mod parallel;

pub use api::{Collection, DiscussionEvent};
pub use auth::Credentials;
pub use client::{ClientBuilder, Endpoint, KineticClient};
pub use content::MessageContent;
pub use error::{Error, Result};
pub use export::ExportShape;
pub use http::{Budget, FormField, Policy, Query, RequestBody, Response};
pub use kinetic_config::SdkOptions;
