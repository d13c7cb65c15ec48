//! Authentication and default request headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};

pub use kinetic_config::Credentials;

use crate::error::{Error, Result};

/// `User-Agent` sent with every request.
pub const USER_AGENT_VALUE: &str = concat!("kinetic-sdk/", env!("CARGO_PKG_VERSION"));

/// The `Authorization` header value for a set of credentials.
pub fn authorization(credentials: &Credentials) -> Option<String> {
    match credentials {
        Credentials::None => None,
        Credentials::Basic { username, password } => {
            let encoded = STANDARD.encode(format!("{}:{}", username, password));
            Some(format!("Basic {}", encoded))
        }
        Credentials::Bearer { token } => Some(format!("Bearer {}", token)),
    }
}

/// Headers attached to every request: JSON accept/content type, the SDK
/// user agent, and the authorization header when credentials are present.
pub fn default_headers(credentials: &Credentials) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    if let Some(value) = authorization(credentials) {
        let mut value = HeaderValue::from_str(&value)
            .map_err(|_| Error::Config("credentials contain invalid header characters".into()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}
