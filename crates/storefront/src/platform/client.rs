//! Shared HTTP plumbing for the row and auth APIs.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use url::Url;

use super::PlatformError;
use super::auth::AuthClient;
use super::query::TableQuery;
use crate::config::PlatformConfig;

/// Longest slice of an error body copied into logs.
const LOGGED_BODY_CHARS: usize = 500;

/// Client for the hosted platform.
///
/// Cheap to clone; all clones share one connection pool. The API key chosen
/// at construction (anon or service-role) is sent as `apikey` on every call
/// and doubles as the bearer token when no user token is supplied.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
}

struct PlatformClientInner {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

/// Error body returned by the row API.
#[derive(Debug, Default, Deserialize)]
struct RestErrorBody {
    code: Option<serde_json::Value>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl PlatformClient {
    /// Create a client that authenticates with the public anon key.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        Self::with_api_key(config, &config.anon_key)
    }

    /// Create a client that authenticates with an explicit API key
    /// (e.g. the service-role key used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_api_key(config: &PlatformConfig, api_key: &str) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(PlatformClientInner {
                http,
                base_url,
                api_key: api_key.to_string(),
            }),
        })
    }

    /// Start a query against a table of the row API.
    #[must_use]
    pub fn from(&self, table: &str) -> TableQuery<'_> {
        TableQuery::new(self, table)
    }

    /// Access the auth API.
    #[must_use]
    pub const fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(self)
    }

    /// Resolve a path relative to the platform base URL.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, PlatformError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Build a request carrying the API key and a bearer token.
    ///
    /// The bearer is the shopper's access token when given, otherwise the
    /// API key itself.
    pub(super) fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.api_key)
            .bearer_auth(bearer.unwrap_or(&self.inner.api_key))
    }
}

/// Pass a successful row API response through, or decode its error body.
pub(super) async fn check_rest(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    log_rejection(status, &text);

    let body: RestErrorBody = serde_json::from_str(&text).unwrap_or_default();
    Err(PlatformError::Api {
        status: status.as_u16(),
        code: body.code.map(|code| match code {
            serde_json::Value::String(code) => code,
            other => other.to_string(),
        }),
        message: body
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback_message(status, &text)),
        details: body.details,
        hint: body.hint,
    })
}

/// Pass a successful auth API response through, or decode its error body.
///
/// The auth API is not consistent about where it puts the message; look in
/// the known fields in order of specificity.
pub(super) async fn check_auth(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    log_rejection(status, &text);

    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| body.get(key).and_then(|v| v.as_str()).map(String::from))
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback_message(status, &text));

    Err(PlatformError::Auth {
        status: status.as_u16(),
        message,
    })
}

fn fallback_message(status: reqwest::StatusCode, text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| format!("HTTP {status}"), String::from)
    } else {
        trimmed.chars().take(200).collect()
    }
}

fn log_rejection(status: reqwest::StatusCode, text: &str) {
    let body: String = text.chars().take(LOGGED_BODY_CHARS).collect();
    if status.is_server_error() {
        tracing::error!(status = %status, body = %body, "Platform returned server error");
    } else {
        tracing::debug!(status = %status, body = %body, "Platform rejected request");
    }
}
