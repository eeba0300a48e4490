//! Mutual-TLS HTTP transport backed by reqwest.
//!
//! Resolves request paths against the configured base URL, negotiates the
//! per-service vendor media type, and decodes the body by response
//! `Content-Type`: Atom/XML through quick-xml, JSON through serde_json.
//!
//! ```ignore
//! let config = TransportConfig::new("https://api.integrationstest.ladok.se")
//!     .with_identity(std::fs::read("client.p12")?, "secret")
//!     .with_environment(Environment::IntTest);
//! let transport = HttpTransport::new(&config)?;
//! ```

use ladok_core::{ApiError, TransportError};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("ladok-rs/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout, TLS handshake included.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Statuses the remote system uses for success.
const SUCCESS_STATUSES: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
    StatusCode::NOT_MODIFIED,
];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Remote deployment. Only changes where the event feed lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Test,
    IntTest,
}

impl Environment {
    pub fn feed_path(self) -> &'static str {
        match self {
            Environment::IntTest => "handelser/feed",
            Environment::Production | Environment::Test => "uppfoljning/feed",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            "int-test" | "inttest" | "integrationstest" => Ok(Environment::IntTest),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// API family behind a path prefix; selects the vendor media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Uppfoljning,
    Kataloginformation,
}

impl Service {
    pub fn name(self) -> &'static str {
        match self {
            Service::Uppfoljning => "uppfoljning",
            Service::Kataloginformation => "kataloginformation",
        }
    }

    pub fn accept(self, format: Format) -> String {
        format!("application/vnd.ladok-{}+{}", self.name(), format)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Xml => "xml",
        })
    }
}

/// Connection settings for [`HttpTransport`].
#[derive(Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub environment: Environment,
    /// PKCS#12 bundle holding the client certificate and key.
    pub certificate: Option<Vec<u8>>,
    pub password: String,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            environment: Environment::default(),
            certificate: None,
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_identity(mut self, pkcs12: Vec<u8>, password: impl Into<String>) -> Self {
        self.certificate = Some(pkcs12);
        self.password = password.into();
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url)
            .field("environment", &self.environment)
            .field("certificate", &self.certificate.as_ref().map(Vec::len))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Authenticated HTTP client for one remote deployment.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    environment: Environment,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        if config.base_url.is_empty() {
            return Err(TransportError::InvalidUrl("base URL must not be empty".into()));
        }

        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        // Relative joins replace the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout);

        if let Some(der) = &config.certificate {
            let identity = reqwest::Identity::from_pkcs12_der(der, &config.password)
                .map_err(|e| TransportError::Certificate(e.to_string()))?;
            builder = builder.identity(identity);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build client: {e}")))?;

        tracing::info!(base_url = %base_url, environment = ?config.environment, "transport ready");

        Ok(Self {
            client,
            base_url,
            environment: config.environment,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs one call and decodes the response into `T`.
    ///
    /// `path` is relative to the base URL. A request `body` is sent as JSON
    /// wrapped in a `{"data": ...}` envelope. A success status with an empty
    /// body (204, 304) has nothing to decode and yields
    /// [`TransportError::EmptyBody`]; use [`send`](Self::send) for those.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        accept: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, TransportError> {
        let (status, content_type, text) = self.execute(method, path, accept, body).await?;
        if text.trim().is_empty() {
            return Err(TransportError::EmptyBody {
                status: status.as_u16(),
            });
        }
        decode_body(&content_type, &text)
    }

    /// Like [`call`](Self::call) for requests whose response body is
    /// ignored. Any success status, body or not, is `Ok`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        accept: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), TransportError> {
        self.execute(method, path, accept, body).await.map(|_| ())
    }

    /// Sends the request and returns status, content type and body text of a
    /// success response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        accept: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(StatusCode, String, String), TransportError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))?;

        tracing::debug!(%method, %url, accept, "ladok request");

        let mut request = self
            .client
            .request(method, url.clone())
            .header(ACCEPT, accept);
        if let Some(body) = body {
            request = request.json(&serde_json::json!({ "data": body }));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("{url}: {e}")))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Request(format!("{url}: reading body: {e}")))?;

        if !SUCCESS_STATUSES.contains(&status) {
            tracing::debug!(%url, status = status.as_u16(), "ladok call failed");
            return Err(error_from_body(status, &content_type, &text));
        }

        Ok((status, content_type, text))
    }
}

/// Decodes a success body according to its media type.
pub fn decode_body<T: DeserializeOwned>(content_type: &str, body: &str) -> Result<T, TransportError> {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if media_type.ends_with("json") {
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
    } else if media_type.ends_with("xml") {
        quick_xml::de::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))
    } else {
        Err(TransportError::UnsupportedContentType(content_type.to_string()))
    }
}

/// Maps a failed response to the remote error body when one is present.
fn error_from_body(status: StatusCode, content_type: &str, body: &str) -> TransportError {
    if content_type.contains("json") {
        if let Ok(api) = serde_json::from_str::<ApiError>(body) {
            if !api.fel_uid.is_empty() || !api.meddelande.is_empty() {
                return TransportError::Api(api);
            }
        }
    }
    TransportError::Status {
        status: status.as_u16(),
    }
}
