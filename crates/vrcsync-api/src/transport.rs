// HTTP transport for the multiMATIC cloud API.
//
// The pipeline only talks to the `Transport` trait; `HttpTransport` is
// the reqwest-backed implementation. It owns TLS, timeouts, the session
// cookie jar and base-URL composition, and unwraps the `{body, meta}`
// envelope.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::request::{Envelope, Method, Request, Response};

/// Executes a single [`Request`] against the API.
///
/// Implementations map HTTP 401 to [`Error::Authentication`], any other
/// non-2xx to [`Error::Api`] and network failures to
/// [`Error::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &Request) -> Result<Response, Error>;

    /// Drop connection and cookie state. Called before a forced re-login.
    fn reset(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (test rigs, intercepting proxies).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vrcsync/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

/// reqwest implementation of [`Transport`].
///
/// The client sits behind a lock so [`reset`](Transport::reset) can swap
/// in a fresh one (new cookie jar, new connection pool) without
/// disturbing requests already in flight.
pub struct HttpTransport {
    base_url: Url,
    config: TransportConfig,
    http: RwLock<reqwest::Client>,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url` (e.g. [`crate::routes::BASE_URL`]).
    pub fn new(base_url: Url, config: TransportConfig) -> Result<Self, Error> {
        let http = config.clone().with_cookie_jar().build_client()?;
        Ok(Self {
            base_url,
            config,
            http: RwLock::new(http),
        })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn client(&self) -> reqwest::Client {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Join a route onto the base URL: `{base}{route}`.
    fn url_for(&self, route: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let route = route.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{route}"))?)
    }

    async fn parse_envelope(resp: reqwest::Response) -> Result<Response, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "session expired or invalid credentials (HTTP 401)".into(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(Response {
                status: status.as_u16(),
                ..Response::default()
            });
        }

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        Ok(Response {
            status: status.as_u16(),
            body: envelope.body,
            meta: envelope.meta,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &Request) -> Result<Response, Error> {
        let url = self.url_for(&request.route)?;
        let http = self.client();

        debug!(method = %request.method, route = %request.route, "sending request");

        let builder = match request.method {
            Method::Get => http.get(url),
            Method::Post => http.post(url),
            Method::Put => http.put(url),
            Method::Delete => http.delete(url),
        };
        let builder = match request.payload {
            Some(ref payload) => builder.json(payload),
            None => builder,
        };

        let resp = builder.send().await?;
        debug!(
            method = %request.method,
            route = %request.route,
            status = resp.status().as_u16(),
            "response received"
        );

        Self::parse_envelope(resp).await
    }

    fn reset(&self) -> Result<(), Error> {
        let fresh = self.config.clone().with_cookie_jar().build_client()?;
        *self.http.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        trace!("transport reset with a fresh cookie jar");
        Ok(())
    }
}

/// First 200 characters of a body, for error messages.
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
