// Authenticated request pipeline
//
// Every API call goes through `RequestPipeline::execute`. Authenticated
// requests first make sure the session is live (logging in if needed),
// and a 401 reply invalidates the session before the error is handed
// back. The pipeline never retries a failed call on its own; the only
// retry it performs is the single forced re-login inside the login
// bootstrap.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::SecretString;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::request::{Request, Response};
use crate::routes;
use crate::session::{Credentials, DeviceAuth, Session, SessionState};
use crate::transport::Transport;

/// Shared entry point for all API traffic.
///
/// The session sits behind an async mutex that is held for the whole
/// login handshake, so concurrent callers that find the session dead
/// wait for one login instead of racing their own.
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    session: Mutex<Session>,
    logins: AtomicU64,
}

impl RequestPipeline {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            session: Mutex::new(Session::new()),
            logins: AtomicU64::new(0),
        }
    }

    /// Execute a request, logging in first if it needs a session.
    pub async fn execute(&self, request: &Request) -> Result<Response, Error> {
        let generation = if request.authenticated {
            Some(self.ensure_session().await?)
        } else {
            None
        };

        match self.transport.execute(request).await {
            Ok(resp) => {
                debug!(
                    method = %request.method,
                    route = %request.route,
                    status = resp.status,
                    "request succeeded"
                );
                Ok(resp)
            }
            Err(e) => {
                if let (true, Some(generation)) = (e.is_auth_expired(), generation) {
                    if self.session.lock().await.invalidate(generation) {
                        warn!(route = %request.route, "session rejected by API, marked unauthenticated");
                    }
                }
                debug!(
                    method = %request.method,
                    route = %request.route,
                    status = ?e.status(),
                    "request failed"
                );
                Err(e)
            }
        }
    }

    /// Run the login handshake.
    ///
    /// With `force`, the cached device token and the transport state are
    /// discarded first so a rotated device identity is never replayed
    /// over a stale connection.
    pub async fn log_in(&self, force: bool) -> Result<(), Error> {
        let mut session = self.session.lock().await;
        if force {
            self.discard(&mut session)?;
        }
        self.log_in_locked(&mut session).await
    }

    /// End the session. Best-effort: the local session is cleared even
    /// if the API call fails.
    pub async fn log_out(&self) -> Result<(), Error> {
        let mut session = self.session.lock().await;
        let result = if session.is_authenticated() {
            self.transport.execute(&routes::logout()).await.map(|_| ())
        } else {
            Ok(())
        };
        session.clear();
        debug!("logged out");
        result
    }

    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    /// Number of successful logins since construction.
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    // ── Login internals ──────────────────────────────────────────────

    /// Returns the generation of the live session, logging in if needed.
    async fn ensure_session(&self) -> Result<u64, Error> {
        let mut session = self.session.lock().await;
        if !session.is_authenticated() {
            self.log_in_locked(&mut session).await?;
        }
        Ok(session.generation())
    }

    async fn log_in_locked(&self, session: &mut Session) -> Result<(), Error> {
        session.begin_login();

        let result = match self.authorize(session).await {
            Err(e) if e.is_auth_expired() => {
                warn!("authorize rejected, retrying once with a fresh device token");
                self.discard(session)?;
                session.begin_login();
                self.authorize(session).await
            }
            other => other,
        };

        match result {
            Ok(()) => {
                session.mark_authenticated();
                self.logins.fetch_add(1, Ordering::Relaxed);
                info!(username = %self.credentials.username, "logged in");
                Ok(())
            }
            Err(e) => {
                session.mark_unauthenticated();
                warn!(error = %e, "login failed");
                Err(e)
            }
        }
    }

    /// Obtain a device token if none is cached, then authorize with it.
    async fn authorize(&self, session: &mut Session) -> Result<(), Error> {
        let auth = if let Some(auth) = session.device_auth() {
            auth.clone()
        } else {
            let auth = self.request_device_token().await?;
            session.set_device_auth(auth.clone());
            auth
        };

        self.transport.execute(&routes::authenticate(&auth)).await?;
        Ok(())
    }

    async fn request_device_token(&self) -> Result<DeviceAuth, Error> {
        let resp = self
            .transport
            .execute(&routes::new_token(&self.credentials))
            .await?;

        let token = resp
            .body
            .get("authToken")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::Deserialization {
                message: "token response carries no authToken".into(),
                body: String::new(),
            })?;

        debug!("device token issued");
        Ok(DeviceAuth {
            device_id: self.credentials.device_id.clone(),
            username: self.credentials.username.clone(),
            token: SecretString::from(token.to_owned()),
        })
    }

    fn discard(&self, session: &mut Session) -> Result<(), Error> {
        session.clear();
        self.transport.reset()
    }
}
