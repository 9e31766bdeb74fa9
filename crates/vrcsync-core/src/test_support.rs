// In-memory transport for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use vrcsync_api::{Credentials, Error, Method, Request, RequestPipeline, Response, Transport};

/// Answers the login handshake itself and every other route from a table.
/// Unknown routes get an empty `200`.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, Result<Response, u16>>>,
    log: Mutex<Vec<Request>>,
    latency: Mutex<Duration>,
}

#[allow(clippy::unwrap_used)]
impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, route: &str, body: Value) {
        self.respond_with_meta(route, body, json!({}));
    }

    pub(crate) fn respond_with_meta(&self, route: &str, body: Value, meta: Value) {
        self.replies.lock().unwrap().insert(
            route.to_owned(),
            Ok(Response {
                status: 200,
                body,
                meta,
            }),
        );
    }

    pub(crate) fn fail(&self, route: &str, status: u16) {
        self.replies
            .lock()
            .unwrap()
            .insert(route.to_owned(), Err(status));
    }

    /// Simulated round-trip time for every non-login call.
    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Every `PUT` seen so far, in order.
    pub(crate) fn writes(&self) -> Vec<Request> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == Method::Put)
            .cloned()
            .collect()
    }

    pub(crate) fn count(&self, route: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.route == route)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    #[allow(clippy::unwrap_used)]
    async fn execute(&self, request: &Request) -> Result<Response, Error> {
        self.log.lock().unwrap().push(request.clone());

        if request.route.starts_with("/account/authentication") {
            return Ok(Response {
                status: 200,
                body: json!({ "authToken": "test-token" }),
                meta: json!({}),
            });
        }

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let reply = self.replies.lock().unwrap().get(&request.route).cloned();
        match reply {
            Some(Ok(resp)) => Ok(resp),
            Some(Err(status)) => Err(Error::Api {
                status,
                message: format!("scripted failure for {}", request.route),
            }),
            None => Ok(Response {
                status: 200,
                ..Response::default()
            }),
        }
    }
}

pub(crate) fn pipeline(transport: &Arc<ScriptedTransport>) -> Arc<RequestPipeline> {
    Arc::new(RequestPipeline::new(
        Arc::clone(transport) as Arc<dyn Transport>,
        Credentials::new("test-device", "tester", "secret"),
    ))
}
