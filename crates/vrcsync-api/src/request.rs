// Request / response shapes exchanged with the transport collaborator.
//
// Every multiMATIC reply uses the same `{ body, meta }` envelope; the
// transport strips the HTTP layer and hands back exactly that pair.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// HTTP verb of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One call against the cloud API.
///
/// `route` is relative to the API base URL and always starts with `/`.
/// Requests are authenticated by default; only the login handshake
/// opts out.
#[derive(Clone, PartialEq)]
pub struct Request {
    pub route: String,
    pub method: Method,
    pub payload: Option<Value>,
    pub authenticated: bool,
}

impl Request {
    pub fn get(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            method: Method::Get,
            payload: None,
            authenticated: true,
        }
    }

    pub fn post(route: impl Into<String>, payload: Value) -> Self {
        Self {
            route: route.into(),
            method: Method::Post,
            payload: Some(payload),
            authenticated: true,
        }
    }

    pub fn put(route: impl Into<String>, payload: Value) -> Self {
        Self {
            route: route.into(),
            method: Method::Put,
            payload: Some(payload),
            authenticated: true,
        }
    }

    /// Mark the request as usable without a session.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

// Payloads may carry the account password or the device token.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("route", &self.route)
            .field("method", &self.method)
            .field("payload", &self.payload.as_ref().map(|_| "<redacted>"))
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

/// A successful reply: HTTP status plus the unwrapped envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
    pub meta: Value,
}

/// Wire shape of every multiMATIC reply.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub meta: Value,
}
