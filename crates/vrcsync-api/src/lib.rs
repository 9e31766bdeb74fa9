//! Async client for the Vaillant multiMATIC (VRC9xx) cloud API.
//!
//! - [`Transport`] / [`HttpTransport`]: one request in, one unwrapped
//!   `{body, meta}` envelope out.
//! - [`RequestPipeline`]: session handling on top of a transport: login
//!   handshake, 401 invalidation, single-flight re-login.
//! - [`routes`]: builders for every endpoint the bridge uses.

pub mod error;
pub mod pipeline;
pub mod request;
pub mod routes;
pub mod session;
pub mod transport;

pub use error::Error;
pub use pipeline::RequestPipeline;
pub use request::{Method, Request, Response};
pub use session::{Credentials, DeviceAuth, SessionState};
pub use transport::{HttpTransport, TlsMode, Transport, TransportConfig};
