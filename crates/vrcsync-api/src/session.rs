use secrecy::SecretString;

/// Account credentials for the multiMATIC cloud.
///
/// `device_id` is the "smartphone id" the API binds auth tokens to.
/// Immutable once handed to the pipeline.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub device_id: String,
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(
        device_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Device-bound token triple returned by the token endpoint and
/// replayed on every authorize call.
#[derive(Debug, Clone)]
pub struct DeviceAuth {
    pub device_id: String,
    pub username: String,
    pub token: SecretString,
}

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Authentication state owned by a `RequestPipeline`.
///
/// The session cookie itself lives in the transport's cookie jar; this
/// struct tracks whether that cookie is believed valid and caches the
/// device token so a plain re-authorize does not need a new token.
///
/// `generation` increases on every successful login. Requests remember
/// the generation they ran under so a late 401 from an old session
/// cannot invalidate a newer one.
#[derive(Debug)]
pub(crate) struct Session {
    state: SessionState,
    device_auth: Option<DeviceAuth>,
    generation: u64,
}

impl Session {
    pub(crate) fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            device_auth: None,
            generation: 0,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn device_auth(&self) -> Option<&DeviceAuth> {
        self.device_auth.as_ref()
    }

    pub(crate) fn set_device_auth(&mut self, auth: DeviceAuth) {
        self.device_auth = Some(auth);
    }

    pub(crate) fn begin_login(&mut self) {
        self.state = SessionState::Authenticating;
    }

    pub(crate) fn mark_authenticated(&mut self) {
        self.state = SessionState::Authenticated;
        self.generation += 1;
    }

    pub(crate) fn mark_unauthenticated(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    /// Drop the session only if it is still the one `generation` refers to.
    /// Returns `true` when the session was actually invalidated.
    pub(crate) fn invalidate(&mut self, generation: u64) -> bool {
        if self.is_authenticated() && self.generation == generation {
            self.state = SessionState::Unauthenticated;
            return true;
        }
        false
    }

    /// Forget everything, including the cached device token.
    pub(crate) fn clear(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.device_auth = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> DeviceAuth {
        DeviceAuth {
            device_id: "phone-1".into(),
            username: "alice".into(),
            token: SecretString::from("tok".to_string()),
        }
    }

    #[test]
    fn stale_generation_does_not_invalidate() {
        let mut session = Session::new();
        session.set_device_auth(auth());
        session.mark_authenticated();
        let old = session.generation();

        session.mark_unauthenticated();
        session.mark_authenticated();

        assert!(!session.invalidate(old));
        assert!(session.is_authenticated());
        assert!(session.invalidate(session.generation()));
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn clear_drops_cached_token() {
        let mut session = Session::new();
        session.set_device_auth(auth());
        session.mark_authenticated();
        session.clear();
        assert!(session.device_auth().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("phone-1", "alice", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
