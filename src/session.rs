//! Operator session lifecycle.

/// Authenticated operator context read by every backend call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Display name returned by the login endpoint.
    pub operator_name: String,
    /// Store/site the operator works in.
    pub site_id: i64,
    /// Bearer token.
    pub access_token: String,
    /// Registration number, needed to end the session server-side.
    pub operator_matricula: String,
}

/// Holder with an explicit sign-in / sign-out lifecycle.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Option<Session>,
}

impl SessionState {
    pub fn sign_in(&mut self, session: Session) {
        tracing::info!(
            "signed in: {} (site {})",
            session.operator_name,
            session.site_id
        );
        self.current = Some(session);
    }

    /// Clear the session, returning it so the caller can end it server-side.
    pub fn sign_out(&mut self) -> Option<Session> {
        let prev = self.current.take();
        if let Some(s) = &prev {
            tracing::info!("signed out: {}", s.operator_name);
        }
        prev
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
pub(crate) fn test_session() -> Session {
    Session {
        operator_name: "Ana".into(),
        site_id: 7,
        access_token: "tok".into(),
        operator_matricula: "1234".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_then_out() {
        let mut st = SessionState::default();
        assert!(!st.is_signed_in());
        st.sign_in(test_session());
        assert_eq!(st.current().map(|s| s.site_id), Some(7));
        let prev = st.sign_out();
        assert_eq!(prev.map(|s| s.operator_matricula), Some("1234".to_string()));
        assert!(st.current().is_none());
        assert!(st.sign_out().is_none());
    }
}
