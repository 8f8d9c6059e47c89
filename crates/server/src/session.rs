//! Session state binding transient connections to durable identities.

use muster_roster::ConnectionId;

/// Per-connection session state.
///
/// A session lives exactly as long as its connection. Seat ownership does
/// not: it is keyed by identity in the roster and survives the session.
#[derive(Debug, Clone)]
pub struct Session {
    pub connection: ConnectionId,
    /// Identity announced by the client, either via an explicit resume or
    /// as a side effect of its first claim. Absent until then.
    pub identity: Option<String>,
}

impl Session {
    /// Create a session for a freshly attached connection.
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            identity: None,
        }
    }

    /// Note the identity this connection speaks for.
    pub fn bind_identity(&mut self, identity: impl Into<String>) {
        self.identity = Some(identity.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_anonymous() {
        let session = Session::new(7);
        assert_eq!(session.connection, 7);
        assert!(session.identity.is_none());
    }

    #[test]
    fn test_bind_identity_replaces_prior() {
        let mut session = Session::new(7);
        session.bind_identity("Kirk");
        session.bind_identity("Spock");
        assert_eq!(session.identity.as_deref(), Some("Spock"));
    }
}
