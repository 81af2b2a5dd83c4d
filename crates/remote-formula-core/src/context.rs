//! Authorization session and execution context.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authorized session returned by a successful login exchange.
///
/// Lives only for one invocation. It is never persisted and never refreshed:
/// once the token expires the next authorized call fails.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token sent as `x-authorization`.
    pub token: String,
    /// Token lifetime in seconds, as reported by the server.
    #[serde(default)]
    pub ttl: u64,
}

impl Session {
    /// Create a session from a token and its lifetime.
    #[must_use]
    pub fn new(token: impl Into<String>, ttl: u64) -> Self {
        Self {
            token: token.into(),
            ttl,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Named scope under which formulas, commands and credentials are evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Context {
    /// Context name, sent as `x-ctx`.
    pub name: String,
}

impl Context {
    /// Create a context by name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Context name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("secret-token", 3600);
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("3600"));
    }

    #[test]
    fn test_session_decodes_without_ttl() {
        let session: Session = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.ttl, 0);
    }
}
