pub mod store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::types::{RecordId, Role};

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

/// Store key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Store key holding the user record as JSON
pub const USER_KEY: &str = "user";

/// User record cached alongside the token.
///
/// Only `role` is mandatory; the other fields are informational and default
/// when the backend omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Client-held proof of authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn display_name(&self) -> &str {
        if !self.user.name.is_empty() {
            &self.user.name
        } else {
            &self.user.email
        }
    }
}

/// The one read/write path over the session store.
///
/// Everything that needs to know who is logged in (the auth gate, the API
/// client, the layout shells) goes through this type. Cloning is cheap and
/// all clones observe the same store.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Read the current session.
    ///
    /// Returns `None` when the token is missing or empty, when the user entry
    /// is missing or does not parse, or when the store itself cannot be read.
    pub fn current(&self) -> Option<Session> {
        let token = match self.store.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => {
                debug!("No session token stored");
                return None;
            }
            Err(e) => {
                warn!("Session store unreadable, treating as logged out: {}", e);
                return None;
            }
        };

        let raw_user = match self.store.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Session token present without a user record");
                return None;
            }
            Err(e) => {
                warn!("Session store unreadable, treating as logged out: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<SessionUser>(&raw_user) {
            Ok(user) => Some(Session { token, user }),
            Err(e) => {
                debug!("Stored user record does not parse: {}", e);
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|session| session.token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Persist a freshly issued session (login)
    pub fn establish(&self, session: &Session) -> Result<(), ClientError> {
        let user = serde_json::to_string(&session.user)?;
        self.store.set(TOKEN_KEY, &session.token)?;
        self.store.set(USER_KEY, &user)?;
        info!(role = %session.user.role, email = %session.user.email, "Session established");
        Ok(())
    }

    /// Drop both the token and the user record (logout)
    pub fn clear(&self) -> Result<(), ClientError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        info!("Session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(entries: &[(&str, &str)]) -> SessionContext {
        let store = MemorySessionStore::with_entries(entries.iter().copied());
        SessionContext::new(Arc::new(store))
    }

    #[test]
    fn minimal_user_record_is_a_session() {
        let ctx = context_with(&[("token", "t1"), ("user", r#"{"role":"Doctor"}"#)]);
        let session = ctx.current().expect("session");
        assert_eq!(session.token, "t1");
        assert_eq!(session.role(), Role::Doctor);
    }

    #[test]
    fn token_without_parsable_user_is_no_session() {
        assert!(context_with(&[("token", "t1")]).current().is_none());
        assert!(context_with(&[("token", "t1"), ("user", "{oops")]).current().is_none());
        assert!(context_with(&[("token", "t1"), ("user", r#"{"role":"Nurse"}"#)])
            .current()
            .is_none());
    }

    #[test]
    fn empty_token_is_no_session() {
        let ctx = context_with(&[("token", "  "), ("user", r#"{"role":"Admin"}"#)]);
        assert!(ctx.current().is_none());
    }

    #[test]
    fn establish_then_clear() {
        let ctx = SessionContext::in_memory();
        let session = Session {
            token: "abc".into(),
            user: SessionUser {
                id: Some(RecordId::Int(3)),
                email: "p@clinic.test".into(),
                role: Role::Patient,
                name: "Pat".into(),
                image: None,
            },
        };
        ctx.establish(&session).unwrap();
        assert_eq!(ctx.current(), Some(session));

        ctx.clear().unwrap();
        assert!(ctx.current().is_none());
        assert!(ctx.token().is_none());
    }
}
