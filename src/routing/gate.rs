use tracing::debug;

use crate::session::{Session, SessionContext};
use crate::types::Role;

use super::{Navigation, RedirectReason, Route, LOGIN_PATH};

/// Outcome of checking the current session against a role set
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Granted(Session),
    Denied(RedirectReason),
}

/// Gate in front of every protected route partition.
///
/// Reads the session through the [`SessionContext`] and nothing else: no
/// network calls, no writes. Missing, malformed and wrong-role sessions all
/// send the visitor to the login route.
#[derive(Debug, Clone)]
pub struct AuthGate {
    session: SessionContext,
}

impl AuthGate {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub fn admit(&self, allowed: &[Role]) -> Admission {
        match self.session.current() {
            None => Admission::Denied(RedirectReason::NoSession),
            Some(session) if allowed.contains(&session.role()) => Admission::Granted(session),
            Some(session) => Admission::Denied(RedirectReason::RoleNotAllowed {
                role: session.role(),
            }),
        }
    }

    /// Render `route` unchanged if the session may enter it, otherwise redirect to login
    pub fn guard(&self, route: Route, allowed: &[Role]) -> Navigation {
        match self.admit(allowed) {
            Admission::Granted(session) => Navigation::Render {
                route,
                session: Some(session),
            },
            Admission::Denied(reason) => {
                debug!(route = %route, reason = %reason, "Auth gate redirect");
                Navigation::Redirect {
                    to: LOGIN_PATH.to_string(),
                    reason,
                }
            }
        }
    }
}
