use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ClientError;
use crate::routing::{Navigation, RedirectReason, LOGIN_PATH};
use crate::session::{Session, SessionContext};
use crate::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

const ADMIN_LINKS: &[NavLink] = &[
    NavLink { label: "Dashboard", path: "/admin/dashboard" },
    NavLink { label: "Users", path: "/admin/users" },
    NavLink { label: "Doctors", path: "/admin/doctors" },
    NavLink { label: "Specialties", path: "/admin/specialties" },
    NavLink { label: "Appointments", path: "/admin/appointments" },
];

const DOCTOR_LINKS: &[NavLink] = &[
    NavLink { label: "Dashboard", path: "/doctor/dashboard" },
    NavLink { label: "Appointments", path: "/doctor/appointments" },
    NavLink { label: "Availability", path: "/doctor/availability" },
    NavLink { label: "Profile", path: "/doctor/profile" },
];

const PATIENT_LINKS: &[NavLink] = &[
    NavLink { label: "Dashboard", path: "/patient/dashboard" },
    NavLink { label: "Search Doctors", path: "/patient/search" },
    NavLink { label: "Appointments", path: "/patient/appointments" },
    NavLink { label: "Profile", path: "/patient/profile" },
];

/// Shared chrome for one role partition: title, navigation and logout.
///
/// Shells assume the auth gate already admitted the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutShell {
    role: Role,
}

impl LayoutShell {
    pub fn for_role(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn title(&self) -> &'static str {
        match self.role {
            Role::Admin => "Admin Panel",
            Role::Doctor => "Doctor Panel",
            Role::Patient => "Patient Panel",
        }
    }

    pub fn links(&self) -> &'static [NavLink] {
        match self.role {
            Role::Admin => ADMIN_LINKS,
            Role::Doctor => DOCTOR_LINKS,
            Role::Patient => PATIENT_LINKS,
        }
    }

    /// Clear the session and send the visitor back to login
    pub fn logout(&self, session: &SessionContext) -> Result<Navigation, ClientError> {
        session.clear()?;
        Ok(Navigation::Redirect {
            to: LOGIN_PATH.to_string(),
            reason: RedirectReason::LoggedOut,
        })
    }

    /// Text rendering of the chrome around `body`, marking `active_path`
    pub fn render(&self, session: &Session, active_path: &str, body: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("== {} ==  ({})\n", self.title(), session.display_name()));
        for link in self.links() {
            let marker = if link.path == active_path { '*' } else { ' ' };
            out.push_str(&format!(" {} {:<16} {}\n", marker, link.label, link.path));
        }
        out.push_str("   Logout\n");
        out.push_str(&"-".repeat(40));
        out.push('\n');
        out.push_str(body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self, session: &Session, active_path: &str, body: Value) -> Value {
        json!({
            "layout": self.title(),
            "user": session.user,
            "active": active_path,
            "links": self.links(),
            "page": body,
        })
    }
}
