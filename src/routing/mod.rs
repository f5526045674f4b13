//! Route table and role-partitioned navigation.
//!
//! Paths are grouped into partitions (`/auth`, `/admin`, `/doctor`,
//! `/patient`). The auth partition is public; every other partition is
//! entered through the [`AuthGate`]. `/admin/login` belongs to the auth
//! partition even though it sits under the admin prefix.

pub mod gate;

use std::fmt;

use crate::session::{Session, SessionContext};
use crate::types::{RecordId, Role};

pub use gate::{Admission, AuthGate};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Auth,
    Admin,
    Doctor,
    Patient,
}

impl Partition {
    /// Roles admitted into the partition; `None` means public
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Partition::Auth => None,
            Partition::Admin => Some(&[Role::Admin]),
            Partition::Doctor => Some(&[Role::Doctor]),
            Partition::Patient => Some(&[Role::Patient]),
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Partition::Admin,
            Role::Doctor => Partition::Doctor,
            Role::Patient => Partition::Patient,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Partition::Auth => "/auth",
            Partition::Admin => "/admin",
            Partition::Doctor => "/doctor",
            Partition::Patient => "/patient",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPage {
    Login,
    Register,
    /// Login restricted to Admin accounts
    AdminLogin,
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminPage {
    Dashboard,
    Users,
    Doctors,
    Specialties,
    Appointments,
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorPage {
    Dashboard,
    Appointments,
    Availability,
    Profile,
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientPage {
    Dashboard,
    Search,
    Appointments,
    Booking(BookingQuery),
    Profile,
    NotFound(String),
}

/// Query string accepted by `/patient/booking`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingQuery {
    pub doctor: Option<RecordId>,
    pub appointment: Option<RecordId>,
    pub reschedule: bool,
}

impl BookingQuery {
    fn parse(query: &str) -> Self {
        let mut parsed = BookingQuery::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "doctor" => parsed.doctor = value.parse().ok(),
                "id" => parsed.appointment = value.parse().ok(),
                "reschedule" => parsed.reschedule = value == "true",
                _ => {}
            }
        }
        parsed
    }

    /// Reschedule mode needs both the flag and the appointment id
    pub fn rescheduling(&self) -> Option<&RecordId> {
        if self.reschedule {
            self.appointment.as_ref()
        } else {
            None
        }
    }

    fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(doctor) = &self.doctor {
            serializer.append_pair("doctor", &doctor.to_string());
        }
        if let Some(id) = &self.appointment {
            serializer.append_pair("id", &id.to_string());
        }
        if self.reschedule {
            serializer.append_pair("reschedule", "true");
        }
        serializer.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Root,
    Auth(AuthPage),
    Admin(AdminPage),
    Doctor(DoctorPage),
    Patient(PatientPage),
    NotFound(String),
}

impl Route {
    pub fn parse(input: &str) -> Route {
        let input = input.trim();
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, query),
            None => (input, ""),
        };
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Root,
            ["auth", rest @ ..] => Route::Auth(match rest {
                [] | ["login"] => AuthPage::Login,
                ["register"] => AuthPage::Register,
                other => AuthPage::NotFound(other.join("/")),
            }),
            ["admin", "login"] => Route::Auth(AuthPage::AdminLogin),
            ["admin", rest @ ..] => Route::Admin(match rest {
                [] | ["dashboard"] => AdminPage::Dashboard,
                ["users"] => AdminPage::Users,
                ["doctors"] => AdminPage::Doctors,
                ["specialties"] => AdminPage::Specialties,
                ["appointments"] => AdminPage::Appointments,
                other => AdminPage::NotFound(other.join("/")),
            }),
            ["doctor", rest @ ..] => Route::Doctor(match rest {
                [] | ["dashboard"] => DoctorPage::Dashboard,
                ["appointments"] => DoctorPage::Appointments,
                ["availability"] => DoctorPage::Availability,
                ["profile"] => DoctorPage::Profile,
                other => DoctorPage::NotFound(other.join("/")),
            }),
            ["patient", rest @ ..] => Route::Patient(match rest {
                [] | ["dashboard"] => PatientPage::Dashboard,
                ["search"] => PatientPage::Search,
                ["appointments"] => PatientPage::Appointments,
                ["booking"] => PatientPage::Booking(BookingQuery::parse(query)),
                ["profile"] => PatientPage::Profile,
                other => PatientPage::NotFound(other.join("/")),
            }),
            other => Route::NotFound(other.join("/")),
        }
    }

    pub fn partition(&self) -> Option<Partition> {
        match self {
            Route::Root | Route::NotFound(_) => None,
            Route::Auth(_) => Some(Partition::Auth),
            Route::Admin(_) => Some(Partition::Admin),
            Route::Doctor(_) => Some(Partition::Doctor),
            Route::Patient(_) => Some(Partition::Patient),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Route::NotFound(_)
                | Route::Auth(AuthPage::NotFound(_))
                | Route::Admin(AdminPage::NotFound(_))
                | Route::Doctor(DoctorPage::NotFound(_))
                | Route::Patient(PatientPage::NotFound(_))
        )
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = |prefix: &str, name: &str| format!("{}/{}", prefix, name);
        let path = match self {
            Route::Root => "/".to_string(),
            Route::NotFound(rest) => format!("/{}", rest),
            Route::Auth(AuthPage::AdminLogin) => ADMIN_LOGIN_PATH.to_string(),
            Route::Auth(p) => page(
                "/auth",
                match p {
                    AuthPage::Login => "login",
                    AuthPage::Register => "register",
                    AuthPage::AdminLogin => "login",
                    AuthPage::NotFound(rest) => rest.as_str(),
                },
            ),
            Route::Admin(p) => page(
                "/admin",
                match p {
                    AdminPage::Dashboard => "dashboard",
                    AdminPage::Users => "users",
                    AdminPage::Doctors => "doctors",
                    AdminPage::Specialties => "specialties",
                    AdminPage::Appointments => "appointments",
                    AdminPage::NotFound(rest) => rest.as_str(),
                },
            ),
            Route::Doctor(p) => page(
                "/doctor",
                match p {
                    DoctorPage::Dashboard => "dashboard",
                    DoctorPage::Appointments => "appointments",
                    DoctorPage::Availability => "availability",
                    DoctorPage::Profile => "profile",
                    DoctorPage::NotFound(rest) => rest.as_str(),
                },
            ),
            Route::Patient(PatientPage::Booking(query)) => {
                let query = query.to_query();
                if query.is_empty() {
                    "/patient/booking".to_string()
                } else {
                    format!("/patient/booking?{}", query)
                }
            }
            Route::Patient(p) => page(
                "/patient",
                match p {
                    PatientPage::Dashboard => "dashboard",
                    PatientPage::Search => "search",
                    PatientPage::Appointments => "appointments",
                    PatientPage::Profile => "profile",
                    PatientPage::NotFound(rest) => rest.as_str(),
                    PatientPage::Booking(_) => "booking",
                },
            ),
        };
        f.write_str(&path)
    }
}

/// Why a navigation ended in a redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    /// `/` always forwards to login
    Root,
    NoSession,
    RoleNotAllowed { role: Role },
    LoggedOut,
    /// Login succeeded; forward to the role's home
    LoggedIn { role: Role },
    Registered,
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectReason::Root => f.write_str("root path"),
            RedirectReason::NoSession => f.write_str("not logged in"),
            RedirectReason::RoleNotAllowed { role } => {
                write!(f, "role {} may not enter this area", role)
            }
            RedirectReason::LoggedOut => f.write_str("logged out"),
            RedirectReason::LoggedIn { role } => write!(f, "logged in as {}", role),
            RedirectReason::Registered => f.write_str("registered"),
        }
    }
}

/// Result of navigating to a path
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// Mount the route; `session` is set for protected partitions
    Render {
        route: Route,
        session: Option<Session>,
    },
    Redirect {
        to: String,
        reason: RedirectReason,
    },
}

impl Navigation {
    pub fn is_redirect_to(&self, path: &str) -> bool {
        matches!(self, Navigation::Redirect { to, .. } if to == path)
    }
}

/// Resolves paths to routes and runs the auth gate for protected partitions
#[derive(Debug, Clone)]
pub struct Router {
    gate: AuthGate,
}

impl Router {
    pub fn new(session: SessionContext) -> Self {
        Self {
            gate: AuthGate::new(session),
        }
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        self.resolve(Route::parse(path))
    }

    pub fn resolve(&self, route: Route) -> Navigation {
        match route.partition() {
            None if route == Route::Root => Navigation::Redirect {
                to: LOGIN_PATH.to_string(),
                reason: RedirectReason::Root,
            },
            None => Navigation::Render {
                route,
                session: None,
            },
            Some(partition) => match partition.allowed_roles() {
                None => Navigation::Render {
                    route,
                    session: None,
                },
                Some(allowed) => self.gate.guard(route, allowed),
            },
        }
    }
}
