//! Feature pages.
//!
//! A page fetches its data when mounted, keeps it as local state for the
//! duration of the view, and re-fetches after every mutation it issues.
//! Pages share nothing with each other.

pub mod admin;
pub mod auth;
pub mod availability;
pub mod doctor;
pub mod patient;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::ApiClient;
use crate::config::PageConfig;
use crate::error::ClientError;
use crate::routing::{AdminPage, AuthPage, DoctorPage, PatientPage, Route};
use crate::session::Session;

#[async_trait]
pub trait Page: Send + Sync {
    fn title(&self) -> &str;

    /// Load the page's data. Failures are kept as the page's inline error.
    async fn mount(&mut self, api: &ApiClient);

    fn error(&self) -> Option<&str>;

    fn render(&self) -> String;

    fn to_json(&self) -> Value;
}

/// Confirmation step in front of destructive actions
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

impl Confirm for AssumeNo {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

pub(crate) fn require_confirmation(confirm: &dyn Confirm, prompt: &str) -> Result<(), ClientError> {
    if confirm.confirm(prompt) {
        Ok(())
    } else {
        Err(ClientError::Cancelled)
    }
}

/// Record a fetch failure as the page's inline error and fall back to `None`
pub(crate) fn capture<T>(
    result: Result<T, ClientError>,
    error: &mut Option<String>,
    what: &str,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to load {}: {}", what, e);
            *error = Some(format!("Failed to load {}: {}", what, e));
            None
        }
    }
}

/// One-based client-side pagination over an already fetched list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paginator {
    per_page: usize,
    current: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            current: 1,
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.per_page)
    }

    /// Jump to `page`, clamped to the pages that exist for `len` items
    pub fn go_to(&mut self, page: usize, len: usize) {
        let last = self.total_pages(len).max(1);
        self.current = page.clamp(1, last);
    }

    pub fn next(&mut self, len: usize) {
        self.go_to(self.current + 1, len);
    }

    pub fn prev(&mut self, len: usize) {
        self.go_to(self.current.saturating_sub(1), len);
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current - 1) * self.per_page;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }

    pub fn footer(&self, len: usize) -> String {
        format!("Page {} of {}", self.current, self.total_pages(len).max(1))
    }
}

/// Shown for unknown paths, scoped to a partition when inside one
#[derive(Debug, Clone)]
pub struct NotFoundPage {
    message: String,
}

impl NotFoundPage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Page for NotFoundPage {
    fn title(&self) -> &str {
        "Not Found"
    }

    async fn mount(&mut self, _api: &ApiClient) {}

    fn error(&self) -> Option<&str> {
        None
    }

    fn render(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> Value {
        json!({ "not_found": self.message })
    }
}

/// Build the page mounted at `route`.
///
/// `session` is the one admitted by the auth gate (absent for public routes).
pub fn page_for(route: &Route, session: Option<&Session>, config: &PageConfig) -> Box<dyn Page> {
    match route {
        Route::Root | Route::NotFound(_) => Box::new(NotFoundPage::new("404 - Page Not Found")),
        Route::Auth(page) => match page {
            AuthPage::Login => Box::new(auth::LoginPage),
            AuthPage::Register => Box::new(auth::RegisterPage),
            AuthPage::AdminLogin => Box::new(auth::AdminLoginPage),
            AuthPage::NotFound(_) => Box::new(NotFoundPage::new("404 - Auth Page Not Found")),
        },
        Route::Admin(page) => match page {
            AdminPage::Dashboard => Box::new(admin::AdminDashboardPage::default()),
            AdminPage::Users => Box::new(admin::UsersPage::default()),
            AdminPage::Doctors => Box::new(admin::DoctorsPage::new(config.doctors_per_page)),
            AdminPage::Specialties => {
                Box::new(admin::SpecialtiesPage::new(config.specialties_per_page))
            }
            AdminPage::Appointments => Box::new(admin::AdminAppointmentsPage::default()),
            AdminPage::NotFound(_) => Box::new(NotFoundPage::new("Admin Page Not Found")),
        },
        Route::Doctor(page) => match page {
            DoctorPage::Dashboard => Box::new(doctor::DoctorDashboardPage::default()),
            DoctorPage::Appointments => Box::new(doctor::DoctorAppointmentsPage::default()),
            DoctorPage::Availability => Box::new(availability::DoctorAvailabilityPage::default()),
            DoctorPage::Profile => Box::new(doctor::DoctorProfilePage::default()),
            DoctorPage::NotFound(_) => Box::new(NotFoundPage::new("Doctor Page Not Found")),
        },
        Route::Patient(page) => match page {
            PatientPage::Dashboard => Box::new(patient::PatientDashboardPage::new(
                session.map(|s| s.display_name().to_string()).unwrap_or_default(),
            )),
            PatientPage::Search => Box::new(patient::DoctorSearchPage::default()),
            PatientPage::Appointments => Box::new(patient::PatientAppointmentsPage::default()),
            PatientPage::Booking(query) => Box::new(patient::BookingPage::new(query.clone())),
            PatientPage::Profile => Box::new(patient::PatientProfilePage::default()),
            PatientPage::NotFound(_) => Box::new(NotFoundPage::new("Patient Page Not Found")),
        },
    }
}
