use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::{capture, require_confirmation, Confirm, Page, Paginator};
use crate::api::models::{Appointment, Doctor, DoctorForm, Specialty, User};
use crate::api::ApiClient;
use crate::error::{ClientError, FieldErrors};
use crate::types::RecordId;
use crate::validation::{is_valid_email, is_valid_image};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub users: usize,
    pub doctors: usize,
    pub specialties: usize,
    pub appointments: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AdminDashboardPage {
    counts: DashboardCounts,
    error: Option<String>,
}

impl AdminDashboardPage {
    pub fn counts(&self) -> DashboardCounts {
        self.counts
    }
}

#[async_trait]
impl Page for AdminDashboardPage {
    fn title(&self) -> &str {
        "Admin Dashboard"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        // Each count degrades independently
        let (users, doctors, specialties, appointments) = futures::join!(
            api.list_users(),
            api.list_doctors(),
            api.list_specialties(),
            api.list_all_appointments()
        );
        let error = &mut self.error;
        self.counts = DashboardCounts {
            users: capture(users, error, "users").map_or(0, |v| v.len()),
            doctors: capture(doctors, error, "doctors").map_or(0, |v| v.len()),
            specialties: capture(specialties, error, "specialties").map_or(0, |v| v.len()),
            appointments: capture(appointments, error, "appointments").map_or(0, |v| v.len()),
        };
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        format!(
            "Users: {}\nDoctors: {}\nSpecialties: {}\nAppointments: {}",
            self.counts.users, self.counts.doctors, self.counts.specialties, self.counts.appointments
        )
    }

    fn to_json(&self) -> Value {
        json!({ "counts": self.counts, "error": self.error })
    }
}

#[derive(Debug, Clone, Default)]
pub struct UsersPage {
    users: Vec<User>,
    error: Option<String>,
}

impl UsersPage {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub async fn delete(
        &mut self,
        api: &ApiClient,
        id: &RecordId,
        confirm: &dyn Confirm,
    ) -> Result<(), ClientError> {
        require_confirmation(confirm, "Are you sure you want to delete this user?")?;
        api.delete_user(id).await?;
        info!(%id, "Deleted user");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for UsersPage {
    fn title(&self) -> &str {
        "Users"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.users = capture(api.list_users().await, &mut self.error, "users").unwrap_or_default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        if self.users.is_empty() {
            return "No users found.".to_string();
        }
        self.users
            .iter()
            .map(|u| format!("{:>6}  {:<24} {:<32} {}", u.id, u.display_name(), u.email, u.role))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> Value {
        json!({ "users": self.users, "error": self.error })
    }
}

/// Client-side checks for the admin doctor form
pub fn doctor_form_errors(form: &DoctorForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if form.name.trim().is_empty() {
        errors.insert("name".into(), "Doctor name is required".into());
    }
    if form.email.trim().is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !is_valid_email(form.email.trim()) {
        errors.insert("email".into(), "Invalid email address".into());
    }
    if form.specialty.trim().is_empty() {
        errors.insert("specialty".into(), "Select a specialty".into());
    }
    if let Some(image) = &form.image {
        if !is_valid_image(image) {
            errors.insert("image".into(), "Image must be JPG/PNG/GIF and less than 5MB".into());
        }
    }
    errors
}

#[derive(Debug, Clone)]
pub struct DoctorsPage {
    doctors: Vec<Doctor>,
    specialties: Vec<Specialty>,
    paginator: Paginator,
    error: Option<String>,
}

impl DoctorsPage {
    pub fn new(per_page: usize) -> Self {
        Self {
            doctors: Vec::new(),
            specialties: Vec::new(),
            paginator: Paginator::new(per_page),
            error: None,
        }
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    /// Doctors on the current page
    pub fn visible(&self) -> &[Doctor] {
        self.paginator.slice(&self.doctors)
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.paginator.go_to(page, self.doctors.len());
    }

    /// Create a doctor, or update one when `id` is given
    pub async fn save(
        &mut self,
        api: &ApiClient,
        id: Option<&RecordId>,
        form: &DoctorForm,
    ) -> Result<(), ClientError> {
        let errors = doctor_form_errors(form);
        if !errors.is_empty() {
            return Err(ClientError::validation(errors));
        }
        api.save_doctor(id, form).await?;
        match id {
            Some(id) => info!(%id, "Updated doctor"),
            None => info!(email = %form.email.trim(), "Created doctor"),
        }
        self.mount(api).await;
        Ok(())
    }

    pub async fn delete(
        &mut self,
        api: &ApiClient,
        id: &RecordId,
        confirm: &dyn Confirm,
    ) -> Result<(), ClientError> {
        require_confirmation(confirm, "Are you sure you want to delete this doctor?")?;
        api.delete_doctor(id).await?;
        info!(%id, "Deleted doctor");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for DoctorsPage {
    fn title(&self) -> &str {
        "Doctors"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        let (doctors, specialties) = futures::join!(api.list_doctors(), api.list_specialties());
        self.doctors = capture(doctors, &mut self.error, "doctors").unwrap_or_default();
        for doctor in &mut self.doctors {
            doctor.image = doctor.image.take().and_then(|image| api.image_url(&image));
        }
        self.specialties = capture(specialties, &mut self.error, "specialties").unwrap_or_default();
        let current = self.paginator.current();
        self.paginator.go_to(current, self.doctors.len());
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        if self.doctors.is_empty() {
            return "No doctors found.".to_string();
        }
        let mut lines: Vec<String> = self
            .visible()
            .iter()
            .map(|d| {
                format!(
                    "{:>6}  {:<24} {:<32} {}",
                    d.id,
                    d.display_name(),
                    d.email,
                    d.specialty.as_deref().unwrap_or("-")
                )
            })
            .collect();
        lines.push(self.paginator.footer(self.doctors.len()));
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        json!({
            "doctors": self.visible(),
            "page": self.paginator.current(),
            "total_pages": self.paginator.total_pages(self.doctors.len()),
            "total": self.doctors.len(),
            "error": self.error,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SpecialtiesPage {
    specialties: Vec<Specialty>,
    paginator: Paginator,
    error: Option<String>,
}

impl SpecialtiesPage {
    pub fn new(per_page: usize) -> Self {
        Self {
            specialties: Vec::new(),
            paginator: Paginator::new(per_page),
            error: None,
        }
    }

    pub fn specialties(&self) -> &[Specialty] {
        &self.specialties
    }

    pub fn visible(&self) -> &[Specialty] {
        self.paginator.slice(&self.specialties)
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.paginator.go_to(page, self.specialties.len());
    }

    fn require_name(name: &str) -> Result<&str, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::field("name", "Specialty name is required"));
        }
        Ok(name)
    }

    pub async fn add(&mut self, api: &ApiClient, name: &str) -> Result<Specialty, ClientError> {
        let name = Self::require_name(name)?;
        let created = api.create_specialty(name).await?;
        info!(id = %created.id, name = %created.name, "Added specialty");
        self.mount(api).await;
        Ok(created)
    }

    pub async fn rename(&mut self, api: &ApiClient, id: &RecordId, name: &str) -> Result<(), ClientError> {
        let name = Self::require_name(name)?;
        api.rename_specialty(id, name).await?;
        info!(%id, name, "Renamed specialty");
        self.mount(api).await;
        Ok(())
    }

    pub async fn delete(
        &mut self,
        api: &ApiClient,
        id: &RecordId,
        confirm: &dyn Confirm,
    ) -> Result<(), ClientError> {
        require_confirmation(confirm, "Are you sure you want to delete this specialty?")?;
        api.delete_specialty(id).await?;
        info!(%id, "Deleted specialty");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for SpecialtiesPage {
    fn title(&self) -> &str {
        "Specialties"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.specialties =
            capture(api.list_specialties().await, &mut self.error, "specialties").unwrap_or_default();
        let current = self.paginator.current();
        self.paginator.go_to(current, self.specialties.len());
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        if self.specialties.is_empty() {
            return "No specialties found.".to_string();
        }
        let mut lines: Vec<String> = self
            .visible()
            .iter()
            .map(|s| format!("{:>6}  {}", s.id, s.name))
            .collect();
        lines.push(self.paginator.footer(self.specialties.len()));
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        json!({
            "specialties": self.visible(),
            "page": self.paginator.current(),
            "total_pages": self.paginator.total_pages(self.specialties.len()),
            "total": self.specialties.len(),
            "error": self.error,
        })
    }
}

/// An appointment with its doctor's name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentRow {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor_name: String,
}

const UNKNOWN_DOCTOR: &str = "Unknown";

/// Embedded name first, then a lookup in the doctor list by id
pub fn resolve_doctor_name(appointment: &Appointment, doctors: &[Doctor]) -> String {
    let Some(doctor) = &appointment.doctor else {
        return UNKNOWN_DOCTOR.to_string();
    };
    if let Some(name) = doctor.name() {
        return name.to_string();
    }
    doctors
        .iter()
        .find(|d| &d.id == doctor.id())
        .map(|d| d.display_name().to_string())
        .unwrap_or_else(|| UNKNOWN_DOCTOR.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct AdminAppointmentsPage {
    rows: Vec<AppointmentRow>,
    error: Option<String>,
}

impl AdminAppointmentsPage {
    pub fn rows(&self) -> &[AppointmentRow] {
        &self.rows
    }
}

#[async_trait]
impl Page for AdminAppointmentsPage {
    fn title(&self) -> &str {
        "Appointments"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        let fetched = futures::try_join!(api.list_all_appointments(), api.list_doctors());
        let Some((appointments, doctors)) = capture(fetched, &mut self.error, "appointments") else {
            self.rows.clear();
            return;
        };
        self.rows = appointments
            .into_iter()
            .map(|appointment| {
                let doctor_name = resolve_doctor_name(&appointment, &doctors);
                AppointmentRow {
                    appointment,
                    doctor_name,
                }
            })
            .collect();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        if self.rows.is_empty() {
            return "No appointments found.".to_string();
        }
        self.rows
            .iter()
            .map(|row| {
                let a = &row.appointment;
                format!(
                    "{:>6}  {} {}  {:<24} {}",
                    a.id,
                    a.date,
                    a.time.format("%H:%M"),
                    row.doctor_name,
                    a.status
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> Value {
        json!({ "appointments": self.rows, "error": self.error })
    }
}
