use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::availability::{flatten_slots, SlotOption};
use super::{capture, require_confirmation, Confirm, Page};
use crate::api::models::{Appointment, BookingRequest, Doctor, PartyRef, PatientProfile};
use crate::api::ApiClient;
use crate::error::{ClientError, FieldErrors};
use crate::routing::BookingQuery;
use crate::types::RecordId;
use crate::validation::is_valid_email;

pub const APPOINTMENTS_PATH: &str = "/patient/appointments";

fn appointment_line(a: &Appointment) -> String {
    let doctor = a
        .doctor
        .as_ref()
        .map(|d| d.name().map(str::to_string).unwrap_or_else(|| format!("Doctor #{}", d.id())))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:>6}  {} {}  {:<24} {}",
        a.id,
        a.date,
        a.time.format("%H:%M"),
        doctor,
        a.status
    )
}

#[derive(Debug, Clone, Default)]
pub struct PatientDashboardPage {
    name: String,
    upcoming: Vec<Appointment>,
    error: Option<String>,
}

impl PatientDashboardPage {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn upcoming(&self) -> &[Appointment] {
        &self.upcoming
    }

    /// Active appointments on or after `today`, soonest first
    pub fn upcoming_from(appointments: Vec<Appointment>, today: NaiveDate) -> Vec<Appointment> {
        let mut upcoming: Vec<Appointment> = appointments
            .into_iter()
            .filter(|a| a.is_active() && a.date >= today)
            .collect();
        upcoming.sort_by_key(|a| (a.date, a.time));
        upcoming
    }
}

#[async_trait]
impl Page for PatientDashboardPage {
    fn title(&self) -> &str {
        "Patient Dashboard"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        let appointments =
            capture(api.my_patient_appointments().await, &mut self.error, "appointments").unwrap_or_default();
        self.upcoming = Self::upcoming_from(appointments, Local::now().date_naive());
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        let greeting = if self.name.is_empty() {
            "Welcome".to_string()
        } else {
            format!("Welcome, {}", self.name)
        };
        let mut lines = vec![greeting, "Upcoming appointments:".to_string()];
        if self.upcoming.is_empty() {
            lines.push("  none".to_string());
        }
        lines.extend(self.upcoming.iter().map(appointment_line));
        lines.push("Find a doctor: /patient/search".to_string());
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        json!({ "name": self.name, "upcoming": self.upcoming, "error": self.error })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorSearchPage {
    doctors: Vec<Doctor>,
    query: String,
    specialty: Option<String>,
    error: Option<String>,
}

impl DoctorSearchPage {
    pub fn with_filters(query: impl Into<String>, specialty: Option<String>) -> Self {
        Self {
            query: query.into(),
            specialty: specialty.filter(|s| !s.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_specialty(&mut self, specialty: Option<String>) {
        self.specialty = specialty.filter(|s| !s.trim().is_empty());
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    /// Case-insensitive name match plus exact specialty match
    pub fn filtered(&self) -> Vec<&Doctor> {
        let needle = self.query.trim().to_lowercase();
        self.doctors
            .iter()
            .filter(|d| needle.is_empty() || d.display_name().to_lowercase().contains(&needle))
            .filter(|d| match &self.specialty {
                Some(wanted) => d.specialty.as_deref() == Some(wanted.as_str()),
                None => true,
            })
            .collect()
    }

    /// Distinct specialties in the order they first appear
    pub fn specialties(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for specialty in self.doctors.iter().filter_map(|d| d.specialty.as_deref()) {
            if !specialty.is_empty() && !seen.contains(&specialty) {
                seen.push(specialty);
            }
        }
        seen
    }
}

#[async_trait]
impl Page for DoctorSearchPage {
    fn title(&self) -> &str {
        "Search Doctors"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.doctors = capture(api.list_doctors().await, &mut self.error, "doctors").unwrap_or_default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        let matches = self.filtered();
        if matches.is_empty() {
            return "No doctors match your search.".to_string();
        }
        let mut lines: Vec<String> = matches
            .iter()
            .map(|d| {
                format!(
                    "{:>6}  {:<24} {:<20} book: /patient/booking?doctor={}",
                    d.id,
                    d.display_name(),
                    d.specialty.as_deref().unwrap_or("-"),
                    d.id
                )
            })
            .collect();
        lines.push(format!("Specialties: {}", self.specialties().join(", ")));
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        json!({
            "doctors": self.filtered(),
            "specialties": self.specialties(),
            "error": self.error,
        })
    }
}

/// What a successful booking or reschedule sent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingOutcome {
    pub doctor_id: RecordId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub rescheduled: Option<RecordId>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingPage {
    query: BookingQuery,
    doctors: Vec<Doctor>,
    selected: Option<RecordId>,
    options: Vec<SlotOption>,
    existing: Option<Appointment>,
    error: Option<String>,
}

impl BookingPage {
    pub fn new(query: BookingQuery) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn selected_doctor(&self) -> Option<&RecordId> {
        self.selected.as_ref()
    }

    pub fn options(&self) -> &[SlotOption] {
        &self.options
    }

    /// The appointment being rescheduled, when in reschedule mode
    pub fn existing(&self) -> Option<&Appointment> {
        self.existing.as_ref()
    }

    pub fn is_rescheduling(&self) -> bool {
        self.query.rescheduling().is_some()
    }

    /// Pick a doctor and load their bookable slots
    pub async fn select_doctor(&mut self, api: &ApiClient, id: RecordId) {
        self.options.clear();
        let availability = capture(
            api.doctor_availability(&id).await,
            &mut self.error,
            "availability",
        );
        if let Some(availability) = availability {
            self.options = flatten_slots(&availability);
            debug!(doctor = %id, options = self.options.len(), "Loaded booking options");
        }
        self.selected = Some(id);
    }

    /// Book the chosen option, or move the existing appointment to it
    pub async fn book(
        &mut self,
        api: &ApiClient,
        option: &SlotOption,
        today: NaiveDate,
    ) -> Result<BookingOutcome, ClientError> {
        let Some(doctor_id) = self.selected.clone() else {
            return Err(ClientError::field("doctor", "Please fill all fields"));
        };
        if !self.options.contains(option) {
            let mut errors = FieldErrors::new();
            errors.insert("slot".into(), format!("{} is not offered by this doctor", option));
            return Err(ClientError::validation(errors));
        }

        let (date, time) = option.schedule(today);
        let request = BookingRequest {
            doctor_id: doctor_id.clone(),
            date,
            time,
        };

        let rescheduled = match self.query.rescheduling() {
            Some(id) => {
                api.reschedule_appointment(id, &request).await?;
                info!(appointment = %id, %date, %time, "Rescheduled appointment");
                Some(id.clone())
            }
            None => {
                api.book_appointment(&request).await?;
                info!(doctor = %doctor_id, %date, %time, "Booked appointment");
                None
            }
        };

        Ok(BookingOutcome {
            doctor_id,
            date,
            time,
            rescheduled,
        })
    }

    /// Cancel the appointment being rescheduled
    pub async fn cancel(&mut self, api: &ApiClient, confirm: &dyn Confirm) -> Result<RecordId, ClientError> {
        let Some(id) = self.query.rescheduling().cloned() else {
            return Err(ClientError::field("id", "No appointment selected to cancel"));
        };
        require_confirmation(confirm, "Are you sure you want to cancel this appointment?")?;
        api.cancel_appointment(&id).await?;
        info!(appointment = %id, "Cancelled appointment");
        Ok(id)
    }
}

#[async_trait]
impl Page for BookingPage {
    fn title(&self) -> &str {
        if self.is_rescheduling() {
            "Reschedule Appointment"
        } else {
            "Book Appointment"
        }
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.doctors = capture(api.list_doctors().await, &mut self.error, "doctors").unwrap_or_default();

        let mut doctor = self.query.doctor.clone();
        if let Some(id) = self.query.rescheduling().cloned() {
            self.existing = capture(api.patient_appointment(&id).await, &mut self.error, "appointment");
            if doctor.is_none() {
                doctor = self
                    .existing
                    .as_ref()
                    .and_then(|a| a.doctor.as_ref())
                    .map(PartyRef::id)
                    .cloned();
            }
        }

        if let Some(id) = doctor {
            self.select_doctor(api, id).await;
        }
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        if let Some(existing) = &self.existing {
            lines.push(format!("Current: {}", appointment_line(existing)));
        }
        match &self.selected {
            None => {
                lines.push("Choose a doctor:".to_string());
                lines.extend(
                    self.doctors
                        .iter()
                        .map(|d| format!("{:>6}  {}", d.id, d.display_name())),
                );
            }
            Some(id) => {
                let name = self
                    .doctors
                    .iter()
                    .find(|d| &d.id == id)
                    .map(|d| d.display_name().to_string())
                    .unwrap_or_else(|| format!("Doctor #{}", id));
                lines.push(format!("Doctor: {}", name));
                if self.options.is_empty() {
                    lines.push("No available slots.".to_string());
                } else {
                    lines.push("Available slots:".to_string());
                    lines.extend(self.options.iter().map(|o| format!("  {}", o)));
                }
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        json!({
            "rescheduling": self.query.rescheduling(),
            "existing": self.existing,
            "doctor": self.selected,
            "doctors": self.doctors,
            "options": self.options.iter().map(SlotOption::to_json).collect::<Vec<_>>(),
            "error": self.error,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientAppointmentsPage {
    appointments: Vec<Appointment>,
    error: Option<String>,
}

impl PatientAppointmentsPage {
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub async fn cancel(
        &mut self,
        api: &ApiClient,
        id: &RecordId,
        confirm: &dyn Confirm,
    ) -> Result<(), ClientError> {
        require_confirmation(confirm, "Are you sure you want to cancel this appointment?")?;
        api.cancel_appointment(id).await?;
        info!(appointment = %id, "Cancelled appointment");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for PatientAppointmentsPage {
    fn title(&self) -> &str {
        "Appointments"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.appointments =
            capture(api.my_patient_appointments().await, &mut self.error, "appointments").unwrap_or_default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        if self.appointments.is_empty() {
            return "You have no appointments.".to_string();
        }
        self.appointments
            .iter()
            .map(|a| {
                let mut line = appointment_line(a);
                if a.is_active() {
                    line.push_str(&format!(
                        "  reschedule: /patient/booking?id={}&reschedule=true",
                        a.id
                    ));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> Value {
        json!({ "appointments": self.appointments, "error": self.error })
    }
}

pub fn profile_errors(profile: &PatientProfile) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if profile.name.trim().is_empty() {
        errors.insert("name".into(), "Name is required".into());
    }
    if profile.email.trim().is_empty() {
        errors.insert("email".into(), "Email is required".into());
    } else if !is_valid_email(profile.email.trim()) {
        errors.insert("email".into(), "Invalid email address".into());
    }
    let phone = profile.phone.trim();
    if !phone.is_empty()
        && !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        errors.insert("phone".into(), "Invalid phone number".into());
    }
    errors
}

#[derive(Debug, Clone, Default)]
pub struct PatientProfilePage {
    profile: Option<PatientProfile>,
    error: Option<String>,
}

impl PatientProfilePage {
    pub fn profile(&self) -> Option<&PatientProfile> {
        self.profile.as_ref()
    }

    pub async fn save(&mut self, api: &ApiClient, profile: &PatientProfile) -> Result<(), ClientError> {
        let errors = profile_errors(profile);
        if !errors.is_empty() {
            return Err(ClientError::validation(errors));
        }
        let trimmed = PatientProfile {
            name: profile.name.trim().to_string(),
            email: profile.email.trim().to_string(),
            phone: profile.phone.trim().to_string(),
        };
        api.update_patient_profile(&trimmed).await?;
        info!("Updated patient profile");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for PatientProfilePage {
    fn title(&self) -> &str {
        "Profile"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.profile = capture(api.patient_profile().await, &mut self.error, "profile");
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        match &self.profile {
            Some(p) => format!(
                "Name:  {}\nEmail: {}\nPhone: {}",
                p.name,
                p.email,
                if p.phone.is_empty() { "-" } else { p.phone.as_str() }
            ),
            None => "Profile not available.".to_string(),
        }
    }

    fn to_json(&self) -> Value {
        json!({ "profile": self.profile, "error": self.error })
    }
}
