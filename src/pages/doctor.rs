use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{capture, Page};
use crate::api::models::{Appointment, AppointmentUpdate, DoctorProfile, DoctorProfileUpdate, ImageUpload};
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::types::{AppointmentStatus, RecordId};
use crate::validation::is_valid_image;

pub const NAME_FALLBACK: &str = "Name not available";

/// Appointment totals keyed by status as the backend spells it
pub fn count_by_status(appointments: &[Appointment]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for appointment in appointments {
        let status = match appointment.status() {
            Some(status) => status.as_str().to_string(),
            None if appointment.status.is_empty() => "unknown".to_string(),
            None => appointment.status.to_lowercase(),
        };
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}

fn patient_label(appointment: &Appointment) -> String {
    match &appointment.patient {
        Some(patient) => patient
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Patient #{}", patient.id())),
        None => "Unknown patient".to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorDashboardPage {
    name: String,
    counts: BTreeMap<String, usize>,
    total: usize,
    error: Option<String>,
}

impl DoctorDashboardPage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[async_trait]
impl Page for DoctorDashboardPage {
    fn title(&self) -> &str {
        "Doctor Dashboard"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        let (profile, appointments) =
            futures::join!(api.my_doctor_profile(), api.my_doctor_appointments());

        self.name = capture(profile, &mut self.error, "profile")
            .map(|p| p.display_name().trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| NAME_FALLBACK.to_string());

        let appointments =
            capture(appointments, &mut self.error, "appointments").unwrap_or_default();
        self.total = appointments.len();
        self.counts = count_by_status(&appointments);
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        let mut lines = vec![
            format!("Welcome, Dr. {}", self.name),
            format!("Appointments: {}", self.total),
        ];
        lines.extend(self.counts.iter().map(|(status, n)| format!("  {:<10} {}", status, n)));
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "total": self.total,
            "by_status": self.counts,
            "error": self.error,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DoctorAppointmentsPage {
    appointments: Vec<Appointment>,
    error: Option<String>,
}

impl DoctorAppointmentsPage {
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub async fn set_status(
        &mut self,
        api: &ApiClient,
        id: &RecordId,
        status: AppointmentStatus,
    ) -> Result<(), ClientError> {
        let update = AppointmentUpdate {
            status: Some(status),
            notes: None,
        };
        api.update_doctor_appointment(id, &update).await?;
        info!(%id, %status, "Updated appointment status");
        self.mount(api).await;
        Ok(())
    }

    pub async fn add_note(&mut self, api: &ApiClient, id: &RecordId, note: &str) -> Result<(), ClientError> {
        let note = note.trim();
        if note.is_empty() {
            return Err(ClientError::field("notes", "Note cannot be empty"));
        }
        let update = AppointmentUpdate {
            status: None,
            notes: Some(note.to_string()),
        };
        api.update_doctor_appointment(id, &update).await?;
        info!(%id, "Added appointment note");
        self.mount(api).await;
        Ok(())
    }
}

#[async_trait]
impl Page for DoctorAppointmentsPage {
    fn title(&self) -> &str {
        "Appointments"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.appointments =
            capture(api.my_doctor_appointments().await, &mut self.error, "appointments").unwrap_or_default();
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        if self.appointments.is_empty() {
            return "No appointments.".to_string();
        }
        self.appointments
            .iter()
            .map(|a| {
                let mut line = format!(
                    "{:>6}  {} {}  {:<24} {}",
                    a.id,
                    a.date,
                    a.time.format("%H:%M"),
                    patient_label(a),
                    a.status
                );
                if let Some(notes) = a.notes.as_deref().filter(|n| !n.is_empty()) {
                    line.push_str(&format!("\n        notes: {}", notes));
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

fn resolve_image(api: &ApiClient, mut profile: DoctorProfile) -> DoctorProfile {
    profile.image = profile.image.take().and_then(|image| api.image_url(&image));
    profile
}

#[derive(Debug, Clone, Default)]
pub struct DoctorProfilePage {
    profile: Option<DoctorProfile>,
    error: Option<String>,
}

impl DoctorProfilePage {
    pub fn profile(&self) -> Option<&DoctorProfile> {
        self.profile.as_ref()
    }

    /// Patch the given fields; the backend's copy replaces the local one
    pub async fn update(&mut self, api: &ApiClient, update: &DoctorProfileUpdate) -> Result<(), ClientError> {
        if update.is_empty() {
            return Err(ClientError::field("profile", "Nothing to update"));
        }
        if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(ClientError::field("name", "Name cannot be empty"));
        }
        let updated = api.update_my_doctor_profile(update).await?;
        info!("Updated doctor profile");
        self.profile = Some(resolve_image(api, updated));
        Ok(())
    }

    /// Upload a new profile image (JPG/PNG/GIF, up to 5MB)
    pub async fn update_image(&mut self, api: &ApiClient, image: &ImageUpload) -> Result<(), ClientError> {
        if !is_valid_image(image) {
            return Err(ClientError::field(
                "image",
                "Profile image must be a JPG, PNG or GIF of at most 5MB",
            ));
        }
        let updated = api.update_my_doctor_image(image).await?;
        info!(file = %image.file_name, "Updated doctor profile image");
        self.profile = Some(resolve_image(api, updated));
        Ok(())
    }
}

#[async_trait]
impl Page for DoctorProfilePage {
    fn title(&self) -> &str {
        "Profile"
    }

    async fn mount(&mut self, api: &ApiClient) {
        self.error = None;
        self.profile = capture(api.my_doctor_profile().await, &mut self.error, "profile")
            .map(|profile| resolve_image(api, profile));
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn render(&self) -> String {
        let Some(profile) = &self.profile else {
            return "Profile not available.".to_string();
        };
        let image = profile
            .image
            .as_deref()
            .filter(|i| !i.is_empty())
            .unwrap_or("-");
        let experience = profile
            .experience
            .map(|years| format!("{} years", years))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "Name:       {}\nEmail:      {}\nSpecialty:  {}\nExperience: {}\nBio:        {}\nImage:      {}",
            profile.display_name(),
            profile.email,
            profile.specialty.as_deref().unwrap_or("-"),
            experience,
            profile.bio.as_deref().unwrap_or("-"),
            image
        )
    }

    fn to_json(&self) -> Value {
        json!({ "profile": self.profile, "error": self.error })
    }
}
