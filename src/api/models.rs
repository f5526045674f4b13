use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::session::SessionUser;
use crate::types::{AppointmentStatus, RecordId};

/// Weekday name (lowercase) to `HH:MM-HH:MM` slot strings
pub type Availability = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    pub user: SessionUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        display_name(self.username.as_deref(), &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: RecordId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Doctor {
    pub fn display_name(&self) -> &str {
        display_name(self.username.as_deref(), &self.name)
    }
}

// Username wins when present, as the backend's account records prefer it
fn display_name<'a>(username: Option<&'a str>, name: &'a str) -> &'a str {
    match username {
        Some(username) if !username.is_empty() => username,
        _ => name,
    }
}

/// Fields sent when an admin creates or edits a doctor account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorForm {
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: RecordId,
    pub name: String,
}

/// A profile image ready for multipart upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Doctor or patient reference inside an appointment: either a bare id or an embedded record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartyRef {
    Embedded {
        id: RecordId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        specialty: Option<String>,
    },
    Id(RecordId),
}

impl PartyRef {
    pub fn id(&self) -> &RecordId {
        match self {
            PartyRef::Embedded { id, .. } => id,
            PartyRef::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PartyRef::Embedded { name, username, .. } => {
                let name = display_name(username.as_deref(), name.as_deref().unwrap_or(""));
                if name.is_empty() {
                    None
                } else {
                    Some(name)
                }
            }
            PartyRef::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    #[serde(default, alias = "doctorId", alias = "doctor_id")]
    pub doctor: Option<PartyRef>,
    #[serde(default, alias = "patientId", alias = "patient_id")]
    pub patient: Option<PartyRef>,
    pub date: NaiveDate,
    #[serde(with = "time_with_seconds")]
    pub time: NaiveTime,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Appointment {
    pub fn status(&self) -> Option<AppointmentStatus> {
        self.status.parse().ok()
    }

    pub fn is_active(&self) -> bool {
        !matches!(
            self.status(),
            Some(AppointmentStatus::Cancelled) | Some(AppointmentStatus::Completed)
        )
    }
}

/// Body for booking or rescheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub doctor_id: RecordId,
    pub date: NaiveDate,
    #[serde(with = "time_with_seconds")]
    pub time: NaiveTime,
}

/// Body for a doctor's appointment update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfile {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Years in practice
    #[serde(default)]
    pub experience: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl DoctorProfile {
    pub fn display_name(&self) -> &str {
        display_name(self.username.as_deref(), &self.name)
    }
}

/// Partial doctor profile update; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
}

impl DoctorProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.specialty.is_none() && self.bio.is_none() && self.experience.is_none()
    }
}

// The backend expects HH:MM:SS even when seconds are zero. Incoming times may
// carry microseconds or drop the seconds.
mod time_with_seconds {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(serde::de::Error::custom)
    }
}
