use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::{json, Value};

use super::models::{Appointment, Doctor, DoctorForm, Specialty, User};
use super::ApiClient;
use crate::error::ClientError;
use crate::types::{RecordId, Role};

pub const USERS_ENDPOINT: &str = "/api/accounts/users/";
pub const DOCTORS_ENDPOINT: &str = "/api/accounts/doctors";
pub const SPECIALTIES_ENDPOINT: &str = "/api/accounts/specialtiesData/";
pub const APPOINTMENTS_ENDPOINT: &str = "/api/appointments/";

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.fetch_all(USERS_ENDPOINT).await
    }

    pub async fn delete_user(&self, id: &RecordId) -> Result<(), ClientError> {
        self.delete(&format!("{}{}/", USERS_ENDPOINT, id)).await
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, ClientError> {
        self.fetch_all(DOCTORS_ENDPOINT).await
    }

    /// Create a doctor account, or update it when `id` is given
    pub async fn save_doctor(
        &self,
        id: Option<&RecordId>,
        form: &DoctorForm,
    ) -> Result<Value, ClientError> {
        let mut multipart = Form::new()
            .text("name", form.name.trim().to_string())
            .text("email", form.email.trim().to_string())
            .text("role", Role::Doctor.to_string())
            .text("specialty", form.specialty.trim().to_string());

        if let Some(image) = &form.image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)?;
            multipart = multipart.part("image", part);
        }

        match id {
            Some(id) => {
                let path = format!("{}/{}", DOCTORS_ENDPOINT, id);
                self.send_multipart(Method::PUT, &path, multipart).await
            }
            None => self.send_multipart(Method::POST, DOCTORS_ENDPOINT, multipart).await,
        }
    }

    pub async fn delete_doctor(&self, id: &RecordId) -> Result<(), ClientError> {
        self.delete(&format!("{}/{}", DOCTORS_ENDPOINT, id)).await
    }

    pub async fn list_specialties(&self) -> Result<Vec<Specialty>, ClientError> {
        self.fetch_all(SPECIALTIES_ENDPOINT).await
    }

    pub async fn create_specialty(&self, name: &str) -> Result<Specialty, ClientError> {
        self.send_json(Method::POST, SPECIALTIES_ENDPOINT, &json!({ "name": name.trim() }))
            .await
    }

    pub async fn rename_specialty(&self, id: &RecordId, name: &str) -> Result<(), ClientError> {
        let path = format!("{}{}/", SPECIALTIES_ENDPOINT, id);
        self.send_json_unit(Method::PUT, &path, &json!({ "name": name.trim() }))
            .await
    }

    pub async fn delete_specialty(&self, id: &RecordId) -> Result<(), ClientError> {
        self.delete(&format!("{}{}/", SPECIALTIES_ENDPOINT, id)).await
    }

    pub async fn list_all_appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        self.fetch_all(APPOINTMENTS_ENDPOINT).await
    }
}
