use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::models::{
    Appointment, AppointmentUpdate, Availability, DoctorProfile, DoctorProfileUpdate, ImageUpload,
};
use super::ApiClient;
use crate::error::ClientError;
use crate::types::RecordId;

pub const MY_PROFILE_ENDPOINT: &str = "/api/doctors/my_profile/";
pub const MY_APPOINTMENTS_ENDPOINT: &str = "/api/doctors/appointments/";
pub const MY_AVAILABILITY_ENDPOINT: &str = "/api/doctors/availability/";

impl ApiClient {
    pub async fn my_doctor_profile(&self) -> Result<DoctorProfile, ClientError> {
        self.get(MY_PROFILE_ENDPOINT).await
    }

    pub async fn update_my_doctor_profile(
        &self,
        update: &DoctorProfileUpdate,
    ) -> Result<DoctorProfile, ClientError> {
        self.send_json(Method::PATCH, MY_PROFILE_ENDPOINT, update).await
    }

    /// Replace the profile image with a multipart PATCH
    pub async fn update_my_doctor_image(&self, image: &ImageUpload) -> Result<DoctorProfile, ClientError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;
        let multipart = Form::new().part("image", part);
        self.send_multipart(Method::PATCH, MY_PROFILE_ENDPOINT, multipart).await
    }

    pub async fn my_doctor_appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        self.fetch_all(MY_APPOINTMENTS_ENDPOINT).await
    }

    pub async fn update_doctor_appointment(
        &self,
        id: &RecordId,
        update: &AppointmentUpdate,
    ) -> Result<(), ClientError> {
        let path = format!("{}{}/", MY_APPOINTMENTS_ENDPOINT, id);
        self.send_json_unit(Method::PATCH, &path, update).await
    }

    pub async fn my_availability(&self) -> Result<Availability, ClientError> {
        self.get(MY_AVAILABILITY_ENDPOINT).await
    }

    pub async fn save_my_availability(&self, availability: &Availability) -> Result<(), ClientError> {
        self.send_json_unit(Method::PUT, MY_AVAILABILITY_ENDPOINT, availability)
            .await
    }

    pub async fn delete_my_availability_day(&self, day: &str) -> Result<(), ClientError> {
        self.delete(&format!("{}{}/", MY_AVAILABILITY_ENDPOINT, day)).await
    }

    /// Any doctor's published availability, as seen by patients
    pub async fn doctor_availability(&self, doctor: &RecordId) -> Result<Availability, ClientError> {
        self.get(&format!("/api/doctors/{}/availability/", doctor)).await
    }
}
