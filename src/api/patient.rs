use reqwest::Method;
use serde_json::Value;

use super::models::{Appointment, BookingRequest, PatientProfile};
use super::ApiClient;
use crate::error::ClientError;
use crate::types::RecordId;

pub const PROFILE_ENDPOINT: &str = "/api/patients/profile/";
pub const APPOINTMENTS_ENDPOINT: &str = "/api/patients/appointments/";

impl ApiClient {
    pub async fn patient_profile(&self) -> Result<PatientProfile, ClientError> {
        self.get(PROFILE_ENDPOINT).await
    }

    pub async fn update_patient_profile(&self, profile: &PatientProfile) -> Result<(), ClientError> {
        self.send_json_unit(Method::PATCH, PROFILE_ENDPOINT, profile).await
    }

    pub async fn my_patient_appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        self.fetch_all(APPOINTMENTS_ENDPOINT).await
    }

    pub async fn patient_appointment(&self, id: &RecordId) -> Result<Appointment, ClientError> {
        self.get(&format!("{}{}/", APPOINTMENTS_ENDPOINT, id)).await
    }

    pub async fn book_appointment(&self, request: &BookingRequest) -> Result<Value, ClientError> {
        self.send_json(Method::POST, APPOINTMENTS_ENDPOINT, request).await
    }

    pub async fn reschedule_appointment(
        &self,
        id: &RecordId,
        request: &BookingRequest,
    ) -> Result<Value, ClientError> {
        let path = format!("{}{}/", APPOINTMENTS_ENDPOINT, id);
        self.send_json(Method::PUT, &path, request).await
    }

    pub async fn cancel_appointment(&self, id: &RecordId) -> Result<(), ClientError> {
        self.post_action(&format!("{}{}/cancel/", APPOINTMENTS_ENDPOINT, id)).await
    }
}
