use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;

use super::models::{LoginRequest, LoginResponse};
use super::ApiClient;
use crate::error::ClientError;
use crate::session::Session;
use crate::validation::RegistrationForm;

pub const LOGIN_ENDPOINT: &str = "/api/accounts/login/";
pub const REGISTER_ENDPOINT: &str = "/api/accounts/register/";

impl ApiClient {
    /// Exchange credentials for a session. Does not persist it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.send_json(Method::POST, LOGIN_ENDPOINT, &request).await?;
        if response.access.trim().is_empty() {
            return Err(ClientError::Unauthorized(
                "Login failed. Check your credentials.".to_string(),
            ));
        }
        Ok(Session {
            token: response.access,
            user: response.user,
        })
    }

    /// Submit a validated registration form as multipart
    pub async fn register(&self, form: &RegistrationForm) -> Result<Value, ClientError> {
        let mut multipart = Form::new()
            .text("name", form.name.trim().to_string())
            .text("email", form.email.trim().to_string())
            .text("password", form.password.clone())
            .text("role", form.role.to_string());

        if let Some(image) = &form.image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)?;
            multipart = multipart.part("image", part);
        }

        self.send_multipart(Method::POST, REGISTER_ENDPOINT, multipart).await
    }
}
