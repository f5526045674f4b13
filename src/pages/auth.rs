use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::Page;
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::routing::{Navigation, RedirectReason, ADMIN_LOGIN_PATH, LOGIN_PATH, REGISTER_PATH};
use crate::types::Role;
use crate::validation::{LoginForm, RegistrationForm};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoginPage;

impl LoginPage {
    /// Validate, exchange credentials, persist the session and head to the role's home.
    ///
    /// Nothing is sent when the form is invalid, and nothing is stored when
    /// the backend rejects the credentials.
    pub async fn submit(&self, api: &ApiClient, form: &LoginForm) -> Result<Navigation, ClientError> {
        form.validate()?;
        let session = api.login(&form.email, &form.password).await?;
        api.session().establish(&session)?;

        let role = session.role();
        info!(%role, "Logged in");
        Ok(Navigation::Redirect {
            to: role.home_path().to_string(),
            reason: RedirectReason::LoggedIn { role },
        })
    }
}

#[async_trait]
impl Page for LoginPage {
    fn title(&self) -> &str {
        "Login"
    }

    async fn mount(&mut self, _api: &ApiClient) {}

    fn error(&self) -> Option<&str> {
        None
    }

    fn render(&self) -> String {
        format!(
            "Sign in with `mediconnect auth login <email>`.\nNo account yet? See {}.",
            REGISTER_PATH
        )
    }

    fn to_json(&self) -> Value {
        json!({ "page": LOGIN_PATH })
    }
}

pub const ADMIN_ONLY_MESSAGE: &str = "Access denied: only Admins can login here.";

/// Login form that only lets Admin accounts through
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminLoginPage;

impl AdminLoginPage {
    /// Like [`LoginPage::submit`], but a non-Admin account is refused and
    /// its session is never stored.
    pub async fn submit(&self, api: &ApiClient, form: &LoginForm) -> Result<Navigation, ClientError> {
        form.validate()?;
        let session = api.login(&form.email, &form.password).await?;
        if session.role() != Role::Admin {
            warn!(role = %session.role(), "Refused non-admin login on the admin form");
            return Err(ClientError::Unauthorized(ADMIN_ONLY_MESSAGE.to_string()));
        }
        api.session().establish(&session)?;

        info!("Admin logged in");
        Ok(Navigation::Redirect {
            to: Role::Admin.home_path().to_string(),
            reason: RedirectReason::LoggedIn { role: Role::Admin },
        })
    }
}

#[async_trait]
impl Page for AdminLoginPage {
    fn title(&self) -> &str {
        "Admin Login"
    }

    async fn mount(&mut self, _api: &ApiClient) {}

    fn error(&self) -> Option<&str> {
        None
    }

    fn render(&self) -> String {
        "Sign in as an administrator with `mediconnect auth login --admin <email>`.".to_string()
    }

    fn to_json(&self) -> Value {
        json!({ "page": ADMIN_LOGIN_PATH })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterPage;

impl RegisterPage {
    /// Validate and submit a self-registration; success leads to the login page
    pub async fn submit(
        &self,
        api: &ApiClient,
        form: &RegistrationForm,
    ) -> Result<Navigation, ClientError> {
        form.validate()?;
        api.register(form).await?;
        info!(role = %form.role, "Registered new account");
        Ok(Navigation::Redirect {
            to: LOGIN_PATH.to_string(),
            reason: RedirectReason::Registered,
        })
    }
}

#[async_trait]
impl Page for RegisterPage {
    fn title(&self) -> &str {
        "Register"
    }

    async fn mount(&mut self, _api: &ApiClient) {}

    fn error(&self) -> Option<&str> {
        None
    }

    fn render(&self) -> String {
        "Create a Patient or Doctor account with `mediconnect auth register`.".to_string()
    }

    fn to_json(&self) -> Value {
        json!({ "page": REGISTER_PATH })
    }
}
