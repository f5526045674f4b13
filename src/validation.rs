//! Client-side form checks, run before any request is issued.

use crate::api::models::ImageUpload;
use crate::error::{ClientError, FieldErrors};
use crate::types::Role;

pub const MIN_LOGIN_PASSWORD_LEN: usize = 6;
pub const MIN_STRONG_PASSWORD_LEN: usize = 8;
pub const MIN_NAME_LEN: usize = 3;
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// `local@domain.tld` with no whitespace and no extra `@`
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Needs a dot with something on both sides somewhere in the domain
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// At least eight characters drawn from letters, digits and `@$!%*?&`,
/// with one of each: lowercase, uppercase, digit, special.
pub fn is_strong_password(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    password.chars().count() >= MIN_STRONG_PASSWORD_LEN
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn is_valid_image(image: &ImageUpload) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&image.content_type.to_ascii_lowercase().as_str())
        && image.size_bytes() <= MAX_IMAGE_BYTES
}

fn into_result(errors: FieldErrors) -> Result<(), ClientError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ClientError::validation(errors))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.email.is_empty() {
            errors.insert("email".into(), "Email is required".into());
        } else if !is_valid_email(&self.email) {
            errors.insert("email".into(), "Invalid email address".into());
        }

        if self.password.is_empty() {
            errors.insert("password".into(), "Password is required".into());
        } else if self.password.chars().count() < MIN_LOGIN_PASSWORD_LEN {
            errors.insert(
                "password".into(),
                format!("Password must be at least {} characters", MIN_LOGIN_PASSWORD_LEN),
            );
        }
        errors
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        into_result(self.errors())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub image: Option<ImageUpload>,
}

impl RegistrationForm {
    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert("name".into(), "Full name is required".into());
        } else if name.chars().count() < MIN_NAME_LEN {
            errors.insert(
                "name".into(),
                format!("Full name must be at least {} characters", MIN_NAME_LEN),
            );
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.insert("email".into(), "Email is required".into());
        } else if !is_valid_email(email) {
            errors.insert("email".into(), "Invalid email address".into());
        }

        if self.password.is_empty() {
            errors.insert("password".into(), "Password is required".into());
        } else if !is_strong_password(&self.password) {
            errors.insert(
                "password".into(),
                "Password must be at least 8 characters, include uppercase, lowercase, number, and special character".into(),
            );
        }

        if self.confirm_password.is_empty() {
            errors.insert("confirm_password".into(), "Please confirm your password".into());
        } else if self.confirm_password != self.password {
            errors.insert("confirm_password".into(), "Passwords do not match".into());
        }

        match &self.image {
            None => {
                errors.insert("image".into(), "Profile image is required".into());
            }
            Some(image) if !is_valid_image(image) => {
                errors.insert("image".into(), "Image must be JPG/PNG/GIF and less than 5MB".into());
            }
            Some(_) => {}
        }

        if !self.role.is_self_registrable() {
            errors.insert("role".into(), "Please select a valid role".into());
        }

        errors
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        into_result(self.errors())
    }
}
