// Client error types
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by form field name
pub type FieldErrors = BTreeMap<String, String>;

/// Errors raised by the session layer, the API client and the feature pages
#[derive(Debug, Error)]
pub enum ClientError {
    // Transport (connection refused, timeout, TLS)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    // 401 / 403 from the backend; treated the same as "not logged in"
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    // 404 from the backend
    #[error("Not found: {0}")]
    NotFound(String),

    // Any other non-success status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    // Client-side form validation, checked before any request is issued
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("Session store error: {0}")]
    Store(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Navigation was refused by the auth gate
    #[error("Redirected to {0}")]
    Redirected(String),

    // A destructive action was declined at the confirmation step
    #[error("Action cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn validation(field_errors: FieldErrors) -> Self {
        let message = match field_errors.len() {
            1 => field_errors
                .values()
                .next()
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string()),
            n => format!("{} fields are invalid", n),
        };
        ClientError::Validation {
            message,
            field_errors,
        }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut field_errors = FieldErrors::new();
        field_errors.insert(field.into(), message.into());
        Self::validation(field_errors)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ClientError::Decode(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        ClientError::Store(message.into())
    }

    /// Build the error for a failed HTTP response from its status and body text
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = backend_message(body)
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        match status {
            401 | 403 => ClientError::Unauthorized(message),
            404 => ClientError::NotFound(message),
            _ => ClientError::Status { status, message },
        }
    }

    /// True when the failure means the stored session should be considered gone
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_) | ClientError::Redirected(_))
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Store(err.to_string())
    }
}

/// Collapse a backend error body into a single message.
///
/// A JSON string is used as-is, an object with `detail` yields the detail,
/// any other object has all of its values joined with a space (list values
/// are comma-joined first). Non-JSON bodies are returned trimmed.
pub fn backend_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => return Some(trimmed.to_string()),
    };

    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Object(map) => {
            if let Some(detail) = map.get("detail") {
                return Some(flatten_value(detail));
            }
            let joined = map
                .values()
                .map(flatten_value)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if joined.is_empty() {
                None
            } else {
                Some(joined)
            }
        }
        other => Some(flatten_value(&other)),
    }
}

fn flatten_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .collect::<Vec<_>>()
            .join(","),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
