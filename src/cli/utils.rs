use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::api::models::ImageUpload;
use crate::cli::OutputFormat;
use crate::error::ClientError;
use crate::layout::LayoutShell;
use crate::pages::{Confirm, Page};
use crate::session::Session;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print field errors one per line, then fail the command with the error
pub fn report_client_error(output_format: &OutputFormat, error: ClientError) -> anyhow::Result<()> {
    if let Some(fields) = error.field_errors() {
        for (field, message) in fields {
            output_error(output_format, message, Some(field.as_str()))?;
        }
    }
    Err(error.into())
}

/// Output a mounted page, inside its role's layout shell when a session admitted it
pub fn output_page(
    output_format: &OutputFormat,
    path: &str,
    session: Option<&Session>,
    page: &dyn Page,
) -> anyhow::Result<()> {
    let shell = session.map(|s| (LayoutShell::for_role(s.role()), s));
    match output_format {
        OutputFormat::Json => {
            let body = json!({
                "title": page.title(),
                "path": path,
                "data": page.to_json(),
            });
            let response = match shell {
                Some((shell, session)) => shell.to_json(session, path, body),
                None => body,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            let mut body = format!("{}\n\n", page.title());
            if let Some(error) = page.error() {
                body.push_str(&format!("! {}\n", error));
            }
            body.push_str(&page.render());
            match shell {
                Some((shell, session)) => print!("{}", shell.render(session, path, &body)),
                None => println!("{}", body),
            }
        }
    }
    Ok(())
}

/// Read a line from stdin after printing `prompt` to stderr
pub fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Use the flag value when given, otherwise ask for it
pub fn value_or_prompt(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt_line(prompt),
    }
}

pub fn load_image(path: &Path) -> anyhow::Result<ImageUpload> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Cannot read image {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    Ok(ImageUpload {
        file_name,
        content_type: crate::cli::config::image_content_type(path).to_string(),
        bytes,
    })
}

/// Asks on the terminal; anything but `y`/`yes` declines
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        match prompt_line(&format!("{} [y/N] ", prompt)) {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
