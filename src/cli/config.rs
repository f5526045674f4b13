use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

pub const SESSION_FILE: &str = "session.json";

pub fn get_config_dir(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let config_dir = match &config.storage.config_dir {
        Some(custom_dir) => custom_dir.clone(),
        None => {
            let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
            PathBuf::from(home).join(".config").join("mediconnect")
        }
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn session_file(config: &AppConfig) -> anyhow::Result<PathBuf> {
    Ok(get_config_dir(config)?.join(SESSION_FILE))
}

/// Content type for a profile image, judged by extension
pub fn image_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
