//! Response helpers and disk persistence

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use datacollector_domain::constants::{SAVE_INDEX_NAME, SAVE_TIMESTAMP_FORMAT};
use datacollector_domain::Result;
use url::Url;

use crate::transport_ports::HttpResponse;

impl HttpResponse {
    /// `Content-Length` header as a number, if present and numeric
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.trim().parse().ok())
    }

    /// Parse the body as JSON, returning the parse error text on failure
    pub fn json(&self) -> std::result::Result<serde_json::Value, String> {
        serde_json::from_slice(&self.body).map_err(|err| err.to_string())
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Write the raw body to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.body)?;
        Ok(())
    }
}

/// File name for an automatically saved response:
/// `{YYYY-MM-DD_HHMMSS}_{domain}_{path}{.json|.html}`
///
/// The domain has `:` replaced by `_`; the path is trimmed of `/`, inner
/// `/` become `_`, and an empty path becomes `index`.
pub fn auto_save_file_name(url: &str, content_type: &str, at: DateTime<Utc>) -> String {
    let (domain, path) = match Url::parse(url) {
        Ok(parsed) => {
            let domain = match (parsed.host_str(), parsed.port()) {
                (Some(host), Some(port)) => format!("{host}_{port}"),
                (Some(host), None) => host.to_string(),
                (None, _) => String::new(),
            };
            (domain, parsed.path().trim_matches('/').replace('/', "_"))
        }
        Err(_) => (String::new(), String::new()),
    };
    let path = if path.is_empty() { SAVE_INDEX_NAME.to_string() } else { path };
    let extension = if content_type.contains("json") { ".json" } else { ".html" };

    format!("{}_{domain}_{path}{extension}", at.format(SAVE_TIMESTAMP_FORMAT))
}

/// Save `response` under `dir` using [`auto_save_file_name`]
pub fn auto_save(dir: &Path, url: &str, response: &HttpResponse, at: DateTime<Utc>) -> Result<PathBuf> {
    let content_type = response.header("content-type").unwrap_or_default();
    let path = dir.join(auto_save_file_name(url, content_type, at));
    response.save_to(&path)?;
    Ok(path)
}
