// JSON artifacts written to and read from the output directory

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const URLS_FILE: &str = "urls.json";
pub const NOT_FOUND_FILE: &str = "404-pages.json";

/// Default load test input, `output/urls.json`.
pub fn default_urls_path() -> PathBuf {
    Path::new(DEFAULT_OUTPUT_DIR).join(URLS_FILE)
}

/// Filename-safe UTC timestamp, e.g. `2024-05-01T12-30-05-123Z`.
pub fn timestamp_slug(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// Load a JSON array of URLs. A missing file, invalid JSON or an empty list is fatal.
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;

    let urls: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of strings", path.display()))?;

    if urls.is_empty() {
        bail!("No URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Pretty-print `value` into `dir/name`, creating `dir` if needed.
pub fn write_json_artifact<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", name))?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}
