use pkgver_error::{PkgverError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

const REQUIREMENTS_MARKER: &str = "requirements";
const REQUIREMENTS_EXTENSIONS: [&str; 2] = [".txt", ".pip"];

/// One line of a requirements file. Only `name` takes part in filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementSpec {
    pub name: String,
    pub constraint: Option<String>,
}

impl RequirementSpec {
    /// Parse a single requirement line. Returns `None` for blank lines,
    /// comments, pip options and lines without a package name.
    pub fn parse(line: &str) -> Option<Self> {
        let line = strip_comment(line).trim();
        if line.is_empty() || line.starts_with('-') {
            return None;
        }

        let end = line
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
            .unwrap_or(line.len());
        let name = &line[..end];
        if name.is_empty() {
            return None;
        }

        let rest = line[end..].trim();
        Some(Self {
            name: name.to_string(),
            constraint: (!rest.is_empty()).then(|| rest.to_string()),
        })
    }
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Canonical package name: lowercase, with runs of `-`, `_` and `.` folded to
/// a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    normalized
}

pub fn parse_requirements(content: &str) -> Vec<RequirementSpec> {
    content
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('-') {
                warn!("skipping pip option in requirements: {}", trimmed);
                return None;
            }
            let parsed = RequirementSpec::parse(line);
            if parsed.is_none() && !strip_comment(line).trim().is_empty() {
                warn!("skipping unparseable requirement: {}", trimmed);
            }
            parsed
        })
        .collect()
}

pub async fn read_requirements(path: &Path) -> Result<Vec<RequirementSpec>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| PkgverError::RequirementsError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(parse_requirements(&content))
}

/// Requirements files directly inside `dir` (`*requirements*.txt` and
/// `*requirements*.pip`), sorted by name.
pub async fn find_requirements_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if is_requirements_file(&file_name) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_requirements_file(file_name: &str) -> bool {
    if file_name.starts_with('.') {
        return false;
    }
    REQUIREMENTS_EXTENSIONS.iter().any(|ext| {
        file_name
            .strip_suffix(ext)
            .map(|stem| stem.contains(REQUIREMENTS_MARKER))
            .unwrap_or(false)
    })
}
