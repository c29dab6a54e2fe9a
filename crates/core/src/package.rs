use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shown wherever a package summary could not be fetched.
pub const NO_DESCRIPTION: &str = "No description available";

/// Which installation the package manager operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// The whole interpreter environment.
    Global,
    /// The current user's site-packages (`--user`).
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageRecord {
    pub name: String,
    pub installed_version: String,
    pub latest_version: Option<String>,
    pub description: Option<String>,
}

impl PackageRecord {
    pub fn new(name: impl Into<String>, installed_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: installed_version.into(),
            latest_version: None,
            description: None,
        }
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutdatedEntry {
    pub latest_version: String,
}

/// Outdated packages keyed by the name the package manager reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutdatedIndex {
    entries: HashMap<String, OutdatedEntry>,
}

impl OutdatedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, latest_version: impl Into<String>) {
        self.entries.insert(
            name.into(),
            OutdatedEntry {
                latest_version: latest_version.into(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&OutdatedEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutdatedEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|name, _| keep(name));
    }
}

impl FromIterator<(String, String)> for OutdatedIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut index = OutdatedIndex::new();
        for (name, latest) in iter {
            index.insert(name, latest);
        }
        index
    }
}

/// A package name pinned to one exact version. This is the unit stored in
/// backup snapshots and handed to install/upgrade calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinnedPackage {
    pub name: String,
    pub version: String,
}

impl PinnedPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// `name==version`, the form pip accepts on the command line.
    pub fn requirement(&self) -> String {
        format!("{}=={}", self.name, self.version)
    }
}

impl From<&PackageRecord> for PinnedPackage {
    fn from(record: &PackageRecord) -> Self {
        Self::new(record.name.clone(), record.installed_version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_package_drops_decorations() {
        let mut record = PackageRecord::new("requests", "2.0.0");
        record.latest_version = Some("2.31.0".to_string());
        record.description = Some("HTTP for Humans.".to_string());

        let pinned = PinnedPackage::from(&record);
        assert_eq!(pinned, PinnedPackage::new("requests", "2.0.0"));
        assert_eq!(pinned.requirement(), "requests==2.0.0");

        let json = serde_json::to_value(&pinned).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "requests", "version": "2.0.0" }));
    }

    #[test]
    fn test_description_sentinel() {
        let record = PackageRecord::new("left-pad", "1.0");
        assert_eq!(record.description_or_default(), NO_DESCRIPTION);
    }

    #[test]
    fn test_outdated_index_is_case_sensitive() {
        let index: OutdatedIndex = vec![("Flask".to_string(), "3.0.0".to_string())]
            .into_iter()
            .collect();
        assert!(index.contains("Flask"));
        assert!(!index.contains("flask"));
        assert_eq!(index.get("Flask").unwrap().latest_version, "3.0.0");
    }
}
