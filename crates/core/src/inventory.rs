use crate::fetch::fetch_descriptions;
use crate::manager::PackageManager;
use crate::package::{OutdatedIndex, PackageRecord, PinnedPackage, Scope, NO_DESCRIPTION};
use crate::requirements::{normalize_name, RequirementSpec};
use pkgver_error::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// List installed packages in `scope` and attach a description to each one.
pub async fn installed_with_descriptions<M>(
    manager: Arc<M>,
    scope: Scope,
    concurrency: usize,
) -> Result<Vec<PackageRecord>>
where
    M: PackageManager + ?Sized + 'static,
{
    let mut records = manager.list_installed(scope).await?;
    let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
    let mut descriptions = fetch_descriptions(manager, &names, concurrency).await;

    for record in &mut records {
        let description = descriptions
            .remove(&record.name)
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        record.description = Some(description);
    }

    debug!("{} installed packages described", records.len());
    Ok(records)
}

/// Installed packages together with what the index says is outdated.
#[derive(Debug, Clone)]
pub struct Inventory {
    pub scope: Scope,
    pub records: Vec<PackageRecord>,
    pub outdated: OutdatedIndex,
}

impl Inventory {
    pub fn new(scope: Scope, mut records: Vec<PackageRecord>, outdated: OutdatedIndex) -> Self {
        for record in &mut records {
            record.latest_version = outdated
                .get(&record.name)
                .map(|entry| entry.latest_version.clone());
        }
        Self {
            scope,
            records,
            outdated,
        }
    }

    /// Keep only the packages named in `requirements`. Version constraints
    /// are ignored; names compare after normalization.
    pub fn restrict_to(mut self, requirements: &[RequirementSpec]) -> Self {
        let wanted: HashSet<String> = requirements
            .iter()
            .map(|req| normalize_name(&req.name))
            .collect();

        self.records
            .retain(|record| wanted.contains(&normalize_name(&record.name)));
        self.outdated
            .retain(|name| wanted.contains(&normalize_name(name)));
        self
    }

    pub fn is_outdated(&self, name: &str) -> bool {
        self.outdated.contains(name)
    }

    /// Current versions of every record, in inventory order.
    pub fn snapshot(&self) -> Vec<PinnedPackage> {
        self.records.iter().map(PinnedPackage::from).collect()
    }

    /// Outdated packages pinned to their latest version, ordered by name.
    pub fn update_targets(&self) -> Vec<PinnedPackage> {
        let mut targets: Vec<PinnedPackage> = self
            .outdated
            .iter()
            .map(|(name, entry)| PinnedPackage::new(name, entry.latest_version.clone()))
            .collect();
        targets.sort_by_key(|target| target.name.to_lowercase());
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DescribePackage;
    use async_trait::async_trait;
    use pkgver_error::PkgverError;

    struct StaticManager {
        installed: Vec<PackageRecord>,
    }

    #[async_trait]
    impl DescribePackage for StaticManager {
        async fn describe(&self, name: &str) -> String {
            match name {
                "requests" => "Python HTTP for Humans.".to_string(),
                _ => NO_DESCRIPTION.to_string(),
            }
        }
    }

    #[async_trait]
    impl PackageManager for StaticManager {
        fn name(&self) -> &str {
            "static"
        }

        async fn check_available(&self) -> Result<bool> {
            Ok(true)
        }

        async fn list_installed(&self, _scope: Scope) -> Result<Vec<PackageRecord>> {
            Ok(self.installed.clone())
        }

        async fn list_outdated(&self, _scope: Scope) -> Result<OutdatedIndex> {
            Ok(OutdatedIndex::new())
        }

        async fn upgrade_to(&self, _name: &str, _version: &str, _scope: Scope) -> Result<()> {
            Err(PkgverError::CommandFailed {
                command: "upgrade".to_string(),
                exit_code: 1,
                stderr: "read only".to_string(),
            })
        }

        async fn install_exact(&self, _name: &str, _version: &str) -> Result<()> {
            Ok(())
        }
    }

    fn sample() -> Vec<PackageRecord> {
        vec![
            PackageRecord::new("requests", "2.0.0"),
            PackageRecord::new("Flask", "2.3.0"),
            PackageRecord::new("numpy", "1.2.0"),
        ]
    }

    #[tokio::test]
    async fn test_descriptions_are_merged() {
        let manager = Arc::new(StaticManager { installed: sample() });
        let records = installed_with_descriptions(manager, Scope::Global, 4)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].description.as_deref(), Some("Python HTTP for Humans."));
        assert_eq!(records[1].description.as_deref(), Some(NO_DESCRIPTION));
    }

    #[test]
    fn test_latest_version_is_stamped() {
        let outdated: OutdatedIndex = vec![("requests".to_string(), "2.31.0".to_string())]
            .into_iter()
            .collect();
        let inventory = Inventory::new(Scope::Global, sample(), outdated);

        assert_eq!(inventory.records[0].latest_version.as_deref(), Some("2.31.0"));
        assert!(inventory.records[1].latest_version.is_none());
        assert!(inventory.is_outdated("requests"));
        assert_eq!(
            inventory.update_targets(),
            vec![PinnedPackage::new("requests", "2.31.0")]
        );
    }

    #[test]
    fn test_restrict_ignores_constraints_and_case() {
        let outdated: OutdatedIndex = vec![
            ("requests".to_string(), "2.31.0".to_string()),
            ("numpy".to_string(), "2.0.0".to_string()),
        ]
        .into_iter()
        .collect();
        let requirements = vec![
            RequirementSpec::parse("requests>=3.0").unwrap(),
            RequirementSpec::parse("flask").unwrap(),
        ];

        let inventory = Inventory::new(Scope::User, sample(), outdated).restrict_to(&requirements);

        let names: Vec<&str> = inventory.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["requests", "Flask"]);
        assert!(inventory.is_outdated("requests"));
        assert!(!inventory.is_outdated("numpy"));
        assert_eq!(inventory.outdated.len(), 1);
    }

    #[test]
    fn test_snapshot_keeps_installed_versions() {
        let outdated: OutdatedIndex = vec![("requests".to_string(), "2.31.0".to_string())]
            .into_iter()
            .collect();
        let inventory = Inventory::new(Scope::Global, sample(), outdated);
        let snapshot = inventory.snapshot();
        assert_eq!(snapshot[0], PinnedPackage::new("requests", "2.0.0"));
        assert_eq!(snapshot.len(), 3);
    }
}
