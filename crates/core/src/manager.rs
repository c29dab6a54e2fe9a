use crate::fetch::DescribePackage;
use crate::package::{OutdatedIndex, PackageRecord, Scope};
use async_trait::async_trait;
use pkgver_error::Result;

/// A package manager driven through its command line.
///
/// `describe` comes from [`DescribePackage`] so a manager can be handed
/// straight to the description fetcher.
#[async_trait]
pub trait PackageManager: DescribePackage {
    fn name(&self) -> &str;

    async fn check_available(&self) -> Result<bool>;

    /// Installed packages, without descriptions.
    async fn list_installed(&self, scope: Scope) -> Result<Vec<PackageRecord>>;

    async fn list_outdated(&self, scope: Scope) -> Result<OutdatedIndex>;

    /// Upgrade `name` to exactly `version` in `scope`.
    async fn upgrade_to(&self, name: &str, version: &str, scope: Scope) -> Result<()>;

    /// Install `name` at exactly `version` into the global environment.
    async fn install_exact(&self, name: &str, version: &str) -> Result<()>;
}
