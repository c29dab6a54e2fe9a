use async_trait::async_trait;
use pkgver_core::process::command_line;
use pkgver_core::{
    CommandRunner, DescribePackage, OutdatedIndex, PackageManager, PackageRecord, Scope,
    SystemRunner, NO_DESCRIPTION,
};
use pkgver_error::{PkgverError, Result};
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, info, warn};

#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

const SUMMARY_PREFIX: &str = "Summary: ";

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct OutdatedListEntry {
    name: String,
    latest_version: String,
}

/// Drives `<python> -m pip`.
pub struct PipManager {
    python: String,
    runner: Arc<dyn CommandRunner>,
}

impl PipManager {
    pub fn new(python: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            python: python.into(),
            runner,
        }
    }

    /// A manager that spawns real processes, each bounded by `timeout`.
    pub fn system(python: impl Into<String>, timeout: Duration) -> Self {
        Self::new(python, Arc::new(SystemRunner::new(timeout)))
    }

    fn build_args(subcommand: &[&str], args: &[&str], scope: Scope) -> Vec<String> {
        let mut cmd_args: Vec<String> = vec!["-m".to_string(), "pip".to_string()];
        cmd_args.extend(subcommand.iter().map(|s| s.to_string()));
        if scope == Scope::User {
            cmd_args.push("--user".to_string());
        }
        cmd_args.extend(args.iter().map(|s| s.to_string()));
        cmd_args
    }

    /// Run one pip subcommand and return its stdout. Not retried.
    async fn exec(&self, subcommand: &[&str], args: &[&str], scope: Scope) -> Result<String> {
        let cmd_args = Self::build_args(subcommand, args, scope);
        let line = command_line(&self.python, &cmd_args);
        debug!("executing {}", line);

        self.runner
            .run(&self.python, &cmd_args)
            .await?
            .into_stdout(&line)
    }
}

pub fn parse_list_output(output: &str) -> Result<Vec<PackageRecord>> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<ListEntry> =
        serde_json::from_str(output).map_err(|e| PkgverError::DecodeError {
            context: "package information".to_string(),
            message: e.to_string(),
        })?;
    Ok(entries
        .into_iter()
        .map(|entry| PackageRecord::new(entry.name, entry.version))
        .collect())
}

pub fn parse_outdated_output(output: &str) -> Result<OutdatedIndex> {
    if output.trim().is_empty() {
        return Ok(OutdatedIndex::new());
    }
    let entries: Vec<OutdatedListEntry> =
        serde_json::from_str(output).map_err(|e| PkgverError::DecodeError {
            context: "outdated package information".to_string(),
            message: e.to_string(),
        })?;
    Ok(entries
        .into_iter()
        .map(|entry| (entry.name, entry.latest_version))
        .collect())
}

/// Value of the first `Summary: ` line of `pip show` output.
pub fn parse_summary(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix(SUMMARY_PREFIX))
        .map(|summary| summary.trim().to_string())
        .filter(|summary| !summary.is_empty())
}

fn decoded_or_empty<T: Default>(decoded: Result<T>) -> Result<T> {
    match decoded {
        Err(err @ PkgverError::DecodeError { .. }) => {
            warn!("{}", err);
            Ok(T::default())
        }
        other => other,
    }
}

#[async_trait]
impl DescribePackage for PipManager {
    async fn describe(&self, name: &str) -> String {
        match self.exec(&["show"], &[name], Scope::Global).await {
            Ok(output) => parse_summary(&output).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            Err(err) => {
                debug!("no description for {}: {}", name, err);
                NO_DESCRIPTION.to_string()
            }
        }
    }
}

#[async_trait]
impl PackageManager for PipManager {
    fn name(&self) -> &str {
        "pip"
    }

    async fn check_available(&self) -> Result<bool> {
        let args = vec!["-m".to_string(), "pip".to_string(), "--version".to_string()];
        match self.runner.run(&self.python, &args).await {
            Ok(output) => Ok(output.success),
            Err(_) => Ok(false),
        }
    }

    async fn list_installed(&self, scope: Scope) -> Result<Vec<PackageRecord>> {
        let output = self.exec(&["list"], &["--format=json"], scope).await?;
        let packages = decoded_or_empty(parse_list_output(&output))?;
        debug!("pip installed packages: {}", packages.len());
        Ok(packages)
    }

    async fn list_outdated(&self, scope: Scope) -> Result<OutdatedIndex> {
        let output = self
            .exec(&["list", "--outdated"], &["--format=json"], scope)
            .await?;
        let outdated = decoded_or_empty(parse_outdated_output(&output))?;
        debug!("pip outdated packages: {}", outdated.len());
        Ok(outdated)
    }

    async fn upgrade_to(&self, name: &str, version: &str, scope: Scope) -> Result<()> {
        let target = format!("{}=={}", name, version);
        info!("pip install --upgrade {}", target);
        self.exec(&["install", "--upgrade"], &[target.as_str()], scope).await?;
        Ok(())
    }

    async fn install_exact(&self, name: &str, version: &str) -> Result<()> {
        let target = format!("{}=={}", name, version);
        info!("pip install {}", target);
        self.exec(&["install"], &[target.as_str()], Scope::Global).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgver_core::CommandOutput;
    use std::sync::Mutex;

    /// Replays canned output keyed on the pip arguments and records every call.
    struct FakeRunner {
        calls: Mutex<Vec<Vec<String>>>,
        respond: Box<dyn Fn(&[String]) -> CommandOutput + Send + Sync>,
    }

    impl FakeRunner {
        fn new<F>(respond: F) -> Arc<Self>
        where
            F: Fn(&[String]) -> CommandOutput + Send + Sync + 'static,
        {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|args| args.join(" "))
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
            assert_eq!(program, "python3");
            self.calls.lock().unwrap().push(args.to_vec());
            Ok((self.respond)(args))
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            success: true,
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_parse_list_output() {
        let output = r#"[{"name": "requests", "version": "2.31.0"}, {"name": "urllib3", "version": "2.0.7"}]"#;
        let packages = parse_list_output(output).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "requests");
        assert_eq!(packages[1].installed_version, "2.0.7");
        assert!(packages[0].description.is_none());
    }

    #[test]
    fn test_parse_outdated_output() {
        let output = r#"[{"name": "Flask", "version": "2.0.0", "latest_version": "3.0.0", "latest_filetype": "wheel"}]"#;
        let outdated = parse_outdated_output(output).unwrap();
        assert_eq!(outdated.get("Flask").unwrap().latest_version, "3.0.0");
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_list_output("Package Version\n------- -------").unwrap_err();
        assert!(matches!(err, PkgverError::DecodeError { .. }));
    }

    #[test]
    fn test_parse_summary() {
        let output = "Name: requests\nVersion: 2.31.0\nSummary: Python HTTP for Humans.\nHome-page: https://requests.readthedocs.io\n";
        assert_eq!(parse_summary(output).as_deref(), Some("Python HTTP for Humans."));
        assert_eq!(parse_summary("Name: x\nSummary: \n"), None);
        assert_eq!(parse_summary("Name: x\n"), None);
    }

    #[tokio::test]
    async fn test_user_scope_appends_flag() {
        let runner = FakeRunner::new(|_| ok("[]"));
        let manager = PipManager::new("python3", runner.clone());

        manager.list_installed(Scope::User).await.unwrap();
        manager.list_outdated(Scope::Global).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "-m pip list --user --format=json",
                "-m pip list --outdated --format=json",
            ]
        );
    }

    #[tokio::test]
    async fn test_install_command_lines() {
        let runner = FakeRunner::new(|_| ok(""));
        let manager = PipManager::new("python3", runner.clone());

        manager.upgrade_to("requests", "2.31.0", Scope::User).await.unwrap();
        manager.upgrade_to("flask", "3.0.0", Scope::Global).await.unwrap();
        manager.install_exact("numpy", "1.2.0").await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "-m pip install --upgrade --user requests==2.31.0",
                "-m pip install --upgrade flask==3.0.0",
                "-m pip install numpy==1.2.0",
            ]
        );
    }

    #[tokio::test]
    async fn test_describe_falls_back_to_sentinel() {
        let runner = FakeRunner::new(|args| match args.last().map(String::as_str) {
            Some("requests") => ok("Name: requests\nSummary: Python HTTP for Humans.\n"),
            Some("nosummary") => ok("Name: nosummary\nVersion: 1.0\n"),
            _ => failed("WARNING: Package(s) not found"),
        });
        let manager = PipManager::new("python3", runner.clone());

        assert_eq!(manager.describe("requests").await, "Python HTTP for Humans.");
        assert_eq!(manager.describe("nosummary").await, NO_DESCRIPTION);
        assert_eq!(manager.describe("missing").await, NO_DESCRIPTION);
        assert_eq!(runner.calls()[0], "-m pip show requests");
    }

    #[tokio::test]
    async fn test_undecodable_listing_is_empty() {
        let runner = FakeRunner::new(|_| ok("not json"));
        let manager = PipManager::new("python3", runner);

        assert!(manager.list_installed(Scope::Global).await.unwrap().is_empty());
        assert!(manager.list_outdated(Scope::Global).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_listing_is_an_error() {
        let runner = FakeRunner::new(|_| failed("pip exploded"));
        let manager = PipManager::new("python3", runner);

        let err = manager.list_installed(Scope::Global).await.unwrap_err();
        assert_eq!(err.stderr(), Some("pip exploded"));
    }

    #[tokio::test]
    async fn test_check_available() {
        let manager = PipManager::new("python3", FakeRunner::new(|_| ok("pip 24.0")));
        assert!(manager.check_available().await.unwrap());

        let manager = PipManager::new("python3", FakeRunner::new(|_| failed("No module named pip")));
        assert!(!manager.check_available().await.unwrap());
        assert_eq!(manager.name(), "pip");
    }
}
