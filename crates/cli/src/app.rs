use crate::menu::{self, Action, ScopeChoice};
use crate::progress::{batch_bar, track};
use crate::settings::Settings;
use crate::table::render_table;
use anyhow::{anyhow, Result};
use colored::*;
use pkgver_backup::{restore_entries, BackupConfig, BackupStore};
use pkgver_core::{
    find_requirements_files, installed_with_descriptions, read_requirements, run_batch,
    BatchReport, Inventory, PackageManager, Scope,
};
use pkgver_error::PkgverError;
use pkgver_pip::PipManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

pub struct App {
    settings: Settings,
    manager: Arc<dyn PackageManager>,
    backups: BackupStore,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let manager = Arc::new(PipManager::system(
            settings.python.clone(),
            settings.command_timeout,
        ));
        Self::with_manager(settings, manager)
    }

    pub fn with_manager(settings: Settings, manager: Arc<dyn PackageManager>) -> Self {
        let backups = BackupStore::new_with_config(BackupConfig {
            backup_dir: settings.backup_dir.clone(),
        });
        Self {
            settings,
            manager,
            backups,
        }
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    pub async fn run(&self) -> Result<Outcome> {
        println!("\n{}", "Package Version Manager".bright_blue().bold());

        if !self.manager.check_available().await? {
            return Err(anyhow!(
                "pip is not available via '{} -m pip'",
                self.settings.python
            ));
        }

        let Some(scope) = menu::select_scope().await? else {
            return Ok(Outcome::Cancelled);
        };
        info!("scope: {}", scope.label());

        let inventory = match scope {
            ScopeChoice::Project => {
                let cwd = std::env::current_dir()?;
                let files = find_requirements_files(&cwd).await?;
                if files.is_empty() {
                    println!(
                        "\n{}",
                        "No requirements files found in the current directory!".bright_red()
                    );
                    return Ok(Outcome::Completed);
                }
                let items = files.iter().map(|path| display_name(path, &cwd)).collect();
                let Some(idx) = menu::select("Select requirements file:", items).await? else {
                    return Ok(Outcome::Cancelled);
                };
                self.check_project_packages(&files[idx]).await?
            }
            ScopeChoice::Global => self.check_global_packages().await?,
        };
        let Some(inventory) = inventory else {
            return Ok(Outcome::Completed);
        };

        println!(
            "\n{}",
            format!("Total package(s): {}", inventory.records.len()).bright_blue()
        );
        if inventory.outdated.is_empty() {
            println!("\n{}", "All packages are up to date!".bright_green());
        } else {
            println!(
                "{}",
                format!("Found {} outdated package(s)", inventory.outdated.len()).bright_yellow()
            );
        }

        let Some(action) = menu::select_action().await? else {
            return Ok(Outcome::Cancelled);
        };
        info!("action: {}", action.label());

        match action {
            Action::UpdateAll => {
                if let Some(report) = self.backup_and_update(&inventory).await {
                    print_failures(&report);
                    println!("\n{}", "Package update process completed!".bright_green());
                }
            }
            Action::BackupOnly => {
                self.create_backup(&inventory).await;
            }
            Action::Restore => return self.restore_from_backup().await,
            Action::Exit => {}
        }

        Ok(Outcome::Completed)
    }

    /// Installed and outdated packages in `scope`, with phase timings printed.
    /// Listing failures are reported and yield `None`.
    pub async fn collect_inventory(&self, scope: Scope, label: &str) -> Option<Inventory> {
        println!("Analyzing {}...", label);
        let started = Instant::now();
        let records =
            match installed_with_descriptions(self.manager.clone(), scope, self.settings.jobs).await {
                Ok(records) => records,
                Err(err) => {
                    report_error("Error listing packages", &err);
                    return None;
                }
            };
        println!("Analysis completed in {:.2}s", started.elapsed().as_secs_f64());

        println!("Checking for updates...");
        let started = Instant::now();
        let outdated = match self.manager.list_outdated(scope).await {
            Ok(outdated) => outdated,
            Err(err) => {
                report_error("Error checking for updates", &err);
                return None;
            }
        };
        println!(
            "Updates check completed in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        Some(Inventory::new(scope, records, outdated))
    }

    pub async fn check_project_packages(&self, requirements_file: &Path) -> Result<Option<Inventory>> {
        println!(
            "\n{}",
            format!("Checking packages from {}", requirements_file.display())
                .bright_blue()
                .bold()
        );
        let requirements = match read_requirements(requirements_file).await {
            Ok(requirements) => requirements,
            Err(err) => {
                println!("\n{}", err.to_string().bright_red());
                Vec::new()
            }
        };

        let Some(inventory) = self.collect_inventory(Scope::User, "project dependencies").await
        else {
            return Ok(None);
        };
        let inventory = inventory.restrict_to(&requirements);

        if inventory.records.is_empty() {
            println!(
                "\n{}",
                "No matching packages found in requirements file".bright_red()
            );
            return Ok(None);
        }

        println!("\n{}", "Project Package Status:".bold());
        print!("{}", render_table(&inventory.records, &inventory.outdated));
        Ok(Some(inventory))
    }

    pub async fn check_global_packages(&self) -> Result<Option<Inventory>> {
        println!("\n{}", "Checking Global Packages".bright_blue().bold());

        let Some(inventory) = self.collect_inventory(Scope::Global, "global packages").await else {
            return Ok(None);
        };

        if inventory.records.is_empty() {
            return Ok(None);
        }

        println!("\n{}", "Global Package Status:".bold());
        print!("{}", render_table(&inventory.records, &inventory.outdated));
        Ok(Some(inventory))
    }

    /// Snapshot the inventory's current versions. Prints the outcome and
    /// returns the snapshot path on success.
    pub async fn create_backup(&self, inventory: &Inventory) -> Option<PathBuf> {
        println!("\n{}", "Creating backup...".bold());
        match self.backups.backup(&inventory.snapshot()).await {
            Ok(path) => {
                println!(
                    "{}",
                    format!("Created backup: {}", path.display()).bright_green()
                );
                Some(path)
            }
            Err(err) => {
                report_error("Error creating backup", &err);
                None
            }
        }
    }

    /// Back up first and upgrade only if the snapshot was written.
    pub async fn backup_and_update(&self, inventory: &Inventory) -> Option<BatchReport> {
        if self.create_backup(inventory).await.is_none() {
            warn!("backup failed, skipping update");
            return None;
        }
        println!("\n{}", "Updating packages...".bold());
        Some(self.update_packages(inventory).await)
    }

    /// Upgrade every outdated package to its latest version in the
    /// inventory's scope.
    pub async fn update_packages(&self, inventory: &Inventory) -> BatchReport {
        let targets = inventory.update_targets();
        let bar = batch_bar(targets.len(), "Updating packages...");
        let manager = self.manager.clone();
        let scope = inventory.scope;

        let report = run_batch(
            &targets,
            |target| {
                let manager = manager.clone();
                async move { manager.upgrade_to(&target.name, &target.version, scope).await }
            },
            track(&bar, "update"),
        )
        .await;
        bar.finish();
        report
    }

    async fn restore_from_backup(&self) -> Result<Outcome> {
        let backups = self.backups.list_backups().await?;
        if backups.is_empty() {
            println!("\n{}", "No backups found!".bright_red());
            return Ok(Outcome::Completed);
        }

        let items = backups.iter().map(|path| path.display().to_string()).collect();
        let Some(idx) = menu::select("Select backup to restore:", items).await? else {
            return Ok(Outcome::Cancelled);
        };

        if let Some(report) = self.restore_backup(&backups[idx]).await {
            print_failures(&report);
            println!("\n{}", "Package restoration completed!".bright_green());
        }
        Ok(Outcome::Completed)
    }

    /// Reinstall the versions recorded in `path`. An unreadable snapshot is
    /// reported and yields `None`.
    pub async fn restore_backup(&self, path: &Path) -> Option<BatchReport> {
        let entries = match self.backups.load(path).await {
            Ok(entries) => entries,
            Err(err) => {
                report_error("Error reading backup file", &err);
                return None;
            }
        };

        println!("\n{}", "Restoring packages...".bold());
        let bar = batch_bar(entries.len(), "Restoring packages...");
        let report = restore_entries(self.manager.as_ref(), &entries, track(&bar, "restore")).await;
        bar.finish();
        Some(report)
    }
}

fn display_name(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn report_error(context: &str, err: &PkgverError) {
    println!("\n{}", format!("{}: {}", context, err).bright_red());
}

fn print_failures(report: &BatchReport) {
    if report.is_clean() {
        return;
    }
    println!(
        "{}",
        format!(
            "{} of {} package(s) failed",
            report.failed.len(),
            report.total()
        )
        .bright_yellow()
    );
}
