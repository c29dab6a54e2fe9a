use anyhow::{anyhow, Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeChoice {
    Project,
    Global,
}

impl ScopeChoice {
    pub const ALL: [ScopeChoice; 2] = [ScopeChoice::Project, ScopeChoice::Global];

    pub fn label(self) -> &'static str {
        match self {
            ScopeChoice::Project => "Project Libraries",
            ScopeChoice::Global => "Global Libraries",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpdateAll,
    BackupOnly,
    Restore,
    Exit,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::UpdateAll,
        Action::BackupOnly,
        Action::Restore,
        Action::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::UpdateAll => "Update all packages",
            Action::BackupOnly => "Create backup only",
            Action::Restore => "Restore from backup",
            Action::Exit => "Exit",
        }
    }
}

/// Show a selection list. `None` means the user backed out (Esc, q or
/// Ctrl-C).
pub async fn select(prompt: &str, items: Vec<String>) -> Result<Option<usize>> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        let theme = ColorfulTheme::default();
        let choice = Select::with_theme(&theme)
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact_opt();
        match choice {
            Ok(choice) => Ok(choice),
            Err(dialoguer::Error::IO(err)) if err.kind() == io::ErrorKind::Interrupted => {
                let _ = console::Term::stderr().show_cursor();
                Ok(None)
            }
            Err(err) => Err(anyhow!("selection failed: {}", err)),
        }
    })
    .await
    .context("prompt task failed")?
}

pub async fn select_scope() -> Result<Option<ScopeChoice>> {
    let items = ScopeChoice::ALL.iter().map(|c| c.label().to_string()).collect();
    let choice = select("What would you like to check?", items).await?;
    Ok(choice.map(|idx| ScopeChoice::ALL[idx]))
}

pub async fn select_action() -> Result<Option<Action>> {
    let items = Action::ALL.iter().map(|a| a.label().to_string()).collect();
    let choice = select("What would you like to do?", items).await?;
    Ok(choice.map(|idx| Action::ALL[idx]))
}
