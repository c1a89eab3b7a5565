use crate::config::AppConfig;

/// Everything a menu entry can lead to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    // Main menu
    Install,
    Configure,
    Verify,
    Backup,
    Tools,
    Secrets,
    Info,
    Quit,

    // Shared
    Back,

    // Configuration
    EditConfig(usize),

    // Backup
    CreateBackup,
    ListBackups,
    RestoreBackup,
    DeleteBackup,

    // Tools
    InstallTools,
    UpdateTools,
    ListTools,
    UninstallTools,

    // Secrets
    BitwardenSetup,
    TestSecrets,
    ShowEnvironment,
    SyncSecrets,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub shortcut: char,
    pub title: String,
    pub description: String,
    pub action: MenuAction,
}

impl MenuEntry {
    pub fn new(
        shortcut: char,
        title: impl Into<String>,
        description: impl Into<String>,
        action: MenuAction,
    ) -> Self {
        Self {
            shortcut,
            title: title.into(),
            description: description.into(),
            action,
        }
    }
}

/// Shortcut for the n-th entry of a list (1-based, up to 9)
fn digit(n: usize) -> char {
    char::from_digit((n % 10) as u32, 10).unwrap_or(' ')
}

fn numbered(items: Vec<(String, String, MenuAction)>) -> Vec<MenuEntry> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, (title, description, action))| {
            let shortcut = if i < 9 { digit(i + 1) } else { ' ' };
            MenuEntry::new(shortcut, title, description, action)
        })
        .collect()
}

fn owned(items: &[(&str, &str, MenuAction)]) -> Vec<(String, String, MenuAction)> {
    items
        .iter()
        .map(|(t, d, a)| (t.to_string(), d.to_string(), *a))
        .collect()
}

pub fn main_menu() -> Vec<MenuEntry> {
    numbered(owned(&[
        (
            "Full installation",
            "Install tools, shell and configuration in one go",
            MenuAction::Install,
        ),
        (
            "Configuration",
            "Edit zsh, git, starship, neovim and tmux files",
            MenuAction::Configure,
        ),
        (
            "Verify installation",
            "Check tools and configuration files",
            MenuAction::Verify,
        ),
        (
            "Backup & Restore",
            "Create, list, restore and delete backups",
            MenuAction::Backup,
        ),
        (
            "Tools",
            "Install, update or remove command line tools",
            MenuAction::Tools,
        ),
        (
            "Secrets",
            "Bitwarden integration and environment",
            MenuAction::Secrets,
        ),
        (
            "System information",
            "OS, shell, user and important paths",
            MenuAction::Info,
        ),
        ("Quit", "Leave the dotfiles manager", MenuAction::Quit),
    ]))
}

pub fn configuration_menu(config: &AppConfig) -> Vec<MenuEntry> {
    let mut items: Vec<(String, String, MenuAction)> = config
        .config_files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let description = if file.description.is_empty() {
                file.path.clone()
            } else {
                format!("{} ({})", file.description, file.path)
            };
            (file.label.clone(), description, MenuAction::EditConfig(i))
        })
        .collect();
    items.push(back());
    numbered(items)
}

pub fn backup_menu() -> Vec<MenuEntry> {
    let mut items = owned(&[
        (
            "Create backup",
            "Copy current dotfiles into a timestamped directory",
            MenuAction::CreateBackup,
        ),
        ("List backups", "Show existing backups", MenuAction::ListBackups),
        (
            "Restore backup",
            "Copy a backup back into HOME",
            MenuAction::RestoreBackup,
        ),
        ("Delete backup", "Remove an old backup", MenuAction::DeleteBackup),
    ]);
    items.push(back());
    numbered(items)
}

pub fn tools_menu() -> Vec<MenuEntry> {
    let mut items = owned(&[
        ("Install tools", "Install missing tools", MenuAction::InstallTools),
        ("Update tools", "Upgrade installed tools", MenuAction::UpdateTools),
        ("List tools", "Show what is installed", MenuAction::ListTools),
        ("Uninstall tools", "Remove installed tools", MenuAction::UninstallTools),
    ]);
    items.push(back());
    numbered(items)
}

pub fn secrets_menu() -> Vec<MenuEntry> {
    let mut items = owned(&[
        (
            "Bitwarden setup",
            "Check the CLI and log-in state for an account",
            MenuAction::BitwardenSetup,
        ),
        (
            "Test integration",
            "Check bw and BW_SESSION",
            MenuAction::TestSecrets,
        ),
        (
            "Environment",
            "Show secret related variables",
            MenuAction::ShowEnvironment,
        ),
        ("Sync vault", "Run bw sync", MenuAction::SyncSecrets),
    ]);
    items.push(back());
    numbered(items)
}

fn back() -> (String, String, MenuAction) {
    (
        "Back".to_string(),
        "Return to the main menu".to_string(),
        MenuAction::Back,
    )
}
