mod backups;
mod bitwarden;
pub mod editor;
mod environment;
mod info;
mod main_menu;
mod sequence;
mod submenu;
mod tools;

pub use backups::{BackupMode, BackupsScreen};
pub use bitwarden::BitwardenForm;
pub use editor::{EditorScreen, SyntaxKind};
pub use environment::EnvironmentScreen;
pub use info::InfoScreen;
pub use main_menu::MainMenu;
pub use sequence::SequenceScreen;
pub use submenu::{Submenu, SubmenuKind};
pub use tools::{ToolMode, ToolsScreen};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::catalog;
use super::menu::MenuAction;
use super::message::Effect;
use super::screen::{Parent, Screen, Update};
use super::Context;

/// Where a menu entry leads
pub fn open(action: MenuAction, ctx: &Context) -> Update {
    let config = &ctx.config;
    let capacity = config.logs.capacity;
    let sequence = |title: &str, steps, parent| {
        Update::navigate(Screen::Sequence(SequenceScreen::new(
            title, steps, parent, capacity,
        )))
    };

    match action {
        MenuAction::Install => sequence("Full installation", catalog::install(config), Parent::MainMenu),
        MenuAction::Verify => sequence("Verify installation", catalog::verify(config), Parent::MainMenu),
        MenuAction::Configure => Parent::Configuration.update(ctx),
        MenuAction::Backup => Parent::Backup.update(ctx),
        MenuAction::Tools => Parent::Tools.update(ctx),
        MenuAction::Secrets => Parent::Secrets.update(ctx),
        MenuAction::Info => Update::navigate(Screen::Info(InfoScreen::new())),
        MenuAction::Quit => Update::effect(Effect::Quit),
        MenuAction::Back => Parent::MainMenu.update(ctx),

        MenuAction::EditConfig(index) => {
            let Some(entry) = config.config_files.get(index) else {
                return Update::none();
            };
            match ctx.expand(&entry.path) {
                Ok(path) => Update::navigate(Screen::Editor(EditorScreen::new(
                    &entry.label,
                    path,
                    config.editor.preview_lines,
                ))),
                Err(e) => Update::effect(Effect::notify(
                    super::overlay::Level::Error,
                    entry.label.clone(),
                    e.to_string(),
                )),
            }
        }

        MenuAction::CreateBackup => sequence(
            "Create backup",
            catalog::backup(config, ctx.home.as_deref(), Local::now().naive_local()),
            Parent::Backup,
        ),
        MenuAction::ListBackups => backups(BackupMode::List),
        MenuAction::RestoreBackup => backups(BackupMode::Restore),
        MenuAction::DeleteBackup => backups(BackupMode::Delete),

        MenuAction::InstallTools => tools(ToolMode::Install),
        MenuAction::UpdateTools => tools(ToolMode::Update),
        MenuAction::ListTools => tools(ToolMode::List),
        MenuAction::UninstallTools => tools(ToolMode::Uninstall),

        MenuAction::BitwardenSetup => Update::navigate(Screen::BitwardenForm(BitwardenForm::new())),
        MenuAction::TestSecrets => {
            sequence("Test secrets integration", catalog::secrets_test(), Parent::Secrets)
        }
        MenuAction::ShowEnvironment => {
            Update::navigate(Screen::Environment(EnvironmentScreen::new(ctx)))
        }
        MenuAction::SyncSecrets => sequence("Sync vault", catalog::secrets_sync(), Parent::Secrets),
    }
}

fn backups(mode: BackupMode) -> Update {
    Update::navigate(Screen::Backups(BackupsScreen::new(mode)))
}

fn tools(mode: ToolMode) -> Update {
    Update::navigate(Screen::Tools(ToolsScreen::new(mode)))
}

pub(crate) fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

pub(crate) fn is_down(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Down | KeyCode::Char('j'))
}

pub(crate) fn is_up(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Up | KeyCode::Char('k'))
}
