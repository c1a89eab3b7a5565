use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tracing::info;

use super::{is_down, is_up};
use crate::app::jobs::{Job, JobMessage};
use crate::app::message::{Effect, Msg};
use crate::app::overlay::{Level, ShortcutGroup};
use crate::app::screen::{Component, Parent, Update};
use crate::app::Context;
use crate::system::BackupEntry;
use crate::ui::widgets::{self, StatusBarState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    List,
    Restore,
    Delete,
}

impl BackupMode {
    fn title(&self) -> &'static str {
        match self {
            BackupMode::List => "Backups",
            BackupMode::Restore => "Restore backup",
            BackupMode::Delete => "Delete backup",
        }
    }
}

#[derive(Debug)]
enum Listing {
    Loading,
    Loaded(Vec<BackupEntry>),
    Failed(String),
}

/// Lists backup directories in HOME and restores or deletes one of them
#[derive(Debug)]
pub struct BackupsScreen {
    mode: BackupMode,
    listing: Listing,
    cursor: usize,
    /// Backup waiting for a y/n answer
    confirm: Option<BackupEntry>,
    busy: bool,
}

impl BackupsScreen {
    pub fn new(mode: BackupMode) -> Self {
        Self {
            mode,
            listing: Listing::Loading,
            cursor: 0,
            confirm: None,
            busy: false,
        }
    }

    pub fn backups(&self) -> &[BackupEntry] {
        match &self.listing {
            Listing::Loaded(backups) => backups,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.listing, Listing::Loading)
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.listing, Listing::Loaded(backups) if backups.is_empty())
    }

    pub fn pending_confirmation(&self) -> Option<&BackupEntry> {
        self.confirm.as_ref()
    }

    fn reload(&mut self) -> Update {
        self.listing = Listing::Loading;
        Update::effect(Effect::Spawn(Job::ListBackups))
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Update {
        let Some(backup) = self.confirm.take() else {
            return Update::none();
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.busy = true;
                info!("{} {}", self.mode.title(), backup.name);
                let job = match self.mode {
                    BackupMode::Delete => Job::DeleteBackup { backup },
                    _ => Job::RestoreBackup { backup },
                };
                Update::effect(Effect::Spawn(job))
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Update::none(),
            _ => {
                self.confirm = Some(backup);
                Update::none()
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Update {
        if self.confirm.is_some() {
            return self.handle_confirm_key(key);
        }
        if is_down(&key) {
            if self.cursor + 1 < self.backups().len() {
                self.cursor += 1;
            }
            return Update::none();
        }
        if is_up(&key) {
            self.cursor = self.cursor.saturating_sub(1);
            return Update::none();
        }
        match key.code {
            KeyCode::Esc => Parent::Backup.update(ctx),
            KeyCode::Char('r') if !self.busy => self.reload(),
            KeyCode::Enter if self.mode != BackupMode::List && !self.busy => {
                self.confirm = self.backups().get(self.cursor).cloned();
                Update::none()
            }
            _ => Update::none(),
        }
    }
}

impl Component for BackupsScreen {
    fn init(&mut self, _ctx: &Context) -> Vec<Effect> {
        vec![Effect::Spawn(Job::ListBackups)]
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Key(key) => self.handle_key(key, ctx),
            Msg::Job(JobMessage::Backups(result)) => {
                self.listing = match result {
                    Ok(backups) => Listing::Loaded(backups),
                    Err(e) => Listing::Failed(e),
                };
                self.cursor = self.cursor.min(self.backups().len().saturating_sub(1));
                Update::none()
            }
            Msg::Job(JobMessage::BackupRestored { name, result }) => {
                self.busy = false;
                match result {
                    Ok(report) if report.is_clean() => Update::effect(Effect::notify(
                        Level::Success,
                        "Backup restored",
                        format!("{} files restored from {}", report.copied, name),
                    )),
                    Ok(report) => Update::effect(Effect::notify(
                        Level::Warning,
                        "Backup partly restored",
                        format!("{} from {}", report.summary(), name),
                    )),
                    Err(e) => Update::effect(Effect::notify(Level::Error, "Restore failed", e)),
                }
            }
            Msg::Job(JobMessage::BackupDeleted { name, result }) => {
                self.busy = false;
                match result {
                    Ok(()) => self.reload().with(Effect::notify(
                        Level::Success,
                        "Backup deleted",
                        name,
                    )),
                    Err(e) => Update::effect(Effect::notify(Level::Error, "Delete failed", e)),
                }
            }
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(format!(" {} ", self.mode.title()))
            .title_style(theme.primary_style());

        match &self.listing {
            Listing::Loading => {
                frame.render_widget(
                    Paragraph::new("Looking for backups...").style(theme.muted_style()).block(block),
                    area,
                );
            }
            Listing::Failed(e) => {
                frame.render_widget(
                    Paragraph::new(format!("Could not list backups: {}", e))
                        .style(theme.error_style())
                        .block(block),
                    area,
                );
            }
            Listing::Loaded(backups) if backups.is_empty() => {
                let text = vec![
                    Line::from(Span::styled("No backups found", theme.primary_style())),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Create one from Backup & Restore > Create backup",
                        theme.muted_style(),
                    )),
                ];
                frame.render_widget(Paragraph::new(text).block(block), area);
            }
            Listing::Loaded(backups) => {
                let items: Vec<ListItem> = backups
                    .iter()
                    .enumerate()
                    .map(|(i, backup)| {
                        let created = backup
                            .created
                            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_else(|| "unknown date".to_string());
                        let marker = if i == self.cursor { ">" } else { " " };
                        let style = if i == self.cursor {
                            theme.selected_style()
                        } else {
                            theme.style()
                        };
                        ListItem::new(format!("{} {:<40} {}", marker, backup.name, created))
                            .style(style)
                    })
                    .collect();
                let mut state = ListState::default().with_selected(Some(self.cursor));
                frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
            }
        }

        if let Some(backup) = &self.confirm {
            let (title, message) = match self.mode {
                BackupMode::Delete => ("Delete", format!("Delete {}? This cannot be undone.", backup.name)),
                _ => ("Restore", format!("Restore {} into your home directory?", backup.name)),
            };
            widgets::draw_confirm_dialog(frame, area, title, &message, theme);
        }
    }

    fn title(&self) -> String {
        self.mode.title().to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        let mut group = ShortcutGroup::new("Backups")
            .key("j/k, Up/Down", "Move")
            .key("r", "Refresh");
        if self.mode != BackupMode::List {
            group = group
                .key("Enter", "Select backup")
                .key("y/n", "Confirm or cancel");
        }
        vec![group]
    }

    fn status(&self) -> StatusBarState {
        if self.confirm.is_some() {
            StatusBarState::confirm()
        } else {
            StatusBarState::picker()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_with, FakeService};
    use crossterm::event::KeyModifiers;
    use std::fs;

    fn key(c: char) -> Msg {
        Msg::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn enter() -> Msg {
        Msg::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    fn list(screen: &mut BackupsScreen, ctx: &Context) {
        let message = Job::ListBackups.run(ctx);
        screen.update(Msg::Job(message), ctx);
    }

    #[test]
    fn empty_home_shows_no_backups() {
        let home = tempfile::tempdir().unwrap();
        let ctx = context_with(FakeService::default(), Some(home.path().to_path_buf()));
        let mut screen = BackupsScreen::new(BackupMode::List);
        assert_eq!(screen.init(&ctx), vec![Effect::Spawn(Job::ListBackups)]);
        assert!(screen.is_loading());

        list(&mut screen, &ctx);
        assert!(screen.is_empty());
        assert!(screen.update(enter(), &ctx).effects.is_empty());
    }

    #[test]
    fn delete_asks_first() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".dotfiles-backup-2024-01-02_03-04-05");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".zshrc"), "old").unwrap();
        let ctx = context_with(FakeService::default(), Some(home.path().to_path_buf()));

        let mut screen = BackupsScreen::new(BackupMode::Delete);
        list(&mut screen, &ctx);
        assert_eq!(screen.backups().len(), 1);

        screen.update(enter(), &ctx);
        assert!(screen.pending_confirmation().is_some());
        let update = screen.update(key('n'), &ctx);
        assert!(update.effects.is_empty());
        assert!(screen.pending_confirmation().is_none());
        assert!(dir.exists());

        screen.update(enter(), &ctx);
        let update = screen.update(key('y'), &ctx);
        let [Effect::Spawn(job)] = &update.effects[..] else {
            panic!("expected a delete job");
        };
        let message = job.clone().run(&ctx);
        assert!(!dir.exists());

        let update = screen.update(Msg::Job(message), &ctx);
        assert_eq!(update.effects[0], Effect::Spawn(Job::ListBackups));
    }

    #[test]
    fn restore_copies_files_back() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".dotfiles-backup-2024-01-02_03-04-05");
        fs::create_dir_all(dir.join(".config/nvim")).unwrap();
        fs::write(dir.join(".config/nvim/init.lua"), "saved").unwrap();
        let ctx = context_with(FakeService::default(), Some(home.path().to_path_buf()));

        let mut screen = BackupsScreen::new(BackupMode::Restore);
        list(&mut screen, &ctx);
        screen.update(enter(), &ctx);
        let update = screen.update(key('y'), &ctx);
        let [Effect::Spawn(job)] = &update.effects[..] else {
            panic!("expected a restore job");
        };
        job.clone().run(&ctx);

        let restored = fs::read_to_string(home.path().join(".config/nvim/init.lua")).unwrap();
        assert_eq!(restored, "saved");
    }

    #[test]
    fn partial_restore_warns() {
        let home = tempfile::tempdir().unwrap();
        let dir = home.path().join(".dotfiles-backup-2024-01-02_03-04-05");
        fs::create_dir_all(dir.join(".config/nvim")).unwrap();
        fs::write(dir.join(".config/nvim/init.lua"), "saved").unwrap();
        fs::write(dir.join(".zshrc"), "export A=1").unwrap();
        fs::write(home.path().join(".config"), "in the way").unwrap();
        let ctx = context_with(FakeService::default(), Some(home.path().to_path_buf()));

        let mut screen = BackupsScreen::new(BackupMode::Restore);
        list(&mut screen, &ctx);
        screen.update(enter(), &ctx);
        let update = screen.update(key('y'), &ctx);
        let [Effect::Spawn(job)] = &update.effects[..] else {
            panic!("expected a restore job");
        };
        let message = job.clone().run(&ctx);
        let update = screen.update(Msg::Job(message), &ctx);

        let [Effect::Notify { level, message, .. }] = &update.effects[..] else {
            panic!("expected a notification");
        };
        assert_eq!(*level, Level::Warning);
        assert!(message.starts_with("1 copied, 1 failed"));
        assert_eq!(fs::read_to_string(home.path().join(".zshrc")).unwrap(), "export A=1");
    }
}
