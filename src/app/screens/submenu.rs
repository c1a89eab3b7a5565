use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{is_down, is_up, open};
use crate::app::menu::{self, MenuAction};
use crate::app::message::Msg;
use crate::app::overlay::ShortcutGroup;
use crate::app::screen::{Component, Parent, Update};
use crate::app::search::FilteredList;
use crate::app::Context;
use crate::config::AppConfig;
use crate::ui::widgets::{self, StatusBarState};
use crate::ui::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmenuKind {
    Configuration,
    Backup,
    Tools,
    Secrets,
}

impl SubmenuKind {
    pub fn title(&self) -> &'static str {
        match self {
            SubmenuKind::Configuration => "Configuration",
            SubmenuKind::Backup => "Backup & Restore",
            SubmenuKind::Tools => "Tools",
            SubmenuKind::Secrets => "Secrets",
        }
    }
}

#[derive(Debug)]
pub struct Submenu {
    kind: SubmenuKind,
    list: FilteredList,
}

impl Submenu {
    pub fn new(kind: SubmenuKind, config: &AppConfig) -> Self {
        let entries = match kind {
            SubmenuKind::Configuration => menu::configuration_menu(config),
            SubmenuKind::Backup => menu::backup_menu(),
            SubmenuKind::Tools => menu::tools_menu(),
            SubmenuKind::Secrets => menu::secrets_menu(),
        };
        Self {
            kind,
            list: FilteredList::new(entries),
        }
    }

    pub fn kind(&self) -> SubmenuKind {
        self.kind
    }

    pub fn list(&self) -> &FilteredList {
        &self.list
    }

    fn activate(&self, action: Option<MenuAction>, ctx: &Context) -> Update {
        action.map_or_else(Update::none, |action| open(action, ctx))
    }
}

impl Component for Submenu {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        let Msg::Key(key) = msg else {
            return Update::none();
        };
        if is_down(&key) {
            self.list.move_down();
            return Update::none();
        }
        if is_up(&key) {
            self.list.move_up();
            return Update::none();
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('h') => Parent::MainMenu.update(ctx),
            KeyCode::Char(c @ '1'..='9') => {
                let action = self.list.select_shortcut(c).map(|e| e.action);
                self.activate(action, ctx)
            }
            KeyCode::Enter | KeyCode::Char('l') => {
                let action = self.list.selected().map(|e| e.action);
                self.activate(action, ctx)
            }
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let (left, right) = Layout::columns(area, 40);
        widgets::draw_entries(
            frame,
            left,
            self.kind.title(),
            self.list.visible(),
            self.list.cursor(),
            &ctx.theme,
        );
        widgets::draw_details(frame, right, self.list.selected(), &ctx.theme);
    }

    fn title(&self) -> String {
        self.kind.title().to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![ShortcutGroup::new(self.kind.title())
            .key("j/k, Up/Down", "Move")
            .key("1-9", "Open entry by position")
            .key("Enter, l", "Open selected entry")
            .key("Esc, h", "Back to the main menu")]
    }

    fn status(&self) -> StatusBarState {
        StatusBarState::submenu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::screen::Screen;
    use crate::testing::{context_with, FakeService};
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn configuration_entries_open_the_editor() {
        let home = tempfile::tempdir().unwrap();
        let ctx = context_with(FakeService::default(), Some(home.path().to_path_buf()));
        let mut submenu = Submenu::new(SubmenuKind::Configuration, &ctx.config);

        let update = submenu.update(key(KeyCode::Char('1')), &ctx);
        match update.next {
            Some(Screen::Editor(editor)) => assert_eq!(editor.path(), home.path().join(".zshrc")),
            other => panic!("unexpected transition {:?}", other.map(|s| s.name())),
        }
    }

    #[test]
    fn back_entry_and_escape_lead_to_the_main_menu() {
        let ctx = context_with(FakeService::default(), None);
        let mut submenu = Submenu::new(SubmenuKind::Tools, &ctx.config);

        let update = submenu.update(key(KeyCode::Esc), &ctx);
        assert!(matches!(update.next, Some(Screen::MainMenu(_))));

        let back = char::from_digit(submenu.list().len() as u32, 10).unwrap();
        let update = submenu.update(key(KeyCode::Char(back)), &ctx);
        assert!(matches!(update.next, Some(Screen::MainMenu(_))));
    }

    #[test]
    fn create_backup_starts_a_sequence() {
        let ctx = context_with(FakeService::default(), None);
        let mut submenu = Submenu::new(SubmenuKind::Backup, &ctx.config);
        let update = submenu.update(key(KeyCode::Enter), &ctx);
        assert!(matches!(update.next, Some(Screen::Sequence(_))));
    }
}
