use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};
use ratatui::Frame;

use super::{is_ctrl, is_down, is_up, open};
use crate::app::input::InputBuffer;
use crate::app::menu::{self, MenuAction};
use crate::app::message::{Effect, Msg};
use crate::app::overlay::ShortcutGroup;
use crate::app::screen::{Component, Update};
use crate::app::search::FilteredList;
use crate::app::Context;
use crate::ui::widgets::{self, StatusBarState};
use crate::ui::Layout;

/// Two-column searchable main menu
#[derive(Debug)]
pub struct MainMenu {
    list: FilteredList,
    query: InputBuffer,
    searching: bool,
}

impl Default for MainMenu {
    fn default() -> Self {
        Self::new()
    }
}

impl MainMenu {
    pub fn new() -> Self {
        Self {
            list: FilteredList::new(menu::main_menu()),
            query: InputBuffer::with_limit(40),
            searching: false,
        }
    }

    pub fn list(&self) -> &FilteredList {
        &self.list
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    fn leave_search(&mut self) {
        self.searching = false;
        self.query.clear();
        self.list.clear_query();
    }

    fn activate(&self, action: Option<MenuAction>, ctx: &Context) -> Update {
        match action {
            Some(action) => open(action, ctx),
            None => Update::none(),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, ctx: &Context) -> Update {
        match key.code {
            KeyCode::Esc => self.leave_search(),
            KeyCode::Enter => {
                let action = self.list.selected().map(|e| e.action);
                self.leave_search();
                return self.activate(action, ctx);
            }
            KeyCode::Up => self.list.move_up(),
            KeyCode::Down => self.list.move_down(),
            KeyCode::Backspace => {
                if self.query.delete_back() {
                    self.list.set_query(self.query.content());
                }
            }
            KeyCode::Char(c) => {
                if self.query.insert(c) {
                    self.list.set_query(self.query.content());
                }
            }
            _ => {}
        }
        Update::none()
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Update {
        if self.searching {
            return self.handle_search_key(key, ctx);
        }
        if is_ctrl(&key, 'f') {
            self.searching = true;
            return Update::none();
        }
        if is_down(&key) {
            self.list.move_down();
            return Update::none();
        }
        if is_up(&key) {
            self.list.move_up();
            return Update::none();
        }

        match key.code {
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('q') => return Update::effect(Effect::Quit),
            KeyCode::Char(c @ '1'..='9') => {
                let action = self.list.select_shortcut(c).map(|e| e.action);
                return self.activate(action, ctx);
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.list.select(0);
            }
            KeyCode::End | KeyCode::Char('G') => {
                let last = self.list.len().saturating_sub(1);
                self.list.select(last);
            }
            KeyCode::Enter | KeyCode::Char('l') => {
                let action = self.list.selected().map(|e| e.action);
                return self.activate(action, ctx);
            }
            _ => {}
        }
        Update::none()
    }
}

impl Component for MainMenu {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Key(key) => self.handle_key(key, ctx),
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let show_search = self.searching || self.list.is_filtered();
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if show_search { 1 } else { 0 }),
                Constraint::Min(3),
            ])
            .split(area);

        if show_search {
            widgets::draw_search_bar(frame, chunks[0], self.query.content(), self.searching, theme);
        }

        let (left, right) = Layout::columns(chunks[1], 40);
        widgets::draw_entries(
            frame,
            left,
            "Menu",
            self.list.visible(),
            self.list.cursor(),
            theme,
        );
        widgets::draw_details(frame, right, self.list.selected(), theme);
    }

    fn title(&self) -> String {
        "Main menu".to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![
            ShortcutGroup::new("Navigation")
                .key("j/k, Up/Down", "Move")
                .key("1-9", "Open entry by position")
                .key("Enter", "Open selected entry")
                .key("q", "Quit"),
            ShortcutGroup::new("Search")
                .key("/, Ctrl+f", "Start searching")
                .key("Esc", "Clear the search"),
        ]
    }

    fn status(&self) -> StatusBarState {
        if self.searching {
            StatusBarState::search()
        } else {
            StatusBarState::main_menu()
        }
    }

    fn captures_text(&self) -> bool {
        self.searching
    }
}
