use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::Frame;

use crate::app::message::{Effect, Msg};
use crate::app::screen::{Component, Host, Screen, Update};
use crate::app::Context;
use crate::ui::widgets::{self, StatusBarState};

/// Keys of one category shown in the help panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutGroup {
    pub category: String,
    pub keys: Vec<(String, String)>,
}

impl ShortcutGroup {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            keys: Vec::new(),
        }
    }

    pub fn key(mut self, keys: impl Into<String>, action: impl Into<String>) -> Self {
        self.keys.push((keys.into(), action.into()));
        self
    }

    pub fn global() -> Self {
        Self::new("General")
            .key("?/F1", "Toggle this help")
            .key("Esc", "Back")
            .key("Ctrl+c", "Quit")
    }
}

/// Help panel drawn over the wrapped screen. While visible it swallows
/// every key.
#[derive(Debug)]
pub struct WithHelp<S> {
    inner: S,
    visible: bool,
}

impl<S: Host> WithHelp<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn is_toggle(&self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::F(1) => true,
            KeyCode::Char('?') => !self.inner.captures_text(),
            _ => false,
        }
    }
}

impl<S: Host> Component for WithHelp<S> {
    fn init(&mut self, ctx: &Context) -> Vec<Effect> {
        self.inner.init(ctx)
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        if let Msg::Key(key) = &msg {
            if self.is_toggle(key) {
                self.visible = !self.visible;
                return Update::none();
            }
            if self.visible {
                self.visible = false;
                return Update::none();
            }
        }
        self.inner.update(msg, ctx)
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        self.inner.draw(frame, area, ctx);
        if self.visible {
            let mut groups = self.inner.shortcuts();
            groups.push(ShortcutGroup::global());
            widgets::draw_help(frame, area, &self.inner.title(), &groups, &ctx.theme);
        }
    }

    fn title(&self) -> String {
        self.inner.title()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        self.inner.shortcuts()
    }

    fn status(&self) -> StatusBarState {
        if self.visible {
            StatusBarState::help()
        } else {
            self.inner.status()
        }
    }

    fn captures_text(&self) -> bool {
        self.inner.captures_text()
    }
}

impl<S: Host> Host for WithHelp<S> {
    fn adopt(&mut self, next: Screen, ctx: &Context) -> Vec<Effect> {
        self.visible = false;
        self.inner.adopt(next, ctx)
    }

    fn screen(&self) -> &Screen {
        self.inner.screen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::screens::{BitwardenForm, MainMenu};
    use crate::testing::{context_with, FakeService};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn menu_cursor(help: &WithHelp<Screen>) -> usize {
        match help.screen() {
            Screen::MainMenu(menu) => menu.list().cursor(),
            other => panic!("unexpected screen {}", other.name()),
        }
    }

    #[test]
    fn question_mark_and_f1_toggle() {
        let ctx = context_with(FakeService::default(), None);
        let mut help = WithHelp::new(Screen::MainMenu(MainMenu::new()));

        help.update(key(KeyCode::Char('?')), &ctx);
        assert!(help.is_visible());
        help.update(key(KeyCode::Char('?')), &ctx);
        assert!(!help.is_visible());
        help.update(key(KeyCode::F(1)), &ctx);
        assert!(help.is_visible());
    }

    #[test]
    fn dismissing_key_is_not_forwarded() {
        let ctx = context_with(FakeService::default(), None);
        let mut help = WithHelp::new(Screen::MainMenu(MainMenu::new()));

        help.update(key(KeyCode::F(1)), &ctx);
        let update = help.update(key(KeyCode::Char('j')), &ctx);
        assert!(!help.is_visible());
        assert!(!update.navigated());
        assert!(update.effects.is_empty());
        assert_eq!(menu_cursor(&help), 0);

        // Once hidden, keys reach the screen again
        help.update(key(KeyCode::Char('j')), &ctx);
        assert_eq!(menu_cursor(&help), 1);
    }

    #[test]
    fn enter_while_visible_does_not_navigate() {
        let ctx = context_with(FakeService::default(), None);
        let mut help = WithHelp::new(Screen::MainMenu(MainMenu::new()));
        help.update(key(KeyCode::F(1)), &ctx);
        let update = help.update(key(KeyCode::Enter), &ctx);
        assert!(!update.navigated());
        assert!(matches!(help.screen(), Screen::MainMenu(_)));
    }

    #[test]
    fn question_mark_is_text_in_a_form() {
        let ctx = context_with(FakeService::default(), None);
        let mut help = WithHelp::new(Screen::BitwardenForm(BitwardenForm::new()));

        help.update(key(KeyCode::Char('?')), &ctx);
        assert!(!help.is_visible());
        match help.screen() {
            Screen::BitwardenForm(form) => assert_eq!(form.email(), "?"),
            other => panic!("unexpected screen {}", other.name()),
        }

        help.update(key(KeyCode::F(1)), &ctx);
        assert!(help.is_visible());
    }

    #[test]
    fn adopting_a_screen_hides_help() {
        let ctx = context_with(FakeService::default(), None);
        let mut help = WithHelp::new(Screen::MainMenu(MainMenu::new()));
        help.update(key(KeyCode::F(1)), &ctx);
        help.adopt(Screen::BitwardenForm(BitwardenForm::new()), &ctx);
        assert!(!help.is_visible());
        assert_eq!(help.title(), "Bitwarden setup");
    }
}
