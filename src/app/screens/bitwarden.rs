use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{is_ctrl, SequenceScreen};
use crate::app::catalog;
use crate::app::input::InputBuffer;
use crate::app::jobs::is_plausible_email;
use crate::app::message::Msg;
use crate::app::overlay::ShortcutGroup;
use crate::app::screen::{Component, Parent, Screen, Update};
use crate::app::Context;
use crate::ui::widgets::{self, StatusBarState};

/// Longest address RFC 5321 allows
const EMAIL_LIMIT: usize = 254;

/// Asks for the vault e-mail, then runs the Bitwarden setup sequence
#[derive(Debug)]
pub struct BitwardenForm {
    email: InputBuffer,
    error: Option<String>,
}

impl Default for BitwardenForm {
    fn default() -> Self {
        Self::new()
    }
}

impl BitwardenForm {
    pub fn new() -> Self {
        Self {
            email: InputBuffer::with_limit(EMAIL_LIMIT),
            error: None,
        }
    }

    pub fn email(&self) -> &str {
        self.email.content()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn submit(&mut self, ctx: &Context) -> Update {
        let email = self.email.content().trim().to_string();
        if !is_plausible_email(&email) {
            self.error = Some(if email.is_empty() {
                "Enter the e-mail address of your vault".to_string()
            } else {
                format!("'{}' is not a valid e-mail address", email)
            });
            return Update::none();
        }

        self.error = None;
        Update::navigate(Screen::Sequence(SequenceScreen::new(
            "Bitwarden setup",
            catalog::bitwarden_setup(&email),
            Parent::Secrets,
            ctx.config.logs.capacity,
        )))
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Update {
        if is_ctrl(&key, 'u') {
            self.email.clear();
            return Update::none();
        }
        match key.code {
            KeyCode::Esc => return Parent::Secrets.update(ctx),
            KeyCode::Enter => return self.submit(ctx),
            KeyCode::Backspace => {
                self.email.delete_back();
            }
            KeyCode::Delete => {
                self.email.delete_forward();
            }
            KeyCode::Left => self.email.move_left(),
            KeyCode::Right => self.email.move_right(),
            KeyCode::Home => self.email.move_start(),
            KeyCode::End => self.email.move_end(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.email.insert(c);
            }
            _ => {}
        }
        Update::none()
    }
}

impl Component for BitwardenForm {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Key(key) => self.handle_key(key, ctx),
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        widgets::draw_input_form(
            frame,
            area,
            "Bitwarden",
            "Log in to the Bitwarden CLI and unlock the vault",
            "E-mail",
            &self.email,
            self.error(),
            &ctx.theme,
        );
    }

    fn title(&self) -> String {
        "Bitwarden setup".to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![ShortcutGroup::new("Form")
            .key("Enter", "Validate and continue")
            .key("Left/Right, Home/End", "Move the cursor")
            .key("Ctrl+u", "Clear the field")
            .key("Esc", "Back to Secrets")]
    }

    fn status(&self) -> StatusBarState {
        StatusBarState::form()
    }

    fn captures_text(&self) -> bool {
        true
    }
}
