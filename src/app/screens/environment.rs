use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::message::Msg;
use crate::app::overlay::ShortcutGroup;
use crate::app::screen::{Component, Parent, Update};
use crate::app::Context;
use crate::ui::widgets::StatusBarState;

/// Variables shown, in display order. Secret ones are never printed.
const VARIABLES: [(&str, bool); 6] = [
    ("BW_SESSION", true),
    ("EDITOR", false),
    ("SHELL", false),
    ("PATH", false),
    ("HOME", false),
    ("USER", false),
];

const MAX_VALUE_WIDTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvRow {
    pub name: &'static str,
    /// None when the variable is not set
    pub value: Option<String>,
}

/// Environment variables relevant to the secrets integration
#[derive(Debug)]
pub struct EnvironmentScreen {
    rows: Vec<EnvRow>,
}

impl EnvironmentScreen {
    pub fn new(ctx: &Context) -> Self {
        Self { rows: read(ctx) }
    }

    pub fn rows(&self) -> &[EnvRow] {
        &self.rows
    }
}

fn read(ctx: &Context) -> Vec<EnvRow> {
    VARIABLES
        .iter()
        .map(|&(name, secret)| EnvRow {
            name,
            value: ctx
                .service
                .env_var(name)
                .filter(|v| !v.is_empty())
                .map(|v| display_value(&v, secret)),
        })
        .collect()
}

fn display_value(value: &str, secret: bool) -> String {
    if secret {
        return "set (hidden)".to_string();
    }
    if value.chars().count() > MAX_VALUE_WIDTH {
        let head: String = value.chars().take(MAX_VALUE_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

impl Component for EnvironmentScreen {
    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        let Msg::Key(key) = msg else {
            return Update::none();
        };
        match key.code {
            KeyCode::Esc => Parent::Secrets.update(ctx),
            KeyCode::Char('r') => {
                self.rows = read(ctx);
                Update::none()
            }
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let lines: Vec<Line> = self
            .rows
            .iter()
            .map(|row| {
                let value = match &row.value {
                    Some(value) => Span::styled(value.as_str(), theme.style()),
                    None => Span::styled("not set", theme.warning_style()),
                };
                Line::from(vec![
                    Span::styled(format!(" {:<12}", row.name), theme.secondary_style()),
                    value,
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(" Environment ")
            .title_style(theme.primary_style());
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn title(&self) -> String {
        "Environment".to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![ShortcutGroup::new("Environment")
            .key("r", "Read the variables again")
            .key("Esc", "Back to Secrets")]
    }

    fn status(&self) -> StatusBarState {
        StatusBarState::view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_with, FakeService};

    fn value<'a>(screen: &'a EnvironmentScreen, name: &str) -> Option<&'a str> {
        screen
            .rows()
            .iter()
            .find(|row| row.name == name)
            .and_then(|row| row.value.as_deref())
    }

    #[test]
    fn session_is_masked_and_long_values_are_cut() {
        let mut service = FakeService::default();
        service.env.insert("BW_SESSION".into(), "s3cr3t-token".into());
        service.env.insert("PATH".into(), "/usr/bin:".repeat(20));
        service.env.insert("EDITOR".into(), "nvim".into());
        let ctx = context_with(service, None);

        let screen = EnvironmentScreen::new(&ctx);
        assert_eq!(value(&screen, "BW_SESSION"), Some("set (hidden)"));
        assert_eq!(value(&screen, "EDITOR"), Some("nvim"));

        let path = value(&screen, "PATH").unwrap();
        assert_eq!(path.chars().count(), MAX_VALUE_WIDTH);
        assert!(path.ends_with("..."));
    }

    #[test]
    fn missing_variables_are_not_set() {
        let ctx = context_with(FakeService::default(), None);
        let screen = EnvironmentScreen::new(&ctx);
        assert_eq!(screen.rows().len(), VARIABLES.len());
        assert!(screen.rows().iter().all(|row| row.value.is_none()));
    }
}
