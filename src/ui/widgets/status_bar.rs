use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Key hints shown in the bottom line, provided by the active screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBarState {
    /// Left side hint text (e.g., "j/k: navigate  Enter: open")
    pub left_hint: String,
    /// Right side hint text (e.g., "?: help  q: quit")
    pub right_hint: String,
}

impl StatusBarState {
    pub fn new(left_hint: impl Into<String>, right_hint: impl Into<String>) -> Self {
        Self {
            left_hint: left_hint.into(),
            right_hint: right_hint.into(),
        }
    }

    pub fn main_menu() -> Self {
        Self::new("j/k: navigate  1-9: select  Enter: open", "/: search  ?: help  q: quit")
    }

    pub fn search() -> Self {
        Self::new("Type to filter", "Enter: open  Esc: cancel")
    }

    pub fn submenu() -> Self {
        Self::new("j/k: navigate  1-9: select  Enter: open", "Esc: back  ?: help")
    }

    pub fn running() -> Self {
        Self::new("Please wait...", "Esc: back (keeps running)")
    }

    pub fn finished() -> Self {
        Self::new("Done", "Enter/Esc: back")
    }

    pub fn picker() -> Self {
        Self::new("j/k: navigate  Enter: select", "r: refresh  Esc: back")
    }

    pub fn confirm() -> Self {
        Self::new("Confirm the action", "y: yes  n: no")
    }

    pub fn form() -> Self {
        Self::new("Type your e-mail address", "Enter: continue  Esc: back  F1: help")
    }

    pub fn editor() -> Self {
        Self::new("e: open editor  Ctrl+s: save", "Ctrl+l/t/p/o: view  Esc: back")
    }

    pub fn view() -> Self {
        Self::new(String::new(), "r: refresh  Esc: back")
    }

    pub fn help() -> Self {
        Self::new("Help", "Press any key to close")
    }
}

pub fn draw_status_bar(frame: &mut Frame, area: Rect, state: &StatusBarState, theme: &Theme) {
    let left = Line::from(vec![
        Span::raw(" "),
        Span::styled(state.left_hint.as_str(), theme.muted_style()),
    ]);
    frame.render_widget(Paragraph::new(left).style(theme.style()), area);

    let right = Line::from(vec![
        Span::styled(state.right_hint.as_str(), theme.secondary_style()),
        Span::raw(" "),
    ]);
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), area);
}
