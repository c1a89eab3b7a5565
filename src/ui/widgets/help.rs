use crate::app::overlay::ShortcutGroup;
use crate::ui::{Layout, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

pub fn draw_help(frame: &mut Frame, area: Rect, title: &str, groups: &[ShortcutGroup], theme: &Theme) {
    let key_width = groups
        .iter()
        .flat_map(|g| g.keys.iter())
        .map(|(keys, _)| keys.chars().count())
        .max()
        .unwrap_or(0);

    let mut help_text = Vec::new();
    for group in groups {
        help_text.push(Line::from(Span::styled(
            group.category.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (keys, action) in &group.keys {
            help_text.push(Line::from(vec![
                Span::styled(format!("  {:<key_width$}  ", keys), theme.secondary_style()),
                Span::raw(action.as_str()),
            ]));
        }
        help_text.push(Line::from(""));
    }
    help_text.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(Color::DarkGray),
    )));

    let height = (help_text.len() as u16 + 2).min(area.height);
    let width = 52u16.min(area.width.saturating_sub(4));
    let help_area = Layout::centered_box(area, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Help: {} ", title))
        .title_style(Style::default().fg(Color::Yellow));

    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}
