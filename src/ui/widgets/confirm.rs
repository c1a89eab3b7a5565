use crate::ui::{Layout, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub fn draw_confirm_dialog(frame: &mut Frame, area: Rect, title: &str, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, theme.style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", theme.success_style().add_modifier(Modifier::BOLD)),
            Span::raw(" - Yes    "),
            Span::styled("n", theme.error_style().add_modifier(Modifier::BOLD)),
            Span::raw(" - No"),
        ]),
    ];

    let width = 50u16.min(area.width);
    let dialog_area = Layout::centered_box(area, width, 7);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.primary_style())
        .title(format!(" {} ", title))
        .title_style(theme.primary_style().add_modifier(Modifier::BOLD));

    frame.render_widget(Clear, dialog_area);
    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        dialog_area,
    );
}
