use crate::ui::Theme;
use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn draw_header(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    screen_title: &str,
    dryrun: bool,
    theme: &Theme,
) {
    let time = Local::now().format("%H:%M").to_string();

    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "localhost".to_string());

    // Left side: app title and current screen
    let mut left = vec![
        Span::raw(" "),
        Span::styled(title, theme.primary_style().add_modifier(Modifier::BOLD)),
    ];
    if !screen_title.is_empty() {
        left.push(Span::styled(" > ", theme.muted_style()));
        left.push(Span::styled(screen_title, theme.style()));
    }
    if dryrun {
        left.push(Span::styled(" [DRYRUN]", theme.error_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(left)), area);

    // Right side: host and time
    let right = Paragraph::new(Line::from(vec![
        Span::styled(hostname, theme.muted_style()),
        Span::raw("  "),
        Span::styled(time, theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
    ]))
    .alignment(Alignment::Right);
    frame.render_widget(right, area);
}
