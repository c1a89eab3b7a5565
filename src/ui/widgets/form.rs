use crate::app::input::InputBuffer;
use crate::ui::{Layout, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Single-field form: an intro line, a labelled input and a hint or error
#[allow(clippy::too_many_arguments)]
pub fn draw_input_form(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    intro: &str,
    label: &str,
    input: &InputBuffer,
    error: Option<&str>,
    theme: &Theme,
) {
    let form_width = 60u16.min(area.width.saturating_sub(4));
    let form_height = 9u16;
    let form_area = Layout::centered_box(area, form_width, form_height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" {} ", title))
        .title_style(theme.primary_style());

    frame.render_widget(Clear, form_area);
    frame.render_widget(block, form_area);

    let inner = form_area.inner(Margin::new(2, 1));

    let chunks = ratatui::layout::Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Intro
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Label
            Constraint::Length(1), // Input
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Hint or error
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(intro, theme.muted_style())),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(label, theme.primary_style())),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(render_input_field(input.content(), input.cursor(), theme)),
        chunks[3],
    );

    let footer = match error {
        Some(error) => Line::from(Span::styled(error, theme.error_style())),
        None => Line::from(Span::styled(
            "Press Enter to continue, Esc to go back",
            theme.muted_style(),
        )),
    };
    frame.render_widget(Paragraph::new(footer), chunks[5]);
}

fn render_input_field<'a>(content: &'a str, cursor: usize, theme: &Theme) -> Line<'a> {
    let before: String = content.chars().take(cursor).collect();
    let after: String = content.chars().skip(cursor).collect();

    Line::from(vec![
        Span::styled("> ", theme.primary_style()),
        Span::raw(before),
        Span::styled("│", theme.primary_style()), // Cursor
        Span::raw(after),
    ])
}
