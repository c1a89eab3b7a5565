use crate::app::menu::MenuEntry;
use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

pub fn draw_entries<'a>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    entries: impl Iterator<Item = &'a MenuEntry>,
    cursor: usize,
    theme: &Theme,
) {
    let items: Vec<ListItem> = entries
        .enumerate()
        .map(|(i, entry)| {
            let style = if i == cursor {
                theme.selected_style()
            } else {
                theme.style()
            };
            let marker = if i == cursor { ">" } else { " " };
            let shortcut = if i < 9 {
                char::from_digit(i as u32 + 1, 10).unwrap_or(' ')
            } else {
                ' '
            };
            ListItem::new(format!("{} {}  {}", marker, shortcut, entry.title)).style(style)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(format!(" {} ", title))
        .title_style(theme.primary_style());

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("No matching entries")
                .style(theme.muted_style())
                .block(block),
            area,
        );
        return;
    }

    let list = List::new(items).block(block);
    let mut state = ListState::default().with_selected(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

pub fn draw_details(frame: &mut Frame, area: Rect, entry: Option<&MenuEntry>, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Details ")
        .title_style(theme.primary_style());

    let text = match entry {
        Some(entry) => vec![
            Line::from(Span::styled(
                entry.title.as_str(),
                theme.primary_style().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(entry.description.as_str(), theme.style())),
            Line::from(""),
            Line::from(Span::styled("Press Enter to open", theme.muted_style())),
        ],
        None => vec![Line::from(Span::styled(
            "Nothing selected",
            theme.muted_style(),
        ))],
    };

    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

pub fn draw_search_bar(frame: &mut Frame, area: Rect, query: &str, active: bool, theme: &Theme) {
    let mut spans = vec![
        Span::styled(" / ", theme.primary_style().add_modifier(Modifier::BOLD)),
        Span::raw(query),
    ];
    if active {
        spans.push(Span::styled("│", theme.primary_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(theme.style()), area);
}
