use crate::app::overlay::{Level, Notification};
use crate::ui::{Layout, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

const WIDTH: u16 = 40;
const HEIGHT: u16 = 4;

fn icon(level: Level) -> &'static str {
    match level {
        Level::Info => "i",
        Level::Success => "x",
        Level::Warning => "!",
        Level::Error => "!!",
    }
}

/// Stack toasts downwards from the top right corner, newest last
pub fn draw_notifications(frame: &mut Frame, area: Rect, notifications: &[&Notification], theme: &Theme) {
    let mut y = area.y;
    for notification in notifications {
        if y + HEIGHT > area.y + area.height {
            break;
        }
        let slot = Rect {
            y,
            height: HEIGHT,
            ..area
        };
        let toast_area = Layout::top_right(slot, WIDTH, HEIGHT);
        let style = theme.level_style(notification.level);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(format!(" {} {} ", icon(notification.level), notification.title))
            .title_style(style.add_modifier(Modifier::BOLD));

        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(notification.message.as_str())
                .style(theme.style())
                .wrap(Wrap { trim: true })
                .block(block),
            toast_area,
        );
        y += HEIGHT;
    }
}
