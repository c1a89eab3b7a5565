mod layout;
mod theme;
pub mod widgets;

pub use layout::Layout;
pub use theme::Theme;

use crate::app::{App, Component};
use ratatui::widgets::Clear;
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &App) {
    let layout = Layout::new(frame.area());
    let ctx = app.context();
    let root = app.root();

    frame.render_widget(Clear, layout.full);
    widgets::draw_header(
        frame,
        layout.header,
        &ctx.config.general.title,
        &root.title(),
        ctx.service.is_dryrun(),
        &ctx.theme,
    );

    // Overlays draw themselves on top of the screen
    root.draw(frame, layout.content, ctx);

    widgets::draw_status_bar(frame, layout.status, &root.status(), &ctx.theme);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context_with, FakeService};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn main_menu_renders_entries_and_details() {
        let app = App::new(context_with(FakeService::default(), None));
        let screen = render(&app);
        assert!(screen.contains("Dotfiles Manager"));
        assert!(screen.contains("Backup & Restore"));
        assert!(screen.contains("Install tools, shell and configuration"));
    }

    #[test]
    fn help_panel_lists_screen_shortcuts() {
        let mut app = App::new(context_with(FakeService::default(), None));
        app.handle_key(KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE));
        let screen = render(&app);
        assert!(screen.contains("Help"));
        assert!(screen.contains("Search"));
        assert!(screen.contains("Ctrl+c"));
    }
}
