use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

pub struct Layout {
    pub full: Rect,
    pub header: Rect,
    pub content: Rect,
    pub status: Rect,
}

impl Layout {
    pub fn new(area: Rect) -> Self {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(5),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        Self {
            full: area,
            header: chunks[0],
            content: chunks[1],
            status: chunks[2],
        }
    }

    pub fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
        let horizontal = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(width),
                Constraint::Fill(1),
            ])
            .split(area);

        let vertical = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(height),
                Constraint::Fill(1),
            ])
            .split(horizontal[1]);

        vertical[1]
    }

    /// Box of the given size anchored to the top right corner of `area`
    pub fn top_right(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width);
        let height = height.min(area.height);
        Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height,
        }
    }

    /// Left and right columns, the left one taking `percent` of the width
    pub fn columns(area: Rect, percent: u16) -> (Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(percent),
                Constraint::Percentage(100 - percent.min(100)),
            ])
            .split(area);
        (chunks[0], chunks[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_right_stays_inside() {
        let area = Rect::new(0, 1, 80, 20);
        let corner = Layout::top_right(area, 30, 4);
        assert_eq!(corner, Rect::new(50, 1, 30, 4));

        let clipped = Layout::top_right(Rect::new(0, 0, 10, 2), 30, 4);
        assert_eq!(clipped, Rect::new(0, 0, 10, 2));
    }
}
