use ratatui::style::{Color, Modifier, Style};

use crate::app::overlay::Level;
use crate::app::steps::StepStatus;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub background: Color,
    pub foreground: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
    pub border: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Yellow,
            secondary: Color::Cyan,
            background: Color::Reset,
            foreground: Color::White,
            error: Color::Red,
            warning: Color::LightYellow,
            success: Color::Green,
            border: Color::DarkGray,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn style(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn secondary_style(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn selected_style(&self) -> Style {
        self.primary_style().add_modifier(Modifier::REVERSED)
    }

    pub fn level_style(&self, level: Level) -> Style {
        let color = match level {
            Level::Info => self.secondary,
            Level::Success => self.success,
            Level::Warning => self.warning,
            Level::Error => self.error,
        };
        Style::default().fg(color)
    }

    pub fn status_style(&self, status: StepStatus) -> Style {
        match status {
            StepStatus::Pending => self.muted_style(),
            StepStatus::Running => self.primary_style().add_modifier(Modifier::BOLD),
            StepStatus::Completed => self.success_style(),
            StepStatus::Warning => self.warning_style(),
            StepStatus::Failed => self.error_style(),
        }
    }
}
