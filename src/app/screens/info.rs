use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::jobs::{InfoSnapshot, Job, JobMessage};
use crate::app::message::{Effect, Msg};
use crate::app::overlay::ShortcutGroup;
use crate::app::screen::{Component, Parent, Update};
use crate::app::Context;
use crate::system::executor::UNKNOWN;
use crate::ui::widgets::StatusBarState;
use crate::ui::Theme;

/// System information and the state of the important paths
#[derive(Debug, Default)]
pub struct InfoScreen {
    snapshot: Option<InfoSnapshot>,
}

impl InfoScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&InfoSnapshot> {
        self.snapshot.as_ref()
    }
}

fn row<'a>(label: &'a str, value: &'a str, theme: &Theme) -> Line<'a> {
    let value_style = if value == UNKNOWN {
        theme.muted_style()
    } else {
        theme.style()
    };
    Line::from(vec![
        Span::styled(format!(" {:<16}", label), theme.secondary_style()),
        Span::styled(value, value_style),
    ])
}

impl Component for InfoScreen {
    fn init(&mut self, _ctx: &Context) -> Vec<Effect> {
        vec![Effect::Spawn(Job::GatherInfo)]
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Job(JobMessage::Info(snapshot)) => {
                self.snapshot = Some(snapshot);
                Update::none()
            }
            Msg::Key(key) => match key.code {
                KeyCode::Esc => Parent::MainMenu.update(ctx),
                KeyCode::Char('r') => {
                    ctx.service.invalidate_cache();
                    self.snapshot = None;
                    Update::effect(Effect::Spawn(Job::GatherInfo))
                }
                _ => Update::none(),
            },
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let block = |title: &str| {
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" {} ", title))
                .title_style(theme.primary_style())
        };

        let Some(info) = &self.snapshot else {
            frame.render_widget(
                Paragraph::new("Gathering system information...")
                    .style(theme.muted_style())
                    .block(block("System")),
                area,
            );
            return;
        };

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(3)])
            .split(area);

        let system = &info.system;
        let manager = info.package_manager.map(|m| m.label()).unwrap_or("none found");
        let mode = if info.dryrun { "dry run" } else { "live" };
        let lines = vec![
            row("OS", &system.os, theme),
            row("Architecture", &system.arch, theme),
            row("Hostname", &system.hostname, theme),
            row("User", &system.user, theme),
            row("Shell", &system.shell, theme),
            row("Home", &system.home, theme),
            row("Package manager", manager, theme),
            row("Mode", mode, theme),
        ];
        frame.render_widget(Paragraph::new(lines).block(block("System")), chunks[0]);

        let paths: Vec<Line> = info
            .paths
            .iter()
            .map(|p| {
                let (mark, style) = if p.exists {
                    ("ok     ", theme.success_style())
                } else {
                    ("missing", theme.warning_style())
                };
                Line::from(vec![
                    Span::styled(format!(" {:<20}", p.label), theme.secondary_style()),
                    Span::styled(mark, style),
                    Span::styled(format!(" {}", p.path), theme.muted_style()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(paths).block(block("Paths")), chunks[1]);
    }

    fn title(&self) -> String {
        "System info".to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![ShortcutGroup::new("System info")
            .key("r", "Refresh")
            .key("Esc", "Back to the main menu")]
    }

    fn status(&self) -> StatusBarState {
        StatusBarState::view()
    }
}
