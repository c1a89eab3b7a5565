use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::{is_down, is_up, SequenceScreen};
use crate::app::catalog;
use crate::app::jobs::{Job, JobMessage, ToolStatus};
use crate::app::message::{Effect, Msg};
use crate::app::overlay::ShortcutGroup;
use crate::app::screen::{Component, Parent, Screen, Update};
use crate::app::Context;
use crate::system::PackageOp;
use crate::ui::widgets::{self, StatusBarState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Install,
    Update,
    List,
    Uninstall,
}

impl ToolMode {
    fn title(&self) -> &'static str {
        match self {
            ToolMode::Install => "Install tools",
            ToolMode::Update => "Update tools",
            ToolMode::List => "Installed tools",
            ToolMode::Uninstall => "Uninstall tools",
        }
    }

    fn op(&self) -> Option<PackageOp> {
        match self {
            ToolMode::Install => Some(PackageOp::Install),
            ToolMode::Update => Some(PackageOp::Update),
            ToolMode::Uninstall => Some(PackageOp::Remove),
            ToolMode::List => None,
        }
    }

    /// Whether a tool in this state can be picked in this mode
    fn offers(&self, status: &ToolStatus) -> bool {
        match self {
            ToolMode::Install => !status.installed,
            ToolMode::Update | ToolMode::Uninstall => status.installed,
            ToolMode::List => true,
        }
    }
}

/// Picks a known tool and hands it to a package manager sequence
#[derive(Debug)]
pub struct ToolsScreen {
    mode: ToolMode,
    /// None until the first scan reported back
    tools: Option<Vec<ToolStatus>>,
    cursor: usize,
    confirm: bool,
}

impl ToolsScreen {
    pub fn new(mode: ToolMode) -> Self {
        Self {
            mode,
            tools: None,
            cursor: 0,
            confirm: false,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn is_scanning(&self) -> bool {
        self.tools.is_none()
    }

    /// Tools offered by the current mode, in configuration order
    pub fn candidates(&self) -> Vec<&ToolStatus> {
        self.tools
            .iter()
            .flatten()
            .filter(|status| self.mode.offers(status))
            .collect()
    }

    pub fn selected(&self) -> Option<&ToolStatus> {
        self.candidates().get(self.cursor).copied()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirm
    }

    fn start(&self, ctx: &Context) -> Update {
        let (Some(op), Some(status)) = (self.mode.op(), self.selected()) else {
            return Update::none();
        };
        let title = format!("{} {}", op.verb(), status.tool.name);
        Update::navigate(Screen::Sequence(SequenceScreen::new(
            title,
            catalog::tool_operation(op, &status.tool),
            Parent::Tools,
            ctx.config.logs.capacity,
        )))
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Update {
        if self.confirm {
            self.confirm = false;
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.start(ctx),
                _ => Update::none(),
            };
        }
        if is_down(&key) {
            if self.cursor + 1 < self.candidates().len() {
                self.cursor += 1;
            }
            return Update::none();
        }
        if is_up(&key) {
            self.cursor = self.cursor.saturating_sub(1);
            return Update::none();
        }
        match key.code {
            KeyCode::Esc => Parent::Tools.update(ctx),
            KeyCode::Char('r') => {
                self.tools = None;
                Update::effect(Effect::Spawn(Job::ScanTools))
            }
            KeyCode::Enter if self.selected().is_some() => match self.mode {
                ToolMode::List => Update::none(),
                ToolMode::Uninstall => {
                    self.confirm = true;
                    Update::none()
                }
                _ => self.start(ctx),
            },
            _ => Update::none(),
        }
    }

    fn empty_text(&self) -> &'static str {
        match self.mode {
            ToolMode::Install => "Every known tool is already installed",
            ToolMode::List => "No tools configured",
            _ => "None of the known tools are installed",
        }
    }
}

impl Component for ToolsScreen {
    fn init(&mut self, _ctx: &Context) -> Vec<Effect> {
        vec![Effect::Spawn(Job::ScanTools)]
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Key(key) => self.handle_key(key, ctx),
            Msg::Job(JobMessage::Tools(tools)) => {
                self.tools = Some(tools);
                self.cursor = self.cursor.min(self.candidates().len().saturating_sub(1));
                Update::none()
            }
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(format!(" {} ", self.mode.title()))
            .title_style(theme.primary_style());

        let candidates = self.candidates();
        if self.is_scanning() {
            frame.render_widget(
                Paragraph::new("Checking which tools are installed...")
                    .style(theme.muted_style())
                    .block(block),
                area,
            );
        } else if candidates.is_empty() {
            frame.render_widget(
                Paragraph::new(self.empty_text()).style(theme.muted_style()).block(block),
                area,
            );
        } else {
            let items: Vec<ListItem> = candidates
                .iter()
                .enumerate()
                .map(|(i, status)| {
                    let (mark, mark_style) = if status.installed {
                        ("installed", theme.success_style())
                    } else {
                        ("missing", theme.warning_style())
                    };
                    let name_style = if i == self.cursor {
                        theme.selected_style()
                    } else {
                        theme.style()
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(format!(" {:<12}", status.tool.name), name_style),
                        Span::styled(format!("{:<10}", mark), mark_style),
                        Span::styled(status.tool.description.clone(), theme.muted_style()),
                    ]))
                })
                .collect();
            let mut state = ListState::default().with_selected(Some(self.cursor));
            frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
        }

        if self.confirm {
            if let Some(status) = self.selected() {
                let message = format!("Uninstall {}?", status.tool.name);
                widgets::draw_confirm_dialog(frame, area, "Uninstall", &message, theme);
            }
        }
    }

    fn title(&self) -> String {
        self.mode.title().to_string()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        let mut group = ShortcutGroup::new("Tools")
            .key("j/k, Up/Down", "Move")
            .key("r", "Scan again");
        if self.mode != ToolMode::List {
            group = group.key("Enter", "Run for the selected tool");
        }
        vec![group]
    }

    fn status(&self) -> StatusBarState {
        if self.confirm {
            StatusBarState::confirm()
        } else {
            StatusBarState::picker()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::jobs::StepTask;
    use crate::testing::{context_with, FakeService};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn scanned(mode: ToolMode, installed: &[&str]) -> (ToolsScreen, Context) {
        let ctx = context_with(FakeService::with_commands(installed), None);
        let mut screen = ToolsScreen::new(mode);
        assert_eq!(screen.init(&ctx), vec![Effect::Spawn(Job::ScanTools)]);
        let message = Job::ScanTools.run(&ctx);
        screen.update(Msg::Job(message), &ctx);
        (screen, ctx)
    }

    #[test]
    fn install_offers_only_missing_tools() {
        let (screen, ctx) = scanned(ToolMode::Install, &["git", "zsh"]);
        let names: Vec<&str> = screen.candidates().iter().map(|s| s.tool.name.as_str()).collect();
        assert_eq!(names.len(), ctx.config.tools.len() - 2);
        assert!(!names.contains(&"git"));
        assert_eq!(names[0], "chezmoi");
    }

    #[test]
    fn update_offers_installed_tools() {
        let (mut screen, ctx) = scanned(ToolMode::Update, &["git", "nvim"]);
        let names: Vec<&str> = screen.candidates().iter().map(|s| s.tool.name.as_str()).collect();
        assert_eq!(names, ["neovim", "git"]);

        screen.update(key(KeyCode::Char('j')), &ctx);
        let update = screen.update(key(KeyCode::Enter), &ctx);
        let Some(Screen::Sequence(seq)) = update.next else {
            panic!("expected a sequence");
        };
        assert_eq!(seq.title(), "Update git");
        assert!(matches!(
            seq.sequence().steps()[1].task(),
            StepTask::PackageOperation {
                op: PackageOp::Update,
                ..
            }
        ));
    }

    #[test]
    fn uninstall_needs_confirmation() {
        let (mut screen, ctx) = scanned(ToolMode::Uninstall, &["fzf"]);
        let update = screen.update(key(KeyCode::Enter), &ctx);
        assert!(!update.navigated());
        assert!(screen.is_confirming());

        let update = screen.update(key(KeyCode::Char('n')), &ctx);
        assert!(!update.navigated());
        assert!(!screen.is_confirming());

        screen.update(key(KeyCode::Enter), &ctx);
        let update = screen.update(key(KeyCode::Char('y')), &ctx);
        assert!(matches!(update.next, Some(Screen::Sequence(_))));
    }

    #[test]
    fn list_mode_only_displays() {
        let (mut screen, ctx) = scanned(ToolMode::List, &[]);
        assert_eq!(screen.candidates().len(), ctx.config.tools.len());
        let update = screen.update(key(KeyCode::Enter), &ctx);
        assert!(!update.navigated());

        let update = screen.update(key(KeyCode::Esc), &ctx);
        assert!(matches!(update.next, Some(Screen::Submenu(_))));
    }
}
