use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::is_ctrl;
use crate::app::jobs::{FileSnapshot, Job, JobMessage};
use crate::app::message::{Effect, Msg};
use crate::app::overlay::{Level, ShortcutGroup};
use crate::app::screen::{Component, Parent, Update};
use crate::app::Context;
use crate::ui::widgets::StatusBarState;

const PREVIEW_MIN: usize = 5;
const PREVIEW_MAX: usize = 30;
const PREVIEW_STEP: usize = 5;

/// File type guessed from the name, used for comments and colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    Shell,
    Toml,
    Lua,
    GitConfig,
    Tmux,
    Plain,
}

impl SyntaxKind {
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match (name.as_str(), extension.as_str()) {
            (".zshrc" | ".bashrc" | ".zprofile" | ".profile" | ".aliases", _) => SyntaxKind::Shell,
            (".gitconfig", _) | (_, "gitconfig") => SyntaxKind::GitConfig,
            (".tmux.conf" | "tmux.conf", _) => SyntaxKind::Tmux,
            (_, "sh" | "zsh" | "bash") => SyntaxKind::Shell,
            (_, "toml") => SyntaxKind::Toml,
            (_, "lua") => SyntaxKind::Lua,
            _ => SyntaxKind::Plain,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyntaxKind::Shell => "Shell",
            SyntaxKind::Toml => "TOML",
            SyntaxKind::Lua => "Lua",
            SyntaxKind::GitConfig => "Git config",
            SyntaxKind::Tmux => "tmux",
            SyntaxKind::Plain => "Plain text",
        }
    }

    pub fn comment_prefix(&self) -> &'static str {
        match self {
            SyntaxKind::Lua => "--",
            _ => "#",
        }
    }

    fn is_section(&self, line: &str) -> bool {
        match self {
            SyntaxKind::Toml | SyntaxKind::GitConfig => line.starts_with('['),
            SyntaxKind::Lua => line.starts_with("local ") || line.starts_with("function "),
            SyntaxKind::Shell => line.starts_with("export ") || line.starts_with("alias "),
            SyntaxKind::Tmux => line.starts_with("set ") || line.starts_with("bind "),
            SyntaxKind::Plain => false,
        }
    }
}

/// Starter content for a configuration file that does not exist yet
pub fn default_template(path: &Path) -> String {
    let syntax = SyntaxKind::detect(path);
    let c = syntax.comment_prefix();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let mut template = format!(
        "{c} New configuration file: {name}\n{c} Created by dotfiles-tui\n\n"
    );
    let body = match syntax {
        SyntaxKind::Shell => "# export EDITOR=nvim\n# alias ll='ls -la'\n",
        SyntaxKind::Toml => "# [section]\n# key = \"value\"\n",
        SyntaxKind::Lua => "-- vim.opt.number = true\n",
        SyntaxKind::GitConfig => "# [user]\n# \tname = Your Name\n# \temail = you@example.com\n",
        SyntaxKind::Tmux => "# set -g mouse on\n",
        SyntaxKind::Plain => "",
    };
    template.push_str(body);
    template
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug)]
pub struct EditorScreen {
    label: String,
    path: PathBuf,
    syntax: SyntaxKind,
    state: LoadState,
    content: String,
    from_template: bool,
    show_line_numbers: bool,
    show_metadata: bool,
    preview_lines: usize,
    saving: bool,
}

impl EditorScreen {
    pub fn new(label: &str, path: PathBuf, preview_lines: usize) -> Self {
        Self {
            label: label.to_string(),
            syntax: SyntaxKind::detect(&path),
            path,
            state: LoadState::Loading,
            content: String::new(),
            from_template: false,
            show_line_numbers: true,
            show_metadata: true,
            preview_lines: preview_lines.clamp(PREVIEW_MIN, PREVIEW_MAX),
            saving: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> Option<&str> {
        (self.state == LoadState::Ready).then_some(self.content.as_str())
    }

    pub fn is_template(&self) -> bool {
        self.from_template
    }

    pub fn preview_lines(&self) -> usize {
        self.preview_lines
    }

    pub fn shows_line_numbers(&self) -> bool {
        self.show_line_numbers
    }

    pub fn shows_metadata(&self) -> bool {
        self.show_metadata
    }

    fn load(&mut self) -> Effect {
        self.state = LoadState::Loading;
        Effect::Spawn(Job::LoadFile {
            path: self.path.clone(),
        })
    }

    fn on_loaded(&mut self, result: Result<FileSnapshot, String>) -> Update {
        match result {
            Ok(snapshot) => {
                self.content = snapshot.content;
                self.from_template = snapshot.from_template;
                self.state = LoadState::Ready;
                Update::none()
            }
            Err(e) => {
                warn!("Loading {:?} failed: {}", self.path, e);
                self.state = LoadState::Failed(e.clone());
                Update::effect(Effect::notify(Level::Error, "Could not read file", e))
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &Context) -> Update {
        if is_ctrl(&key, 's') {
            if self.state != LoadState::Ready || self.saving {
                return Update::none();
            }
            self.saving = true;
            return Update::effect(Effect::Spawn(Job::SaveFile {
                path: self.path.clone(),
                content: self.content.clone(),
            }));
        }
        if is_ctrl(&key, 'l') {
            self.show_line_numbers = !self.show_line_numbers;
            return Update::none();
        }
        if is_ctrl(&key, 't') {
            self.show_metadata = !self.show_metadata;
            return Update::none();
        }
        if is_ctrl(&key, 'p') {
            self.preview_lines = (self.preview_lines + PREVIEW_STEP).min(PREVIEW_MAX);
            return Update::none();
        }
        if is_ctrl(&key, 'o') {
            self.preview_lines = self.preview_lines.saturating_sub(PREVIEW_STEP).max(PREVIEW_MIN);
            return Update::none();
        }

        match key.code {
            KeyCode::Esc => Parent::Configuration.update(ctx),
            KeyCode::Char('e') | KeyCode::Enter => {
                info!("Opening {:?} in an external editor", self.path);
                Update::effect(Effect::LaunchEditor(self.path.clone()))
            }
            KeyCode::Char('r') => {
                // The file may have changed outside the app
                ctx.service.forget_file(&self.path);
                Update::effect(self.load())
            }
            _ => Update::none(),
        }
    }

    fn metadata_lines(&self) -> Vec<Line<'_>> {
        let mut lines = vec![Line::from(format!("Path:   {}", self.path.display()))];
        match &self.state {
            LoadState::Loading => lines.push(Line::from("Loading...")),
            LoadState::Failed(e) => lines.push(Line::from(format!("Error:  {}", e))),
            LoadState::Ready => {
                lines.push(Line::from(format!(
                    "Size:   {} bytes, {} lines",
                    self.content.len(),
                    self.content.lines().count()
                )));
                let mut syntax = format!("Syntax: {}", self.syntax.label());
                if self.from_template {
                    syntax.push_str("  (new file, template not saved yet)");
                }
                lines.push(Line::from(syntax));
            }
        }
        lines
    }
}

impl Component for EditorScreen {
    fn init(&mut self, _ctx: &Context) -> Vec<Effect> {
        vec![self.load()]
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Key(key) => self.handle_key(key, ctx),
            Msg::Job(JobMessage::FileLoaded { path, result }) if path == self.path => {
                self.on_loaded(result)
            }
            Msg::Job(JobMessage::FileSaved { path, result }) if path == self.path => {
                self.saving = false;
                match result {
                    Ok(bytes) => {
                        self.from_template = false;
                        Update::effect(Effect::notify(
                            Level::Success,
                            "Saved",
                            format!("{} bytes written to {}", bytes, self.path.display()),
                        ))
                    }
                    Err(e) => Update::effect(Effect::notify(Level::Error, "Save failed", e)),
                }
            }
            Msg::Job(JobMessage::EditorClosed { path, result }) if path == self.path => {
                match result {
                    Ok(()) => Update::effect(self.load())
                        .with(Effect::notify(Level::Info, "Editor closed", "File reloaded")),
                    Err(e) => Update::effect(Effect::notify(Level::Error, "Editor", e)),
                }
            }
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let metadata = if self.show_metadata {
            self.metadata_lines()
        } else {
            Vec::new()
        };
        let meta_height = if metadata.is_empty() {
            0
        } else {
            metadata.len() as u16 + 2
        };
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(meta_height),
                Constraint::Length(self.preview_lines as u16 + 2),
                Constraint::Min(0),
            ])
            .split(area);

        if !metadata.is_empty() {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .title(format!(" {} ", self.label))
                .title_style(theme.primary_style());
            frame.render_widget(Paragraph::new(metadata).block(block), chunks[0]);
        }

        let comment = self.syntax.comment_prefix();
        let width = self.content.lines().count().max(1).to_string().len();
        let preview: Vec<Line> = self
            .content
            .lines()
            .take(self.preview_lines)
            .enumerate()
            .map(|(i, line)| {
                let trimmed = line.trim_start();
                let style = if trimmed.starts_with(comment) {
                    theme.muted_style()
                } else if self.syntax.is_section(trimmed) {
                    theme.secondary_style()
                } else {
                    theme.style()
                };
                let mut spans = Vec::new();
                if self.show_line_numbers {
                    spans.push(Span::styled(
                        format!("{:>width$} ", i + 1),
                        theme.muted_style(),
                    ));
                }
                spans.push(Span::styled(line, style));
                Line::from(spans)
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(format!(" Preview ({} lines) ", self.preview_lines))
            .title_style(theme.primary_style());
        frame.render_widget(Paragraph::new(preview).block(block), chunks[1]);
    }

    fn title(&self) -> String {
        format!("Edit {}", self.label)
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![
            ShortcutGroup::new("File")
                .key("e, Enter", "Open in external editor")
                .key("Ctrl+s", "Save")
                .key("r", "Reload"),
            ShortcutGroup::new("View")
                .key("Ctrl+l", "Toggle line numbers")
                .key("Ctrl+t", "Toggle metadata")
                .key("Ctrl+p/Ctrl+o", "Grow/shrink preview"),
        ]
    }

    fn status(&self) -> StatusBarState {
        StatusBarState::editor()
    }
}
