use ratatui::layout::Rect;
use ratatui::Frame;

use super::message::{Effect, Msg};
use super::overlay::ShortcutGroup;
use super::screens::{
    BackupsScreen, BitwardenForm, EditorScreen, EnvironmentScreen, InfoScreen, MainMenu,
    SequenceScreen, Submenu, SubmenuKind, ToolsScreen,
};
use super::Context;
use crate::ui::widgets::StatusBarState;

/// Result of handling one message
#[derive(Debug, Default)]
pub struct Update {
    /// Replace the active screen
    pub next: Option<Screen>,
    pub effects: Vec<Effect>,
}

impl Update {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            next: None,
            effects: vec![effect],
        }
    }

    pub fn navigate(screen: Screen) -> Self {
        Self {
            next: Some(screen),
            effects: Vec::new(),
        }
    }

    pub fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn navigated(&self) -> bool {
        self.next.is_some()
    }
}

/// A view plus its state
pub trait Component {
    /// Effects to run when the component becomes active
    fn init(&mut self, _ctx: &Context) -> Vec<Effect> {
        Vec::new()
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update;

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context);

    fn title(&self) -> String;

    fn shortcuts(&self) -> Vec<ShortcutGroup>;

    fn status(&self) -> StatusBarState {
        StatusBarState::default()
    }

    /// Plain characters are text input, not commands
    fn captures_text(&self) -> bool {
        false
    }
}

/// Owns the active screen and can swap it out. Overlays implement this by
/// passing the new screen down to what they wrap.
pub trait Host: Component {
    fn adopt(&mut self, next: Screen, ctx: &Context) -> Vec<Effect>;
    fn screen(&self) -> &Screen;
}

/// Where `esc` leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    MainMenu,
    Configuration,
    Backup,
    Tools,
    Secrets,
}

impl Parent {
    pub fn screen(self, ctx: &Context) -> Screen {
        match self {
            Parent::MainMenu => Screen::MainMenu(MainMenu::new()),
            Parent::Configuration => {
                Screen::Submenu(Submenu::new(SubmenuKind::Configuration, &ctx.config))
            }
            Parent::Backup => Screen::Submenu(Submenu::new(SubmenuKind::Backup, &ctx.config)),
            Parent::Tools => Screen::Submenu(Submenu::new(SubmenuKind::Tools, &ctx.config)),
            Parent::Secrets => Screen::Submenu(Submenu::new(SubmenuKind::Secrets, &ctx.config)),
        }
    }

    pub fn update(self, ctx: &Context) -> Update {
        Update::navigate(self.screen(ctx))
    }
}

#[derive(Debug)]
pub enum Screen {
    MainMenu(MainMenu),
    Submenu(Submenu),
    Sequence(SequenceScreen),
    Editor(EditorScreen),
    Backups(BackupsScreen),
    Tools(ToolsScreen),
    BitwardenForm(BitwardenForm),
    Environment(EnvironmentScreen),
    Info(InfoScreen),
}

impl Screen {
    fn inner(&self) -> &dyn Component {
        match self {
            Screen::MainMenu(s) => s,
            Screen::Submenu(s) => s,
            Screen::Sequence(s) => s,
            Screen::Editor(s) => s,
            Screen::Backups(s) => s,
            Screen::Tools(s) => s,
            Screen::BitwardenForm(s) => s,
            Screen::Environment(s) => s,
            Screen::Info(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Component {
        match self {
            Screen::MainMenu(s) => s,
            Screen::Submenu(s) => s,
            Screen::Sequence(s) => s,
            Screen::Editor(s) => s,
            Screen::Backups(s) => s,
            Screen::Tools(s) => s,
            Screen::BitwardenForm(s) => s,
            Screen::Environment(s) => s,
            Screen::Info(s) => s,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Screen::MainMenu(_) => "main-menu",
            Screen::Submenu(_) => "submenu",
            Screen::Sequence(_) => "sequence",
            Screen::Editor(_) => "editor",
            Screen::Backups(_) => "backups",
            Screen::Tools(_) => "tools",
            Screen::BitwardenForm(_) => "bitwarden-form",
            Screen::Environment(_) => "environment",
            Screen::Info(_) => "info",
        }
    }
}

impl Component for Screen {
    fn init(&mut self, ctx: &Context) -> Vec<Effect> {
        self.inner_mut().init(ctx)
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        self.inner_mut().update(msg, ctx)
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        self.inner().draw(frame, area, ctx)
    }

    fn title(&self) -> String {
        self.inner().title()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        self.inner().shortcuts()
    }

    fn status(&self) -> StatusBarState {
        self.inner().status()
    }

    fn captures_text(&self) -> bool {
        self.inner().captures_text()
    }
}

impl Host for Screen {
    fn adopt(&mut self, next: Screen, ctx: &Context) -> Vec<Effect> {
        tracing::debug!("Switching screen {} -> {}", self.name(), next.name());
        *self = next;
        self.init(ctx)
    }

    fn screen(&self) -> &Screen {
        self
    }
}
