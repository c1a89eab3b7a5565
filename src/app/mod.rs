pub mod catalog;
pub mod input;
pub mod jobs;
pub mod menu;
pub mod message;
pub mod overlay;
pub mod progress;
pub mod screen;
pub mod screens;
pub mod search;
pub mod steps;

pub use jobs::{Job, JobMessage};
pub use message::{Effect, Msg};
pub use screen::{Component, Host, Parent, Screen, Update};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{expand_path, AppConfig};
use crate::error::{DotfilesError, Result};
use crate::event::Event;
use crate::system::{create_service, CachedService, SystemService};
use crate::ui::Theme;
use overlay::{NotificationCenter, WithHelp, WithNotifications};
use screens::MainMenu;

/// Everything screens and units of work need, passed explicitly
#[derive(Clone)]
pub struct Context {
    pub config: Arc<AppConfig>,
    pub service: Arc<dyn SystemService>,
    pub home: Option<PathBuf>,
    pub theme: Theme,
}

impl Context {
    pub fn new(config: AppConfig, service: Arc<dyn SystemService>, home: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            home,
            theme: Theme::default(),
        }
    }

    /// Live or dry-run service behind the lookup cache
    pub fn from_config(config: AppConfig) -> Self {
        let commands = &config.commands;
        let service = create_service(config.general.dryrun, commands.check_timeout());
        let cached = CachedService::new(service, commands.cache_ttl(), commands.file_cache_ttl());
        let home = dirs::home_dir();
        if home.is_none() {
            warn!("Could not determine the home directory");
        }
        Self::new(config, Arc::new(cached), home)
    }

    pub fn home(&self) -> Result<&Path> {
        self.home.as_deref().ok_or(DotfilesError::HomeNotFound)
    }

    /// Resolve a `~`-relative path from the configuration
    pub fn expand(&self, path: &str) -> Result<PathBuf> {
        Ok(expand_path(path, self.home()?))
    }
}

/// Screen generation a unit of work was issued for. Results carrying an
/// older ticket belong to a screen that is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

/// Work for the runtime loop
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Spawn { ticket: Ticket, job: Job },
    ScheduleExpiry { id: u64, after: Duration },
    /// Hand the terminal to an external editor, then report back
    LaunchEditor { ticket: Ticket, path: PathBuf },
    Quit,
}

type Root = WithNotifications<WithHelp<Screen>>;

/// Navigation state machine: the active screen wrapped in its overlays
pub struct App {
    ctx: Context,
    root: Root,
    generation: u64,
    should_quit: bool,
}

impl App {
    pub fn new(ctx: Context) -> Self {
        Self::with_screen(ctx, Screen::MainMenu(MainMenu::new()))
    }

    pub fn with_screen(ctx: Context, screen: Screen) -> Self {
        let root = WithNotifications::new(WithHelp::new(screen), &ctx.config.notifications);
        Self {
            ctx,
            root,
            generation: 0,
            should_quit: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn screen(&self) -> &Screen {
        self.root.screen()
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn help_visible(&self) -> bool {
        self.root.inner().is_visible()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        self.root.notifications()
    }

    pub(crate) fn root(&self) -> &impl Component {
        &self.root
    }

    /// Effects of the initial screen
    pub fn start(&mut self) -> Vec<Command> {
        info!("Starting on {}", self.screen().name());
        let effects = self.root.init(&self.ctx);
        self.commands(effects, self.ticket())
    }

    pub fn handle_event(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Tick => self.dispatch(Msg::Tick),
            Event::Resize(width, height) => self.dispatch(Msg::Resize(width, height)),
            Event::Mouse => Vec::new(),
            Event::Job { ticket, message } => self.handle_job(ticket, message),
            Event::NotificationExpired(id) => self.dispatch(Msg::NotificationExpired(id)),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            info!("Quit requested");
            self.should_quit = true;
            return vec![Command::Quit];
        }
        self.dispatch(Msg::Key(key))
    }

    pub fn handle_job(&mut self, ticket: Ticket, message: JobMessage) -> Vec<Command> {
        if ticket != self.ticket() {
            debug!(
                "Dropping result for generation {} (current {})",
                ticket.0, self.generation
            );
            return Vec::new();
        }
        self.dispatch(Msg::Job(message))
    }

    pub fn draw(&self, frame: &mut Frame) {
        crate::ui::draw(frame, self);
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Command> {
        let update = self.root.update(msg, &self.ctx);
        self.apply(update)
    }

    /// Effects of an update run for the current generation. A transition
    /// starts a new generation and the new screen's effects belong to it.
    fn apply(&mut self, update: Update) -> Vec<Command> {
        let Update { next, effects } = update;
        let mut commands = self.commands(effects, self.ticket());

        if let Some(next) = next {
            self.generation += 1;
            let effects = self.root.adopt(next, &self.ctx);
            commands.extend(self.commands(effects, self.ticket()));
        }
        commands
    }

    fn commands(&mut self, effects: Vec<Effect>, ticket: Ticket) -> Vec<Command> {
        let mut commands = Vec::with_capacity(effects.len());
        for effect in effects {
            match effect {
                Effect::Spawn(job) => commands.push(Command::Spawn { ticket, job }),
                Effect::ScheduleExpiry { id, after } => {
                    commands.push(Command::ScheduleExpiry { id, after })
                }
                Effect::LaunchEditor(path) => commands.push(Command::LaunchEditor { ticket, path }),
                Effect::Quit => {
                    self.should_quit = true;
                    commands.push(Command::Quit);
                }
                Effect::Notify { title, .. } => {
                    warn!("Notification '{}' reached the app unhandled", title);
                }
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::jobs::StepTask;
    use crate::app::progress::Summary;
    use crate::app::screens::SequenceScreen;
    use crate::app::steps::{FailurePolicy, Step, StepSequence, StepStatus};
    use crate::testing::{context_with, FakeService};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Run spawned jobs inline until none are left
    fn drain(app: &mut App, mut commands: Vec<Command>) {
        while let Some(command) = commands.pop() {
            if let Command::Spawn { ticket, job } = command {
                let message = job.run(app.context());
                commands.extend(app.handle_job(ticket, message));
            }
        }
    }

    fn spawned(commands: &[Command]) -> Vec<(Ticket, Job)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Spawn { ticket, job } => Some((*ticket, job.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tool_checks_produce_a_summary() {
        let ctx = context_with(FakeService::with_commands(&["chezmoi"]), None);
        let check = |name: &str, command: &str| {
            Step::new(
                name,
                "",
                StepTask::CheckTool {
                    command: command.to_string(),
                    required: true,
                },
            )
        };
        let sequence = StepSequence::new(
            vec![check("Chezmoi", "chezmoi"), check("Starship", "starship")],
            FailurePolicy::Continue,
        );
        let screen = SequenceScreen::new("Verify", sequence, Parent::MainMenu, 6);
        let mut app = App::with_screen(ctx, Screen::Sequence(screen));

        let commands = app.start();
        drain(&mut app, commands);

        let Screen::Sequence(screen) = app.screen() else {
            panic!("left the sequence screen");
        };
        let statuses: Vec<StepStatus> = screen.sequence().steps().iter().map(|s| s.status()).collect();
        assert_eq!(statuses, vec![StepStatus::Completed, StepStatus::Failed]);
        assert_eq!(
            screen.summary(),
            Some(Summary {
                total: 2,
                passed: 1,
                failed: 1,
                warning: 0
            })
        );
        assert_eq!(app.notifications().len(), 1);
    }

    #[test]
    fn menu_shortcut_opens_a_sequence_in_a_new_generation() {
        let ctx = context_with(FakeService::default(), None);
        let mut app = App::new(ctx);
        assert!(app.start().is_empty());
        assert_eq!(app.ticket(), Ticket(0));

        // 3: Verify installation
        let commands = app.handle_key(key(KeyCode::Char('3')));
        assert!(matches!(app.screen(), Screen::Sequence(_)));
        let jobs = spawned(&commands);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].0, Ticket(1));
        assert!(matches!(jobs[0].1, Job::Step { index: 0, .. }));
    }

    #[test]
    fn results_for_an_abandoned_screen_are_dropped() {
        let ctx = context_with(FakeService::with_commands(&["chezmoi"]), None);
        let mut app = App::new(ctx);
        app.start();

        let first = spawned(&app.handle_key(key(KeyCode::Char('3'))));
        let (old_ticket, old_job) = first[0].clone();

        // Leave the sequence, then open it again
        app.handle_key(key(KeyCode::Esc));
        assert!(matches!(app.screen(), Screen::MainMenu(_)));
        let second = spawned(&app.handle_key(key(KeyCode::Char('3'))));
        assert_ne!(second[0].0, old_ticket);

        let message = old_job.run(app.context());
        assert!(app.handle_job(old_ticket, message).is_empty());

        let Screen::Sequence(screen) = app.screen() else {
            panic!("left the sequence screen");
        };
        assert_eq!(screen.sequence().current(), 0);
        assert_eq!(screen.sequence().steps()[0].status(), StepStatus::Running);
    }

    #[test]
    fn ctrl_c_quits_even_under_help() {
        let ctx = context_with(FakeService::default(), None);
        let mut app = App::new(ctx);
        app.handle_key(key(KeyCode::F(1)));
        assert!(app.help_visible());

        let commands = app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(commands, vec![Command::Quit]);
        assert!(app.should_quit());
    }

    #[test]
    fn q_on_the_main_menu_quits() {
        let ctx = context_with(FakeService::default(), None);
        let mut app = App::new(ctx);
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), vec![Command::Quit]);
        assert!(app.should_quit());
    }

    #[test]
    fn esc_from_a_submenu_returns_to_the_main_menu() {
        let ctx = context_with(FakeService::default(), None);
        let mut app = App::new(ctx);
        // 4: Backup & Restore
        app.handle_key(key(KeyCode::Char('4')));
        assert!(matches!(app.screen(), Screen::Submenu(_)));
        app.handle_key(key(KeyCode::Esc));
        assert!(matches!(app.screen(), Screen::MainMenu(_)));
        assert_eq!(app.ticket(), Ticket(2));
    }
}
