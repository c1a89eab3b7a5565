use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotfiles_tui::app::{jobs, App, Command, Context, JobMessage, Ticket};
use dotfiles_tui::config::AppConfig;
use dotfiles_tui::error::{DotfilesError, Result};
use dotfiles_tui::event::{Event, EventHandler};
use dotfiles_tui::system::executor;
use ratatui::prelude::*;
use std::collections::VecDeque;
use std::io::stdout;
use std::panic;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

type Term = Terminal<CrosstermBackend<std::io::Stdout>>;

#[derive(Parser, Debug)]
#[command(name = "dotfiles-tui")]
#[command(author, version, about = "Interactive terminal menu for managing dotfiles")]
struct Args {
    /// Path to config file (default: ~/.config/dotfiles-tui/config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Simulate all operations without making real changes
    #[arg(long)]
    dryrun: bool,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging only if log file is specified
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting dotfiles-tui");
        }
    }

    let mut config = match args.config.as_deref() {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .unwrap_or_else(|e| {
        warn!("Ignoring unreadable config: {}", e);
        AppConfig::default()
    });

    // --dryrun flag overrides config
    if args.dryrun {
        config.general.dryrun = true;
    }

    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;

    let result = run(&mut terminal, Context::from_config(config)).await;

    restore_terminal()?;

    if let Err(ref e) = result {
        error!("dotfiles-tui error: {}", e);
    }

    result
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode().map_err(|e| DotfilesError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .map_err(|e| DotfilesError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).map_err(|e| DotfilesError::Terminal(e.to_string()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| DotfilesError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)
        .map_err(|e| DotfilesError::Terminal(e.to_string()))?;
    Ok(())
}

async fn run(terminal: &mut Term, ctx: Context) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);
    let mut app = App::new(ctx);

    let mut pending: VecDeque<Command> = app.start().into();

    loop {
        while let Some(command) = pending.pop_front() {
            match command {
                Command::Spawn { ticket, job } => {
                    jobs::spawn(job, ticket, app.context().clone(), events.sender());
                }
                Command::ScheduleExpiry { id, after } => {
                    let tx = events.sender();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = tx.send(Event::NotificationExpired(id));
                    });
                }
                Command::LaunchEditor { ticket, path } => {
                    // The editor owns the terminal until it exits
                    events.pause();
                    restore_terminal()?;
                    let result = edit(app.context(), &path);
                    *terminal = setup_terminal()?;
                    events.resume();
                    pending.extend(report_editor(&mut app, ticket, path, result));
                }
                Command::Quit => {}
            }
        }

        if app.should_quit() {
            break;
        }

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| DotfilesError::Terminal(e.to_string()))?;

        match events.next().await {
            Some(event) => pending.extend(app.handle_event(event)),
            None => break,
        }
    }

    info!("Exiting");
    Ok(())
}

fn edit(ctx: &Context, path: &Path) -> std::result::Result<(), String> {
    if ctx.service.is_dryrun() {
        info!("[DRYRUN] Would open {:?} in an editor", path);
        return Err("dry run: editor not launched".to_string());
    }
    let candidates = &ctx.config.editor.candidates;
    let result = executor::find_editor(candidates, ctx.config.commands.check_timeout())
        .and_then(|argv| executor::launch_editor(&argv, path))
        .map_err(|e| e.to_string());
    // The file changed behind the file cache
    ctx.service.forget_file(path);
    result
}

fn report_editor(
    app: &mut App,
    ticket: Ticket,
    path: PathBuf,
    result: std::result::Result<(), String>,
) -> Vec<Command> {
    if let Err(ref e) = result {
        warn!("Editor on {:?} failed: {}", path, e);
    }
    app.handle_job(ticket, JobMessage::EditorClosed { path, result })
}
