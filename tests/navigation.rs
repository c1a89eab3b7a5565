use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dotfiles_tui::app::{App, Command, Component, Context, Screen};
use dotfiles_tui::config::AppConfig;
use dotfiles_tui::system::DryrunService;
use ratatui::backend::TestBackend;
use ratatui::Terminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn dryrun_app(home: &Path) -> App {
    let service = Arc::new(DryrunService::new(Duration::from_millis(500)));
    let ctx = Context::new(AppConfig::default(), service, Some(home.to_path_buf()));
    App::new(ctx)
}

fn press(app: &mut App, code: KeyCode) -> Vec<Command> {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
}

/// Run spawned jobs inline, feeding their results back until none are left
fn drain(app: &mut App, mut commands: Vec<Command>) {
    while let Some(command) = commands.pop() {
        if let Command::Spawn { ticket, job } = command {
            let message = job.run(app.context());
            commands.extend(app.handle_job(ticket, message));
        }
    }
}

fn render(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| app.draw(frame)).unwrap();
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
fn listing_backups_in_an_empty_home() {
    let home = tempfile::tempdir().unwrap();
    let mut app = dryrun_app(home.path());
    app.start();

    // 4: Backup & Restore, then 2: List backups
    press(&mut app, KeyCode::Char('4'));
    assert_eq!(app.screen().title(), "Backup & Restore");
    let commands = press(&mut app, KeyCode::Char('2'));
    drain(&mut app, commands);

    assert!(matches!(app.screen(), Screen::Backups(_)));
    assert!(render(&app).contains("No backups found"));

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen().title(), "Backup & Restore");
    press(&mut app, KeyCode::Esc);
    assert!(matches!(app.screen(), Screen::MainMenu(_)));
}

#[test]
fn dry_run_backup_leaves_home_untouched() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join(".zshrc"), "export EDITOR=nvim\n").unwrap();
    let mut app = dryrun_app(home.path());
    app.start();

    press(&mut app, KeyCode::Char('4'));
    let commands = press(&mut app, KeyCode::Char('1'));
    drain(&mut app, commands);

    let Screen::Sequence(sequence) = app.screen() else {
        panic!("expected the backup sequence");
    };
    assert!(sequence.is_finished());
    assert_eq!(app.notifications().len(), 1);

    let entries: Vec<_> = std::fs::read_dir(home.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(entries, vec![".zshrc".to_string()]);
}

#[test]
fn search_then_enter_opens_the_match() {
    let home = tempfile::tempdir().unwrap();
    let mut app = dryrun_app(home.path());
    app.start();

    press(&mut app, KeyCode::Char('/'));
    for c in "secrets".chars() {
        press(&mut app, KeyCode::Char(c));
    }
    // Help is not toggled while typing
    press(&mut app, KeyCode::Char('?'));
    assert!(!app.help_visible());
    press(&mut app, KeyCode::Backspace);

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen().title(), "Secrets");
    assert!(render(&app).contains("[DRYRUN]"));
}

#[test]
fn quitting_from_the_main_menu() {
    let home = tempfile::tempdir().unwrap();
    let mut app = dryrun_app(home.path());
    app.start();

    let commands = press(&mut app, KeyCode::Char('q'));
    assert_eq!(commands, vec![Command::Quit]);
    assert!(app.should_quit());
}
