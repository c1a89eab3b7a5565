use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::screens::editor::default_template;
use super::steps::{Outcome, StepResult};
use super::{Context, Ticket};
use crate::config::{AppConfig, ToolSpec};
use crate::event::Event;
use crate::system::executor::split_command_line;
use crate::system::{
    backup, BackupEntry, CopyReport, PackageManager, PackageOp, SystemInfo, SystemService,
};

/// The work behind one step of a sequence
#[derive(Debug, Clone, PartialEq)]
pub enum StepTask {
    // Install
    DetectSystem,
    BackupExisting { files: Vec<String> },
    InstallPackages { packages: Vec<String> },
    SetupZsh { plugins: Vec<String> },
    CreateDirectories { directories: Vec<String> },
    ApplyConfigs,
    RunScript { command_line: String },

    // Verify
    CheckTool { command: String, required: bool },
    CheckPath { path: String, required: bool },

    // Backup
    AnalyseBackup { files: Vec<String> },
    CreateBackupDir { dir: PathBuf },
    CopyBackupFiles { dir: PathBuf, files: Vec<String> },
    FinalizeBackup { dir: PathBuf },

    // Tools
    DetectPackageManager,
    PackageOperation { op: PackageOp, tool: ToolSpec },
    VerifyTool { tool: ToolSpec, expect_installed: bool },

    // Secrets
    ValidateEmail { email: String },
    CheckEnv { name: String, required: bool },
    BitwardenStatus,
    BitwardenSync,
}

/// A detached unit of work. Runs on a blocking worker and answers with
/// exactly one `JobMessage`.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Step { index: usize, task: StepTask },
    LoadFile { path: PathBuf },
    SaveFile { path: PathBuf, content: String },
    ListBackups,
    RestoreBackup { backup: BackupEntry },
    DeleteBackup { backup: BackupEntry },
    ScanTools,
    GatherInfo,
}

/// File contents handed to the editor screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub content: String,
    /// The file did not exist and `content` is a starter template
    pub from_template: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub tool: ToolSpec,
    pub installed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStatus {
    pub label: String,
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSnapshot {
    pub system: SystemInfo,
    pub package_manager: Option<PackageManager>,
    pub dryrun: bool,
    pub paths: Vec<PathStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobMessage {
    Step(StepResult),
    /// Fraction of the running step done so far
    StepProgress {
        index: usize,
        fraction: f32,
    },
    FileLoaded {
        path: PathBuf,
        result: Result<FileSnapshot, String>,
    },
    FileSaved {
        path: PathBuf,
        result: Result<usize, String>,
    },
    EditorClosed {
        path: PathBuf,
        result: Result<(), String>,
    },
    Backups(Result<Vec<BackupEntry>, String>),
    BackupRestored {
        name: String,
        result: Result<CopyReport, String>,
    },
    BackupDeleted {
        name: String,
        result: Result<(), String>,
    },
    Tools(Vec<ToolStatus>),
    Info(InfoSnapshot),
}

impl Job {
    pub fn run(self, ctx: &Context) -> JobMessage {
        self.run_reporting(ctx, &|_| {})
    }

    /// Like `run`, handing intermediate messages to `progress` as they happen
    pub fn run_reporting(self, ctx: &Context, progress: &dyn Fn(JobMessage)) -> JobMessage {
        match self {
            Job::Step { index, task } => {
                let on_progress = |fraction| progress(JobMessage::StepProgress { index, fraction });
                JobMessage::Step(run_step_reporting(index, &task, ctx, &on_progress))
            }
            Job::LoadFile { path } => {
                let result = load_file(&path, ctx);
                JobMessage::FileLoaded { path, result }
            }
            Job::SaveFile { path, content } => {
                let result = ctx
                    .service
                    .write_file(&path, &content)
                    .map(|_| content.len())
                    .map_err(|e| e.to_string());
                JobMessage::FileSaved { path, result }
            }
            Job::ListBackups => {
                let result = ctx
                    .home()
                    .and_then(|home| ctx.service.list_backups(home, &ctx.config.backup.prefix))
                    .map_err(|e| e.to_string());
                JobMessage::Backups(result)
            }
            Job::RestoreBackup { backup } => {
                let result = ctx
                    .home()
                    .and_then(|home| ctx.service.restore_backup(&backup.path, home))
                    .map_err(|e| e.to_string());
                JobMessage::BackupRestored {
                    name: backup.name,
                    result,
                }
            }
            Job::DeleteBackup { backup } => {
                let result = ctx
                    .service
                    .delete_backup(&backup.path)
                    .map_err(|e| e.to_string());
                JobMessage::BackupDeleted {
                    name: backup.name,
                    result,
                }
            }
            Job::ScanTools => JobMessage::Tools(scan_tools(ctx)),
            Job::GatherInfo => JobMessage::Info(gather_info(ctx)),
        }
    }

    /// Message reported when the worker running this job died
    pub fn failed(self, reason: &str) -> JobMessage {
        let reason = reason.to_string();
        match self {
            Job::Step { index, .. } => JobMessage::Step(StepResult {
                index,
                outcome: Outcome::Failed,
                message: reason,
                logs: Vec::new(),
            }),
            Job::LoadFile { path } => JobMessage::FileLoaded {
                path,
                result: Err(reason),
            },
            Job::SaveFile { path, .. } => JobMessage::FileSaved {
                path,
                result: Err(reason),
            },
            Job::ListBackups => JobMessage::Backups(Err(reason)),
            Job::RestoreBackup { backup } => JobMessage::BackupRestored {
                name: backup.name,
                result: Err(reason),
            },
            Job::DeleteBackup { backup } => JobMessage::BackupDeleted {
                name: backup.name,
                result: Err(reason),
            },
            Job::ScanTools => JobMessage::Tools(Vec::new()),
            Job::GatherInfo => JobMessage::Info(InfoSnapshot {
                system: fallback_info(),
                package_manager: None,
                dryrun: false,
                paths: Vec::new(),
            }),
        }
    }
}

fn fallback_info() -> SystemInfo {
    let unknown = || crate::system::executor::UNKNOWN.to_string();
    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        hostname: unknown(),
        shell: unknown(),
        home: unknown(),
        user: unknown(),
    }
}

/// Run `job` off the event loop and post its message back with `ticket`
pub fn spawn(job: Job, ticket: Ticket, ctx: Context, tx: mpsc::UnboundedSender<Event>) {
    tokio::spawn(async move {
        let fallback = job.clone();
        let progress_tx = tx.clone();
        let result = tokio::task::spawn_blocking(move || {
            job.run_reporting(&ctx, &|message| {
                let _ = progress_tx.send(Event::Job { ticket, message });
            })
        })
        .await;

        let message = match result {
            Ok(message) => message,
            Err(e) => {
                error!("Worker failed: {}", e);
                fallback.failed(&format!("worker failed: {e}"))
            }
        };

        if tx.send(Event::Job { ticket, message }).is_err() {
            warn!("Event queue closed before job result was delivered");
        }
    });
}

fn load_file(path: &Path, ctx: &Context) -> Result<FileSnapshot, String> {
    match ctx.service.read_file(path) {
        Ok(Some(content)) => Ok(FileSnapshot {
            content,
            from_template: false,
        }),
        Ok(None) => {
            info!("{:?} does not exist, using template", path);
            Ok(FileSnapshot {
                content: default_template(path),
                from_template: true,
            })
        }
        Err(e) => Err(e.to_string()),
    }
}

fn scan_tools(ctx: &Context) -> Vec<ToolStatus> {
    ctx.config
        .tools
        .iter()
        .map(|tool| ToolStatus {
            installed: ctx.service.command_exists(&tool.command),
            tool: tool.clone(),
        })
        .collect()
}

fn gather_info(ctx: &Context) -> InfoSnapshot {
    let home = ctx.home.as_deref();
    let mut paths = Vec::new();
    if let Some(home) = home {
        for (label, path) in [
            ("Configuration", "~/.config"),
            ("Chezmoi source", "~/.local/share/chezmoi"),
            ("Zsh", "~/.zshrc"),
            ("Neovim", "~/.config/nvim"),
        ] {
            let full = crate::config::expand_path(path, home);
            paths.push(PathStatus {
                label: label.to_string(),
                path: full.display().to_string(),
                exists: ctx.service.path_exists(&full),
            });
        }
    }
    if let Some(config_path) = AppConfig::default_path() {
        paths.push(PathStatus {
            label: "dotfiles-tui config".to_string(),
            exists: ctx.service.path_exists(&config_path),
            path: config_path.display().to_string(),
        });
    }

    InfoSnapshot {
        system: ctx.service.system_info(home),
        package_manager: ctx.service.package_manager(),
        dryrun: ctx.service.is_dryrun(),
        paths,
    }
}

/// Collects log lines while a step runs
struct Report<'a> {
    index: usize,
    logs: Vec<String>,
    progress: &'a dyn Fn(f32),
}

impl Report<'_> {
    fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }

    /// `done` of `total` items handled
    fn progress(&self, done: usize, total: usize) {
        if total > 0 {
            (self.progress)(done as f32 / total as f32);
        }
    }

    fn finish(self, outcome: Outcome, message: impl Into<String>) -> StepResult {
        StepResult {
            index: self.index,
            outcome,
            message: message.into(),
            logs: self.logs,
        }
    }
}

fn last_lines(output: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].iter().map(|l| l.trim().to_string()).collect()
}

/// Home-relative location of `path`, used to lay files out inside a backup
fn relative_to_home(path: &Path, home: &Path) -> PathBuf {
    path.strip_prefix(home)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default())
}

/// Copy one path, logging every entry that could not be copied
fn copy_logged(
    service: &dyn SystemService,
    from: &Path,
    to: &Path,
    report: &mut Report<'_>,
) -> CopyReport {
    let copy = service.copy_path(from, to).unwrap_or_else(|e| CopyReport {
        copied: 0,
        failed: vec![(from.to_path_buf(), e.to_string())],
    });
    for (path, error) in &copy.failed {
        report.log(format!("Failed {}: {}", path.display(), error));
    }
    copy
}

pub fn run_step(index: usize, task: &StepTask, ctx: &Context) -> StepResult {
    run_step_reporting(index, task, ctx, &|_| {})
}

pub fn run_step_reporting(
    index: usize,
    task: &StepTask,
    ctx: &Context,
    progress: &dyn Fn(f32),
) -> StepResult {
    let mut report = Report {
        index,
        logs: Vec::new(),
        progress,
    };
    let service = &ctx.service;

    match task {
        StepTask::DetectSystem => {
            let info = service.system_info(ctx.home.as_deref());
            report.log(format!("OS: {}", info.os));
            report.log(format!("Architecture: {}", info.arch));
            report.log(format!("Shell: {}", info.shell));
            match service.package_manager() {
                Some(pm) => report.log(format!("Package manager: {}", pm.label())),
                None => report.log("No supported package manager found"),
            }
            if ctx.home.is_none() {
                return report.finish(Outcome::Warning, "HOME is not set");
            }
            let message = format!("{}/{}", info.os, info.arch);
            report.finish(Outcome::Passed, message)
        }

        StepTask::BackupExisting { files } => {
            let home = match ctx.home() {
                Ok(home) => home,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            let existing: Vec<PathBuf> = files
                .iter()
                .map(|f| crate::config::expand_path(f, home))
                .filter(|p| service.path_exists(p))
                .collect();
            if existing.is_empty() {
                return report.finish(Outcome::Passed, "No existing configuration to back up");
            }

            let name = backup::backup_dir_name(&ctx.config.backup.prefix, Local::now().naive_local());
            let dir = home.join(&name);
            if let Err(e) = service.create_dir_all(&dir) {
                return report.finish(Outcome::Failed, e.to_string());
            }
            let mut total = CopyReport::default();
            for (i, path) in existing.iter().enumerate() {
                report.progress(i, existing.len());
                let relative = relative_to_home(path, home);
                let copy = copy_logged(&**service, path, &dir.join(&relative), &mut report);
                if copy.is_clean() {
                    report.log(format!("Saved {}", relative.display()));
                }
                total.merge(copy);
            }
            let saved = format!("Saved {} files to ~/{}", total.copied, name);
            match (total.is_clean(), total.copied) {
                (true, _) => report.finish(Outcome::Passed, saved),
                (false, 0) => {
                    report.finish(Outcome::Failed, format!("Nothing saved: {}", total.summary()))
                }
                (false, _) => report.finish(
                    Outcome::Warning,
                    format!("{}, {} failed", saved, total.failed.len()),
                ),
            }
        }

        StepTask::InstallPackages { packages } => {
            let Some(pm) = service.package_manager() else {
                return report.finish(Outcome::Failed, "No supported package manager found");
            };
            report.log(format!("Installing through {}", pm.label()));

            let (mut installed, mut present, mut failed) = (0, 0, 0);
            for (i, package) in packages.iter().enumerate() {
                report.progress(i, packages.len());
                let command = ctx
                    .config
                    .tools
                    .iter()
                    .find(|t| t.package_name() == package || &t.name == package)
                    .map(|t| t.command.as_str())
                    .unwrap_or(package.as_str());
                if service.command_exists(command) {
                    present += 1;
                    report.log(format!("{} already installed", package));
                    continue;
                }
                match service.package(pm, PackageOp::Install, package) {
                    Ok(_) => {
                        installed += 1;
                        report.log(format!("Installed {}", package));
                    }
                    Err(e) => {
                        failed += 1;
                        warn!("Installing {} failed: {}", package, e);
                        report.log(format!("Failed to install {}: {}", package, e));
                    }
                }
            }
            service.invalidate_cache();

            let message = format!(
                "{} installed, {} already present, {} failed",
                installed, present, failed
            );
            let outcome = match (failed, installed + present) {
                (0, _) => Outcome::Passed,
                (_, 0) => Outcome::Failed,
                _ => Outcome::Warning,
            };
            report.finish(outcome, message)
        }

        StepTask::SetupZsh { plugins } => {
            if !service.command_exists("zsh") {
                return report.finish(Outcome::Failed, "zsh not found");
            }
            let home = match ctx.home() {
                Ok(home) => home,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            let omz = home.join(".oh-my-zsh");
            if !service.path_exists(&omz) {
                return report.finish(
                    Outcome::Warning,
                    "Oh My Zsh is not installed (https://ohmyz.sh)",
                );
            }
            report.log("Oh My Zsh found");

            let plugin_dir = omz.join("custom").join("plugins");
            let missing: Vec<&String> = plugins
                .iter()
                .filter(|p| !service.path_exists(&plugin_dir.join(p)))
                .collect();
            for plugin in plugins {
                if missing.contains(&plugin) {
                    report.log(format!("Plugin {} missing", plugin));
                } else {
                    report.log(format!("Plugin {} present", plugin));
                }
            }
            if missing.is_empty() {
                report.finish(Outcome::Passed, "Zsh ready")
            } else {
                report.finish(
                    Outcome::Warning,
                    format!("{} plugin(s) missing", missing.len()),
                )
            }
        }

        StepTask::CreateDirectories { directories } => {
            let home = match ctx.home() {
                Ok(home) => home,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            for dir in directories {
                let path = crate::config::expand_path(dir, home);
                if let Err(e) = service.create_dir_all(&path) {
                    return report.finish(Outcome::Failed, format!("{}: {}", dir, e));
                }
                report.log(format!("Created {}", dir));
            }
            report.finish(
                Outcome::Passed,
                format!("{} directories ready", directories.len()),
            )
        }

        StepTask::ApplyConfigs => {
            if !service.command_exists("chezmoi") {
                return report.finish(Outcome::Failed, "chezmoi not found");
            }
            report.log("$ chezmoi apply");
            match service.run("chezmoi", &["apply".to_string()]) {
                Ok(output) => {
                    report.logs.extend(last_lines(&output, 3));
                    report.finish(Outcome::Passed, "Configuration applied")
                }
                Err(e) => report.finish(Outcome::Failed, e.to_string()),
            }
        }

        StepTask::RunScript { command_line } => {
            let argv = match split_command_line(command_line) {
                Ok(argv) => argv,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            let program = Path::new(&argv[0]);
            if program.components().count() > 1 && !service.path_exists(program) {
                return report.finish(
                    Outcome::Warning,
                    format!("{} not found, skipped", argv[0]),
                );
            }
            report.log(format!("$ {}", command_line));
            match service.run(&argv[0], &argv[1..]) {
                Ok(output) => {
                    report.logs.extend(last_lines(&output, 3));
                    report.finish(Outcome::Passed, "Verification script passed")
                }
                Err(e) => report.finish(Outcome::Failed, e.to_string()),
            }
        }

        StepTask::CheckTool { command, required } => {
            if service.command_exists(command) {
                report.finish(Outcome::Passed, format!("{} installed", command))
            } else if *required {
                report.finish(Outcome::Failed, format!("{} not found", command))
            } else {
                report.finish(Outcome::Warning, format!("{} not found (optional)", command))
            }
        }

        StepTask::CheckPath { path, required } => {
            let home = match ctx.home() {
                Ok(home) => home,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            let full = crate::config::expand_path(path, home);
            if service.path_exists(&full) {
                report.finish(Outcome::Passed, format!("{} present", path))
            } else if *required {
                report.finish(Outcome::Failed, format!("{} missing", path))
            } else {
                report.finish(Outcome::Warning, format!("{} missing (optional)", path))
            }
        }

        StepTask::AnalyseBackup { files } => {
            let home = match ctx.home() {
                Ok(home) => home,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            let mut present = 0;
            for file in files {
                if service.path_exists(&crate::config::expand_path(file, home)) {
                    present += 1;
                    report.log(format!("Found {}", file));
                } else {
                    report.log(format!("Skipping {} (missing)", file));
                }
            }
            if present == 0 {
                report.finish(Outcome::Warning, "Nothing to back up")
            } else {
                report.finish(
                    Outcome::Passed,
                    format!("{} of {} paths present", present, files.len()),
                )
            }
        }

        StepTask::CreateBackupDir { dir } => match service.create_dir_all(dir) {
            Ok(()) => {
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                report.finish(Outcome::Passed, format!("Created {}", name))
            }
            Err(e) => report.finish(Outcome::Failed, e.to_string()),
        },

        StepTask::CopyBackupFiles { dir, files } => {
            let home = match ctx.home() {
                Ok(home) => home,
                Err(e) => return report.finish(Outcome::Failed, e.to_string()),
            };
            let mut total = CopyReport::default();
            let mut skipped = 0;
            for (i, file) in files.iter().enumerate() {
                report.progress(i, files.len());
                let source = crate::config::expand_path(file, home);
                if !service.path_exists(&source) {
                    skipped += 1;
                    continue;
                }
                let relative = relative_to_home(&source, home);
                let copy = copy_logged(&**service, &source, &dir.join(&relative), &mut report);
                if copy.is_clean() {
                    report.log(format!("Copied {}", file));
                }
                total.merge(copy);
            }
            if total.is_clean() {
                report.finish(
                    Outcome::Passed,
                    format!("{} files copied, {} skipped", total.copied, skipped),
                )
            } else if total.copied > 0 {
                report.finish(Outcome::Warning, total.summary())
            } else {
                report.finish(Outcome::Failed, total.summary())
            }
        }

        StepTask::FinalizeBackup { dir } => {
            report.log("Restore it from Backup > Restore");
            report.finish(Outcome::Passed, format!("Backup saved to {}", dir.display()))
        }

        StepTask::DetectPackageManager => match service.package_manager() {
            Some(pm) => report.finish(Outcome::Passed, format!("Using {}", pm.label())),
            None => report.finish(Outcome::Failed, "No supported package manager found"),
        },

        StepTask::PackageOperation { op, tool } => {
            let Some(pm) = service.package_manager() else {
                return report.finish(Outcome::Failed, "No supported package manager found");
            };
            let command = service.command_string(&crate::system::ServiceOp::Package {
                manager: pm,
                op: *op,
                package: tool.package_name().to_string(),
            });
            report.log(format!("$ {}", command));
            let result = service.package(pm, *op, tool.package_name());
            service.invalidate_cache();
            match result {
                Ok(output) => {
                    report.logs.extend(last_lines(&output, 3));
                    report.finish(Outcome::Passed, format!("{} {} done", op.verb(), tool.name))
                }
                Err(e) => report.finish(Outcome::Failed, e.to_string()),
            }
        }

        StepTask::VerifyTool {
            tool,
            expect_installed,
        } => {
            let installed = service.command_exists(&tool.command);
            match (installed, *expect_installed) {
                (true, true) => report.finish(Outcome::Passed, format!("{} is available", tool.command)),
                (false, false) => report.finish(Outcome::Passed, format!("{} is gone", tool.command)),
                (false, true) if service.is_dryrun() => {
                    report.finish(Outcome::Warning, "Dry run: nothing was installed")
                }
                (true, false) if service.is_dryrun() => {
                    report.finish(Outcome::Warning, "Dry run: nothing was removed")
                }
                (false, true) => report.finish(Outcome::Failed, format!("{} still not on PATH", tool.command)),
                (true, false) => report.finish(Outcome::Failed, format!("{} is still on PATH", tool.command)),
            }
        }

        StepTask::ValidateEmail { email } => {
            if is_plausible_email(email) {
                report.finish(Outcome::Passed, format!("Using {}", email))
            } else {
                report.finish(Outcome::Failed, format!("'{}' is not a valid e-mail address", email))
            }
        }

        StepTask::CheckEnv { name, required } => match service.env_var(name) {
            Some(_) => report.finish(Outcome::Passed, format!("{} is set", name)),
            None if *required => report.finish(Outcome::Failed, format!("{} is not set", name)),
            None => report.finish(Outcome::Warning, format!("{} is not set", name)),
        },

        StepTask::BitwardenStatus => {
            if !service.command_exists("bw") {
                return report.finish(Outcome::Failed, "Bitwarden CLI (bw) not found");
            }
            match service.run("bw", &["status".to_string()]) {
                Ok(output) if output.contains("\"unlocked\"") => {
                    report.finish(Outcome::Passed, "Vault unlocked")
                }
                Ok(output) if output.contains("\"locked\"") => {
                    report.log("Run `bw unlock` and export BW_SESSION");
                    report.finish(Outcome::Warning, "Vault locked")
                }
                Ok(_) => {
                    report.log("Run `bw login` to authenticate");
                    report.finish(Outcome::Warning, "Not logged in")
                }
                Err(e) => report.finish(Outcome::Failed, e.to_string()),
            }
        }

        StepTask::BitwardenSync => {
            if !service.command_exists("bw") {
                return report.finish(Outcome::Failed, "Bitwarden CLI (bw) not found");
            }
            match service.run("bw", &["sync".to_string()]) {
                Ok(output) => {
                    report.logs.extend(last_lines(&output, 2));
                    report.finish(Outcome::Passed, "Vault synchronized")
                }
                Err(e) => report.finish(Outcome::Failed, e.to_string()),
            }
        }
    }
}

pub fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
