use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{DotfilesError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Package managers the tools menu knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Brew,
    Apt,
    Pacman,
    Dnf,
    Yum,
}

/// Operation requested from a package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOp {
    Install,
    Update,
    Remove,
}

impl PackageOp {
    pub fn verb(&self) -> &'static str {
        match self {
            PackageOp::Install => "Install",
            PackageOp::Update => "Update",
            PackageOp::Remove => "Remove",
        }
    }
}

impl PackageManager {
    /// Detection order: Homebrew first, then the distribution managers
    pub const ALL: [PackageManager; 5] = [
        PackageManager::Brew,
        PackageManager::Apt,
        PackageManager::Pacman,
        PackageManager::Dnf,
        PackageManager::Yum,
    ];

    pub fn command(&self) -> &'static str {
        match self {
            PackageManager::Brew => "brew",
            PackageManager::Apt => "apt-get",
            PackageManager::Pacman => "pacman",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PackageManager::Brew => "Homebrew",
            PackageManager::Apt => "APT",
            PackageManager::Pacman => "pacman",
            PackageManager::Dnf => "DNF",
            PackageManager::Yum => "YUM",
        }
    }

    /// Full argument vector for `op`. System managers go through `sudo -n`
    /// since the TUI owns the terminal and cannot answer a password prompt.
    pub fn invocation(&self, op: PackageOp, package: &str) -> Vec<String> {
        let mut argv: Vec<&str> = match self {
            PackageManager::Brew => vec!["brew"],
            _ => vec!["sudo", "-n", self.command()],
        };

        let tail: &[&str] = match (self, op) {
            (PackageManager::Brew, PackageOp::Install) => &["install"],
            (PackageManager::Brew, PackageOp::Update) => &["upgrade"],
            (PackageManager::Brew, PackageOp::Remove) => &["uninstall"],
            (PackageManager::Apt, PackageOp::Install) => &["install", "-y"],
            (PackageManager::Apt, PackageOp::Update) => &["install", "--only-upgrade", "-y"],
            (PackageManager::Apt, PackageOp::Remove) => &["remove", "-y"],
            (PackageManager::Pacman, PackageOp::Install) => &["-S", "--noconfirm", "--needed"],
            (PackageManager::Pacman, PackageOp::Update) => &["-S", "--noconfirm"],
            (PackageManager::Pacman, PackageOp::Remove) => &["-R", "--noconfirm"],
            (PackageManager::Dnf | PackageManager::Yum, PackageOp::Install) => &["install", "-y"],
            (PackageManager::Dnf | PackageManager::Yum, PackageOp::Update) => &["upgrade", "-y"],
            (PackageManager::Dnf | PackageManager::Yum, PackageOp::Remove) => &["remove", "-y"],
        };
        argv.extend_from_slice(tail);
        argv.push(package);
        argv.into_iter().map(|s| s.to_string()).collect()
    }
}

/// Snapshot of the environment shown on the system information screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub hostname: String,
    pub shell: String,
    pub home: String,
    pub user: String,
}

pub const UNKNOWN: &str = "unknown";

/// Check whether `command` resolves on PATH, giving up after `timeout`
pub fn command_exists(command: &str, timeout: Duration) -> bool {
    if command.trim().is_empty() {
        return false;
    }

    let child = Command::new("sh")
        .args(["-c", "command -v \"$1\"", "sh", command])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn lookup for {}: {}", command, e);
            return false;
        }
    };

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Lookup {} -> {}", command, status.success());
                return status.success();
            }
            Ok(None) if Instant::now() >= deadline => {
                warn!("Lookup of {} timed out after {:?}", command, timeout);
                let _ = child.kill();
                let _ = child.wait();
                return false;
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                warn!("Lookup of {} failed: {}", command, e);
                return false;
            }
        }
    }
}

/// Run a program to completion and return its combined stdout and stderr
pub fn run_command(program: &str, args: &[String]) -> Result<String> {
    info!("Running: {}", format_argv(program, args));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(combined)
    } else {
        Err(DotfilesError::Command(format!(
            "{} exited with code {:?}: {}",
            program,
            output.status.code(),
            combined.trim()
        )))
    }
}

/// Split a user supplied command line the way a shell would
pub fn split_command_line(line: &str) -> Result<Vec<String>> {
    let argv = shell_words::split(line)
        .map_err(|e| DotfilesError::Command(format!("Cannot parse `{}`: {}", line, e)))?;
    if argv.is_empty() {
        return Err(DotfilesError::Command("Empty command".to_string()));
    }
    Ok(argv)
}

/// Render a command for logs and status lines
pub fn format_argv(program: &str, args: &[String]) -> String {
    std::iter::once(program.to_string())
        .chain(args.iter().map(|a| shell_escape::escape(a.as_str().into()).to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn detect_package_manager(timeout: Duration) -> Option<PackageManager> {
    let found = PackageManager::ALL
        .into_iter()
        .find(|pm| command_exists(pm.command(), timeout));
    match found {
        Some(pm) => info!("Detected package manager: {}", pm.label()),
        None => warn!("No supported package manager found"),
    }
    found
}

/// Read an environment variable, treating empty values as absent
pub fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// `$USER`, falling back to the passwd entry of the current uid
pub fn current_user() -> Option<String> {
    env_var("USER").or_else(|| {
        nix::unistd::User::from_uid(nix::unistd::getuid())
            .ok()
            .flatten()
            .map(|u| u.name)
    })
}

pub fn system_info(home: Option<&Path>) -> SystemInfo {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| UNKNOWN.to_string());

    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        hostname,
        shell: env_var("SHELL").unwrap_or_else(|| UNKNOWN.to_string()),
        home: home
            .map(|h| h.display().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string()),
        user: current_user().unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/// Pick the editor command: `$EDITOR` when it resolves, else the first
/// available candidate.
pub fn find_editor(candidates: &[String], timeout: Duration) -> Result<Vec<String>> {
    if let Some(editor) = env_var("EDITOR") {
        match split_command_line(&editor) {
            Ok(argv) if command_exists(&argv[0], timeout) => return Ok(argv),
            Ok(_) => warn!("$EDITOR ({}) not found on PATH", editor),
            Err(e) => warn!("Ignoring $EDITOR: {}", e),
        }
    }

    candidates
        .iter()
        .find(|c| command_exists(c, timeout))
        .map(|c| vec![c.clone()])
        .ok_or_else(|| DotfilesError::NoEditor(candidates.join(", ")))
}

/// Run an interactive editor on `path`, inheriting the terminal
pub fn launch_editor(argv: &[String], path: &Path) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| DotfilesError::Command("Empty editor command".to_string()))?;

    info!("Launching editor {} on {:?}", program, path);

    let status = Command::new(program).args(args).arg(path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(DotfilesError::Command(format!(
            "{} exited with code {:?}",
            program,
            status.code()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sh_is_found_and_garbage_is_not() {
        let timeout = Duration::from_secs(2);
        assert!(command_exists("sh", timeout));
        assert!(!command_exists("definitely-not-a-real-command-4821", timeout));
        assert!(!command_exists("", timeout));
    }

    #[test]
    fn run_command_reports_failure_with_output() {
        let ok = run_command("sh", &["-c".to_string(), "echo out; echo err >&2".to_string()]).unwrap();
        assert!(ok.contains("out"));
        assert!(ok.contains("err"));

        let err = run_command("sh", &["-c".to_string(), "echo boom >&2; exit 3".to_string()])
            .unwrap_err()
            .to_string();
        assert!(err.contains("Some(3)"));
        assert!(err.contains("boom"));
    }

    #[test]
    fn system_managers_run_through_sudo() {
        assert_eq!(
            PackageManager::Brew.invocation(PackageOp::Install, "fzf"),
            vec!["brew", "install", "fzf"]
        );
        assert_eq!(
            PackageManager::Apt.invocation(PackageOp::Remove, "bat"),
            vec!["sudo", "-n", "apt-get", "remove", "-y", "bat"]
        );
    }

    #[test]
    fn command_lines_are_split_and_quoted() {
        assert_eq!(
            split_command_line("code --wait 'my file'").unwrap(),
            vec!["code", "--wait", "my file"]
        );
        assert!(split_command_line("   ").is_err());
        assert_eq!(
            format_argv("echo", &["a b".to_string()]),
            "echo 'a b'"
        );
    }
}
