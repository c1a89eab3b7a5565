//! Step lists behind every multi-step operation.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

use super::jobs::StepTask;
use super::steps::{FailurePolicy, Step, StepSequence};
use crate::config::{AppConfig, ToolSpec};
use crate::system::backup::backup_dir_name;
use crate::system::PackageOp;

fn policy(halt_on_failure: bool) -> FailurePolicy {
    if halt_on_failure {
        FailurePolicy::Halt
    } else {
        FailurePolicy::Continue
    }
}

pub fn install(config: &AppConfig) -> StepSequence {
    let steps = vec![
        Step::new(
            "Detect system",
            "Operating system, shell and package manager",
            StepTask::DetectSystem,
        ),
        Step::new(
            "Back up existing configuration",
            "Save current dotfiles before they are replaced",
            StepTask::BackupExisting {
                files: config.backup.files.clone(),
            },
        ),
        Step::new(
            "Install essential tools",
            "Install missing packages",
            StepTask::InstallPackages {
                packages: config.install.packages.clone(),
            },
        ),
        Step::new(
            "Configure Zsh",
            "Check Oh My Zsh and its plugins",
            StepTask::SetupZsh {
                plugins: config.install.zsh_plugins.clone(),
            },
        ),
        Step::new(
            "Create directories",
            "Development directory layout",
            StepTask::CreateDirectories {
                directories: config.install.directories.clone(),
            },
        ),
        Step::new(
            "Apply configuration",
            "chezmoi apply",
            StepTask::ApplyConfigs,
        ),
        Step::new(
            "Verify installation",
            "Run the verification script",
            StepTask::RunScript {
                command_line: config.commands.verify_script.clone(),
            },
        ),
    ];
    StepSequence::new(steps, policy(config.install.halt_on_failure))
}

pub fn verify(config: &AppConfig) -> StepSequence {
    let tools = config.tools.iter().map(|tool| {
        Step::new(
            tool.name.clone(),
            tool.description.clone(),
            StepTask::CheckTool {
                command: tool.command.clone(),
                required: tool.required,
            },
        )
    });
    let paths = config.verify.paths.iter().map(|check| {
        Step::new(
            check.label.clone(),
            check.path.clone(),
            StepTask::CheckPath {
                path: check.path.clone(),
                required: check.required,
            },
        )
    });
    StepSequence::new(
        tools.chain(paths).collect(),
        policy(config.verify.halt_on_failure),
    )
}

/// Backup into `<home>/<prefix>-<now>`. Without a home directory the
/// first step fails and the sequence halts before anything is created.
pub fn backup(config: &AppConfig, home: Option<&Path>, now: NaiveDateTime) -> StepSequence {
    let name = backup_dir_name(&config.backup.prefix, now);
    let dir = home.map(|h| h.join(&name)).unwrap_or_else(|| PathBuf::from(&name));
    let files = config.backup.files.clone();

    let steps = vec![
        Step::new(
            "Analyse",
            "Find the files worth saving",
            StepTask::AnalyseBackup {
                files: files.clone(),
            },
        ),
        Step::new(
            "Create directory",
            name.clone(),
            StepTask::CreateBackupDir { dir: dir.clone() },
        ),
        Step::new(
            "Copy files",
            "Copy dotfiles into the backup",
            StepTask::CopyBackupFiles {
                dir: dir.clone(),
                files,
            },
        ),
        Step::new("Finalize", "Report the backup location", StepTask::FinalizeBackup { dir }),
    ];
    StepSequence::new(steps, FailurePolicy::Halt)
}

pub fn tool_operation(op: PackageOp, tool: &ToolSpec) -> StepSequence {
    let steps = vec![
        Step::new(
            "Detect package manager",
            "brew, apt, pacman, dnf or yum",
            StepTask::DetectPackageManager,
        ),
        Step::new(
            format!("{} {}", op.verb(), tool.name),
            tool.description.clone(),
            StepTask::PackageOperation {
                op,
                tool: tool.clone(),
            },
        ),
        Step::new(
            "Verify",
            format!("Look up {} on PATH", tool.command),
            StepTask::VerifyTool {
                tool: tool.clone(),
                expect_installed: op != PackageOp::Remove,
            },
        ),
    ];
    StepSequence::new(steps, FailurePolicy::Halt)
}

pub fn secrets_test() -> StepSequence {
    let steps = vec![
        Step::new(
            "Bitwarden CLI",
            "bw on PATH",
            StepTask::CheckTool {
                command: "bw".to_string(),
                required: true,
            },
        ),
        Step::new(
            "Session",
            "BW_SESSION exported",
            StepTask::CheckEnv {
                name: "BW_SESSION".to_string(),
                required: true,
            },
        ),
        Step::new("Vault status", "bw status", StepTask::BitwardenStatus),
    ];
    StepSequence::new(steps, FailurePolicy::Continue)
}

pub fn secrets_sync() -> StepSequence {
    let steps = vec![
        Step::new(
            "Bitwarden CLI",
            "bw on PATH",
            StepTask::CheckTool {
                command: "bw".to_string(),
                required: true,
            },
        ),
        Step::new(
            "Session",
            "BW_SESSION exported",
            StepTask::CheckEnv {
                name: "BW_SESSION".to_string(),
                required: false,
            },
        ),
        Step::new("Sync vault", "bw sync", StepTask::BitwardenSync),
    ];
    StepSequence::new(steps, FailurePolicy::Continue)
}

pub fn bitwarden_setup(email: &str) -> StepSequence {
    let steps = vec![
        Step::new(
            "Validate e-mail",
            email.to_string(),
            StepTask::ValidateEmail {
                email: email.to_string(),
            },
        ),
        Step::new(
            "Bitwarden CLI",
            "bw on PATH",
            StepTask::CheckTool {
                command: "bw".to_string(),
                required: true,
            },
        ),
        Step::new("Login status", "bw status", StepTask::BitwardenStatus),
    ];
    StepSequence::new(steps, FailurePolicy::Halt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn install_policy_follows_config() {
        let mut config = AppConfig::default();
        assert_eq!(install(&config).policy(), FailurePolicy::Continue);
        config.install.halt_on_failure = true;
        let seq = install(&config);
        assert_eq!(seq.policy(), FailurePolicy::Halt);
        assert_eq!(seq.steps().len(), 7);
    }

    #[test]
    fn verify_checks_every_tool_then_every_path() {
        let config = AppConfig::default();
        let seq = verify(&config);
        assert_eq!(
            seq.steps().len(),
            config.tools.len() + config.verify.paths.len()
        );
        assert_eq!(seq.steps()[0].name, config.tools[0].name);
    }

    #[test]
    fn backup_directory_carries_the_timestamp() {
        let config = AppConfig::default();
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 0))
            .unwrap();
        let seq = backup(&config, Some(Path::new("/home/me")), now);
        assert_eq!(seq.policy(), FailurePolicy::Halt);
        assert_eq!(
            seq.steps()[1].task(),
            &StepTask::CreateBackupDir {
                dir: PathBuf::from("/home/me/.dotfiles-backup-2024-03-09_14-05-00")
            }
        );
    }

    #[test]
    fn removal_expects_the_tool_gone() {
        let tool = AppConfig::default().tools[0].clone();
        let seq = tool_operation(PackageOp::Remove, &tool);
        assert!(matches!(
            seq.steps()[2].task(),
            StepTask::VerifyTool {
                expect_installed: false,
                ..
            }
        ));
    }
}
