use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::backup::{self, BackupEntry, CopyReport};
use super::executor::{self, PackageManager, PackageOp, SystemInfo};
use crate::error::{DotfilesError, Result};

/// Describes a service operation for command string display
#[derive(Debug, Clone)]
pub enum ServiceOp {
    Run {
        program: String,
        args: Vec<String>,
    },
    Package {
        manager: PackageManager,
        op: PackageOp,
        package: String,
    },
}

/// Trait abstracting every side effect the menus trigger
pub trait SystemService: Send + Sync {
    // Query methods
    fn command_exists(&self, command: &str) -> bool;
    fn package_manager(&self) -> Option<PackageManager>;
    fn system_info(&self, home: Option<&Path>) -> SystemInfo;
    fn env_var(&self, name: &str) -> Option<String>;
    fn path_exists(&self, path: &Path) -> bool;
    /// `Ok(None)` when the file does not exist
    fn read_file(&self, path: &Path) -> Result<Option<String>>;
    fn list_backups(&self, home: &Path, prefix: &str) -> Result<Vec<BackupEntry>>;

    // Mutating methods
    fn run(&self, program: &str, args: &[String]) -> Result<String>;
    fn package(&self, manager: PackageManager, op: PackageOp, package: &str) -> Result<String>;
    fn write_file(&self, path: &Path, content: &str) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Copy a file or tree. Entries that fail are listed in the report.
    fn copy_path(&self, from: &Path, to: &Path) -> Result<CopyReport>;
    fn restore_backup(&self, backup: &Path, home: &Path) -> Result<CopyReport>;
    fn delete_backup(&self, backup: &Path) -> Result<()>;

    /// Drop memoized lookups after something was installed or removed
    fn invalidate_cache(&self) {}

    /// Drop any memoized content of `path`
    fn forget_file(&self, _path: &Path) {}

    fn is_dryrun(&self) -> bool;

    // Command description for display
    fn command_string(&self, op: &ServiceOp) -> String {
        format_command_string(op)
    }
}

/// Format the command string for a given operation
pub fn format_command_string(op: &ServiceOp) -> String {
    match op {
        ServiceOp::Run { program, args } => executor::format_argv(program, args),
        ServiceOp::Package {
            manager,
            op,
            package,
        } => {
            let argv = manager.invocation(*op, package);
            match argv.split_first() {
                Some((program, args)) => executor::format_argv(program, args),
                None => String::new(),
            }
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Live service that executes real system commands
pub struct LiveService {
    timeout: Duration,
}

impl LiveService {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl SystemService for LiveService {
    fn command_exists(&self, command: &str) -> bool {
        executor::command_exists(command, self.timeout)
    }

    fn package_manager(&self) -> Option<PackageManager> {
        executor::detect_package_manager(self.timeout)
    }

    fn system_info(&self, home: Option<&Path>) -> SystemInfo {
        executor::system_info(home)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        executor::env_var(name)
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        read_optional(path)
    }

    fn list_backups(&self, home: &Path, prefix: &str) -> Result<Vec<BackupEntry>> {
        backup::list_backups(home, prefix)
    }

    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        executor::run_command(program, args)
    }

    fn package(&self, manager: PackageManager, op: PackageOp, package: &str) -> Result<String> {
        let argv = manager.invocation(op, package);
        let (program, args) = argv
            .split_first()
            .ok_or(DotfilesError::NoPackageManager)?;
        executor::run_command(program, args)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn copy_path(&self, from: &Path, to: &Path) -> Result<CopyReport> {
        Ok(backup::copy_recursive(from, to))
    }

    fn restore_backup(&self, backup: &Path, home: &Path) -> Result<CopyReport> {
        backup::restore_backup(backup, home)
    }

    fn delete_backup(&self, backup: &Path) -> Result<()> {
        backup::delete_backup(backup)
    }

    fn is_dryrun(&self) -> bool {
        false
    }
}

/// Dryrun service that reads the real system but never changes it
pub struct DryrunService {
    timeout: Duration,
}

impl DryrunService {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl SystemService for DryrunService {
    fn command_exists(&self, command: &str) -> bool {
        executor::command_exists(command, self.timeout)
    }

    fn package_manager(&self) -> Option<PackageManager> {
        executor::detect_package_manager(self.timeout)
    }

    fn system_info(&self, home: Option<&Path>) -> SystemInfo {
        executor::system_info(home)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        executor::env_var(name)
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        read_optional(path)
    }

    fn list_backups(&self, home: &Path, prefix: &str) -> Result<Vec<BackupEntry>> {
        backup::list_backups(home, prefix)
    }

    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        let op = ServiceOp::Run {
            program: program.to_string(),
            args: args.to_vec(),
        };
        Ok(format!("(dryrun) {}", self.command_string(&op)))
    }

    fn package(&self, manager: PackageManager, op: PackageOp, package: &str) -> Result<String> {
        let op = ServiceOp::Package {
            manager,
            op,
            package: package.to_string(),
        };
        Ok(format!("(dryrun) {}", self.command_string(&op)))
    }

    fn write_file(&self, _path: &Path, _content: &str) -> Result<()> {
        Ok(())
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn copy_path(&self, from: &Path, _to: &Path) -> Result<CopyReport> {
        Ok(CopyReport {
            copied: backup::count_files(from),
            failed: Vec::new(),
        })
    }

    fn restore_backup(&self, backup: &Path, _home: &Path) -> Result<CopyReport> {
        Ok(CopyReport {
            copied: backup::count_files(backup),
            failed: Vec::new(),
        })
    }

    fn delete_backup(&self, _backup: &Path) -> Result<()> {
        Ok(())
    }

    fn is_dryrun(&self) -> bool {
        true
    }
}

/// Create the appropriate service based on dryrun mode
pub fn create_service(dryrun: bool, timeout: Duration) -> Arc<dyn SystemService> {
    if dryrun {
        Arc::new(DryrunService::new(timeout))
    } else {
        Arc::new(LiveService::new(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dryrun_never_touches_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let service = create_service(true, Duration::from_secs(1));
        let target = dir.path().join("sub/file.txt");

        service.write_file(&target, "content").unwrap();
        service.create_dir_all(&dir.path().join("made")).unwrap();

        assert!(!target.exists());
        assert!(!dir.path().join("made").exists());
        assert!(service.is_dryrun());
        let marker = dir.path().join("marker");
        let output = service
            .run("touch", &[marker.display().to_string()])
            .unwrap();
        assert!(output.starts_with("(dryrun) touch"));
        assert!(!marker.exists());
    }

    #[test]
    fn live_read_distinguishes_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let service = create_service(false, Duration::from_secs(1));
        let path = dir.path().join("nested/.zshrc");

        assert_eq!(service.read_file(&path).unwrap(), None);
        service.write_file(&path, "alias ll='ls -l'").unwrap();
        assert_eq!(
            service.read_file(&path).unwrap().as_deref(),
            Some("alias ll='ls -l'")
        );
    }

    #[test]
    fn package_command_strings_show_the_full_invocation() {
        let op = ServiceOp::Package {
            manager: PackageManager::Pacman,
            op: PackageOp::Install,
            package: "fzf".to_string(),
        };
        assert_eq!(
            format_command_string(&op),
            "sudo -n pacman -S --noconfirm --needed fzf"
        );
    }
}
