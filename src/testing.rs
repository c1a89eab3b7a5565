//! In-memory service used by unit tests.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::Context;
use crate::config::AppConfig;
use crate::error::{DotfilesError, Result};
use crate::system::{backup, BackupEntry, CopyReport, PackageManager, PackageOp, SystemInfo, SystemService};

/// Answers lookups from a fixed table; filesystem calls hit the real
/// (temporary) filesystem.
#[derive(Default)]
pub struct FakeService {
    pub commands: HashSet<String>,
    pub env: HashMap<String, String>,
    pub manager: Option<PackageManager>,
    pub failing_programs: HashSet<String>,
    lookups: Mutex<Vec<String>>,
    runs: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn with_commands(commands: &[&str]) -> Self {
        Self {
            commands: commands.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().clone()
    }
}

impl SystemService for FakeService {
    fn command_exists(&self, command: &str) -> bool {
        self.lookups.lock().push(command.to_string());
        self.commands.contains(command)
    }

    fn package_manager(&self) -> Option<PackageManager> {
        self.manager
    }

    fn system_info(&self, home: Option<&Path>) -> SystemInfo {
        SystemInfo {
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
            hostname: "testbox".to_string(),
            shell: self.env.get("SHELL").cloned().unwrap_or_else(|| "unknown".to_string()),
            home: home
                .map(|h| h.display().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            user: self.env.get("USER").cloned().unwrap_or_else(|| "unknown".to_string()),
        }
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_backups(&self, home: &Path, prefix: &str) -> Result<Vec<BackupEntry>> {
        backup::list_backups(home, prefix)
    }

    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        self.runs.lock().push(format!("{} {}", program, args.join(" ")).trim().to_string());
        if self.failing_programs.contains(program) {
            Err(DotfilesError::Command(format!("{} failed", program)))
        } else {
            Ok(format!("{} ok", program))
        }
    }

    fn package(&self, manager: PackageManager, op: PackageOp, package: &str) -> Result<String> {
        let argv = manager.invocation(op, package);
        self.runs.lock().push(argv.join(" "));
        if self.failing_programs.contains(package) {
            Err(DotfilesError::Command(format!("{} failed", package)))
        } else {
            Ok(String::new())
        }
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
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

pub fn context_with(service: FakeService, home: Option<PathBuf>) -> Context {
    Context::new(AppConfig::default(), Arc::new(service), home)
}
