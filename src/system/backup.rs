use chrono::NaiveDateTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A backup directory found in HOME
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    /// None when the suffix is not a timestamp we wrote
    pub created: Option<NaiveDateTime>,
}

pub fn backup_dir_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{}-{}", prefix, at.format(TIMESTAMP_FORMAT))
}

/// Returns None when `name` does not follow the `<prefix>-*` convention
pub fn parse_backup_name(name: &str, prefix: &str) -> Option<Option<NaiveDateTime>> {
    let suffix = name.strip_prefix(prefix)?.strip_prefix('-')?;
    Some(NaiveDateTime::parse_from_str(suffix, TIMESTAMP_FORMAT).ok())
}

/// Backups in `home`, newest first. A missing directory lists as empty.
pub fn list_backups(home: &Path, prefix: &str) -> Result<Vec<BackupEntry>> {
    let read_dir = match fs::read_dir(home) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut backups = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(created) = parse_backup_name(&name, prefix) else {
            continue;
        };
        if !entry.path().is_dir() {
            continue;
        }
        backups.push(BackupEntry {
            name,
            path: entry.path(),
            created,
        });
    }

    backups.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
    debug!("Found {} backups in {:?}", backups.len(), home);
    Ok(backups)
}

/// Result of copying a tree: files written plus the entries that failed.
/// One bad entry never stops the rest of the copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub copied: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl CopyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: CopyReport) {
        self.copied += other.copied;
        self.failed.extend(other.failed);
    }

    fn fail(&mut self, path: &Path, error: io::Error) {
        warn!("Could not copy {:?}: {}", path, error);
        self.failed.push((path.to_path_buf(), error.to_string()));
    }

    pub fn summary(&self) -> String {
        format!("{} copied, {} failed", self.copied, self.failed.len())
    }
}

/// Copy a file or directory tree to `to`. Symlinks are recreated, never
/// followed, so dangling links copy like any other entry.
pub fn copy_recursive(from: &Path, to: &Path) -> CopyReport {
    let mut report = CopyReport::default();
    copy_entry(from, to, &mut report);
    report
}

fn copy_entry(from: &Path, to: &Path, report: &mut CopyReport) {
    let meta = match fs::symlink_metadata(from) {
        Ok(meta) => meta,
        Err(e) => return report.fail(from, e),
    };

    if meta.is_dir() {
        if let Err(e) = fs::create_dir_all(to) {
            return report.fail(from, e);
        }
        let read_dir = match fs::read_dir(from) {
            Ok(rd) => rd,
            Err(e) => return report.fail(from, e),
        };
        for entry in read_dir {
            match entry {
                Ok(entry) => copy_entry(&entry.path(), &to.join(entry.file_name()), report),
                Err(e) => report.fail(from, e),
            }
        }
        return;
    }

    let result = prepare_parent(to).and_then(|()| {
        if meta.file_type().is_symlink() {
            copy_symlink(from, to)
        } else {
            fs::copy(from, to).map(|_| ())
        }
    });
    match result {
        Ok(()) => report.copied += 1,
        Err(e) => report.fail(from, e),
    }
}

fn prepare_parent(to: &Path) -> io::Result<()> {
    match to.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    if fs::symlink_metadata(to).is_ok_and(|m| !m.is_dir()) {
        fs::remove_file(to)?;
    }
    std::os::unix::fs::symlink(target, to)
}

/// Number of files `copy_recursive` would write
pub fn count_files(path: &Path) -> usize {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::read_dir(path)
            .map(|rd| rd.flatten().map(|e| count_files(&e.path())).sum())
            .unwrap_or(0),
        Ok(_) => 1,
        Err(_) => 0,
    }
}

/// Copy every entry of `backup` back into `home`, overwriting existing files.
/// Only an unreadable backup directory is an error; per-file failures land
/// in the report.
pub fn restore_backup(backup: &Path, home: &Path) -> Result<CopyReport> {
    info!("Restoring {:?} into {:?}", backup, home);
    let mut report = CopyReport::default();
    for entry in fs::read_dir(backup)? {
        match entry {
            Ok(entry) => report.merge(copy_recursive(&entry.path(), &home.join(entry.file_name()))),
            Err(e) => report.fail(backup, e),
        }
    }
    info!("Restore finished: {}", report.summary());
    Ok(report)
}

pub fn delete_backup(backup: &Path) -> Result<()> {
    info!("Deleting backup {:?}", backup);
    fs::remove_dir_all(backup)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn names_round_trip_through_the_timestamp_format() {
        let name = backup_dir_name(".dotfiles-backup", at(8, 5, 1));
        assert_eq!(name, ".dotfiles-backup-2024-03-09_08-05-01");
        assert_eq!(
            parse_backup_name(&name, ".dotfiles-backup"),
            Some(Some(at(8, 5, 1)))
        );
        assert_eq!(parse_backup_name(".dotfiles-backup-manual", ".dotfiles-backup"), Some(None));
        assert_eq!(parse_backup_name(".dotfiles", ".dotfiles-backup"), None);
    }

    #[test]
    fn empty_home_lists_nothing() {
        let home = tempfile::tempdir().unwrap();
        assert!(list_backups(home.path(), ".dotfiles-backup").unwrap().is_empty());
        assert!(list_backups(&home.path().join("gone"), ".dotfiles-backup").unwrap().is_empty());
    }

    #[test]
    fn listing_is_newest_first_and_ignores_other_entries() {
        let home = tempfile::tempdir().unwrap();
        for name in [
            ".dotfiles-backup-2024-03-09_08-05-01",
            ".dotfiles-backup-2024-03-10_08-05-01",
            ".config",
        ] {
            fs::create_dir(home.path().join(name)).unwrap();
        }
        fs::write(home.path().join(".dotfiles-backup-2024-03-11_00-00-00"), "file").unwrap();

        let backups = list_backups(home.path(), ".dotfiles-backup").unwrap();
        let names: Vec<_> = backups.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                ".dotfiles-backup-2024-03-10_08-05-01",
                ".dotfiles-backup-2024-03-09_08-05-01",
            ]
        );
    }

    #[test]
    fn copy_restore_and_delete() {
        let home = tempfile::tempdir().unwrap();
        let nvim = home.path().join(".config/nvim/lua");
        fs::create_dir_all(&nvim).unwrap();
        fs::write(nvim.join("init.lua"), "-- lua").unwrap();
        fs::write(home.path().join(".zshrc"), "export A=1").unwrap();

        let backup = home.path().join(".dotfiles-backup-2024-03-09_08-05-01");
        assert_eq!(copy_recursive(&home.path().join(".zshrc"), &backup.join(".zshrc")).copied, 1);
        let nvim = copy_recursive(&home.path().join(".config/nvim"), &backup.join(".config/nvim"));
        assert_eq!(nvim, CopyReport { copied: 1, failed: Vec::new() });
        assert_eq!(count_files(&backup), 2);

        fs::write(home.path().join(".zshrc"), "broken").unwrap();
        let restored = restore_backup(&backup, home.path()).unwrap();
        assert_eq!(restored.copied, 2);
        assert!(restored.is_clean());
        assert_eq!(fs::read_to_string(home.path().join(".zshrc")).unwrap(), "export A=1");

        delete_backup(&backup).unwrap();
        assert!(!backup.exists());
    }

    #[test]
    fn dangling_symlinks_are_copied_as_links() {
        let home = tempfile::tempdir().unwrap();
        let nvim = home.path().join(".config/nvim");
        fs::create_dir_all(&nvim).unwrap();
        std::os::unix::fs::symlink("/nonexistent/plugin", nvim.join("dangling")).unwrap();
        fs::write(nvim.join("init.lua"), "-- lua").unwrap();

        let backup = home.path().join("backup");
        let report = copy_recursive(&nvim, &backup.join(".config/nvim"));
        assert!(report.is_clean());
        assert_eq!(report.copied, 2);
        assert_eq!(count_files(&nvim), 2);
        assert_eq!(
            fs::read_link(backup.join(".config/nvim/dangling")).unwrap(),
            PathBuf::from("/nonexistent/plugin")
        );
        assert!(backup.join(".config/nvim/init.lua").is_file());

        // Restoring over an existing link replaces it
        let restored = restore_backup(&backup, home.path()).unwrap();
        assert!(restored.is_clean());
        assert_eq!(restored.copied, 2);
    }

    #[test]
    fn restore_keeps_going_past_a_failed_entry() {
        let home = tempfile::tempdir().unwrap();
        let backup = home.path().join("backup");
        fs::create_dir_all(backup.join(".config/nvim")).unwrap();
        fs::write(backup.join(".config/nvim/init.lua"), "saved").unwrap();
        fs::write(backup.join(".zshrc"), "export A=1").unwrap();
        // A plain file where a directory has to go
        fs::write(home.path().join(".config"), "not a directory").unwrap();

        let report = restore_backup(&backup, home.path()).unwrap();
        assert_eq!(report.copied, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, backup.join(".config"));
        assert_eq!(report.summary(), "1 copied, 1 failed");
        assert_eq!(fs::read_to_string(home.path().join(".zshrc")).unwrap(), "export A=1");
    }
}
