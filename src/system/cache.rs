use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::backup::{BackupEntry, CopyReport};
use super::executor::{PackageManager, PackageOp, SystemInfo};
use super::service::{ServiceOp, SystemService};
use crate::error::Result;

/// Map whose entries expire `ttl` after insertion
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        self.entries
            .get(key)
            .filter(|(stored, _)| now.saturating_duration_since(*stored) < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (now, value));
    }

    pub fn remove(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, (stored, _)| now.saturating_duration_since(*stored) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memoizes slow lookups of another service. Handed to whoever needs it
/// through the application context.
pub struct CachedService {
    inner: Arc<dyn SystemService>,
    commands: Mutex<TtlCache<String, bool>>,
    package_manager: Mutex<TtlCache<(), Option<PackageManager>>>,
    files: Mutex<TtlCache<PathBuf, Option<String>>>,
}

impl CachedService {
    pub fn new(inner: Arc<dyn SystemService>, ttl: Duration, file_ttl: Duration) -> Self {
        Self {
            inner,
            commands: Mutex::new(TtlCache::new(ttl)),
            package_manager: Mutex::new(TtlCache::new(ttl)),
            files: Mutex::new(TtlCache::new(file_ttl)),
        }
    }

    /// Entry counts for the command and file caches
    #[cfg(test)]
    pub fn stats(&self) -> (usize, usize) {
        let now = Instant::now();
        let mut commands = self.commands.lock();
        commands.purge_expired(now);
        let mut files = self.files.lock();
        files.purge_expired(now);
        (commands.len(), files.len())
    }
}

impl SystemService for CachedService {
    fn command_exists(&self, command: &str) -> bool {
        let key = command.to_string();
        if let Some(found) = self.commands.lock().get(&key) {
            return found;
        }
        // Lookup runs unlocked; it can take up to the command timeout
        let found = self.inner.command_exists(command);
        self.commands.lock().insert(key, found);
        found
    }

    fn package_manager(&self) -> Option<PackageManager> {
        if let Some(pm) = self.package_manager.lock().get(&()) {
            return pm;
        }
        let pm = self.inner.package_manager();
        self.package_manager.lock().insert((), pm);
        pm
    }

    fn system_info(&self, home: Option<&Path>) -> SystemInfo {
        self.inner.system_info(home)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        self.inner.env_var(name)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.inner.path_exists(path)
    }

    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        let key = path.to_path_buf();
        if let Some(content) = self.files.lock().get(&key) {
            debug!("File cache hit for {:?}", path);
            return Ok(content);
        }
        let content = self.inner.read_file(path)?;
        self.files.lock().insert(key, content.clone());
        Ok(content)
    }

    fn list_backups(&self, home: &Path, prefix: &str) -> Result<Vec<BackupEntry>> {
        self.inner.list_backups(home, prefix)
    }

    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        self.inner.run(program, args)
    }

    fn package(&self, manager: PackageManager, op: PackageOp, package: &str) -> Result<String> {
        self.inner.package(manager, op, package)
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.files.lock().remove(&path.to_path_buf());
        self.inner.write_file(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.create_dir_all(path)
    }

    fn copy_path(&self, from: &Path, to: &Path) -> Result<CopyReport> {
        self.inner.copy_path(from, to)
    }

    fn restore_backup(&self, backup: &Path, home: &Path) -> Result<CopyReport> {
        // Restored files replace whatever was cached
        self.files.lock().clear();
        self.inner.restore_backup(backup, home)
    }

    fn delete_backup(&self, backup: &Path) -> Result<()> {
        self.inner.delete_backup(backup)
    }

    fn invalidate_cache(&self) {
        debug!("Invalidating command and file caches");
        self.commands.lock().clear();
        self.package_manager.lock().clear();
        self.files.lock().clear();
        self.inner.invalidate_cache();
    }

    fn forget_file(&self, path: &Path) {
        debug!("Forgetting cached content of {:?}", path);
        self.files.lock().remove(&path.to_path_buf());
        self.inner.forget_file(path);
    }

    fn is_dryrun(&self) -> bool {
        self.inner.is_dryrun()
    }

    fn command_string(&self, op: &ServiceOp) -> String {
        self.inner.command_string(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeService;

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(120));
        let t0 = Instant::now();
        cache.insert_at("zshrc", 1, t0);

        assert_eq!(cache.get_at(&"zshrc", t0 + Duration::from_secs(60)), Some(1));
        assert_eq!(cache.get_at(&"zshrc", t0 + Duration::from_secs(120)), None);

        cache.purge_expired(t0 + Duration::from_secs(121));
        assert!(cache.is_empty());
    }

    #[test]
    fn command_lookups_hit_the_inner_service_once() {
        let fake = Arc::new(FakeService::with_commands(&["chezmoi"]));
        let cached = CachedService::new(fake.clone(), Duration::from_secs(300), Duration::from_secs(120));

        assert!(cached.command_exists("chezmoi"));
        assert!(cached.command_exists("chezmoi"));
        assert!(!cached.command_exists("starship"));
        assert_eq!(fake.lookups(), vec!["chezmoi", "starship"]);

        cached.invalidate_cache();
        assert!(cached.command_exists("chezmoi"));
        assert_eq!(fake.lookups().len(), 3);
    }

    #[test]
    fn writes_invalidate_the_cached_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".aliases");
        let cached = CachedService::new(
            Arc::new(FakeService::default()),
            Duration::from_secs(300),
            Duration::from_secs(120),
        );

        assert_eq!(cached.read_file(&path).unwrap(), None);
        cached.write_file(&path, "alias g=git").unwrap();
        assert_eq!(cached.read_file(&path).unwrap().as_deref(), Some("alias g=git"));
        assert_eq!(cached.stats().1, 1);
    }
}
