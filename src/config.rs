use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::Result;

const CONFIG_DIR: &str = "dotfiles-tui";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logs: LogsConfig,
    pub notifications: NotificationsConfig,
    pub commands: CommandsConfig,
    pub editor: EditorConfig,
    pub backup: BackupConfig,
    pub install: InstallConfig,
    pub verify: VerifyConfig,
    /// Files offered by the configuration menu
    pub config_files: Vec<ConfigFileEntry>,
    /// Tools managed by the tools menu and checked by verification
    pub tools: Vec<ToolSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            logs: LogsConfig::default(),
            notifications: NotificationsConfig::default(),
            commands: CommandsConfig::default(),
            editor: EditorConfig::default(),
            backup: BackupConfig::default(),
            install: InstallConfig::default(),
            verify: VerifyConfig::default(),
            config_files: default_config_files(),
            tools: default_tools(),
        }
    }
}

impl AppConfig {
    /// Default location: `$XDG_CONFIG_HOME/dotfiles-tui/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => {
                info!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

/// Expand a leading `~` against `home`. Relative paths are taken from `home` too.
pub fn expand_path(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    if let Some(rest) = path.strip_prefix("~/") {
        return home.join(rest);
    }
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        home.join(path)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    /// Dry run mode - nothing is installed, written or deleted
    pub dryrun: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "Dotfiles Manager".to_string(),
            dryrun: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Number of log lines kept by a running operation
    pub capacity: usize,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self { capacity: 6 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub max_visible: usize,
    pub duration_ms: u64,
}

impl NotificationsConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            max_visible: 3,
            duration_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Upper bound for a single PATH lookup
    pub check_timeout_ms: u64,
    /// Command line run by the last install step
    pub verify_script: String,
    /// How long command lookups stay cached
    pub cache_ttl_secs: u64,
    /// How long file contents stay cached
    pub file_cache_ttl_secs: u64,
}

impl CommandsConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn file_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.file_cache_ttl_secs)
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            check_timeout_ms: 2000,
            verify_script: "./verify-installation.sh".to_string(),
            cache_ttl_secs: 300,
            file_cache_ttl_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Editors tried in order when `$EDITOR` is not usable
    pub candidates: Vec<String>,
    pub preview_lines: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            candidates: ["nvim", "vim", "nano", "code", "subl"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preview_lines: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Backup directories are named `<prefix>-YYYY-MM-DD_HH-MM-SS` inside HOME
    pub prefix: String,
    /// Home-relative paths copied into a backup
    pub files: Vec<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            prefix: ".dotfiles-backup".to_string(),
            files: [
                ".zshrc",
                ".gitconfig",
                ".aliases",
                ".tmux.conf",
                ".config/starship.toml",
                ".config/nvim",
                ".config/tmux",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Stop the install sequence at the first failed step
    pub halt_on_failure: bool,
    /// Packages installed by the "install tools" step
    pub packages: Vec<String>,
    /// Directories created by the "create directories" step
    pub directories: Vec<String>,
    /// Zsh plugins expected under Oh My Zsh's custom plugin directory
    pub zsh_plugins: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            halt_on_failure: false,
            packages: ["starship", "zsh", "neovim", "tmux", "fzf", "ripgrep"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            directories: ["~/dev", "~/dev/projects", "~/dev/tools", "~/.config"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            zsh_plugins: [
                "zsh-autosuggestions",
                "fast-syntax-highlighting",
                "zsh-completions",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    pub halt_on_failure: bool,
    /// Configuration paths checked after the tools
    pub paths: Vec<PathCheck>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        let check = |label: &str, path: &str, required: bool| PathCheck {
            label: label.to_string(),
            path: path.to_string(),
            required,
        };
        Self {
            halt_on_failure: false,
            paths: vec![
                check("Zsh configuration", "~/.zshrc", true),
                check("Git configuration", "~/.gitconfig", true),
                check("Starship configuration", "~/.config/starship.toml", true),
                check("Neovim configuration", "~/.config/nvim", true),
                check("tmux configuration", "~/.config/tmux", true),
                check("Oh My Zsh", "~/.oh-my-zsh", false),
                check("Zsh plugins", "~/.oh-my-zsh/custom/plugins", false),
            ],
        }
    }
}

/// A file or directory that verification expects to exist
#[derive(Debug, Clone, Deserialize)]
pub struct PathCheck {
    pub label: String,
    pub path: String,
    /// Missing required paths fail, others only warn
    #[serde(default)]
    pub required: bool,
}

/// A configuration file offered by the configuration menu
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFileEntry {
    pub label: String,
    pub path: String,
    #[serde(default)]
    pub description: String,
}

/// A command line tool known to the manager
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolSpec {
    /// Display name, also the default package name
    pub name: String,
    /// Executable looked up on PATH
    pub command: String,
    #[serde(default)]
    pub description: String,
    /// Missing required tools fail verification, optional ones warn
    #[serde(default)]
    pub required: bool,
    /// Package name when it differs from `name`
    #[serde(default)]
    pub package: Option<String>,
}

impl ToolSpec {
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.name)
    }
}

fn default_config_files() -> Vec<ConfigFileEntry> {
    let entry = |label: &str, path: &str, description: &str| ConfigFileEntry {
        label: label.to_string(),
        path: path.to_string(),
        description: description.to_string(),
    };
    vec![
        entry("Zsh", "~/.zshrc", "Shell configuration"),
        entry("Git", "~/.gitconfig", "User, aliases and diff settings"),
        entry("Starship", "~/.config/starship.toml", "Prompt layout and modules"),
        entry("Neovim", "~/.config/nvim/init.lua", "Editor entry point"),
        entry("tmux", "~/.config/tmux/tmux.conf", "Terminal multiplexer"),
        entry("Aliases", "~/.aliases", "Shell aliases"),
    ]
}

fn default_tools() -> Vec<ToolSpec> {
    let tool = |name: &str, command: &str, description: &str, required: bool| ToolSpec {
        name: name.to_string(),
        command: command.to_string(),
        description: description.to_string(),
        required,
        package: None,
    };
    vec![
        tool("chezmoi", "chezmoi", "Dotfiles manager", true),
        tool("starship", "starship", "Cross-shell prompt", true),
        tool("zsh", "zsh", "Shell", true),
        tool("neovim", "nvim", "Editor", true),
        tool("tmux", "tmux", "Terminal multiplexer", true),
        tool("git", "git", "Version control", true),
        tool("fzf", "fzf", "Fuzzy finder", false),
        tool("ripgrep", "rg", "Fast grep", false),
        tool("fd", "fd", "Friendly find", false),
        tool("bat", "bat", "Cat with highlighting", false),
        tool("eza", "eza", "Modern ls", false),
        tool("lazygit", "lazygit", "Git interface", false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.logs.capacity, 6);
        assert_eq!(config.notifications.max_visible, 3);
        assert_eq!(config.commands.check_timeout(), Duration::from_secs(2));
        assert_eq!(config.tools.len(), 12);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[logs]\ncapacity = 10\n\n[install]\nhalt_on_failure = true\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.logs.capacity, 10);
        assert!(config.install.halt_on_failure);
        assert_eq!(config.install.packages.len(), 6);
        assert_eq!(config.backup.prefix, ".dotfiles-backup");
    }

    #[test]
    fn custom_tools_replace_the_default_list() {
        let toml = r#"
            [[tools]]
            name = "ripgrep"
            command = "rg"
            package = "rg-bin"
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.tools.len(), 1);
        assert_eq!(config.tools[0].package_name(), "rg-bin");
        assert!(!config.tools[0].required);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logs\ncapacity = ").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn expand_path_handles_tilde_and_relative() {
        let home = Path::new("/home/me");
        assert_eq!(expand_path("~", home), PathBuf::from("/home/me"));
        assert_eq!(expand_path("~/.zshrc", home), PathBuf::from("/home/me/.zshrc"));
        assert_eq!(expand_path(".aliases", home), PathBuf::from("/home/me/.aliases"));
        assert_eq!(expand_path("/etc/zshrc", home), PathBuf::from("/etc/zshrc"));
    }
}
