use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DotfilesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("HOME is not set")]
    HomeNotFound,

    #[error("No editor available (tried: {0})")]
    NoEditor(String),

    #[error("No supported package manager found")]
    NoPackageManager,

    #[error("{command} did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

pub type Result<T> = std::result::Result<T, DotfilesError>;
