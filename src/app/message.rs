use crossterm::event::KeyEvent;
use std::path::PathBuf;
use std::time::Duration;

use super::jobs::{Job, JobMessage};
use super::overlay::Level;

/// Input delivered to the active screen
#[derive(Debug, Clone)]
pub enum Msg {
    Key(KeyEvent),
    Tick,
    Resize(u16, u16),
    Job(JobMessage),
    NotificationExpired(u64),
}

/// Side effects a screen asks for; the app turns them into runtime commands
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Spawn(Job),
    Notify {
        level: Level,
        title: String,
        message: String,
    },
    /// Deliver `Msg::NotificationExpired(id)` after `after`
    ScheduleExpiry { id: u64, after: Duration },
    LaunchEditor(PathBuf),
    Quit,
}

impl Effect {
    pub fn notify(level: Level, title: impl Into<String>, message: impl Into<String>) -> Self {
        Effect::Notify {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}
