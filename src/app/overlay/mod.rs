mod help;
mod notifications;

pub use help::{ShortcutGroup, WithHelp};
pub use notifications::{Level, Notification, NotificationCenter, WithNotifications};
