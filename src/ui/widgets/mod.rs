mod confirm;
mod form;
mod header;
mod help;
mod menu;
mod notifications;
mod status_bar;
mod steps;

pub use confirm::draw_confirm_dialog;
pub use form::draw_input_form;
pub use header::draw_header;
pub use help::draw_help;
pub use menu::{draw_details, draw_entries, draw_search_bar};
pub use notifications::draw_notifications;
pub use status_bar::{draw_status_bar, StatusBarState};
pub use steps::{draw_logs, draw_steps, draw_summary, spinner_char, verdict_text};
