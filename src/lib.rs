pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod system;
pub mod ui;

#[cfg(test)]
mod testing;
