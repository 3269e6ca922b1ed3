//! CLI command handlers. Each command is in its own file.

mod config;
mod schedule;
mod todo;

pub use config::run_config;
pub use schedule::run_schedule;
pub use todo::run_todo;

#[cfg(test)]
pub(crate) use schedule::schedule_lines;
