pub mod client;
pub mod config;
pub mod control;
pub mod logging;
pub mod retry;
