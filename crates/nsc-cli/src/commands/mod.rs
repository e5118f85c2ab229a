//! Command implementations for nsc-cli

pub mod config;
pub mod log;
pub mod receive;
pub mod resolve;
pub mod send;

pub use config::run_config_show;
pub use log::run_log;
pub use receive::run_receive;
pub use resolve::run_resolve;
pub use send::run_send;
