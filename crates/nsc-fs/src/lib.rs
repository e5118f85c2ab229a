//! Filesystem layer for NSC file synchronization
//!
//! Provides atomic writes, timestamp stamping, archive moves, an advisory
//! run lock, and layered YAML configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod lock;

pub use config::{ConfigStore, merge_values};
pub use error::{Error, Result};
pub use lock::{LOCK_FILE_NAME, RunLock};
