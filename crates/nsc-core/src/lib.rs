//! Incremental sync engine for NSC file exchange
//!
//! This crate implements:
//!
//! - **Watermark**: the high-water mark of remote modification times already
//!   processed, persisted as the mtime of a marker file
//! - **Naming**: decomposition of NSC filenames into fields and templated
//!   local name synthesis
//! - **Rules**: an ordered catalog of rename rules, first match wins
//! - **Audit log**: append-only CSV history of downloads, imports and uploads
//! - **Sync**: the receive and send runs that tie it together
//!
//! # Architecture
//!
//! ```text
//!                        nsc-cli
//!                           |
//!                       nsc-core
//!                           |
//!  +--------+--------+------+-----+--------+---------+
//!  |        |        |            |        |         |
//! config  naming   rules       remote    audit    import
//!                           |
//!                        nsc-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nsc_core::{ConfigResolver, DirectoryConnector, MarkerFile, ReceiveEngine, RuleCatalog};
//!
//! fn receive(start: &std::path::Path) -> nsc_core::Result<()> {
//!     let config = ConfigResolver::new(start).resolve()?;
//!     let catalog = RuleCatalog::from_mapping(&config.nsc.rename)?;
//!     let mut marker = MarkerFile::in_dir(&config.nsc.local.receive_path);
//!     let report = ReceiveEngine::new(&config.nsc, &catalog)
//!         .run(&DirectoryConnector::new(), &mut marker)?;
//!     println!("{} downloaded", report.count(nsc_core::FileStatus::Downloaded));
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod import;
pub mod naming;
pub mod remote;
pub mod rules;
pub mod sync;
pub mod watermark;

pub use audit::{AuditLog, AuditRecord, AuditStatus, Direction};
pub use config::{Config, ConfigResolver, NscConfig, ROOT_MARKER};
pub use error::{Error, Result};
pub use import::{CommandImporter, ImportDispatcher, ImportOutcome, ImportRequest};
pub use naming::{DecomposedName, FieldSet, decompose};
pub use remote::{Connector, DirectoryConnector, RemoteEntry, RemoteSession};
pub use rules::{RenameRule, Resolution, RuleCatalog};
pub use sync::{
    FileOutcome, FileStatus, ImportStatus, ReceiveEngine, ReceiveReport, SendEngine, SendReport,
    SyncOptions, UploadOutcome, UploadStatus,
};
pub use watermark::{MARKER_FILE_NAME, MarkerFile, WatermarkStore};
