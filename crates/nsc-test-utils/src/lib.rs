//! Shared test utilities for the nsc workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`site`]: [`site::TestSite`] builder laying out a root directory, an
//!   endpoint mirror, local directories and configuration

pub mod site;

pub use site::TestSite;
