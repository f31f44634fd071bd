//! Library crate for student-records.
//!
//! This crate exposes the building blocks of the program:
//! - In-memory record store with id uniqueness and grade derivation (`store`)
//! - Line-oriented menu driver (`console`)
//! - TUI application state and update loop (`app`)
//! - Table filtering helpers (`search`)
//! - UI rendering and widgets (`ui`)
//! - Error and result types (`error`)
//!
//! It is used by the `student-records` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod app;
pub mod console;
pub mod error;
pub mod search;
pub mod store;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
pub use store::{StoreError, StudentRecord, StudentStore};
