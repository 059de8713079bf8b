//! # uvmake-sync
//!
//! Deferred finalization of a configuration pass: snapshot-gated manifest
//! regeneration, dev-dependency registration and environment sync, all by
//! shelling out to `uv`.
//!
//! Collect contributions with [`pipeline::collect_at`] (or build a
//! [`Session`] by hand), then call [`Session::finalize`] exactly once.

pub mod error;
pub mod install;
pub mod manifest;
pub mod pipeline;
pub mod process;
pub mod snapshot;
pub mod status;
pub mod uv;
pub mod writer;

pub use error::{SyncError, ToolError};
pub use pipeline::{FinalizeReport, Session};
pub use process::{Runner, Step, SystemRunner, ToolCommand, ToolOutput};
pub use status::Status;
pub use uv::{ProjectIdentity, Uv};
pub use writer::WriteResult;
