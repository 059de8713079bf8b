//! uvmake core library: initialization config, the contribution
//! accumulator, configuration-tree loading and errors.
//!
//! - [`config`]: [`InitOptions`], [`InitializationConfig`], [`ConfigCell`]
//! - [`types`]: [`ContributorSet`] and the [`Contributor`] registration handle
//! - [`contributor`]: `uvmake.yaml` loading and tree traversal
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod contributor;
pub mod error;
pub mod types;

pub use config::{ConfigCell, InitOptions, InitializationConfig, ManifestMode};
pub use contributor::ContributorFile;
pub use error::ConfigError;
pub use types::{Contributor, ContributorSet, DevDependency, ProjectRef};
