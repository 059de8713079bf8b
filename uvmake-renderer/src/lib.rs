//! # uvmake-renderer
//!
//! Tera-based renderer for the generated workspace manifest.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use uvmake_renderer::{ManifestContext, MemberCtx, Renderer};
//!
//! fn render() -> Result<String, uvmake_renderer::RenderError> {
//!     let ctx = ManifestContext::new(
//!         "demo",
//!         "0.1.0",
//!         ">=3.12",
//!         vec![MemberCtx::new("a", Path::new("/repo/a"), Path::new("/repo"))],
//!     );
//!     Renderer::new()?.render(&ctx)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{module_name, ManifestContext, MemberCtx};
pub use engine::Renderer;
pub use error::RenderError;
