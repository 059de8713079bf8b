//! Tera rendering engine for the workspace manifest.
//!
//! Section order is fixed by the template: project metadata, dependencies,
//! build backend, wheel target, workspace sources, workspace members. String
//! values go through `json_encode`, whose escapes are a subset of TOML
//! basic-string escapes.

use tera::Tera;

use crate::context::ManifestContext;
use crate::error::RenderError;

const MANIFEST_TEMPLATE: &str = "pyproject.toml.tera";

// Embedded at compile time via include_str!.
const TPLS: &[(&str, &str)] = &[(
    MANIFEST_TEMPLATE,
    include_str!("templates/pyproject.toml.tera"),
)];

/// Tera-based manifest renderer. Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Construct a new [`Renderer`] with the embedded template.
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TPLS.iter().copied())?;
        Ok(Renderer { tera })
    }

    /// Render the manifest. Output depends only on `ctx` and always uses LF
    /// line endings.
    pub fn render(&self, ctx: &ManifestContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(MANIFEST_TEMPLATE, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
