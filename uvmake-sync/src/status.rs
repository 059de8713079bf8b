//! Read-only staleness check. Never invokes `uv`.
//!
//! Signal precedence:
//! 1. `NeverConfigured` (no snapshot)
//! 2. `Stale` (a snapshot field differs from the current contributions)
//! 3. `Missing` (managed manifest absent)
//! 4. `Modified` (managed manifest hash differs from the snapshot)
//! 5. `Current`

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use uvmake_core::{ContributorSet, InitializationConfig};

use crate::error::SyncError;
use crate::snapshot;
use crate::writer;

/// Staleness classification for one configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Status {
    NeverConfigured,
    Stale { fields: Vec<String> },
    Missing { path: PathBuf },
    Modified { path: PathBuf },
    Current,
}

impl Status {
    /// Whether the next `configure` would regenerate.
    pub fn needs_configure(&self) -> bool {
        !matches!(self, Status::Current | Status::Modified { .. })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NeverConfigured => f.write_str("never configured"),
            Status::Stale { fields } => write!(f, "stale ({} changed)", fields.join(", ")),
            Status::Missing { path } => write!(f, "manifest missing: {}", path.display()),
            Status::Modified { path } => write!(f, "manifest modified: {}", path.display()),
            Status::Current => f.write_str("current"),
        }
    }
}

/// Compare `contributions` against the stored snapshot.
pub fn check(
    config: &InitializationConfig,
    contributions: &ContributorSet,
) -> Result<Status, SyncError> {
    let Some(previous) = snapshot::load_at(&config.state_dir)? else {
        return Ok(Status::NeverConfigured);
    };

    let fields = snapshot::current_fields(config, contributions)?;
    let changed = snapshot::changed_fields(&fields, Some(&previous));
    if !changed.is_empty() {
        return Ok(Status::Stale { fields: changed });
    }

    if !config.is_managed() {
        return Ok(Status::Current);
    }
    let path = config.manifest_path.clone();
    match writer::hash_file(&path)? {
        None => Ok(Status::Missing { path }),
        Some(hash) if previous.manifest_sha256.as_deref() != Some(hash.as_str()) => {
            Ok(Status::Modified { path })
        }
        Some(_) => Ok(Status::Current),
    }
}
