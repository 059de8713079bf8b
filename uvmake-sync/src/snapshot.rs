//! Previous-run snapshot for change detection across configuration passes.
//!
//! Persists a [`Snapshot`] JSON document at `<state_dir>/snapshot.json`.
//! Writes use the atomic `.tmp` + rename pattern.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use uvmake_core::{ContributorSet, InitializationConfig, ManifestMode};

use crate::error::{io_err, SyncError};

/// Snapshot key for the serialized workspace settings.
pub const WORKSPACE: &str = "workspace";

const SNAPSHOT_FILE: &str = "snapshot.json";

/// On-disk snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub configured_at: DateTime<Utc>,
    /// Field name -> canonical serialized form.
    pub fields: BTreeMap<String, String>,
    /// SHA-256 of the managed manifest as the last regeneration left it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_sha256: Option<String>,
}

#[derive(Serialize)]
struct WorkspaceFingerprint<'a> {
    package_name: &'a str,
    package_version: &'a str,
    python: &'a str,
    manifest_path: &'a Path,
    mode: ManifestMode,
}

/// Every field compared between passes: the two contribution fields plus
/// the workspace settings that shape the generated manifest.
pub fn current_fields(
    config: &InitializationConfig,
    contributions: &ContributorSet,
) -> Result<BTreeMap<String, String>, SyncError> {
    let mut fields = contributions.serialized_fields()?;
    let fingerprint = WorkspaceFingerprint {
        package_name: &config.package_name,
        package_version: &config.package_version,
        python: &config.python,
        manifest_path: &config.manifest_path,
        mode: config.mode,
    };
    fields.insert(WORKSPACE.to_owned(), serde_json::to_string(&fingerprint)?);
    Ok(fields)
}

/// Names of the fields that differ from `previous`, in key order.
/// Every field counts as changed when there is no previous snapshot.
pub fn changed_fields(current: &BTreeMap<String, String>, previous: Option<&Snapshot>) -> Vec<String> {
    current
        .iter()
        .filter(|(key, value)| previous.and_then(|p| p.fields.get(*key)) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// `<state_dir>/snapshot.json`
pub fn snapshot_path_at(state_dir: &Path) -> PathBuf {
    state_dir.join(SNAPSHOT_FILE)
}

/// Load the snapshot, or `None` if no pass has completed yet.
pub fn load_at(state_dir: &Path) -> Result<Option<Snapshot>, SyncError> {
    let path = snapshot_path_at(state_dir);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save the snapshot atomically (`<path>.tmp` then rename).
pub fn save_at(state_dir: &Path, snapshot: &Snapshot) -> Result<(), SyncError> {
    std::fs::create_dir_all(state_dir).map_err(|e| io_err(state_dir, e))?;

    let path = snapshot_path_at(state_dir);
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uvmake_core::types::{DEV_DEPENDENCY_SPECIFIERS, PROJECT_REFERENCES};

    fn fields(projects: &str, deps: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (PROJECT_REFERENCES.to_owned(), projects.to_owned()),
            (DEV_DEPENDENCY_SPECIFIERS.to_owned(), deps.to_owned()),
        ])
    }

    fn snapshot(fields: BTreeMap<String, String>) -> Snapshot {
        Snapshot {
            configured_at: Utc::now(),
            fields,
            manifest_sha256: None,
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_at(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut snap = snapshot(fields("[\"/a\"]", "[]"));
        snap.manifest_sha256 = Some("deadbeef".into());
        save_at(&tmp.path().join("state"), &snap).unwrap();
        let loaded = load_at(&tmp.path().join("state")).unwrap().unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        save_at(tmp.path(), &snapshot(BTreeMap::new())).unwrap();
        let tmp_path = snapshot_path_at(tmp.path()).with_extension("json.tmp");
        assert!(!tmp_path.exists(), "tmp file should be removed after atomic rename");
    }

    #[test]
    fn everything_changed_without_previous_snapshot() {
        let current = fields("[]", "[]");
        assert_eq!(changed_fields(&current, None).len(), 2);
    }

    #[test]
    fn fields_compared_independently() {
        let previous = snapshot(fields("[\"/a\"]", "[]"));
        let same = fields("[\"/a\"]", "[]");
        assert!(changed_fields(&same, Some(&previous)).is_empty());

        let new_dep = fields("[\"/a\"]", "[\"pytest\"]");
        assert_eq!(changed_fields(&new_dep, Some(&previous)), [DEV_DEPENDENCY_SPECIFIERS]);
    }

    #[test]
    fn corrupt_snapshot_is_a_json_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(snapshot_path_at(tmp.path()), "{not json").unwrap();
        assert!(matches!(load_at(tmp.path()), Err(SyncError::Json(_))));
    }
}
