//! Per-target YAML registry.
//!
//! # Storage layout
//!
//! ```text
//! ~/.vaultpub/
//!   targets/
//!     <target_name>.yaml   (one file per target — mode 0600, token inside)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::types::{Target, TargetName};

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.vaultpub/targets/`
///
/// Creates the directory (mode `0700`) if it does not yet exist.
pub fn targets_dir_at(home: &Path) -> Result<PathBuf, RegistryError> {
    let dir = home.join(".vaultpub").join("targets");
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `<home>/.vaultpub/targets/<name>.yaml` — pure, no I/O.
pub fn target_path_at(home: &Path, name: &TargetName) -> PathBuf {
    home.join(".vaultpub")
        .join("targets")
        .join(format!("{}.yaml", name.0))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load a single target from `<home>/.vaultpub/targets/<name>.yaml`.
///
/// Returns `RegistryError::TargetNotFound` if absent,
/// `RegistryError::Parse` (with path + line context) if malformed YAML.
pub fn load_target_at(home: &Path, name: &TargetName) -> Result<Target, RegistryError> {
    let path = target_path_at(home, name);
    if !path.exists() {
        return Err(RegistryError::TargetNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })
}

/// `load_target_at` convenience wrapper.
pub fn load_target(name: &TargetName) -> Result<Target, RegistryError> {
    load_target_at(&home()?, name)
}

/// Walk `<home>/.vaultpub/targets/*.yaml` and return every target, sorted by
/// name for deterministic output.
pub fn list_targets_at(home: &Path) -> Result<Vec<Target>, RegistryError> {
    let dir = home.join(".vaultpub").join("targets");
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".yaml"))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut targets = Vec::new();
    for entry in entries {
        let contents = std::fs::read_to_string(entry.path())?;
        let target: Target = serde_yaml::from_str(&contents).map_err(|e| {
            RegistryError::Parse {
                path: entry.path(),
                source: e,
            }
        })?;
        targets.push(target);
    }
    Ok(targets)
}

/// `list_targets_at` convenience wrapper.
pub fn list_targets() -> Result<Vec<Target>, RegistryError> {
    list_targets_at(&home()?)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a target to `<home>/.vaultpub/targets/<name>.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target file (same
/// filesystem — no EXDEV on macOS).
pub fn save_target_at(home: &Path, target: &Target) -> Result<(), RegistryError> {
    targets_dir_at(home)?; // create dir + 0700 if absent
    let path = target_path_at(home, &target.name);
    let tmp_path = path.with_file_name(format!("{}.yaml.tmp", target.name.0));

    let yaml = serde_yaml::to_string(target)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_target_at` convenience wrapper.
pub fn save_target(target: &Target) -> Result<(), RegistryError> {
    save_target_at(&home()?, target)
}

// ---------------------------------------------------------------------------
// 4. Remove
// ---------------------------------------------------------------------------

/// Delete `<home>/.vaultpub/targets/<name>.yaml`.
///
/// Returns `RegistryError::TargetNotFound` if the target was never saved.
pub fn remove_target_at(home: &Path, name: &TargetName) -> Result<(), RegistryError> {
    let path = target_path_at(home, name);
    if !path.exists() {
        return Err(RegistryError::TargetNotFound { path });
    }
    std::fs::remove_file(&path)?;
    Ok(())
}

/// `remove_target_at` convenience wrapper.
pub fn remove_target(name: &TargetName) -> Result<(), RegistryError> {
    remove_target_at(&home()?, name)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use crate::types::{Identity, Target, TargetName};

    use super::*;

    fn sample_target(name: &str) -> Target {
        let now = Utc::now();
        Target {
            name: TargetName::from(name),
            repo: "alice/notes".parse().unwrap(),
            branch: "main".to_owned(),
            folder: "docs".to_owned(),
            vault: std::path::PathBuf::from("/home/alice/vault"),
            selection: vec![std::path::PathBuf::from("journal")],
            token: Some("ghp_secret".to_owned()),
            commit_message: None,
            identity: Identity::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn save_then_load_roundtrip() {
        let home = TempDir::new().unwrap();
        let target = sample_target("notes");
        save_target_at(home.path(), &target).unwrap();

        let loaded = load_target_at(home.path(), &target.name).unwrap();
        assert_eq!(loaded, target);
    }

    #[test]
    fn load_missing_is_target_not_found() {
        let home = TempDir::new().unwrap();
        let err = load_target_at(home.path(), &TargetName::from("ghost")).unwrap_err();
        assert!(matches!(err, RegistryError::TargetNotFound { .. }));
    }

    #[test]
    fn list_is_sorted_and_skips_nothing() {
        let home = TempDir::new().unwrap();
        save_target_at(home.path(), &sample_target("zeta")).unwrap();
        save_target_at(home.path(), &sample_target("alpha")).unwrap();

        let names: Vec<String> = list_targets_at(home.path())
            .unwrap()
            .into_iter()
            .map(|t| t.name.0)
            .collect();
        assert_eq!(names, vec!["alpha".to_owned(), "zeta".to_owned()]);
    }

    #[test]
    fn list_empty_home_returns_empty_vec() {
        let home = TempDir::new().unwrap();
        assert!(list_targets_at(home.path()).unwrap().is_empty());
    }

    #[test]
    fn save_is_atomic_no_tmp_left_behind() {
        let home = TempDir::new().unwrap();
        let target = sample_target("notes");
        save_target_at(home.path(), &target).unwrap();

        let tmp = target_path_at(home.path(), &target.name)
            .with_file_name("notes.yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be renamed away");
    }

    #[test]
    #[cfg(unix)]
    fn saved_file_is_mode_0600() {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().unwrap();
        let target = sample_target("notes");
        save_target_at(home.path(), &target).unwrap();

        let path = target_path_at(home.path(), &target.name);
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600, "token-bearing file must be 0600");
    }

    #[test]
    fn remove_deletes_and_second_remove_errors() {
        let home = TempDir::new().unwrap();
        let target = sample_target("notes");
        save_target_at(home.path(), &target).unwrap();

        remove_target_at(home.path(), &target.name).unwrap();
        let err = remove_target_at(home.path(), &target.name).unwrap_err();
        assert!(matches!(err, RegistryError::TargetNotFound { .. }));
    }

    #[test]
    fn parse_error_carries_path() {
        let home = TempDir::new().unwrap();
        let dir = targets_dir_at(home.path()).unwrap();
        std::fs::write(dir.join("broken.yaml"), "branch: [unclosed").unwrap();

        let err = load_target_at(home.path(), &TargetName::from("broken")).unwrap_err();
        match err {
            RegistryError::Parse { path, .. } => {
                assert!(path.ends_with("broken.yaml"));
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }
}
