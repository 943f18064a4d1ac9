//! Local vault access and selection expansion.
//!
//! The engine never touches the filesystem directly; it goes through the
//! [`Vault`] trait so tests (and other hosts) can supply their own storage.
//! [`resolve_selection`] turns the configured selection into the flat,
//! deduplicated list of [`LocalEntry`] values the reconciler diffs.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::reconcile::LocalEntry;

/// File-or-folder classification of a selected vault path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// Read access to the local vault. All paths are vault-relative.
pub trait Vault {
    /// Classify `rel` as a file or folder.
    fn classify(&self, rel: &Path) -> Result<EntryKind, SyncError>;

    /// Read the full text content of the file at `rel`.
    fn read(&self, rel: &Path) -> Result<String, SyncError>;

    /// Every descendant *file* of the folder at `rel`, recursively,
    /// ignoring nothing. Sorted for deterministic output.
    fn list_descendants(&self, rel: &Path) -> Result<Vec<PathBuf>, SyncError>;
}

/// A vault rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }
}

impl Vault for FsVault {
    fn classify(&self, rel: &Path) -> Result<EntryKind, SyncError> {
        let abs = self.abs(rel);
        let meta = std::fs::metadata(&abs).map_err(|source| SyncError::LocalRead {
            path: abs.clone(),
            source,
        })?;
        Ok(if meta.is_dir() {
            EntryKind::Folder
        } else {
            EntryKind::File
        })
    }

    fn read(&self, rel: &Path) -> Result<String, SyncError> {
        let abs = self.abs(rel);
        std::fs::read_to_string(&abs).map_err(|source| SyncError::LocalRead { path: abs, source })
    }

    fn list_descendants(&self, rel: &Path) -> Result<Vec<PathBuf>, SyncError> {
        let mut files = Vec::new();
        walk(&self.root, rel, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn walk(root: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> Result<(), SyncError> {
    let abs = root.join(rel);
    let entries = std::fs::read_dir(&abs).map_err(|source| match source.kind() {
        ErrorKind::NotFound => SyncError::LocalRead {
            path: abs.clone(),
            source,
        },
        _ => io_err(&abs, source),
    })?;

    let mut children: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    children.sort_by_key(|e| e.file_name());

    for child in children {
        let child_rel = rel.join(child.file_name());
        let file_type = child.file_type().map_err(|e| io_err(child.path(), e))?;
        if file_type.is_dir() {
            walk(root, &child_rel, out)?;
        } else {
            out.push(child_rel);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Selection expansion
// ---------------------------------------------------------------------------

/// Root a vault-relative path under the target folder, normalizing
/// separators to `/` regardless of the local platform convention.
pub(crate) fn remote_path(folder: &str, rel: &Path) -> String {
    let rel: String = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if folder.is_empty() {
        rel
    } else {
        format!("{folder}/{rel}")
    }
}

/// Expand the configured selection into the flat local file set.
///
/// Folders recurse into every descendant file. Entries are deduplicated by
/// remote path — a file reachable both directly and via a selected ancestor
/// folder appears once, last-seen wins — and returned sorted by remote path.
///
/// Any unreadable path (vanished since selection, permission change) aborts
/// the whole expansion: a partial list would publish a partial mirror.
pub fn resolve_selection(
    vault: &impl Vault,
    selection: &[PathBuf],
    folder: &str,
) -> Result<Vec<LocalEntry>, SyncError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for selected in selection {
        match vault.classify(selected)? {
            EntryKind::File => files.push(selected.clone()),
            EntryKind::Folder => files.extend(vault.list_descendants(selected)?),
        }
    }

    let mut by_remote: BTreeMap<String, LocalEntry> = BTreeMap::new();
    for local_path in files {
        let content = vault.read(&local_path)?;
        let remote = remote_path(folder, &local_path);
        by_remote.insert(
            remote.clone(),
            LocalEntry {
                local_path,
                remote_path: remote,
                content,
            },
        );
    }

    Ok(by_remote.into_values().collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn vault_with(files: &[(&str, &str)]) -> (TempDir, FsVault) {
        let dir = TempDir::new().expect("vault dir");
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
            fs::write(&path, content).expect("write");
        }
        let vault = FsVault::new(dir.path());
        (dir, vault)
    }

    #[test]
    fn remote_path_roots_under_folder() {
        assert_eq!(remote_path("docs", Path::new("a/b.md")), "docs/a/b.md");
        assert_eq!(remote_path("", Path::new("a/b.md")), "a/b.md");
    }

    #[test]
    fn folder_expansion_recurses_into_every_descendant() {
        let (_dir, vault) = vault_with(&[
            ("journal/2024/jan.md", "jan"),
            ("journal/2024/feb.md", "feb"),
            ("journal/index.md", "idx"),
        ]);

        let entries =
            resolve_selection(&vault, &[PathBuf::from("journal")], "docs").expect("resolve");
        let paths: Vec<&str> = entries.iter().map(|e| e.remote_path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "docs/journal/2024/feb.md",
                "docs/journal/2024/jan.md",
                "docs/journal/index.md",
            ]
        );
    }

    #[test]
    fn file_and_containing_folder_dedupe_to_one_entry() {
        let (_dir, vault) = vault_with(&[("journal/a.md", "a"), ("journal/b.md", "b")]);

        let selection = vec![PathBuf::from("journal"), PathBuf::from("journal/a.md")];
        let entries = resolve_selection(&vault, &selection, "").expect("resolve");

        let paths: Vec<&str> = entries.iter().map(|e| e.remote_path.as_str()).collect();
        assert_eq!(paths, vec!["journal/a.md", "journal/b.md"]);
    }

    #[test]
    fn vanished_selected_file_aborts_with_local_read() {
        let (_dir, vault) = vault_with(&[("kept.md", "k")]);

        let selection = vec![PathBuf::from("kept.md"), PathBuf::from("gone.md")];
        let err = resolve_selection(&vault, &selection, "").unwrap_err();
        assert!(matches!(err, SyncError::LocalRead { .. }));
    }

    #[test]
    fn empty_folder_yields_no_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        let vault = FsVault::new(dir.path());

        let entries = resolve_selection(&vault, &[PathBuf::from("empty")], "docs").unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn content_is_read_verbatim() {
        let (_dir, vault) = vault_with(&[("note.md", "line1\nline2\n")]);
        let entries = resolve_selection(&vault, &[PathBuf::from("note.md")], "").unwrap();
        assert_eq!(entries[0].content, "line1\nline2\n");
        assert_eq!(entries[0].local_path, PathBuf::from("note.md"));
    }
}
