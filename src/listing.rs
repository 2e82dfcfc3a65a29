//! Enumeration of a folder's immediate children.
//!
//! The listing is capped: at most `cap` entries are kept for display and the
//! remainder is reported as a single overflow row.

use std::fs::{self, FileType};
use std::path::{Path, PathBuf};

use crate::error::PreviewError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Where a row's icon comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconSource {
    /// The shell's generic folder icon.
    StockFolder,
    /// The icon the shell associates with this file.
    Associated(PathBuf),
}

/// One on-screen row: a label and the icon drawn beside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowSpec {
    pub label: String,
    pub icon: IconSource,
}

#[derive(Clone, Debug)]
pub struct FolderListing {
    pub folder: PathBuf,
    pub shown: Vec<FolderEntry>,
    pub total: usize,
}

impl FolderListing {
    pub fn read(folder: &Path, cap: usize) -> Result<Self, PreviewError> {
        let meta = fs::metadata(folder).map_err(|source| PreviewError::ReadFolder {
            path: folder.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(PreviewError::NotAFolder(folder.to_path_buf()));
        }

        let dir = fs::read_dir(folder).map_err(|source| PreviewError::ReadFolder {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut found: Vec<Found> = dir
            .filter_map(|item| item.ok())
            .map(|item| Found {
                name: item.file_name().to_string_lossy().into_owned(),
                file_type: item.file_type().ok(),
                path: item.path(),
            })
            .collect();

        sort_by_name(&mut found);

        let total = found.len();
        found.truncate(cap);

        let entries = found
            .into_iter()
            .map(|found| FolderEntry {
                kind: entry_kind(found.file_type, &found.path),
                name: found.name,
                path: found.path,
            })
            .collect();

        Ok(Self {
            folder: folder.to_path_buf(),
            shown: entries,
            total,
        })
    }

    /// Number of entries that did not fit under the cap.
    pub fn hidden(&self) -> usize {
        self.total - self.shown.len()
    }

    pub fn rows(&self) -> Vec<RowSpec> {
        let mut rows: Vec<RowSpec> = self
            .shown
            .iter()
            .map(|entry| RowSpec {
                label: entry.name.clone(),
                icon: match entry.kind {
                    EntryKind::Folder => IconSource::StockFolder,
                    EntryKind::File => IconSource::Associated(entry.path.clone()),
                },
            })
            .collect();

        let hidden = self.hidden();
        if hidden > 0 {
            rows.push(RowSpec {
                label: overflow_label(hidden),
                icon: IconSource::StockFolder,
            });
        }
        rows
    }
}

pub fn overflow_label(hidden: usize) -> String {
    if hidden == 1 {
        "1 more item hidden".to_string()
    } else {
        format!("{hidden} more items hidden")
    }
}

/// A directory entry before its kind is resolved.
struct Found {
    name: String,
    path: PathBuf,
    file_type: Option<FileType>,
}

fn sort_by_name(found: &mut [Found]) {
    found.sort_by_cached_key(|f| (f.name.to_lowercase(), f.name.clone()));
}

// Plain entries are typed from the directory read itself. Symlinks and
// junctions are followed with `fs::metadata`, so a link to a directory shows
// as a folder; anything unreadable falls back to a file.
fn entry_kind(file_type: Option<FileType>, path: &Path) -> EntryKind {
    match file_type {
        Some(ft) if ft.is_dir() => EntryKind::Folder,
        Some(ft) if !ft.is_symlink() => EntryKind::File,
        _ => match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => EntryKind::Folder,
            _ => EntryKind::File,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[(&str, EntryKind)], total: usize) -> FolderListing {
        FolderListing {
            folder: PathBuf::from("root"),
            shown: names
                .iter()
                .map(|(name, kind)| FolderEntry {
                    name: name.to_string(),
                    path: PathBuf::from("root").join(name),
                    kind: *kind,
                })
                .collect(),
            total,
        }
    }

    #[test]
    fn names_sort_case_insensitively() {
        let mut found: Vec<Found> = ["beta", "alpha", "Alpha", "Gamma"]
            .iter()
            .map(|name| Found {
                name: name.to_string(),
                path: PathBuf::from(name),
                file_type: None,
            })
            .collect();
        sort_by_name(&mut found);
        let names: Vec<_> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "Gamma"]);
    }

    #[test]
    fn untyped_missing_entry_is_a_file() {
        let kind = entry_kind(None, Path::new("definitely/not/here"));
        assert_eq!(kind, EntryKind::File);
    }

    #[test]
    fn rows_pick_icons_by_kind() {
        let rows = listing(
            &[("docs", EntryKind::Folder), ("a.txt", EntryKind::File)],
            2,
        )
        .rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].icon, IconSource::StockFolder);
        assert_eq!(
            rows[1].icon,
            IconSource::Associated(PathBuf::from("root").join("a.txt"))
        );
    }

    #[test]
    fn overflow_row_is_appended_once() {
        let rows = listing(&[("a", EntryKind::File)], 5).rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "4 more items hidden");
        assert_eq!(rows[1].icon, IconSource::StockFolder);
    }

    #[test]
    fn no_overflow_row_when_everything_fits() {
        let rows = listing(&[("a", EntryKind::File)], 1).rows();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn overflow_label_singular() {
        assert_eq!(overflow_label(1), "1 more item hidden");
        assert_eq!(overflow_label(12), "12 more items hidden");
    }
}
