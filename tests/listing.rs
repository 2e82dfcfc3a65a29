use std::fs;

use folder_preview_win::error::PreviewError;
use folder_preview_win::listing::{EntryKind, FolderListing, IconSource};
use folder_preview_win::settings::DEFAULT_SHOW_CAP;
use tempfile::tempdir;

fn touch(dir: &std::path::Path, name: &str) {
    fs::write(dir.join(name), b"x").unwrap();
}

#[test]
fn lists_files_and_folders_sorted() {
    let tmp = tempdir().unwrap();
    touch(tmp.path(), "b.txt");
    touch(tmp.path(), "A.md");
    fs::create_dir(tmp.path().join("docs")).unwrap();

    let listing = FolderListing::read(tmp.path(), DEFAULT_SHOW_CAP).unwrap();
    let names: Vec<_> = listing.shown.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["A.md", "b.txt", "docs"]);
    assert_eq!(listing.total, 3);
    assert_eq!(listing.hidden(), 0);
    assert_eq!(listing.shown[2].kind, EntryKind::Folder);
    assert_eq!(listing.shown[0].kind, EntryKind::File);
}

#[test]
fn only_immediate_children_are_listed() {
    let tmp = tempdir().unwrap();
    let nested = tmp.path().join("outer").join("inner");
    fs::create_dir_all(&nested).unwrap();
    touch(&nested, "deep.txt");

    let listing = FolderListing::read(tmp.path(), DEFAULT_SHOW_CAP).unwrap();
    assert_eq!(listing.total, 1);
    assert_eq!(listing.shown[0].name, "outer");
}

#[test]
fn display_is_capped_with_one_overflow_row() {
    let tmp = tempdir().unwrap();
    for i in 0..25 {
        touch(tmp.path(), &format!("file{i:02}.txt"));
    }

    let listing = FolderListing::read(tmp.path(), 20).unwrap();
    assert_eq!(listing.shown.len(), 20);
    assert_eq!(listing.total, 25);
    assert_eq!(listing.hidden(), 5);

    let rows = listing.rows();
    assert_eq!(rows.len(), 21);
    assert_eq!(rows[19].label, "file19.txt");
    assert_eq!(rows[20].label, "5 more items hidden");
    assert_eq!(rows[20].icon, IconSource::StockFolder);
}

#[test]
fn large_mixed_folder_keeps_kinds_for_shown_entries() {
    let tmp = tempdir().unwrap();
    for i in 0..300 {
        if i % 2 == 0 {
            fs::create_dir(tmp.path().join(format!("Entry{i:03}"))).unwrap();
        } else {
            touch(tmp.path(), &format!("entry{i:03}"));
        }
    }

    let listing = FolderListing::read(tmp.path(), DEFAULT_SHOW_CAP).unwrap();
    assert_eq!(listing.total, 300);
    assert_eq!(listing.shown.len(), DEFAULT_SHOW_CAP);
    for (i, entry) in listing.shown.iter().enumerate() {
        let expected = if i % 2 == 0 { EntryKind::Folder } else { EntryKind::File };
        assert_eq!(entry.kind, expected, "{}", entry.name);
    }
    assert_eq!(listing.shown[0].name, "Entry000");
    assert_eq!(listing.shown[1].name, "entry001");
}

#[test]
fn exactly_cap_entries_has_no_overflow_row() {
    let tmp = tempdir().unwrap();
    for i in 0..3 {
        touch(tmp.path(), &format!("{i}.txt"));
    }
    let rows = FolderListing::read(tmp.path(), 3).unwrap().rows();
    assert_eq!(rows.len(), 3);
}

#[test]
fn zero_cap_shows_only_the_overflow_row() {
    let tmp = tempdir().unwrap();
    touch(tmp.path(), "a.txt");
    touch(tmp.path(), "b.txt");

    let rows = FolderListing::read(tmp.path(), 0).unwrap().rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "2 more items hidden");
}

#[test]
fn empty_folder_has_no_rows() {
    let tmp = tempdir().unwrap();
    let listing = FolderListing::read(tmp.path(), DEFAULT_SHOW_CAP).unwrap();
    assert_eq!(listing.total, 0);
    assert!(listing.rows().is_empty());
}

#[test]
fn file_rows_use_their_own_path_for_icons() {
    let tmp = tempdir().unwrap();
    touch(tmp.path(), "report.pdf");

    let rows = FolderListing::read(tmp.path(), DEFAULT_SHOW_CAP).unwrap().rows();
    assert_eq!(
        rows[0].icon,
        IconSource::Associated(tmp.path().join("report.pdf"))
    );
}

#[test]
fn a_file_is_not_a_folder() {
    let tmp = tempdir().unwrap();
    touch(tmp.path(), "plain.txt");

    let err = FolderListing::read(&tmp.path().join("plain.txt"), DEFAULT_SHOW_CAP).unwrap_err();
    assert!(matches!(err, PreviewError::NotAFolder(_)));
}

#[test]
fn missing_folder_is_a_read_error() {
    let tmp = tempdir().unwrap();
    let err = FolderListing::read(&tmp.path().join("gone"), DEFAULT_SHOW_CAP).unwrap_err();
    assert!(matches!(err, PreviewError::ReadFolder { .. }));
}

#[cfg(unix)]
#[test]
fn symlinked_directories_count_as_folders() {
    let tmp = tempdir().unwrap();
    let target = tmp.path().join("real");
    fs::create_dir(&target).unwrap();
    std::os::unix::fs::symlink(&target, tmp.path().join("link")).unwrap();
    std::os::unix::fs::symlink(tmp.path().join("nowhere"), tmp.path().join("dangling")).unwrap();

    let listing = FolderListing::read(tmp.path(), DEFAULT_SHOW_CAP).unwrap();
    let kind_of = |name: &str| {
        listing
            .shown
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.kind)
    };
    assert_eq!(kind_of("link"), Some(EntryKind::Folder));
    assert_eq!(kind_of("dangling"), Some(EntryKind::File));
}
