//! Output relocation under a destination root.

use easy_append::{apply_additions, determine_common_path, RunOptions, Silent, TextAddition};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn touch(dir: &Path, relative: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, relative).unwrap();
    path
}

#[test]
fn test_mirrors_nested_tree() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    let files = vec![
        touch(&src, "top.txt"),
        touch(&src, "one/two/deep.txt"),
        touch(&src, "one/mid.txt"),
    ];
    let out = dir.path().join("out");

    let report = apply_additions(
        &files,
        &[TextAddition::prepend("#")],
        &RunOptions::under(&out),
        &mut Silent,
    )
    .unwrap();

    assert_eq!(report.common_base, Some(fs::canonicalize(&src).unwrap()));
    assert_eq!(fs::read_to_string(out.join("top.txt")).unwrap(), "#\ntop.txt");
    assert_eq!(
        fs::read_to_string(out.join("one/two/deep.txt")).unwrap(),
        "#\none/two/deep.txt"
    );
    assert_eq!(
        fs::read_to_string(out.join("one/mid.txt")).unwrap(),
        "#\none/mid.txt"
    );
}

#[test]
fn test_common_base_independent_of_order() {
    let dir = TempDir::new().unwrap();
    let a = touch(dir.path(), "p/q/r/a.txt");
    let b = touch(dir.path(), "p/s/b.txt");
    let c = touch(dir.path(), "p/q/c.txt");

    let forward = determine_common_path(&[&a, &b, &c]).unwrap();
    let backward = determine_common_path(&[&c, &b, &a]).unwrap();
    assert_eq!(forward, backward);
    assert_eq!(forward, Some(fs::canonicalize(dir.path().join("p")).unwrap()));
}

#[test]
fn test_single_file_goes_directly_under_destination() {
    let dir = TempDir::new().unwrap();
    let file = touch(dir.path(), "deep/down/only.txt");
    let out = dir.path().join("out");

    let report = apply_additions(
        &[&file],
        &[TextAddition::append("end")],
        &RunOptions::under(&out),
        &mut Silent,
    )
    .unwrap();

    let expected = fs::canonicalize(&out).unwrap().join("only.txt");
    assert_eq!(report.files[0].destination, expected);
    assert!(expected.exists());
}

#[test]
fn test_in_place_destination_is_source() {
    let dir = TempDir::new().unwrap();
    let file = touch(dir.path(), "x.txt");

    let report = apply_additions(
        &[&file],
        &[TextAddition::append("end")],
        &RunOptions::in_place(),
        &mut Silent,
    )
    .unwrap();

    let outcome = &report.files[0];
    assert_eq!(outcome.destination, outcome.source);
    assert_eq!(outcome.source, fs::canonicalize(&file).unwrap());
}

#[test]
#[cfg(unix)]
fn test_unwritable_destination_is_write_failure() {
    let dir = TempDir::new().unwrap();
    let file = touch(dir.path(), "src/x.txt");
    // A file standing where the destination directory should be.
    let out = dir.path().join("out");
    fs::write(&out, "not a directory").unwrap();

    let err = apply_additions(
        &[&file],
        &[TextAddition::append("end")],
        &RunOptions::under(&out),
        &mut Silent,
    )
    .unwrap_err();

    assert!(err.is_write());
    assert_eq!(fs::read_to_string(&file).unwrap(), "src/x.txt");
}
