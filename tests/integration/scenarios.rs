//! End-to-end addition scenarios
//!
//! Covers:
//! - Conditional prepends next to unconditional appends
//! - Same-line stacking of prepend fragments
//! - Repeated runs stacking again on already-processed files
//! - Dry runs and abort-on-first-failure

use easy_append::{apply_additions, Position, RunOptions, Silent, TextAddition};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_conditional_prepend_with_unconditional_append() {
    let dir = TempDir::new().unwrap();
    let x = write(dir.path(), "a/b/x.txt", "X\n");
    let y = write(dir.path(), "a/c/y.txt", "Y\n");
    let out = dir.path().join("out");

    let additions = vec![
        TextAddition::prepend("P1").when_contains("^X$").unwrap(),
        TextAddition::append("A1"),
    ];

    let report = apply_additions(&[&x, &y], &additions, &RunOptions::under(&out), &mut Silent)
        .expect("run should succeed");

    assert_eq!(
        report.common_base,
        Some(fs::canonicalize(dir.path().join("a")).unwrap())
    );
    assert_eq!(fs::read_to_string(out.join("b/x.txt")).unwrap(), "P1\nX\n\nA1");
    assert_eq!(fs::read_to_string(out.join("c/y.txt")).unwrap(), "Y\n\nA1");

    // Sources are untouched when writing elsewhere.
    assert_eq!(fs::read_to_string(&x).unwrap(), "X\n");
    assert_eq!(fs::read_to_string(&y).unwrap(), "Y\n");
}

#[test]
fn test_same_line_then_new_line_prepend() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "body.txt", "BODY");

    let additions = vec![
        TextAddition::prepend("text1").same_line(),
        TextAddition::prepend("text2"),
    ];
    apply_additions(&[&file], &additions, &RunOptions::in_place(), &mut Silent).unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "text1text2\nBODY");
}

#[test]
fn test_prepends_and_appends_keep_call_order() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "body.txt", "BODY");

    let additions = vec![
        TextAddition::prepend("first"),
        TextAddition::append("tail-1"),
        TextAddition::prepend("second"),
        TextAddition::append("tail-2"),
        TextAddition::append(";").same_line(),
    ];
    apply_additions(&[&file], &additions, &RunOptions::in_place(), &mut Silent).unwrap();

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "first\nsecond\nBODY\ntail-1\ntail-2;"
    );
}

#[test]
fn test_second_run_adds_again() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "body.txt", "BODY\n");
    let additions = vec![TextAddition::prepend("# header")];

    for _ in 0..2 {
        apply_additions(&[&file], &additions, &RunOptions::in_place(), &mut Silent).unwrap();
    }

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "# header\n# header\nBODY\n"
    );
}

#[test]
fn test_inverted_condition_guards_rerun() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "body.txt", "BODY\n");
    let additions = vec![TextAddition::prepend("# header")
        .when_contains("^# header$")
        .unwrap()
        .inverted()];

    for _ in 0..2 {
        apply_additions(&[&file], &additions, &RunOptions::in_place(), &mut Silent).unwrap();
    }

    assert_eq!(fs::read_to_string(&file).unwrap(), "# header\nBODY\n");
}

#[test]
fn test_exactly_one_of_apply_or_skip() {
    let dir = TempDir::new().unwrap();
    let with = write(dir.path(), "with.txt", "needle\n");
    let without = write(dir.path(), "without.txt", "hay\n");

    for inverted in [false, true] {
        let mut addition = TextAddition::append("!").when_contains("needle").unwrap();
        if inverted {
            addition = addition.inverted();
        }
        let options = RunOptions::in_place().dry_run();
        let report =
            apply_additions(&[&with, &without], &[addition], &options, &mut Silent).unwrap();

        for (outcome, contains) in report.files.iter().zip([true, false]) {
            assert_eq!(outcome.applied.len() + outcome.skipped.len(), 1);
            assert_eq!(outcome.changed(), contains ^ inverted);
        }
    }
}

#[test]
fn test_dry_run_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "src/x.txt", "X\n");
    let out = dir.path().join("out");

    let mut lines = Vec::new();
    let mut sink = |text: &str, level: usize| lines.push((text.to_string(), level));
    let options = RunOptions::under(&out).dry_run();
    let report = apply_additions(
        &[&file],
        &[TextAddition::append("A").when_contains("X").unwrap()],
        &options,
        &mut sink,
    )
    .unwrap();

    assert!(!out.exists());
    assert_eq!(report.written(), 0);
    assert!(lines
        .iter()
        .any(|(text, level)| text == "File does contain the regex." && *level == 2));
    assert!(lines
        .iter()
        .any(|(text, _)| text.starts_with("File will be written to: ")));
    assert!(!lines.iter().any(|(text, _)| text == "File written."));
}

#[test]
fn test_failure_keeps_earlier_files_written() {
    let dir = TempDir::new().unwrap();
    let first = write(dir.path(), "1.txt", "one");
    let missing = dir.path().join("2.txt");
    let third = write(dir.path(), "3.txt", "three");

    let err = apply_additions(
        &[first.clone(), missing, third.clone()],
        &[TextAddition::append("!").same_line()],
        &RunOptions::in_place(),
        &mut Silent,
    )
    .unwrap_err();

    assert!(err.is_read());
    assert_eq!(fs::read_to_string(&first).unwrap(), "one!");
    assert_eq!(fs::read_to_string(&third).unwrap(), "three");
}

#[test]
fn test_reset_between_additions() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "x.txt", "body");

    let additions = vec![
        TextAddition::append("lost"),
        TextAddition::new(Position::Append, None),
        TextAddition::append("kept").same_line(),
    ];
    apply_additions(&[&file], &additions, &RunOptions::in_place(), &mut Silent).unwrap();

    assert_eq!(fs::read_to_string(&file).unwrap(), "bodykept");
}
