//! Expansion of command-line inputs into the list of target files.

use crate::paths;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("{} is a directory (use --recursive to process its files)", .0.display())]
    Directory(PathBuf),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve `inputs` to absolute file paths.
///
/// Files are kept even when they do not exist, so that the addition run
/// reports them as unreadable. Directories are walked when `recursive` is
/// set, their regular files sorted by path. Paths naming the same file
/// (`x.txt` and `sub/../x.txt`, or a symlink met during a walk) count once,
/// at the first position.
pub fn collect_files<P: AsRef<Path>>(
    inputs: &[P],
    recursive: bool,
) -> Result<Vec<PathBuf>, DiscoverError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for input in inputs {
        let input = std::path::absolute(input.as_ref())?;

        if !input.is_dir() {
            if seen.insert(paths::canonicalize(&input)?) {
                files.push(input);
            }
            continue;
        }

        if !recursive {
            return Err(DiscoverError::Directory(input));
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&input).follow_links(true) {
            let entry = entry?;
            if entry.file_type().is_file() {
                found.push(entry.into_path());
            }
        }
        found.sort();
        tracing::debug!(dir = %input.display(), files = found.len(), "walked directory");

        for file in found {
            if seen.insert(paths::canonicalize(&file)?) {
                files.push(file);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_files_pass_through_in_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let b = temp_dir.path().join("b.txt");
        let a = temp_dir.path().join("a.txt");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let files = collect_files(&[&b, &a, &b], false).unwrap();
        assert_eq!(files, vec![b, a]);
    }

    #[test]
    fn test_aliased_paths_count_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        let x = temp_dir.path().join("x.txt");
        fs::write(&x, "BODY\n").unwrap();
        let alias = temp_dir.path().join("sub/../x.txt");

        let files = collect_files(&[&x, &alias], false).unwrap();
        assert_eq!(files, vec![x]);
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_file_in_walk_counts_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("real.txt"), "").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("zlink.txt")).unwrap();

        let files = collect_files(&[root], true).unwrap();
        assert_eq!(files, vec![root.join("real.txt")]);
    }

    #[test]
    fn test_missing_files_are_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.txt");
        let files = collect_files(&[&missing], false).unwrap();
        assert_eq!(files, vec![missing]);
    }

    #[test]
    fn test_directory_requires_recursive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = collect_files(&[temp_dir.path()], false).unwrap_err();
        assert!(matches!(err, DiscoverError::Directory(_)));
    }

    #[test]
    fn test_recursive_walk_is_sorted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("z.txt"), "").unwrap();
        fs::write(root.join("sub/deeper/y.txt"), "").unwrap();
        fs::write(root.join("sub/a.txt"), "").unwrap();

        let files = collect_files(&[root], true).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("sub/a.txt"),
                PathBuf::from("sub/deeper/y.txt"),
                PathBuf::from("z.txt"),
            ]
        );
    }
}
