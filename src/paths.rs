//! Output location resolution.
//!
//! When files are written under a destination root instead of in place, each
//! one keeps its position relative to the lowest directory shared by every
//! target file. Files spread over different roots (drives, UNC shares) share
//! no directory; they are filed under a one-letter label for their root.

use crate::errors::AdditionError;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Canonical absolute form of `path`.
///
/// Existing paths go through `fs::canonicalize`. For a path that does not
/// exist yet, the deepest existing ancestor is canonicalized and the missing
/// tail is re-attached, with `.` and `..` resolved lexically.
pub fn canonicalize(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(canonical) => return Ok(canonical),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let absolute = normalize_lexically(&std::path::absolute(path)?);
    let mut existing = absolute.as_path();
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }

        match fs::canonicalize(existing) {
            Ok(mut resolved) => {
                resolved.extend(missing.iter().rev());
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Drop `.` components and fold `..` into the preceding component.
///
/// `..` at the root stays at the root. Leading `..` of a relative path are
/// kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Path that leads from directory `from` to `to`, using `..` to climb.
///
/// Both paths are expected to be absolute and normalized. Equal paths give
/// an empty relative path.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let shared = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in shared..from.len() {
        relative.push(Component::ParentDir);
    }
    for component in &to[shared..] {
        relative.push(component);
    }
    relative
}

fn step_ups(relative: &Path) -> usize {
    relative
        .components()
        .filter(|c| matches!(c, Component::ParentDir))
        .count()
}

/// The prefix and root-directory part of `path` (`/`, `C:\`, `\\server\share\`).
pub fn root_of(path: &Path) -> PathBuf {
    path.components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect()
}

/// Lower-cased one-character label for the root of `path`, e.g. `c` for
/// `C:\`. Roots without any alphanumeric character (a bare `/`) have none.
pub fn root_label(path: &Path) -> Option<String> {
    root_of(path)
        .to_string_lossy()
        .chars()
        .find(|c| c.is_alphanumeric())
        .map(|c| c.to_lowercase().collect())
}

/// Lowest common ancestor of a set of canonical directories.
///
/// Streams over `dirs` keeping a single candidate base. Returns `None` when
/// the set is empty or when any directory sits under a different root than
/// the first one.
pub fn common_base<I, P>(dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut dirs = dirs.into_iter();
    let mut base = dirs.next()?.as_ref().to_path_buf();

    for dir in dirs {
        let dir = dir.as_ref();

        if root_of(&base) != root_of(dir) {
            tracing::trace!(base = %base.display(), dir = %dir.display(), "root mismatch");
            return None;
        }
        if base == dir {
            continue;
        }

        let down = step_ups(&relative_path(&base, dir));
        let up = step_ups(&relative_path(dir, &base));

        if down > 0 && up > 0 {
            // Siblings below a shared ancestor: climb out of the base by as
            // many levels as it takes to reach `dir`.
            for _ in 0..down {
                base.pop();
            }
        } else if down > 0 {
            base = dir.to_path_buf();
        }
        tracing::trace!(dir = %dir.display(), base = %base.display(), "common base step");
    }

    Some(base)
}

/// Common base directory of `files`, computed from each file's canonical
/// parent directory.
///
/// `Ok(None)` means the files share no directory (different roots), or the
/// set was empty.
pub fn determine_common_path<P: AsRef<Path>>(
    files: &[P],
) -> Result<Option<PathBuf>, AdditionError> {
    let mut parents = Vec::with_capacity(files.len());
    for file in files {
        let file = file.as_ref();
        let canonical = canonicalize(file).map_err(|e| AdditionError::read(file, e))?;
        let parent = match canonical.parent() {
            Some(parent) => parent.to_path_buf(),
            None => canonical,
        };
        parents.push(parent);
    }

    let Some(base) = common_base(&parents) else {
        tracing::debug!(files = files.len(), "files share no common path");
        return Ok(None);
    };
    let base = canonicalize(&base).map_err(|e| AdditionError::read(&base, e))?;
    tracing::debug!(base = %base.display(), "common path");
    Ok(Some(base))
}

/// Where the processed `file` should be written.
///
/// Without a destination root the file is edited in place. Otherwise the
/// file's path relative to `base` is re-rooted under `destination`; with no
/// common base the file's root label stands in for the root itself.
pub fn determine_file_location(
    file: &Path,
    base: Option<&Path>,
    destination: Option<&Path>,
) -> Result<PathBuf, AdditionError> {
    let Some(destination) = destination else {
        return Ok(file.to_path_buf());
    };

    let relative = match base {
        Some(base) => relative_path(base, file),
        None => {
            let root = root_of(file);
            let below_root = file.strip_prefix(&root).unwrap_or(file);
            match root_label(file) {
                Some(label) => Path::new(&label).join(below_root),
                None => below_root.to_path_buf(),
            }
        }
    };

    let target = destination.join(relative);
    canonicalize(&target).map_err(|e| AdditionError::write(&target, e))
}
