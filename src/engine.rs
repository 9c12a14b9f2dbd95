//! Addition engine - applies an ordered list of additions to every file
//!
//! For each file, in order:
//! - Evaluates each addition's content condition (loading the file lazily)
//! - Accumulates matching additions onto the file's head or tail
//! - Resolves the output location (in place or under a destination root)
//! - Writes the result, unless this is a dry run
//!
//! Progress is reported through a [`ProgressSink`] passed in by the caller.
//! The first read or write failure aborts the run; files written before it
//! stay written.

use crate::addition::{Position, TextAddition};
use crate::buffered::{BufferedFile, Charset};
use crate::errors::AdditionError;
use crate::paths::{canonicalize, determine_common_path, determine_file_location};
use std::path::{Path, PathBuf};

/// Receiver for human-readable progress lines.
///
/// `level` is the nesting depth of the line: 0 for per-run and per-file
/// lines, 1 for per-addition lines, 2 for details of one addition.
pub trait ProgressSink {
    fn message(&mut self, text: &str, level: usize);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str, usize),
{
    fn message(&mut self, text: &str, level: usize) {
        self(text, level)
    }
}

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressSink for Silent {
    fn message(&mut self, _text: &str, _level: usize) {}
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Root to write results under; `None` edits files in place.
    pub destination: Option<PathBuf>,
    /// Go through every step except creating output files.
    pub dry_run: bool,
    pub charset: Charset,
    /// Record each file's content before and after in its outcome.
    pub keep_preview: bool,
}

impl RunOptions {
    pub fn in_place() -> Self {
        Self::default()
    }

    pub fn under(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Self::default()
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_preview(mut self) -> Self {
        self.keep_preview = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub before: String,
    pub after: String,
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct FileOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// 1-based indices of the additions that applied.
    pub applied: Vec<usize>,
    /// 1-based indices of the additions whose condition failed.
    pub skipped: Vec<usize>,
    pub written: bool,
    pub preview: Option<Preview>,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[must_use = "RunReport should be checked for per-file outcomes"]
pub struct RunReport {
    pub common_base: Option<PathBuf>,
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn written(&self) -> usize {
        self.files.iter().filter(|f| f.written).count()
    }
}

/// Apply `additions`, in order, to each of `files`, in order.
pub fn apply_additions<P, S>(
    files: &[P],
    additions: &[TextAddition],
    options: &RunOptions,
    sink: &mut S,
) -> Result<RunReport, AdditionError>
where
    P: AsRef<Path>,
    S: ProgressSink + ?Sized,
{
    let common_base = determine_common_path(files)?;
    if options.destination.is_some() {
        match &common_base {
            Some(base) => sink.message(
                &format!("Common path that files share is: {}", base.display()),
                0,
            ),
            None => sink.message("Files do not share a common path", 0),
        }
    }

    let mut report = RunReport {
        common_base,
        files: Vec::with_capacity(files.len()),
    };

    for file in files {
        let file = file.as_ref();
        let source = canonicalize(file).map_err(|e| AdditionError::read(file, e))?;
        let mut buffered = BufferedFile::new(source, options.charset);
        let outcome = process_file(
            &mut buffered,
            additions,
            report.common_base.as_deref(),
            options,
            sink,
        )?;
        report.files.push(outcome);
    }

    tracing::debug!(
        files = report.files.len(),
        written = report.written(),
        dry_run = options.dry_run,
        "addition run finished"
    );
    Ok(report)
}

fn process_file<S>(
    file: &mut BufferedFile,
    additions: &[TextAddition],
    common_base: Option<&Path>,
    options: &RunOptions,
    sink: &mut S,
) -> Result<FileOutcome, AdditionError>
where
    S: ProgressSink + ?Sized,
{
    sink.message(&format!("Working on file {file}"), 0);

    let mut applied = Vec::new();
    let mut skipped = Vec::new();

    for (idx, addition) in additions.iter().enumerate() {
        let number = idx + 1;
        sink.message(
            &format!(
                "Evaluating text addition #{number} ({})",
                addition.position()
            ),
            1,
        );

        let apply = match addition.pattern() {
            Some(pattern) => {
                let contains = file.contains(pattern)?;
                let apply = addition.decide(contains);
                sink.message(
                    &format!(
                        "File {} contain the regex.",
                        if contains { "does" } else { "does not" }
                    ),
                    2,
                );
                if !apply {
                    sink.message(
                        &format!(
                            "Skipping because regex should{} be matched.",
                            if addition.is_inverted() { " not" } else { "" }
                        ),
                        2,
                    );
                }
                apply
            }
            None => true,
        };

        if !apply {
            skipped.push(number);
            continue;
        }

        file.add_text(addition.position(), addition.text(), addition.is_same_line());
        applied.push(number);
        let note = match (addition.text(), addition.position()) {
            (Some(_), Position::Prepend) => "Text will be prepended.",
            (Some(_), Position::Append) => "Text will be appended.",
            (None, Position::Prepend) => "Pending prepend text cleared.",
            (None, Position::Append) => "Pending append text cleared.",
        };
        sink.message(note, 2);
    }

    let destination =
        determine_file_location(file.path(), common_base, options.destination.as_deref())?;
    if options.destination.is_some() {
        sink.message(
            &format!("File will be written to: {}", destination.display()),
            1,
        );
    }

    let preview = if options.keep_preview {
        let before = file.original()?.to_string();
        let after = file.render()?;
        Some(Preview { before, after })
    } else {
        None
    };

    let written = if options.dry_run {
        // Only the output is skipped; an unreadable source still fails here.
        file.original()?;
        false
    } else {
        file.write(&destination)?;
        sink.message("File written.", 1);
        true
    };

    Ok(FileOutcome {
        source: file.path().to_path_buf(),
        destination,
        applied,
        skipped,
        written,
        preview,
    })
}
