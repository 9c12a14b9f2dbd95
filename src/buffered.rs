//! Per-file edit buffer.
//!
//! A [`BufferedFile`] holds a target file's original content, loaded at most
//! once, plus the text accumulated for its head and tail. Nothing touches the
//! disk until a match query or [`BufferedFile::write`] needs the content.

use crate::addition::{Pattern, Position};
use crate::errors::AdditionError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Character set used to decode a file and encode it back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
pub enum Charset {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[serde(rename = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl Charset {
    pub fn decode(&self, bytes: Vec<u8>) -> io::Result<String> {
        match self {
            Charset::Utf8 => {
                String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            Charset::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(&self, text: &str) -> io::Result<Vec<u8>> {
        match self {
            Charset::Utf8 => Ok(text.as_bytes().to_vec()),
            Charset::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(c).map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("character {c:?} cannot be encoded as latin1"),
                        )
                    })
                })
                .collect(),
        }
    }
}

impl FromStr for Charset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Charset::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Charset::Latin1),
            other => Err(format!(
                "unsupported charset '{other}' (expected utf-8 or latin1)"
            )),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Charset::Utf8 => f.write_str("utf-8"),
            Charset::Latin1 => f.write_str("latin1"),
        }
    }
}

/// Text pending for one end of a file.
///
/// `Unset` and `Cleared` both render nothing; `Cleared` records that a
/// text-less addition reset this side. The next text after either starts a
/// fresh `Pending` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Accumulator {
    #[default]
    Unset,
    Cleared,
    Pending(String),
}

impl Accumulator {
    /// Add a fragment for `position`.
    ///
    /// Prepends get their line break after the fragment, appends before it,
    /// so both sides read in call order with the original content between
    /// them. `None` resets the side.
    pub fn push(&mut self, position: Position, text: Option<&str>, same_line: bool) {
        let Some(text) = text else {
            *self = Accumulator::Cleared;
            return;
        };

        if !matches!(self, Accumulator::Pending(_)) {
            *self = Accumulator::Pending(String::with_capacity(text.len() + 1));
        }
        if let Accumulator::Pending(acc) = self {
            match position {
                Position::Prepend => {
                    acc.push_str(text);
                    if !same_line {
                        acc.push('\n');
                    }
                }
                Position::Append => {
                    if !same_line {
                        acc.push('\n');
                    }
                    acc.push_str(text);
                }
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Accumulator::Pending(text) => Some(text),
            Accumulator::Unset | Accumulator::Cleared => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Accumulator::Pending(_))
    }
}

/// A target file plus everything queued for it.
#[derive(Debug)]
pub struct BufferedFile {
    path: PathBuf,
    charset: Charset,
    content: Option<String>,
    prepend: Accumulator,
    append: Accumulator,
}

impl BufferedFile {
    pub fn new(path: impl Into<PathBuf>, charset: Charset) -> Self {
        Self {
            path: path.into(),
            charset,
            content: None,
            prepend: Accumulator::Unset,
            append: Accumulator::Unset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// Original content, read from disk on first use only.
    pub fn original(&mut self) -> Result<&str, AdditionError> {
        if self.content.is_none() {
            let bytes = fs::read(&self.path).map_err(|e| AdditionError::read(&self.path, e))?;
            let text = self
                .charset
                .decode(bytes)
                .map_err(|e| AdditionError::read(&self.path, e))?;
            tracing::debug!(
                path = %self.path.display(),
                len = text.len(),
                charset = %self.charset,
                "loaded original content"
            );
            self.content = Some(text);
        }
        Ok(self.content.as_deref().unwrap_or_default())
    }

    /// Whether `pattern` matches anywhere in the original content.
    pub fn contains(&mut self, pattern: &Pattern) -> Result<bool, AdditionError> {
        Ok(pattern.is_match(self.original()?))
    }

    pub fn set_prepend_text(&mut self, text: Option<&str>, same_line: bool) {
        self.prepend.push(Position::Prepend, text, same_line);
    }

    pub fn set_append_text(&mut self, text: Option<&str>, same_line: bool) {
        self.append.push(Position::Append, text, same_line);
    }

    pub fn add_text(&mut self, position: Position, text: Option<&str>, same_line: bool) {
        match position {
            Position::Prepend => self.set_prepend_text(text, same_line),
            Position::Append => self.set_append_text(text, same_line),
        }
    }

    pub fn prepend_text(&self) -> Option<&str> {
        self.prepend.as_str()
    }

    pub fn append_text(&self) -> Option<&str> {
        self.append.as_str()
    }

    /// Final content: prepend block, original content, append block.
    pub fn render(&mut self) -> Result<String, AdditionError> {
        self.original()?;
        let original = self.content.as_deref().unwrap_or_default();
        let prepend = self.prepend.as_str().unwrap_or_default();
        let append = self.append.as_str().unwrap_or_default();

        let mut out = String::with_capacity(prepend.len() + original.len() + append.len());
        out.push_str(prepend);
        out.push_str(original);
        out.push_str(append);
        Ok(out)
    }

    /// Write the rendered content to `output`, replacing any file there and
    /// creating missing parent directories.
    pub fn write(&mut self, output: &Path) -> Result<(), AdditionError> {
        let rendered = self.render()?;
        let bytes = self
            .charset
            .encode(&rendered)
            .map_err(|e| AdditionError::write(output, e))?;
        atomic_write(output, &bytes).map_err(|e| AdditionError::write(output, e))?;
        tracing::debug!(
            source = %self.path.display(),
            output = %output.display(),
            len = bytes.len(),
            "wrote file"
        );
        Ok(())
    }
}

impl fmt::Display for BufferedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The tempfile lives in the destination directory so the rename never
/// crosses filesystems. An existing destination keeps its permissions.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory")
    })?;
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;

    if let Ok(existing) = fs::metadata(path) {
        temp.as_file().set_permissions(existing.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
