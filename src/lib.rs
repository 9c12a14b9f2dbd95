//! Easy Append: conditional prepend/append for sets of files
//!
//! Inserts text at the head and/or tail of files, optionally only when a
//! file's content matches (or does not match) a regular expression. Results
//! are written in place, or under a destination root that mirrors each
//! file's position relative to the lowest directory all files share.
//!
//! # Architecture
//!
//! - [`TextAddition`] is one immutable rule: text, side, condition.
//! - [`BufferedFile`] loads a file at most once and accumulates the text
//!   queued for its head and tail.
//! - [`paths`] computes the common base directory and each output location.
//! - [`apply_additions`] runs every rule against every file in order and
//!   reports progress through a caller-supplied [`ProgressSink`].
//!
//! # Example
//!
//! ```no_run
//! use easy_append::{apply_additions, RunOptions, TextAddition};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let additions = vec![
//!     TextAddition::prepend("// SPDX-License-Identifier: MIT")
//!         .when_contains("SPDX-License-Identifier")?
//!         .inverted(),
//!     TextAddition::append("// end of file"),
//! ];
//!
//! let mut print = |line: &str, level: usize| println!("{}{line}", "  ".repeat(level));
//! let report = apply_additions(
//!     &["src/main.rs", "src/lib.rs"],
//!     &additions,
//!     &RunOptions::under("out"),
//!     &mut print,
//! )?;
//! println!("{} files written", report.written());
//! # Ok(())
//! # }
//! ```

pub mod addition;
pub mod buffered;
pub mod config;
pub mod discover;
pub mod engine;
pub mod errors;
pub mod paths;

// Re-exports
pub use addition::{Pattern, PatternError, Position, TextAddition};
pub use buffered::{Accumulator, BufferedFile, Charset};
pub use config::{load_from_path, load_from_str, AdditionConfig, ConfigError};
pub use discover::{collect_files, DiscoverError};
pub use engine::{
    apply_additions, FileOutcome, Preview, ProgressSink, RunOptions, RunReport, Silent,
};
pub use errors::AdditionError;
pub use paths::{determine_common_path, determine_file_location};
