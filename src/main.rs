use anyhow::{anyhow, bail, Result};
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use colored::Colorize;
use easy_append::config::{load_from_path, AdditionConfig};
use easy_append::{
    apply_additions, collect_files, AdditionError, Charset, Pattern, Position, ProgressSink,
    RunOptions, RunReport, TextAddition,
};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "easy-append")]
#[command(about = "Conditionally prepend and append text to files", long_about = None)]
#[command(version)]
struct Cli {
    /// Files to modify (directories too, with --recursive)
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Text to prepend; repeat to stack several lines in order
    #[arg(short, long, value_name = "TEXT")]
    prepend: Vec<String>,

    /// Text to append; repeat to stack several lines in order
    #[arg(short, long, value_name = "TEXT")]
    append: Vec<String>,

    /// Apply the preceding --prepend/--append only to files matching REGEX
    #[arg(short, long, value_name = "REGEX")]
    contains: Vec<String>,

    /// Apply the preceding --prepend/--append only to files NOT matching its --contains
    #[arg(
        short,
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    invert: Vec<bool>,

    /// Join the preceding --prepend/--append without a line break
    #[arg(
        short,
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    same_line: Vec<bool>,

    /// TOML file of additions, applied before command-line additions
    #[arg(short = 'f', long, value_name = "FILE")]
    additions: Option<PathBuf>,

    /// Write results under this directory instead of in place
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Dry run - show what would be changed without writing files
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Process every file below directory arguments
    #[arg(short, long)]
    recursive: bool,

    /// Character set of the files: utf-8 (default) or latin1
    #[arg(long, value_name = "CHARSET")]
    charset: Option<Charset>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Exit codes: 1 invalid arguments or configuration, 2 unreadable source,
/// 3 unwritable destination.
fn main() -> ExitCode {
    let (cli, matches) = match parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Help and version requests also arrive here, on stdout.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_tracing(cli.verbose);

    match run(cli, &matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = match e.downcast_ref::<AdditionError>() {
                Some(AdditionError::Read { .. }) => {
                    eprintln!(
                        "{}",
                        "One or more of the file(s) to modify could not be read.".red()
                    );
                    2
                }
                Some(AdditionError::Write { .. }) => {
                    eprintln!("{}", "Could not write the output file(s).".red());
                    3
                }
                None => 1,
            };
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(code)
        }
    }
}

/// Typed arguments plus the raw matches, which keep the command-line
/// position of every flag.
fn parse_args<I, T>(args: I) -> Result<(Cli, ArgMatches), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = Cli::command().try_get_matches_from(args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    Ok((cli, matches))
}

/// Logging goes to stderr; `EASY_APPEND_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("EASY_APPEND_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Prints progress lines, indented two spaces per level.
struct ConsolePrinter {
    quiet: bool,
}

impl ProgressSink for ConsolePrinter {
    fn message(&mut self, text: &str, level: usize) {
        if self.quiet {
            return;
        }
        let indent = "  ".repeat(level);
        match level {
            0 => println!("{indent}{}", text.bold()),
            1 => println!("{indent}{text}"),
            _ => println!("{indent}{}", text.dimmed()),
        }
    }
}

fn run(cli: Cli, matches: &ArgMatches) -> Result<()> {
    // 1. Collect additions: file first, then command line
    let config = cli.additions.as_deref().map(load_from_path).transpose()?;
    let mut additions = match &config {
        Some(config) => {
            if !cli.quiet {
                report_config(config, cli.additions.as_deref());
            }
            config.to_additions()?
        }
        None => Vec::new(),
    };
    additions.extend(command_line_additions(&cli, matches)?);

    if additions.is_empty() {
        bail!(
            "Nothing to add. Pass --prepend/--append or an additions file with --additions"
        );
    }

    // 2. Resolve target files
    let files = collect_files(&cli.files, cli.recursive)?;

    // 3. Command line overrides the additions file
    let meta = config.as_ref().map(|c| &c.meta);
    let options = RunOptions {
        destination: cli
            .output
            .clone()
            .or_else(|| meta.and_then(|m| m.destination.clone())),
        dry_run: cli.dry_run,
        charset: cli
            .charset
            .or_else(|| meta.and_then(|m| m.charset))
            .unwrap_or_default(),
        keep_preview: cli.diff,
    };

    if cli.dry_run && !cli.quiet {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    // 4. Apply
    let mut printer = ConsolePrinter { quiet: cli.quiet };
    let report = apply_additions(&files, &additions, &options, &mut printer)?;

    // 5. Report
    if cli.diff {
        for outcome in &report.files {
            if let Some(preview) = &outcome.preview {
                if preview.before != preview.after {
                    display_diff(&outcome.destination, &preview.before, &preview.after);
                }
            }
        }
    }

    if !cli.quiet {
        print_summary(&report, cli.dry_run);
    }

    Ok(())
}

fn report_config(config: &AdditionConfig, path: Option<&Path>) {
    let source = path.map(|p| p.display().to_string()).unwrap_or_default();
    if config.meta.name.is_empty() {
        println!(
            "Loaded {} additions from {}",
            config.additions.len(),
            source
        );
    } else {
        println!(
            "Loaded {} additions from {} ({})",
            config.additions.len(),
            source,
            config.meta.name
        );
    }
    if let Some(description) = &config.meta.description {
        println!("{}", description.dimmed());
    }
}

#[derive(Debug, Default, Clone)]
struct Modifiers<'a> {
    contains: Option<&'a str>,
    inverted: bool,
    same_line: bool,
}

/// Additions given as flags, in command-line order.
///
/// `--contains`, `--invert` and `--same-line` modify the closest
/// `--prepend`/`--append` before them.
fn command_line_additions(cli: &Cli, matches: &ArgMatches) -> Result<Vec<TextAddition>> {
    let mut texts: Vec<(usize, Position, &str)> = Vec::new();
    for (idx, text) in indices(matches, "prepend").into_iter().zip(&cli.prepend) {
        texts.push((idx, Position::Prepend, text));
    }
    for (idx, text) in indices(matches, "append").into_iter().zip(&cli.append) {
        texts.push((idx, Position::Append, text));
    }
    texts.sort_by_key(|(idx, ..)| *idx);

    let owner = |idx: usize, flag: &str| {
        texts
            .iter()
            .rposition(|(at, ..)| *at < idx)
            .ok_or_else(|| anyhow!("{flag} must follow a --prepend or --append"))
    };

    let mut modifiers = vec![Modifiers::default(); texts.len()];
    for (idx, regex) in indices(matches, "contains").into_iter().zip(&cli.contains) {
        let slot = &mut modifiers[owner(idx, "--contains")?];
        if slot.contains.replace(regex.as_str()).is_some() {
            bail!("--contains given twice for the same --prepend/--append");
        }
    }
    for (idx, inverted) in indices(matches, "invert").into_iter().zip(&cli.invert) {
        modifiers[owner(idx, "--invert")?].inverted = *inverted;
    }
    for (idx, same_line) in indices(matches, "same_line").into_iter().zip(&cli.same_line) {
        modifiers[owner(idx, "--same-line")?].same_line = *same_line;
    }

    let mut additions = Vec::with_capacity(texts.len());
    for ((_, position, text), modifiers) in texts.iter().zip(modifiers) {
        if modifiers.inverted && modifiers.contains.is_none() {
            bail!("--invert needs a --contains for the same --{position}");
        }
        let pattern = modifiers.contains.map(Pattern::new).transpose()?;
        let mut addition = TextAddition::new(*position, Some(unescape(text))).with_pattern(pattern);
        if modifiers.inverted {
            addition = addition.inverted();
        }
        if modifiers.same_line {
            addition = addition.same_line();
        }
        additions.push(addition);
    }
    Ok(additions)
}

fn indices(matches: &ArgMatches, id: &str) -> Vec<usize> {
    matches
        .indices_of(id)
        .map(Iterator::collect)
        .unwrap_or_default()
}

/// Expand `\n`, `\t` and `\\` in command-line text.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (modified)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
        if change.missing_newline() {
            println!();
        }
    }
}

fn print_summary(report: &RunReport, dry_run: bool) {
    let changed = report.files.iter().filter(|f| f.changed()).count();
    let unchanged = report.files.len() - changed;

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} files processed", report.files.len());
    if dry_run {
        println!("  {} would be written", format!("{}", report.files.len()).cyan());
    } else {
        println!("  {} written", format!("{}", report.written()).green());
    }
    println!("  {} with additions", format!("{}", changed).green());
    println!("  {} without additions", format!("{}", unchanged).yellow());
}
