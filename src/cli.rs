//! Command-line interface for multialign.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to align
    pub inputs: Vec<PathBuf>,

    /// Align only the block around this 1-based line (default: whole file)
    pub line: Option<usize>,

    /// Scope token override (default: derived from the file extension)
    pub scope: Option<String>,

    /// Tab width override
    pub tab_size: Option<usize>,

    /// Override for stopping block expansion at empty lines
    pub break_at_empty_lines: Option<bool>,

    /// Override for stopping block expansion at non-matching lines
    pub break_at_non_matching_lines: Option<bool>,

    /// Output to stdout instead of in-place
    pub stdout: bool,

    /// Config file path
    pub config: Option<PathBuf>,

    /// Recursive directory processing
    pub recursive: bool,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Only process files with these extensions when recursing
    pub extensions: Vec<String>,

    /// Number of parallel jobs (0 = auto, 1 = sequential)
    pub jobs: Option<usize>,

    /// Silent mode (no output)
    pub silent: bool,

    /// Enable debug output
    pub debug: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("multialign")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Align configurable characters across neighboring lines of text")
        .arg(
            Arg::new("inputs")
                .help("Files or directories to align")
                .value_name("FILE")
                .num_args(1..)
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("line")
                .short('l')
                .long("line")
                .help("Align only the block around this line (1-based)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("scope")
                .long("scope")
                .help("Scope token for rule filtering (e.g. source.python)")
                .value_name("SCOPE"),
        )
        .arg(
            Arg::new("tab-size")
                .short('t')
                .long("tab-size")
                .help("Number of columns a tab expands to [default: 4]")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("break-at-empty-lines")
                .long("break-at-empty-lines")
                .help("Stop block expansion at empty lines")
                .value_name("BOOL")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("break-at-non-matching-lines")
                .long("break-at-non-matching-lines")
                .help("Stop block expansion at lines without a matching slot")
                .value_name("BOOL")
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new("stdout")
                .short('s')
                .long("stdout")
                .help("Output to stdout instead of modifying files in-place")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to configuration file (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Recursively align directories")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files/directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("ext")
                .short('x')
                .long("ext")
                .help("Only process files with this extension when recursing (can be repeated)")
                .value_name("EXT")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto, 1=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("silent")
                .short('S')
                .long("silent")
                .help("Silent mode (no output, for editor integration)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (shows config and per-file decisions)")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        inputs: matches
            .get_many::<PathBuf>("inputs")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        line: matches.get_one::<usize>("line").copied(),
        scope: matches.get_one::<String>("scope").cloned(),
        tab_size: matches.get_one::<usize>("tab-size").copied(),
        break_at_empty_lines: matches.get_one::<bool>("break-at-empty-lines").copied(),
        break_at_non_matching_lines: matches
            .get_one::<bool>("break-at-non-matching-lines")
            .copied(),
        stdout: matches.get_flag("stdout"),
        config: matches.get_one::<PathBuf>("config").cloned(),
        recursive: matches.get_flag("recursive"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        extensions: matches
            .get_many::<String>("ext")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        silent: matches.get_flag("silent"),
        debug: matches.get_flag("debug"),
    }
}
