//! multialign - Align configurable characters across neighboring lines

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use glob::Pattern;
use multialign::{align_until_stable, parse_args, Buffer, CliArgs, Config, Result, TextBuffer};
use rayon::prelude::*;
use walkdir::WalkDir;

/// Scope tokens derived from file extensions, for rule scope filters
const SCOPE_BY_EXTENSION: &[(&str, &str)] = &[
    ("py", "source.python"),
    ("f90", "source.modern-fortran"),
    ("f95", "source.modern-fortran"),
    ("f03", "source.modern-fortran"),
    ("f08", "source.modern-fortran"),
    ("f", "source.fixedform-fortran"),
    ("for", "source.fixedform-fortran"),
    ("rs", "source.rust"),
    ("c", "source.c"),
    ("h", "source.c"),
    ("sh", "source.shell"),
    ("toml", "source.toml"),
    ("yaml", "source.yaml"),
    ("yml", "source.yaml"),
];

/// Default maximum file size in bytes (100 MB)
/// Files larger than this are skipped to prevent memory exhaustion
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = parse_args();

    // Check if we should read from stdin
    let use_stdin =
        args.inputs.is_empty() || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");

    // If no inputs and running interactively, print usage; otherwise read from stdin
    if args.inputs.is_empty() && io::stdin().is_terminal() {
        print_usage();
        return Ok(());
    }

    if use_stdin {
        // Process stdin - use current directory for config discovery
        let config = build_config(&args, None)?;
        return process_stdin(&config, &args);
    }

    // Build base configuration for parallel processing
    // For explicit config files, we use one config for all files
    // For auto-discovery, each file may have its own config
    let use_per_file_config = args.config.is_none();
    let base_config = if use_per_file_config {
        None
    } else {
        Some(build_config(&args, None)?)
    };

    // Configure thread pool if --jobs specified
    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                eprintln!("Warning: failed to configure thread pool: {e}");
            }
        }
    }

    // Collect all files to process
    let files = collect_files(&args);

    if files.is_empty() {
        if !args.silent {
            eprintln!("No files found to align.");
        }
        return Ok(());
    }

    // Sequential processing keeps stdout output in input order
    let use_sequential = args.stdout || args.jobs == Some(1);
    let (changed, errors) = if use_sequential {
        process_files_sequential(&files, base_config.as_ref(), &args)
    } else {
        process_files_parallel(&files, base_config.as_ref(), &args)
    };

    if !args.silent {
        print_summary(files.len(), changed, errors);
    }

    Ok(())
}

fn print_summary(total: usize, changed: usize, errors: usize) {
    if errors == 0 {
        eprintln!("Aligned {total} files, {changed} changed.");
    } else {
        eprintln!("Aligned {total} files, {changed} changed, {errors} errors.");
    }
}

/// Build configuration from CLI args and optional config file
///
/// If `for_path` is provided and no explicit config file is specified,
/// uses auto-discovery to find config files in parent directories.
fn build_config(args: &CliArgs, for_path: Option<&Path>) -> Result<Config> {
    let mut config = if let Some(config_path) = &args.config {
        // Explicit config file specified
        if args.debug {
            eprintln!(
                "[DEBUG] Using explicit config file: {}",
                config_path.display()
            );
        }
        Config::from_toml_file(config_path)?
    } else if let Some(path) = for_path {
        // Auto-discover config files from parent directories
        if args.debug {
            let discovered = Config::discover_config_files(path);
            if discovered.is_empty() {
                eprintln!("[DEBUG] No config files discovered for: {}", path.display());
            } else {
                eprintln!("[DEBUG] Discovered config files for {}:", path.display());
                for f in &discovered {
                    eprintln!("[DEBUG]   - {}", f.display());
                }
            }
        }
        Config::from_discovered_files(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Config::from_discovered_files(&cwd)
    };

    // CLI arguments override file settings
    if let Some(tab_size) = args.tab_size {
        config.tab_size = tab_size;
    }
    if let Some(value) = args.break_at_empty_lines {
        config.break_at_empty_lines = value;
    }
    if let Some(value) = args.break_at_non_matching_lines {
        config.break_at_non_matching_lines = value;
    }

    if let Some(message) = config.validate() {
        anyhow::bail!("invalid configuration: {message}");
    }

    if args.debug {
        print_debug_config(&config);
    }

    Ok(config)
}

fn print_debug_config(config: &Config) {
    eprintln!("[DEBUG] Configuration:");
    eprintln!("[DEBUG]   tab_size: {}", config.tab_size);
    eprintln!(
        "[DEBUG]   break_at_empty_lines: {}",
        config.break_at_empty_lines
    );
    eprintln!(
        "[DEBUG]   break_at_non_matching_lines: {}",
        config.break_at_non_matching_lines
    );
    eprintln!("[DEBUG]   rules: {}", config.rules.len());
    for rule in &config.rules {
        if let Some(literal) = &rule.literal {
            eprintln!("[DEBUG]     - {literal:?} ({:?})", rule.alignment);
        }
    }
}

/// Scope token for a file, from the CLI override or the extension table
fn scope_for_path(path: &Path, args: &CliArgs) -> String {
    if let Some(scope) = &args.scope {
        return scope.clone();
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            SCOPE_BY_EXTENSION
                .iter()
                .find(|(known, _)| ext.eq_ignore_ascii_case(known))
                .map(|(_, scope)| (*scope).to_string())
        })
        .unwrap_or_else(|| "text.plain".to_string())
}

/// Align text and report whether anything changed
///
/// With `line` set, only the block around that 1-based line is aligned;
/// otherwise every row serves as an anchor in turn.
fn align_text(text: &str, scope: &str, config: &Config, line: Option<usize>) -> Result<(String, bool)> {
    let mut buffer = TextBuffer::new(text)
        .with_scope(scope)
        .with_tab_size(config.tab_size)
        .with_translate_tabs(config.translate_tabs_to_spaces);

    let rows: Vec<usize> = match line {
        Some(line) => {
            anyhow::ensure!(
                line >= 1 && line <= buffer.line_count(),
                "line {line} outside file of {} lines",
                buffer.line_count()
            );
            vec![line - 1]
        }
        None => (0..buffer.line_count()).collect(),
    };

    let mut changed = false;
    for row in rows {
        buffer.select_row(row);
        if align_until_stable(&mut buffer, config)? > 0 {
            changed = true;
        }
    }

    Ok((buffer.text(), changed))
}

/// Process stdin and write the aligned text to stdout
fn process_stdin(config: &Config, args: &CliArgs) -> Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let scope = args
        .scope
        .clone()
        .unwrap_or_else(|| "text.plain".to_string());
    let (aligned, _) = align_text(&input, &scope, config, args.line)?;

    io::stdout().write_all(aligned.as_bytes())?;
    Ok(())
}

/// Collect all files to process, handling directories and recursive flag
fn collect_files(args: &CliArgs) -> Vec<PathBuf> {
    // Compile exclude patterns
    let exclude_patterns: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut files = Vec::new();

    for input in &args.inputs {
        if input.is_file() {
            if !is_excluded(input, &exclude_patterns) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            if args.recursive {
                // WalkDir detects symlink loops when follow_links(true) and
                // returns errors for them; errors are skipped via filter_map.
                for entry in WalkDir::new(input)
                    .follow_links(true)
                    .max_depth(256)
                    .into_iter()
                    .filter_map(std::result::Result::ok)
                {
                    let path = entry.path();
                    if path.is_file()
                        && has_wanted_extension(path, &args.extensions)
                        && !is_excluded(path, &exclude_patterns)
                    {
                        files.push(path.to_path_buf());
                    }
                }
            } else {
                // Non-recursive: only direct children
                if let Ok(entries) = std::fs::read_dir(input) {
                    for entry in entries.filter_map(std::result::Result::ok) {
                        let path = entry.path();
                        if path.is_file()
                            && has_wanted_extension(&path, &args.extensions)
                            && !is_excluded(&path, &exclude_patterns)
                        {
                            files.push(path);
                        }
                    }
                }
            }
        }
    }

    files
}

/// Check if a path matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let path_str = path.to_string_lossy();

    for pattern in patterns {
        // Match against full path
        if pattern.matches(&path_str) {
            return true;
        }

        // Match against file name only
        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Match against each path component (for directory patterns)
        for component in path.components() {
            if let std::path::Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}

/// Check if a file carries one of the wanted extensions
///
/// An empty filter accepts every file.
fn has_wanted_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions.iter().any(|wanted| {
                let wanted = wanted.strip_prefix('.').unwrap_or(wanted);
                ext.eq_ignore_ascii_case(wanted)
            })
        })
}

/// Process files sequentially (for stdout output); returns (changed, errors)
fn process_files_sequential(
    files: &[PathBuf],
    base_config: Option<&Config>,
    args: &CliArgs,
) -> (usize, usize) {
    let mut changed_count = 0;
    let mut error_count = 0;

    for path in files {
        // Use base config if provided, otherwise discover per-file config
        let file_result = if let Some(config) = base_config {
            process_single_file(path, config, args)
        } else {
            match build_config(args, Some(path)) {
                Ok(config) => process_single_file(path, &config, args),
                Err(e) => Err(e),
            }
        };

        match file_result {
            Ok(changed) => {
                if changed {
                    changed_count += 1;
                }
            }
            Err(e) => {
                error_count += 1;
                eprintln!("Error aligning {}: {}", path.display(), e);
            }
        }
    }

    (changed_count, error_count)
}

/// Process files in parallel using Rayon; returns (changed, errors)
fn process_files_parallel(
    files: &[PathBuf],
    base_config: Option<&Config>,
    args: &CliArgs,
) -> (usize, usize) {
    let changed_count = AtomicUsize::new(0);
    let error_count = AtomicUsize::new(0);

    files.par_iter().for_each(|path| {
        // Use base config if provided, otherwise discover per-file config
        let file_result = if let Some(config) = base_config {
            process_single_file(path, config, args)
        } else {
            match build_config(args, Some(path)) {
                Ok(config) => process_single_file(path, &config, args),
                Err(e) => Err(e),
            }
        };

        match file_result {
            Ok(changed) => {
                if changed {
                    changed_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                error_count.fetch_add(1, Ordering::Relaxed);
                eprintln!("Error aligning {}: {}", path.display(), e);
            }
        }
    });

    (
        changed_count.load(Ordering::Relaxed),
        error_count.load(Ordering::Relaxed),
    )
}

/// Process a single file; returns whether the file changed
fn process_single_file(path: &PathBuf, config: &Config, args: &CliArgs) -> Result<bool> {
    // Check file size BEFORE reading to prevent memory exhaustion
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > DEFAULT_MAX_FILE_SIZE {
        if !args.silent {
            eprintln!(
                "Skipping {} ({} MB exceeds {} MB limit)",
                path.display(),
                metadata.len() / (1024 * 1024),
                DEFAULT_MAX_FILE_SIZE / (1024 * 1024)
            );
        }
        return Ok(false);
    }

    let contents = std::fs::read_to_string(path)?;
    let scope = scope_for_path(path, args);
    if args.debug {
        eprintln!("[DEBUG] {} scope: {scope}", path.display());
    }

    let (aligned, changed) = align_text(&contents, &scope, config, args.line)?;

    if args.stdout {
        io::stdout().write_all(aligned.as_bytes())?;
        return Ok(changed);
    }

    if changed {
        std::fs::write(path, aligned)?;
        if !args.silent {
            eprintln!("Aligned {}", path.display());
        }
    } else if args.debug {
        eprintln!("[DEBUG] {} already aligned", path.display());
    }

    Ok(changed)
}

fn print_usage() {
    eprintln!("multialign: no input files");
    eprintln!("Usage: multialign [OPTIONS] [FILE]...");
    eprintln!("       cat file | multialign [OPTIONS]");
    eprintln!("Try 'multialign --help' for more information.");
}
