//! multialign - Align configurable characters across neighboring lines
//!
//! Aligns a chosen character (`=`, `:`, `::`, ...) across a contiguous run
//! of lines, honoring per-rule spacing, scope filters and contextual
//! predicates (enclosure, adjacency).

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

pub mod buffer;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;

// Re-export commonly used types
pub use buffer::{Buffer, Position, Selection, TextBuffer};
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::{Alignment, Config, RuleConfig};
pub use engine::{align_once, align_until_stable, AlignOutcome};
pub use error::Result;
