//! The alignment engine.
//!
//! One invocation corresponds to one user action and flows through the
//! submodules in order:
//! - [`rules`]: compiles the configured rule list into matchers
//! - [`scanner`]: finds a row's occurrences under predicates ([`predicates`])
//! - [`block`]: expands each selection into a block of compatible rows
//! - [`solver`]: resolves target columns across all blocks
//! - [`planner`]: picks the single slot requiring realignment
//! - [`rewriter`]: rebuilds and commits the affected lines
//!
//! Nothing mutates the buffer until the full set of replacement lines is
//! computed; an invocation either rewrites every row of the scheduled slot
//! or none.

pub mod block;
pub mod planner;
pub mod predicates;
pub mod rewriter;
pub mod rules;
pub mod scanner;
pub mod solver;

use anyhow::ensure;

pub use block::{expand_blocks, RowEntry};
pub use planner::{plan, SlotPlan};
pub use rewriter::{build_edits, commit, Edit};
pub use rules::{AlignRule, RuleSet};
pub use scanner::{expand_tabs, scan, AlignMatch};
pub use solver::solve_targets;

use crate::buffer::Buffer;
use crate::config::Config;
use crate::error::Result;

/// Immutable per-invocation context threaded through every component
#[derive(Debug, Clone)]
pub struct AlignContext {
    pub tab_size: usize,
    pub translate_tabs_to_spaces: bool,
    /// Scope token at the first selection; fixed for the whole invocation
    pub scope: String,
    pub line_count: usize,
    pub break_at_empty_lines: bool,
    pub break_at_non_matching_lines: bool,
}

impl AlignContext {
    #[must_use]
    pub fn new(buffer: &dyn Buffer, config: &Config, scope: String) -> Self {
        AlignContext {
            tab_size: buffer.tab_size(),
            translate_tabs_to_spaces: buffer.translate_tabs_to_spaces(),
            scope,
            line_count: buffer.line_count(),
            break_at_empty_lines: config.break_at_empty_lines,
            break_at_non_matching_lines: config.break_at_non_matching_lines,
        }
    }
}

/// Tab-expanded text of one line; all scanning and column arithmetic works
/// on this form
pub(crate) fn line_text(buffer: &dyn Buffer, ctx: &AlignContext, row: usize) -> String {
    expand_tabs(buffer.line(row), ctx.tab_size)
}

/// Result of one alignment invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOutcome {
    /// No selection, or the anchor row has no matching slot
    NoAnchor,
    /// Every slot already sits at its target column
    Stable,
    /// One slot was realigned across `rows` rows
    Realigned { slot: usize, rows: usize },
}

/// Run one alignment invocation against the buffer
///
/// At most one slot is rewritten per call; repeated invocation converges to
/// a stable buffer ([`AlignOutcome::Stable`]).
pub fn align_once(buffer: &mut dyn Buffer, config: &Config) -> Result<AlignOutcome> {
    let selections = buffer.selections();
    let Some(first) = selections.first() else {
        return Ok(AlignOutcome::NoAnchor);
    };

    let scope = buffer.scope_at(first.start);
    let ctx = AlignContext::new(buffer, config, scope);
    let rules = RuleSet::compile(&config.rules)?;

    let main_row = first.start.row;
    ensure!(
        main_row < ctx.line_count,
        "selection row {main_row} outside buffer of {} lines",
        ctx.line_count
    );

    let mut main_slots = scan(&line_text(buffer, &ctx, main_row), &rules, &ctx.scope);
    if main_slots.is_empty() {
        return Ok(AlignOutcome::NoAnchor);
    }

    let entries = expand_blocks(buffer, &ctx, &rules, &main_slots, &selections);
    solve_targets(&mut main_slots, &entries, &rules);

    match plan(buffer, &ctx, &rules, &main_slots, &entries) {
        Some(slot_plan) => {
            let edits = build_edits(buffer, &ctx, &rules, &slot_plan);
            let rows = edits.len();
            let slot = slot_plan.slot;
            commit(buffer, edits);
            Ok(AlignOutcome::Realigned { slot, rows })
        }
        None => Ok(AlignOutcome::Stable),
    }
}

/// Upper bound on invocations per anchor before giving up
///
/// Each invocation settles one slot, so convergence normally takes at most
/// one pass per slot plus one stable pass; the bound only guards against a
/// pathological rule set.
const MAX_PASSES: usize = 64;

/// Re-invoke [`align_once`] on the current selection until stable
///
/// Returns the number of invocations that rewrote the buffer.
pub fn align_until_stable(buffer: &mut dyn Buffer, config: &Config) -> Result<usize> {
    let mut rewrites = 0;
    for _ in 0..MAX_PASSES {
        match align_once(buffer, config)? {
            AlignOutcome::Realigned { .. } => rewrites += 1,
            AlignOutcome::Stable | AlignOutcome::NoAnchor => break,
        }
    }
    Ok(rewrites)
}
