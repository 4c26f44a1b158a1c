//! Line rewriting.
//!
//! Applies one slot plan: every participating row is rebuilt as the
//! unchanged prefix, the padding and literal, and the trailing-trimmed
//! remainder. All replacement lines are computed before the first buffer
//! write, so a failure can never leave a partial rewrite behind.

use crate::buffer::Buffer;
use crate::engine::planner::SlotPlan;
use crate::engine::rules::RuleSet;
use crate::engine::{line_text, AlignContext};
use crate::Alignment;

/// One pending line replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub row: usize,
    pub text: String,
}

/// Compute the replacement text for every row of the scheduled slot
#[must_use]
pub fn build_edits(
    buffer: &dyn Buffer,
    ctx: &AlignContext,
    rules: &RuleSet,
    plan: &SlotPlan,
) -> Vec<Edit> {
    let rule = rules.rule(plan.rule_index);
    let mut edits = Vec::with_capacity(plan.rows.len());

    for (&row, slot) in &plan.rows {
        let line = line_text(buffer, ctx, row);
        let literal_len = slot.literal.len();

        let (spaces_left, mut spaces_right) = match rule.alignment {
            Alignment::Left => (
                rule.spaces_left,
                (plan.target_col + rule.spaces_right).saturating_sub(slot.start + literal_len),
            ),
            Alignment::Right => (
                plan.target_col.saturating_sub(slot.start + literal_len),
                rule.spaces_right,
            ),
        };

        // Never pad at end of line
        if slot.end == line.len() {
            spaces_right = 0;
        }

        let mut text = String::with_capacity(line.len() + spaces_left + spaces_right);
        text.push_str(&line[..slot.start]);
        text.push_str(&" ".repeat(spaces_left));
        text.push_str(&slot.literal);
        text.push_str(&" ".repeat(spaces_right));
        text.push_str(line[slot.end..].trim());

        edits.push(Edit { row, text });
    }

    edits
}

/// Commit all edits; one transaction from the caller's point of view
pub fn commit(buffer: &mut dyn Buffer, edits: Vec<Edit>) {
    for edit in edits {
        buffer.replace_line(edit.row, edit.text);
    }
}
