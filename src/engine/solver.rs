//! Target-column resolution.
//!
//! For each slot of the main row, pulls the target column up to the maximum
//! across every block row holding a compatible match at that slot.
//! Alignment always widens toward the most space-demanding row; it never
//! narrows below any participant.

use crate::engine::block::RowEntry;
use crate::engine::rules::RuleSet;
use crate::engine::scanner::AlignMatch;

/// Widen each main-row slot's target column to the block-wide maximum
pub fn solve_targets(main_slots: &mut [AlignMatch], entries: &[RowEntry], rules: &RuleSet) {
    for (i, main_slot) in main_slots.iter_mut().enumerate() {
        for entry in entries {
            let Some(slot) = entry.slots.get(i) else {
                continue;
            };
            if rules.same_literal(slot.rule_index, main_slot.rule_index)
                && slot.target_col > main_slot.target_col
            {
                main_slot.target_col = slot.target_col;
            }
        }
    }
}
