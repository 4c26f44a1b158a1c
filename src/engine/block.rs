//! Block expansion.
//!
//! Starting from each selection's anchor row, walks upward and downward to
//! collect the neighboring rows that belong to the same alignment block:
//! same indentation as the anchor, and a slot sequence that is a
//! literal-by-literal prefix of the main row's sequence.

use std::sync::LazyLock;

use regex::Regex;

use crate::buffer::{Buffer, Selection};
use crate::engine::rules::RuleSet;
use crate::engine::scanner::{scan, AlignMatch};
use crate::engine::{line_text, AlignContext};

// Leading whitespace up to the first non-whitespace character
static INDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)\S").unwrap());

/// One row participating in a block
#[derive(Debug, Clone)]
pub struct RowEntry {
    /// Buffer row index
    pub row: usize,
    /// Anchor row of the block this entry belongs to
    pub anchor_row: usize,
    /// Walk direction from the anchor: -1 up, 0 the anchor itself, 1 down
    pub direction: i32,
    /// Slot matches, truncated to the prefix compatible with the main row
    pub slots: Vec<AlignMatch>,
}

/// Indentation of a tab-expanded line, or `None` for a blank line
#[must_use]
pub fn indentation(line: &str, ctx: &AlignContext) -> Option<usize> {
    let caps = INDENT_RE.captures(line)?;
    let width = caps.get(1).map_or(0, |m| m.len());
    if ctx.translate_tabs_to_spaces {
        Some(width / ctx.tab_size)
    } else {
        Some(width)
    }
}

/// Truncate a row's slot list to the longest prefix whose literals match the
/// main row's slot literals position by position
fn truncate_to_prefix(
    scanned: Vec<AlignMatch>,
    main_slots: &[AlignMatch],
    rules: &RuleSet,
) -> Vec<AlignMatch> {
    let mut checked = Vec::new();
    for (slot, main_slot) in scanned.into_iter().zip(main_slots) {
        if !rules.same_literal(slot.rule_index, main_slot.rule_index) {
            break;
        }
        checked.push(slot);
    }
    checked
}

/// Expand one block per selection and merge the row entries
///
/// Entry order per block: anchor row first, then rows walking upward, then
/// rows walking downward. Later blocks may revisit a row already collected
/// by an earlier one; the planner's per-row bookkeeping lets the later entry
/// win.
#[must_use]
pub fn expand_blocks(
    buffer: &dyn Buffer,
    ctx: &AlignContext,
    rules: &RuleSet,
    main_slots: &[AlignMatch],
    selections: &[Selection],
) -> Vec<RowEntry> {
    let mut entries = Vec::new();

    for selection in selections {
        let anchor_row = selection.start.row;
        let anchor_line = line_text(buffer, ctx, anchor_row);
        let slots = scan(&anchor_line, rules, &ctx.scope);
        if slots.is_empty() {
            continue;
        }
        let anchor_indent = indentation(&anchor_line, ctx);

        // The anchor row enters with its full slot list, untruncated
        entries.push(RowEntry {
            row: anchor_row,
            anchor_row,
            direction: 0,
            slots,
        });

        for direction in [-1i32, 1] {
            let mut row = i64::try_from(anchor_row).unwrap_or(i64::MAX) + i64::from(direction);
            while row >= 0 && row < i64::try_from(ctx.line_count).unwrap_or(i64::MAX) {
                #[allow(clippy::cast_sign_loss)]
                let row_index = row as usize;
                let line = line_text(buffer, ctx, row_index);

                match indentation(&line, ctx) {
                    None => {
                        // Blank line: stop or skip depending on configuration
                        if ctx.break_at_empty_lines {
                            break;
                        }
                        row += i64::from(direction);
                        continue;
                    }
                    Some(indent) if Some(indent) != anchor_indent => break,
                    Some(_) => {}
                }

                let scanned = scan(&line, rules, &ctx.scope);
                let checked = truncate_to_prefix(scanned, main_slots, rules);

                if checked.is_empty() {
                    if ctx.break_at_non_matching_lines {
                        break;
                    }
                    row += i64::from(direction);
                    continue;
                }

                entries.push(RowEntry {
                    row: row_index,
                    anchor_row,
                    direction,
                    slots: checked,
                });
                row += i64::from(direction);
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use crate::config::{default_rules, Config, RuleConfig};

    fn context(buffer: &TextBuffer, config: &Config) -> AlignContext {
        AlignContext::new(buffer, config, "text.plain".to_string())
    }

    fn equals_rules() -> RuleSet {
        RuleSet::compile(&[RuleConfig::new("=")]).unwrap()
    }

    fn expand(buffer: &TextBuffer, config: &Config, rules: &RuleSet, anchor: usize) -> Vec<RowEntry> {
        let ctx = context(buffer, config);
        let main_slots = scan(&line_text(buffer, &ctx, anchor), rules, &ctx.scope);
        expand_blocks(
            buffer,
            &ctx,
            rules,
            &main_slots,
            &[Selection::caret(anchor)],
        )
    }

    #[test]
    fn test_indentation() {
        let buffer = TextBuffer::new("");
        let ctx = context(&buffer, &Config::default());
        assert_eq!(indentation("x = 1", &ctx), Some(0));
        assert_eq!(indentation("    x = 1", &ctx), Some(4));
        assert_eq!(indentation("", &ctx), None);
        assert_eq!(indentation("   ", &ctx), None);
    }

    #[test]
    fn test_indentation_tab_stops() {
        // Tab settings live on the buffer; the context picks them up there
        let buffer = TextBuffer::new("").with_translate_tabs(true);
        let ctx = context(&buffer, &Config::default());
        assert_eq!(indentation("        x", &ctx), Some(2));
    }

    #[test]
    fn test_expand_contiguous_rows() {
        let buffer = TextBuffer::new("a = 1\nbb = 22\nccc = 333");
        let entries = expand(&buffer, &Config::default(), &equals_rules(), 1);
        let mut rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2]);
        // Anchor entry comes first
        assert_eq!(entries[0].row, 1);
        assert_eq!(entries[0].direction, 0);
    }

    #[test]
    fn test_expand_stops_at_blank_line() {
        let buffer = TextBuffer::new("a = 1\n\nb = 2");
        let entries = expand(&buffer, &Config::default(), &equals_rules(), 0);
        let rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn test_expand_skips_blank_line_when_configured() {
        let config = Config {
            break_at_empty_lines: false,
            ..Default::default()
        };
        let buffer = TextBuffer::new("a = 1\n\nb = 2");
        let entries = expand(&buffer, &config, &equals_rules(), 0);
        let mut rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        rows.sort_unstable();
        // Blank row 1 is skipped, not included and not a stop
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn test_expand_stops_at_indent_change() {
        let buffer = TextBuffer::new("a = 1\n    b = 2");
        let entries = expand(&buffer, &Config::default(), &equals_rules(), 0);
        let rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn test_expand_stops_at_non_matching_line() {
        let buffer = TextBuffer::new("a = 1\nno assignment\nb = 2");
        let entries = expand(&buffer, &Config::default(), &equals_rules(), 0);
        let rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![0]);
    }

    #[test]
    fn test_expand_skips_non_matching_line_when_configured() {
        let config = Config {
            break_at_non_matching_lines: false,
            ..Default::default()
        };
        let buffer = TextBuffer::new("a = 1\nno assignment\nb = 2");
        let entries = expand(&buffer, &config, &equals_rules(), 0);
        let mut rows: Vec<usize> = entries.iter().map(|e| e.row).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn test_truncation_keeps_matching_prefix() {
        // Anchor has slots '=' then ':'; neighbor has '=' then '=' at the
        // second position, so only the first slot survives
        let rules = RuleSet::compile(&default_rules()).unwrap();
        let buffer = TextBuffer::new("a = b: 1\nc = d = 2");
        let config = Config::default();
        let ctx = context(&buffer, &config);
        let main_slots = scan(&line_text(&buffer, &ctx, 0), &rules, &ctx.scope);
        assert_eq!(main_slots.len(), 2);
        let entries = expand_blocks(&buffer, &ctx, &rules, &main_slots, &[Selection::caret(0)]);
        let neighbor = entries.iter().find(|e| e.row == 1).unwrap();
        assert_eq!(neighbor.slots.len(), 1);
        assert_eq!(rules.rule(neighbor.slots[0].rule_index).literal, "=");
    }

    #[test]
    fn test_selection_without_matches_contributes_nothing() {
        let buffer = TextBuffer::new("plain text\nmore text");
        let config = Config::default();
        let ctx = context(&buffer, &config);
        let rules = equals_rules();
        let entries = expand_blocks(&buffer, &ctx, &rules, &[], &[Selection::caret(0)]);
        assert!(entries.is_empty());
    }
}
