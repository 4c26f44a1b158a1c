//! Line scanning.
//!
//! Finds every occurrence of a configured literal on one line, resolves
//! which rule owns each occurrence, applies scope filters and contextual
//! predicates, and computes the occurrence's target column. The returned
//! matches are ordered by start offset; their positions in that order are
//! the row's slot indices.

use crate::engine::predicates::{is_enclosed_by, is_left_of, is_right_of};
use crate::engine::rules::RuleSet;

/// One matched occurrence on one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignMatch {
    /// Index of the owning rule in the rule set
    pub rule_index: usize,
    /// Start of the whole match, including captured leading whitespace
    pub start: usize,
    /// End of the whole match; for left-aligned rules this includes the
    /// captured trailing whitespace
    pub end: usize,
    /// Matched literal text, including the prefix character if one matched
    pub literal: String,
    /// Column the aligned boundary is pulled toward; widened later by the
    /// column solver
    pub target_col: usize,
}

/// Expand tabs to spaces, the way the scan and all column arithmetic expect
#[must_use]
pub fn expand_tabs(line: &str, tab_size: usize) -> String {
    line.replace('\t', &" ".repeat(tab_size))
}

/// Scan one tab-expanded line for alignment matches
#[must_use]
pub fn scan(line: &str, rules: &RuleSet, scope: &str) -> Vec<AlignMatch> {
    let Some(combined) = rules.combined() else {
        return Vec::new();
    };

    let mut matches = Vec::new();
    for caps in combined.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // Participating groups in index order: leading whitespace, literal
        // (with prefix), optional prefix, trailing whitespace
        let groups: Vec<regex::Match> = caps.iter().skip(1).flatten().collect();
        if groups.len() < 3 {
            continue;
        }
        let literal = groups[1];

        // First rule whose pattern matches the captured text owns the
        // occurrence; an occurrence owned by a scope-excluded rule yields
        // no match at all
        let Some(rule_index) = rules.owner_of(literal.as_str()) else {
            continue;
        };
        let rule = rules.rule(rule_index);
        if !rule.matches_scope(scope) {
            continue;
        }

        let occ_start = literal.start();
        if !rule.not_enclosed_by.is_empty() && is_enclosed_by(line, occ_start, &rule.not_enclosed_by)
        {
            continue;
        }
        if !rule.not_left_of_char.is_empty() && is_left_of(line, occ_start, &rule.not_left_of_char)
        {
            continue;
        }
        if !rule.not_right_of_char.is_empty()
            && is_right_of(line, occ_start, &rule.not_right_of_char)
        {
            continue;
        }
        if !rule.is_enclosed_by.is_empty() && !is_enclosed_by(line, occ_start, &rule.is_enclosed_by)
        {
            continue;
        }
        if !rule.is_left_of_char.is_empty() && !is_left_of(line, occ_start, &rule.is_left_of_char) {
            continue;
        }
        if !rule.is_right_of_char.is_empty()
            && !is_right_of(line, occ_start, &rule.is_right_of_char)
        {
            continue;
        }

        // At the line start the leading whitespace is indentation and must
        // not be widened; the target is wherever the literal already ends
        let target_col = if whole.start() == 0 {
            groups[0].len() + literal.len()
        } else {
            whole.start() + rule.spaces_left + literal.len()
        };

        matches.push(AlignMatch {
            rule_index,
            start: whole.start(),
            end: whole.end(),
            literal: literal.as_str().to_string(),
            target_col,
        });
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_rules, Alignment, RuleConfig};

    fn ruleset(configs: &[RuleConfig]) -> RuleSet {
        RuleSet::compile(configs).unwrap()
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx = 1", 4), "    x = 1");
        assert_eq!(expand_tabs("a\tb", 2), "a  b");
        assert_eq!(expand_tabs("none", 4), "none");
    }

    #[test]
    fn test_scan_simple_assignment() {
        let rules = ruleset(&[RuleConfig::new("=")]);
        let matches = scan("x = 1", &rules, "text.plain");
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.rule_index, 0);
        assert_eq!(m.start, 1);
        assert_eq!(m.end, 3);
        assert_eq!(m.literal, "=");
        // start(1) + spaces_left(1) + literal(1)
        assert_eq!(m.target_col, 3);
    }

    #[test]
    fn test_scan_no_rules() {
        let rules = ruleset(&[]);
        assert!(scan("x = 1", &rules, "text.plain").is_empty());
    }

    #[test]
    fn test_scan_target_at_line_start() {
        let rules = ruleset(&[RuleConfig::new("=")]);
        let matches = scan("= 1", &rules, "text.plain");
        assert_eq!(matches.len(), 1);
        // Leading whitespace (0) + literal length (1)
        assert_eq!(matches[0].target_col, 1);
    }

    #[test]
    fn test_scan_left_alignment_captures_trailing_whitespace() {
        let configs = vec![RuleConfig {
            alignment: Alignment::Left,
            spaces_left: 0,
            ..RuleConfig::new(":")
        }];
        let rules = ruleset(&configs);
        let matches = scan("a:   int", &rules, "text.plain");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].start, 1);
        // End includes the trailing whitespace run
        assert_eq!(matches[0].end, 5);
    }

    #[test]
    fn test_scan_prefix_character() {
        let rules = ruleset(&default_rules());
        let matches = scan("x += 1", &rules, "text.plain");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].literal, "+=");
        // start(1) + spaces_left(1) + literal(2)
        assert_eq!(matches[0].target_col, 4);
    }

    #[test]
    fn test_scan_priority_arrow_over_equals() {
        let rules = ruleset(&default_rules());
        let matches = scan("ptr => target", &rules, "text.plain");
        assert_eq!(matches.len(), 1);
        let rule = rules.rule(matches[0].rule_index);
        assert_eq!(rule.literal, "=>");
    }

    #[test]
    fn test_scan_scope_excluded_rule_yields_no_match() {
        let configs = vec![RuleConfig {
            is_in_scope: vec!["source.python".to_string()],
            ..RuleConfig::new("=")
        }];
        let rules = ruleset(&configs);
        assert!(scan("x = 1", &rules, "source.fortran").is_empty());
        assert_eq!(scan("x = 1", &rules, "source.python").len(), 1);
    }

    #[test]
    fn test_scan_not_enclosed_by() {
        let rules = ruleset(&default_rules());
        // '=' inside parentheses is excluded by the default rule
        let matches = scan("call foo(a = 1)", &rules, "text.plain");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_scan_not_enclosed_by_unclosed_nesting() {
        let rules = ruleset(&default_rules());
        // Odd (unclosed) nesting of '(' before '=' still counts as enclosed
        let matches = scan("foo((a = 1", &rules, "text.plain");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_scan_is_left_of() {
        let rules = ruleset(&default_rules());
        let matches = scan("from os import path", &rules, "source.python");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].literal, " import ");
        // 'import' without 'from' earlier fails the predicate
        assert!(scan("os import path", &rules, "source.python").is_empty());
    }

    #[test]
    fn test_scan_is_right_of() {
        let rules = ruleset(&default_rules());
        let scope = "source.modern-fortran";
        // ' intent' must have '::' somewhere after it
        let matches = scan("integer, intent(in) :: n", &rules, scope);
        assert!(matches
            .iter()
            .any(|m| rules.rule(m.rule_index).literal == " intent"));
        let matches = scan("integer, intent(in) n", &rules, scope);
        assert!(!matches
            .iter()
            .any(|m| rules.rule(m.rule_index).literal == " intent"));
    }

    #[test]
    fn test_scan_multiple_slots_ordered() {
        let rules = ruleset(&default_rules());
        let matches = scan("x = a: 1", &rules, "text.plain");
        assert_eq!(matches.len(), 2);
        assert!(matches[0].start < matches[1].start);
        assert_eq!(rules.rule(matches[0].rule_index).literal, "=");
        assert_eq!(rules.rule(matches[1].rule_index).literal, ":");
    }
}
