//! Rule compilation.
//!
//! Turns the ordered [`RuleConfig`] list into a [`RuleSet`]: one pattern per
//! rule plus a single combined alternation used for scanning. Rule order is
//! preserved everywhere; it is both match priority and the slot order of the
//! anchor row.

use anyhow::Context;
use regex::Regex;

use crate::config::{Alignment, RuleConfig};
use crate::error::Result;

/// One compiled alignment rule
#[derive(Debug)]
pub struct AlignRule {
    /// Literal to align, verbatim from configuration
    pub literal: String,
    pub alignment: Alignment,
    pub spaces_left: usize,
    pub spaces_right: usize,
    pub is_in_scope: Vec<String>,
    pub not_in_scope: Vec<String>,
    pub is_enclosed_by: Vec<String>,
    pub not_enclosed_by: Vec<String>,
    pub is_left_of_char: Vec<String>,
    pub not_left_of_char: Vec<String>,
    pub is_right_of_char: Vec<String>,
    pub not_right_of_char: Vec<String>,
    /// The rule's own pattern; used to decide which rule owns an occurrence
    pattern: Regex,
}

impl AlignRule {
    /// Whether this rule applies under the given scope token
    #[must_use]
    pub fn matches_scope(&self, scope: &str) -> bool {
        if !self.is_in_scope.is_empty() && !self.is_in_scope.iter().any(|s| s == scope) {
            return false;
        }
        if !self.not_in_scope.is_empty() && self.not_in_scope.iter().any(|s| s == scope) {
            return false;
        }
        true
    }

    /// Whether this rule's pattern matches the captured literal text
    #[must_use]
    pub fn owns(&self, literal_text: &str) -> bool {
        self.pattern.is_match(literal_text)
    }
}

/// Ordered, compiled rule list plus the combined scanning pattern
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<AlignRule>,
    /// Alternation over all rule patterns, `None` when no rule survived
    combined: Option<Regex>,
}

impl RuleSet {
    /// Compile an ordered list of rule records
    ///
    /// Records without a literal are dropped; everything else is normalized
    /// by serde defaults before reaching this point. Literals are escaped,
    /// so compilation only fails on a malformed pattern, which indicates a
    /// bug rather than bad configuration.
    pub fn compile(configs: &[RuleConfig]) -> Result<Self> {
        let mut rules = Vec::new();
        let mut alternation = String::new();

        for config in configs {
            // Skip rule records without a literal
            let Some(literal) = config.literal.as_deref() else {
                continue;
            };
            if literal.is_empty() {
                continue;
            }

            let pattern_str = pattern_string(literal, &config.prefixes, config.alignment);
            let pattern = Regex::new(&pattern_str)
                .with_context(|| format!("invalid pattern for rule {literal:?}"))?;

            if !alternation.is_empty() {
                alternation.push('|');
            }
            alternation.push_str(&pattern_str);

            rules.push(AlignRule {
                literal: literal.to_string(),
                alignment: config.alignment,
                spaces_left: config.spaces_left,
                spaces_right: config.spaces_right,
                is_in_scope: config.is_in_scope.clone(),
                not_in_scope: config.not_in_scope.clone(),
                is_enclosed_by: config.is_enclosed_by.clone(),
                not_enclosed_by: config.not_enclosed_by.clone(),
                is_left_of_char: config.is_left_of_char.clone(),
                not_left_of_char: config.not_left_of_char.clone(),
                is_right_of_char: config.is_right_of_char.clone(),
                not_right_of_char: config.not_right_of_char.clone(),
                pattern,
            });
        }

        let combined = if rules.is_empty() {
            None
        } else {
            Some(Regex::new(&alternation).context("invalid combined alignment pattern")?)
        };

        Ok(RuleSet { rules, combined })
    }

    #[must_use]
    pub fn rule(&self, index: usize) -> &AlignRule {
        &self.rules[index]
    }

    #[must_use]
    pub fn rules(&self) -> &[AlignRule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn combined(&self) -> Option<&Regex> {
        self.combined.as_ref()
    }

    /// Literals of two slots compare equal iff their owning rules configure
    /// the same literal
    #[must_use]
    pub fn same_literal(&self, a: usize, b: usize) -> bool {
        self.rules[a].literal == self.rules[b].literal
    }

    /// First rule (priority order) whose pattern matches the captured text
    #[must_use]
    pub fn owner_of(&self, literal_text: &str) -> Option<usize> {
        self.rules.iter().position(|rule| rule.owns(literal_text))
    }
}

/// Build the pattern for one rule: leading whitespace group, optional
/// one-character prefix class, escaped literal, and a trailing whitespace
/// group that captures only for left-aligned rules.
fn pattern_string(literal: &str, prefixes: &[String], alignment: Alignment) -> String {
    let mut pattern = String::from(r"(\s*)(");
    if !prefixes.is_empty() {
        pattern.push_str("([");
        for prefix in prefixes {
            pattern.push_str(&regex::escape(prefix));
        }
        pattern.push_str("]?)");
    }
    pattern.push_str(&regex::escape(literal));
    pattern.push(')');
    if alignment == Alignment::Left {
        pattern.push_str(r"(\s*)");
    } else {
        pattern.push_str("()");
    }
    pattern
}
