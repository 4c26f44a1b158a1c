//! Contextual predicates evaluated against a line and an occurrence start.
//!
//! All predicates are pure functions of `(line, occurrence_start, params)`;
//! they carry no state and can be tested in isolation. Offsets are byte
//! offsets into the tab-expanded line.

/// Whether the occurrence at `start` sits inside any of the given bracket
/// pairs.
///
/// Each pair is a 2-character string, e.g. `"()"`. For a pair with distinct
/// open/close characters a running nesting count over everything left of
/// `start` decides; non-zero means enclosed. For a pair with identical
/// open/close characters (e.g. `"\"\""`) the occurrence counts as enclosed
/// iff the character occurs both strictly before and strictly after `start`.
#[must_use]
pub fn is_enclosed_by(line: &str, start: usize, pairs: &[String]) -> bool {
    for pair in pairs {
        let mut chars = pair.chars();
        let (Some(open), Some(close)) = (chars.next(), chars.next()) else {
            continue;
        };

        if open == close {
            let single = open.to_string();
            if is_left_of(line, start, std::slice::from_ref(&single))
                && is_right_of(line, start, std::slice::from_ref(&single))
            {
                return true;
            }
            continue;
        }

        let mut level: i64 = 0;
        for (pos, ch) in line.char_indices() {
            if pos >= start {
                break;
            }
            if ch == open {
                level += 1;
            } else if ch == close {
                level -= 1;
            }
        }
        if level != 0 {
            return true;
        }
    }
    false
}

/// Whether the earliest occurrence of any literal in `literals` starts
/// strictly before `start`.
#[must_use]
pub fn is_left_of(line: &str, start: usize, literals: &[String]) -> bool {
    literals
        .iter()
        .filter_map(|lit| line.find(lit.as_str()))
        .min()
        .is_some_and(|pos| pos < start)
}

/// Whether any occurrence of any literal in `literals` starts strictly
/// after `start`.
///
/// Literals are matched as whole tokens, not character classes; a
/// multi-character literal only counts when it occurs verbatim.
#[must_use]
pub fn is_right_of(line: &str, start: usize, literals: &[String]) -> bool {
    literals
        .iter()
        .any(|lit| line.match_indices(lit.as_str()).any(|(pos, _)| pos > start))
}
