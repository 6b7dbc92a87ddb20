// guard.rs — ReDoS guard for user-supplied regex patterns.
//
// Policy rules may carry a `matches` predicate whose pattern comes from a
// user-editable document. A pattern like `(a+)+` backtracks exponentially
// on non-matching input, so patterns are screened for nested-quantifier
// shapes before they are ever handed to the regex compiler. Rejected or
// uncompilable patterns simply never match (fail-closed).

use regex::Regex;

/// Patterns longer than this are rejected outright.
const MAX_PATTERN_CHARS: usize = 256;

/// Returns true if `pattern` is free of nested-quantifier shapes.
///
/// The scan tracks group nesting and character classes: a group that
/// contains a quantifier (at any depth) and is itself followed by an
/// unbounded quantifier (`*`, `+`, `{`) is the classic catastrophic
/// backtracking shape and is rejected.
pub fn is_safe_pattern(pattern: &str) -> bool {
    if pattern.chars().count() > MAX_PATTERN_CHARS {
        return false;
    }

    // One entry per currently-open group: does it contain a quantifier?
    let mut open_groups: Vec<bool> = Vec::new();
    // Set when the previous char closed a group that contained a quantifier.
    let mut closed_quantified = false;
    let mut in_class = false;
    let mut escaped = false;
    // Set right after `(` so the `?` of `(?:`/`(?i)` is read as a group
    // modifier, not a quantifier.
    let mut just_opened = false;

    for c in pattern.chars() {
        if escaped {
            escaped = false;
            closed_quantified = false;
            just_opened = false;
            continue;
        }
        let was_just_opened = just_opened;
        just_opened = false;
        match c {
            '\\' => {
                escaped = true;
                closed_quantified = false;
            }
            '[' if !in_class => {
                in_class = true;
                closed_quantified = false;
            }
            ']' if in_class => {
                in_class = false;
                closed_quantified = false;
            }
            _ if in_class => {}
            '(' => {
                open_groups.push(false);
                closed_quantified = false;
                just_opened = true;
            }
            ')' => {
                let contained = open_groups.pop().unwrap_or(false);
                // A quantified subgroup counts as a quantifier in the parent.
                if let Some(parent) = open_groups.last_mut() {
                    *parent |= contained;
                }
                closed_quantified = contained;
            }
            '*' | '+' | '{' => {
                if closed_quantified {
                    return false;
                }
                if let Some(top) = open_groups.last_mut() {
                    *top = true;
                }
                closed_quantified = false;
            }
            '?' => {
                // `?` is bounded (0 or 1) so it is safe as an outer
                // quantifier, but it still marks the group as quantified:
                // `(a?)*` is ambiguous and backtracks. Directly after `(`
                // it is a group modifier instead.
                if !was_just_opened {
                    if let Some(top) = open_groups.last_mut() {
                        *top = true;
                    }
                }
                closed_quantified = false;
            }
            _ => {
                closed_quantified = false;
            }
        }
    }
    true
}

/// Compile `pattern` if and only if it passes the guard.
///
/// Returns `None` both for rejected shapes and for patterns the regex
/// compiler itself refuses.
pub fn compile_safe(pattern: &str) -> Option<Regex> {
    if !is_safe_pattern(pattern) {
        return None;
    }
    Regex::new(pattern).ok()
}
