//! Token rewriting for sugared prefixes and suffixes.
//!
//! A rule fires when a token starts (prefix rules) or ends (suffix rules) with
//! its trigger character and something is left after stripping it. Each
//! template string has `{}` replaced by that remainder, and the results are
//! parsed in order as ordinary tokens.
//!
//! | token   | expands to         |
//! |---------|--------------------|
//! | `(xs`   | `(` `xs`           |
//! | `xs)`   | `xs` `)`           |
//! | `op$`   | `:op` `foldl`      |
//! | `name?` | `:name` `get`      |
//! | `op.`   | `:op` `map`        |
//! | `name=` | `:name` `set`      |

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone)]
pub struct MacroRule {
    pub trigger: char,
    pub anchor: Anchor,
    pub template: &'static [&'static str],
}

impl MacroRule {
    /// Remainder of `token` once the trigger is stripped, if this rule applies
    fn strip<'a>(&self, token: &'a str) -> Option<&'a str> {
        let remainder = match self.anchor {
            Anchor::Prefix => token.strip_prefix(self.trigger),
            Anchor::Suffix => token.strip_suffix(self.trigger),
        }?;
        (!remainder.is_empty()).then_some(remainder)
    }

    fn instantiate(&self, remainder: &str) -> Vec<String> {
        self.template
            .iter()
            .map(|part| part.replace("{}", remainder))
            .collect()
    }
}

/// Prefix rules come first; the first matching rule wins
static MACRO_RULES: &[MacroRule] = &[
    MacroRule {
        trigger: '(',
        anchor: Anchor::Prefix,
        template: &["(", "{}"],
    },
    MacroRule {
        trigger: ')',
        anchor: Anchor::Suffix,
        template: &["{}", ")"],
    },
    MacroRule {
        trigger: '$',
        anchor: Anchor::Suffix,
        template: &[":{}", "foldl"],
    },
    MacroRule {
        trigger: '?',
        anchor: Anchor::Suffix,
        template: &[":{}", "get"],
    },
    MacroRule {
        trigger: '.',
        anchor: Anchor::Suffix,
        template: &[":{}", "map"],
    },
    MacroRule {
        trigger: '=',
        anchor: Anchor::Suffix,
        template: &[":{}", "set"],
    },
];

pub fn get_macro_rules() -> &'static [MacroRule] {
    MACRO_RULES
}

/// Rewrite `token` with the first matching rule, or `None` if no rule applies
pub fn expand(token: &str) -> Option<Vec<String>> {
    let prefixes = MACRO_RULES.iter().filter(|rule| rule.anchor == Anchor::Prefix);
    let suffixes = MACRO_RULES.iter().filter(|rule| rule.anchor == Anchor::Suffix);

    prefixes.chain(suffixes).find_map(|rule| {
        let remainder = rule.strip(token)?;
        let expansion = rule.instantiate(remainder);
        trace!(token, trigger = %rule.trigger, ?expansion, "macro expanded");
        Some(expansion)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|item| item.to_string()).collect())
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(expand("+$"), parts(&[":+", "foldl"]));
        assert_eq!(expand("x?"), parts(&[":x", "get"]));
        assert_eq!(expand("*."), parts(&[":*", "map"]));
        assert_eq!(expand("total="), parts(&[":total", "set"]));
        assert_eq!(expand("3)"), parts(&["3", ")"]));
    }

    #[test]
    fn test_prefix_rule() {
        assert_eq!(expand("(1"), parts(&["(", "1"]));
        // prefix wins over suffix
        assert_eq!(expand("(1)"), parts(&["(", "1)"]));
        assert_eq!(expand("(("), parts(&["(", "("]));
    }

    #[test]
    fn test_bare_triggers_do_not_expand() {
        for token in ["(", ")", "$", "?", ".", "="] {
            assert_eq!(expand(token), None, "{token}");
        }
    }

    #[test]
    fn test_no_rule() {
        assert_eq!(expand("swap"), None);
        assert_eq!(expand("+"), None);
        assert_eq!(expand("r'"), None);
    }

    #[test]
    fn test_only_last_trigger_is_stripped() {
        assert_eq!(expand("+$$"), parts(&[":+$", "foldl"]));
        assert_eq!(expand("a=?"), parts(&[":a=", "get"]));
    }

    #[test]
    fn test_rule_table_order() {
        let anchors: Vec<_> = get_macro_rules().iter().map(|rule| rule.anchor).collect();
        let first_suffix = anchors.iter().position(|a| *a == Anchor::Suffix).unwrap();
        assert!(anchors[first_suffix..].iter().all(|a| *a == Anchor::Suffix));
    }
}
