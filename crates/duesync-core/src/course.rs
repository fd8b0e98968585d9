//! Course code resolution from noisy scraped text.
//!
//! LMS calendar views rarely expose a clean course code. The resolver tries
//! an ordered list of strategies over the event's title, course hint, and
//! description, and the first strategy that produces a code wins.
//!
//! Codes found by pattern match are canonicalized to upper-case letters, a
//! single space, and four digits: `"cs1337"`, `"CS-1337"`, and `"CS  1337"`
//! all become `"CS 1337"`. A course hint used verbatim is only trimmed.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Two to four letters followed by exactly four digits.
static COURSE_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{2,4})(?:\s+|-)?(\d{4})\b").expect("Invalid course code regex")
});

/// The text fields a course code can be resolved from.
#[derive(Debug, Clone, Copy)]
pub struct CourseHints<'a> {
    pub title: &'a str,
    pub course_hint: &'a str,
    pub description: &'a str,
}

impl<'a> CourseHints<'a> {
    /// Bundles the resolver inputs.
    pub fn new(title: &'a str, course_hint: &'a str, description: &'a str) -> Self {
        Self {
            title,
            course_hint,
            description,
        }
    }
}

/// A single resolution strategy.
pub type ResolveStrategy = fn(&CourseHints<'_>) -> Option<String>;

/// Resolves course codes by trying strategies in order.
#[derive(Debug, Clone)]
pub struct CourseResolver {
    strategies: Vec<(&'static str, ResolveStrategy)>,
}

impl Default for CourseResolver {
    fn default() -> Self {
        Self::new(vec![
            ("title", from_title as ResolveStrategy),
            ("hint", from_readable_hint),
            ("description", from_opaque_hint_description),
        ])
    }
}

impl CourseResolver {
    /// Creates a resolver with a custom strategy order.
    pub fn new(strategies: Vec<(&'static str, ResolveStrategy)>) -> Self {
        Self { strategies }
    }

    /// Returns the strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|(name, _)| *name).collect()
    }

    /// Resolves a course code, returning an empty string when unresolved.
    pub fn resolve(&self, title: &str, course_hint: &str, description: &str) -> String {
        let hints = CourseHints::new(title, course_hint, description);
        self.resolve_hints(&hints).unwrap_or_default()
    }

    /// Resolves a course code from bundled hints.
    pub fn resolve_hints(&self, hints: &CourseHints<'_>) -> Option<String> {
        for (name, strategy) in &self.strategies {
            if let Some(code) = strategy(hints) {
                debug!(strategy = name, code = %code, "resolved course code");
                return Some(code);
            }
        }
        None
    }
}

/// Finds the first course-code pattern in `text`, canonicalized.
pub fn find_course_code(text: &str) -> Option<String> {
    COURSE_CODE_REGEX
        .captures(text)
        .map(|caps| format!("{} {}", caps[1].to_ascii_uppercase(), &caps[2]))
}

/// Returns true if a course hint is an opaque LMS identifier (e.g. `_12345_1`).
pub fn is_opaque_identifier(hint: &str) -> bool {
    hint.trim_start().starts_with('_')
}

/// A course code embedded in the title.
pub fn from_title(hints: &CourseHints<'_>) -> Option<String> {
    find_course_code(hints.title)
}

/// A human-readable course hint, used verbatim.
pub fn from_readable_hint(hints: &CourseHints<'_>) -> Option<String> {
    let hint = hints.course_hint.trim();
    if hint.is_empty() || is_opaque_identifier(hint) {
        return None;
    }
    Some(hint.to_string())
}

/// A course code in the description, only consulted for opaque hints.
pub fn from_opaque_hint_description(hints: &CourseHints<'_>) -> Option<String> {
    if !is_opaque_identifier(hints.course_hint) {
        return None;
    }
    find_course_code(hints.description)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(title: &str, hint: &str, description: &str) -> String {
        CourseResolver::default().resolve(title, hint, description)
    }

    #[test]
    fn title_with_spaced_code() {
        assert_eq!(resolve("CS 1337 Homework 2", "", ""), "CS 1337");
    }

    #[test]
    fn title_with_compact_code() {
        assert_eq!(resolve("CS1337 Homework 2", "", ""), "CS 1337");
    }

    #[test]
    fn title_code_is_case_insensitive() {
        assert_eq!(resolve("quiz for math2417", "", ""), "MATH 2417");
        assert_eq!(resolve("Hist-1301 essay", "", ""), "HIST 1301");
        assert_eq!(resolve("PHYS   2325 lab", "", ""), "PHYS 2325");
    }

    #[test]
    fn title_code_requires_exactly_four_digits() {
        assert_eq!(resolve("CS 133 Homework", "", ""), "");
        assert_eq!(resolve("CS 13370 Homework", "", ""), "");
    }

    #[test]
    fn title_code_requires_two_to_four_letters() {
        assert_eq!(resolve("C 1337", "", ""), "");
        assert_eq!(resolve("ABCDE1234", "", ""), "");
    }

    #[test]
    fn title_wins_over_hint() {
        assert_eq!(resolve("CS 1337 Homework", "Math Section", ""), "CS 1337");
    }

    #[test]
    fn readable_hint_used_verbatim() {
        assert_eq!(resolve("Homework 2", "  Intro to Programming ", ""), "Intro to Programming");
    }

    #[test]
    fn opaque_hint_falls_back_to_description() {
        assert_eq!(
            resolve("Homework 2", "_12345_1", "Submit via the CS 2336 course page"),
            "CS 2336"
        );
    }

    #[test]
    fn opaque_hint_without_description_code_is_unresolved() {
        assert_eq!(resolve("Homework 2", "_12345_1", "Submit online"), "");
    }

    #[test]
    fn empty_hint_does_not_search_description() {
        assert_eq!(resolve("Homework 2", "", "CS 2336"), "");
    }

    #[test]
    fn strategies_are_ordered() {
        assert_eq!(
            CourseResolver::default().strategy_names(),
            vec!["title", "hint", "description"]
        );
    }

    #[test]
    fn custom_strategy_order() {
        let resolver = CourseResolver::new(vec![("hint", from_readable_hint as ResolveStrategy)]);
        assert_eq!(resolver.resolve("CS 1337 Homework", "", ""), "");
        assert_eq!(resolver.resolve("CS 1337 Homework", "Algebra", ""), "Algebra");
    }

    #[test]
    fn individual_strategies() {
        let hints = CourseHints::new("Essay", "_99_1", "ENG 1302 syllabus");
        assert_eq!(from_title(&hints), None);
        assert_eq!(from_readable_hint(&hints), None);
        assert_eq!(from_opaque_hint_description(&hints), Some("ENG 1302".to_string()));
    }
}
