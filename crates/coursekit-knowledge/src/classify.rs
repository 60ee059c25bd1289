//! Chapter key assignment from a document path.

use std::sync::LazyLock;

use regex::Regex;

static CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"chapter[\s_-]*(\d+)").unwrap());
static UNIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"unit[\s_-]*(\d+)").unwrap());

/// Keyword fallbacks, checked in order after the numbered patterns.
const TOPIC_CHAPTERS: &[(&[&str], &str)] = &[
    (&["probability"], "chapter_10"),
    (&["statistics"], "chapter_11"),
    (&["personal_finance", "finance"], "chapter_6"),
    (&["voting", "apportionment"], "chapter_13"),
];

pub const GENERAL: &str = "general";

/// Chapter key (`chapter_N`, `unit_N` or `general`) for a path string.
///
/// Pure function of its input.
#[must_use]
pub fn chapter_key(path: &str) -> String {
    let lower = path.to_lowercase();

    if let Some(caps) = CHAPTER_RE.captures(&lower) {
        return format!("chapter_{}", &caps[1]);
    }
    if let Some(caps) = UNIT_RE.captures(&lower) {
        return format!("unit_{}", &caps[1]);
    }

    TOPIC_CHAPTERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map_or_else(|| GENERAL.to_owned(), |(_, key)| (*key).to_owned())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn numbered_chapter() {
        assert_eq!(chapter_key("course_materials/Chapter 6/notes.md"), "chapter_6");
        assert_eq!(chapter_key("chapter-10-probability.md"), "chapter_10");
        assert_eq!(chapter_key("chapter_4.html"), "chapter_4");
    }

    #[test]
    fn numbered_unit() {
        assert_eq!(chapter_key("english/Unit_2/essay.md"), "unit_2");
    }

    #[test]
    fn chapter_takes_precedence_over_unit() {
        assert_eq!(chapter_key("unit_1/chapter_5.md"), "chapter_5");
    }

    #[test]
    fn keyword_fallbacks() {
        assert_eq!(chapter_key("notes/probability_rules.md"), "chapter_10");
        assert_eq!(chapter_key("notes/statistics.txt"), "chapter_11");
        assert_eq!(chapter_key("notes/personal_finance.md"), "chapter_6");
        assert_eq!(chapter_key("notes/finance-basics.md"), "chapter_6");
        assert_eq!(chapter_key("notes/apportionment.md"), "chapter_13");
        assert_eq!(chapter_key("notes/voting.md"), "chapter_13");
    }

    #[test]
    fn unmatched_is_general() {
        assert_eq!(chapter_key("notes/syllabus.md"), GENERAL);
        assert_eq!(chapter_key(""), GENERAL);
    }

    proptest! {
        #[test]
        fn classification_is_idempotent(path in ".{0,80}") {
            prop_assert_eq!(chapter_key(&path), chapter_key(&path));
        }

        #[test]
        fn classification_yields_known_shape(path in "[a-zA-Z0-9_ /.-]{0,60}") {
            let key = chapter_key(&path);
            prop_assert!(
                key == GENERAL || key.starts_with("chapter_") || key.starts_with("unit_")
            );
        }
    }
}
