//! Keyword tables that route a question and map it onto the course chapters.

use crate::request::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathTopic {
    Interest,
    Proportion,
    Probability,
    Statistics,
    Voting,
    Apportionment,
    Conversion,
    Linear,
    Exponential,
}

impl MathTopic {
    pub const ALL: [Self; 9] = [
        Self::Interest,
        Self::Proportion,
        Self::Probability,
        Self::Statistics,
        Self::Voting,
        Self::Apportionment,
        Self::Conversion,
        Self::Linear,
        Self::Exponential,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Interest => "interest",
            Self::Proportion => "proportion",
            Self::Probability => "probability",
            Self::Statistics => "statistics",
            Self::Voting => "voting",
            Self::Apportionment => "apportionment",
            Self::Conversion => "conversion",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Interest => &["interest", "compound", "simple", "apy", "investment"],
            Self::Proportion => &["proportion", "ratio", "cross multiply", "percent"],
            Self::Probability => &["probability", "expected value", "odds", "chance"],
            Self::Statistics => &["mean", "median", "standard deviation", "z-score", "normal"],
            Self::Voting => &["voting", "plurality", "majority", "borda", "election"],
            Self::Apportionment => &["apportionment", "quota", "divisor", "hamilton"],
            Self::Conversion => &["convert", "metric", "temperature", "measurement"],
            Self::Linear => &["linear", "slope", "function", "equation"],
            Self::Exponential => &["exponential", "growth", "decay"],
        }
    }

    /// Chapter the topic is taught in.
    #[must_use]
    pub fn chapter(self) -> u32 {
        match self {
            Self::Interest => 6,
            Self::Proportion => 4,
            Self::Probability => 10,
            Self::Statistics => 11,
            Self::Voting | Self::Apportionment => 13,
            Self::Conversion => 7,
            Self::Linear | Self::Exponential => 5,
        }
    }

    #[must_use]
    pub fn study_tip(self) -> &'static str {
        match self {
            Self::Interest => {
                "Break interest problems into 3 steps: identify P, r and t, convert the percent to a decimal, then plug into the formula."
            }
            Self::Proportion => "Cross multiply to solve proportions: a/b = c/d means a × d = b × c.",
            Self::Probability => "Think \"favorable over total\": count what you want over what is possible.",
            Self::Statistics => "The mean gets pulled by outliers; the median stays stable.",
            Self::Voting => "Make a table for each voting method. Visual organization helps!",
            Self::Conversion => "Use the stair-step method: moving to smaller units means multiplying.",
            Self::Apportionment | Self::Linear | Self::Exponential => GENERAL_TIP,
        }
    }

    /// Ordered solution steps for topics that have a worked recipe.
    #[must_use]
    pub fn steps(self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            Self::Interest => Some((
                "Interest Problem Steps",
                &[
                    "Identify the principal (P), rate (r) and time (t)",
                    "Convert the percentage to a decimal (5% = 0.05)",
                    "Choose a formula: simple (I = Prt) or compound (A = P(1 + r/n)^(nt))",
                    "Substitute the values and calculate",
                    "Check that the answer makes sense",
                ],
            )),
            Self::Proportion => Some((
                "Proportion Steps",
                &[
                    "Set up the ratios: a/b = c/d",
                    "Cross multiply: a × d = b × c",
                    "Solve for the unknown",
                    "Check by substituting back",
                ],
            )),
            Self::Probability => Some((
                "Probability Steps",
                &[
                    "Count the favorable outcomes",
                    "Count the total possible outcomes",
                    "P = favorable / total",
                    "Simplify if possible",
                ],
            )),
            _ => None,
        }
    }
}

pub const GENERAL_TIP: &str = "Break the problem into small steps and check each one.";

pub const GENERAL_STEPS: &[&str] = &[
    "Read the problem carefully",
    "Identify what you know and what you need to find",
    "Choose the right formula or method",
    "Work through it step by step",
    "Check your answer",
];

/// Every math topic whose keywords appear in the question, in table order.
#[must_use]
pub fn math_topics(question: &str) -> Vec<MathTopic> {
    let lower = question.to_lowercase();
    MathTopic::ALL
        .into_iter()
        .filter(|topic| topic.keywords().iter().any(|k| lower.contains(k)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingTopic {
    EssayStructure,
    CompareContrast,
    Citations,
    Plagiarism,
    Revision,
    Thesis,
    Brainstorm,
}

impl WritingTopic {
    pub const ALL: [Self; 7] = [
        Self::EssayStructure,
        Self::CompareContrast,
        Self::Citations,
        Self::Plagiarism,
        Self::Revision,
        Self::Thesis,
        Self::Brainstorm,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::EssayStructure => &["structure", "organize", "outline", "introduction", "conclusion"],
            Self::CompareContrast => &["compare", "contrast", "similarity", "difference"],
            Self::Citations => &["cite", "citation", "mla", "quote", "source"],
            Self::Plagiarism => &["plagiarism", "cheat", "copy", "original"],
            Self::Revision => &["revise", "edit", "improve", "draft"],
            Self::Thesis => &["thesis", "argument", "main idea", "claim"],
            Self::Brainstorm => &["brainstorm", "ideas", "topic", "start"],
        }
    }
}

/// First writing topic mentioned in the question.
#[must_use]
pub fn writing_topic(question: &str) -> Option<WritingTopic> {
    let lower = question.to_lowercase();
    WritingTopic::ALL
        .into_iter()
        .find(|topic| topic.keywords().iter().any(|k| lower.contains(k)))
}

const MATH_WORDS: &[&str] = &[
    "formula",
    "calculate",
    "solve",
    "math",
    "percent",
    "interest",
    "probability",
];
const WRITING_WORDS: &[&str] = &["essay", "write", "citation", "thesis", "paragraph"];

/// Pick the tutor for a question. An explicit context wins over keywords.
#[must_use]
pub fn route(question: &str, context: Option<&str>) -> Subject {
    let lower = question.to_lowercase();
    if context == Some("math-tutorial") || MATH_WORDS.iter().any(|w| lower.contains(w)) {
        Subject::Math
    } else if context == Some("writing-help") || WRITING_WORDS.iter().any(|w| lower.contains(w)) {
        Subject::Writing
    } else {
        Subject::General
    }
}

const CHAPTERS: &[(u32, &str, &str)] = &[
    (
        1,
        "Thinking Mathematically, Estimating, Problem Solving",
        "problem solving, patterns, deductive & inductive reasoning",
    ),
    (
        4,
        "Proportions, Percentages, and Ratios",
        "proportions, cross-multiplication, percentages, unit rates",
    ),
    (
        5,
        "Linear and Exponential Functions",
        "linear functions (y=mx+b), exponential functions (y=ab^x)",
    ),
    (
        6,
        "Personal Finance (Interest, Saving, Borrowing)",
        "simple interest (I=Prt), compound interest, APY, loans, present value",
    ),
    (
        7,
        "Measurement and Conversions",
        "metric conversions, temperature formulas, dimensional analysis",
    ),
    (
        10,
        "Probability and Expected Value",
        "probability calculations, expected value E(X), odds, independent events",
    ),
    (
        11,
        "Statistics and Data Analysis",
        "mean, median, mode, standard deviation, z-scores, normal distribution",
    ),
    (
        13,
        "Voting Methods and Apportionment",
        "voting methods (plurality, Borda, IRV), apportionment (standard divisor & quota)",
    ),
];

fn chapter_entry(chapter: &str) -> Option<&'static (u32, &'static str, &'static str)> {
    let num: u32 = chapter.trim().parse().ok()?;
    CHAPTERS.iter().find(|(n, _, _)| *n == num)
}

/// Course title of a chapter, e.g. `"Measurement and Conversions"` for `"7"`.
#[must_use]
pub fn chapter_title(chapter: &str) -> Option<&'static str> {
    chapter_entry(chapter).map(|(_, title, _)| *title)
}

/// Short list of what a chapter covers.
#[must_use]
pub fn chapter_topics(chapter: &str) -> Option<&'static str> {
    chapter_entry(chapter).map(|(_, _, topics)| *topics)
}

/// Knowledge-base chapter key for a request: the explicit chapter if given,
/// else the chapter of the first detected topic, else `general`.
#[must_use]
pub fn chapter_key(chapter: Option<&str>, topics: &[MathTopic]) -> String {
    match (chapter, topics.first()) {
        (Some(chapter), _) => format!("chapter_{chapter}"),
        (None, Some(topic)) => format!("chapter_{}", topic.chapter()),
        (None, None) => "general".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_found_in_table_order() {
        assert_eq!(
            math_topics("Compound interest on an investment at 5 percent"),
            vec![MathTopic::Interest, MathTopic::Proportion]
        );
        assert!(math_topics("hello").is_empty());
    }

    #[test]
    fn context_beats_keywords() {
        assert_eq!(route("how do I write this", Some("math-tutorial")), Subject::Math);
        assert_eq!(route("anything", Some("writing-help")), Subject::Writing);
        assert_eq!(route("Help me solve this essay", None), Subject::Math);
        assert_eq!(route("My thesis is weak", None), Subject::Writing);
        assert_eq!(route("What time is class?", Some("general")), Subject::General);
    }

    #[test]
    fn chapter_key_resolution() {
        assert_eq!(chapter_key(Some("4"), &[MathTopic::Interest]), "chapter_4");
        assert_eq!(chapter_key(None, &[MathTopic::Voting]), "chapter_13");
        assert_eq!(chapter_key(None, &[]), "general");
    }

    #[test]
    fn chapter_tables() {
        assert_eq!(chapter_title("7"), Some("Measurement and Conversions"));
        assert!(chapter_topics("6").unwrap().contains("I=Prt"));
        assert_eq!(chapter_title("2"), None);
        assert_eq!(chapter_title("six"), None);
    }

    #[test]
    fn writing_topic_first_match() {
        assert_eq!(
            writing_topic("How do I cite a source in MLA?"),
            Some(WritingTopic::Citations)
        );
        assert_eq!(writing_topic("Outline for my thesis"), Some(WritingTopic::EssayStructure));
        assert_eq!(writing_topic("help"), None);
    }
}
