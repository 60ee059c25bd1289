use std::fmt;

use scraper::ElementRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Contrast,
    Palette,
    LongParagraph,
    TextBlock,
    MissingAlt,
    HeadingSkip,
    MissingLabel,
    IconLabel,
}

impl IssueKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contrast => "contrast",
            Self::Palette => "palette",
            Self::LongParagraph => "long_paragraph",
            Self::TextBlock => "text_block",
            Self::MissingAlt => "missing_alt",
            Self::HeadingSkip => "heading_skip",
            Self::MissingLabel => "missing_label",
            Self::IconLabel => "icon_label",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub file: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub detail: String,
}

impl Issue {
    pub fn new(file: &str, kind: IssueKind, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            file: file.to_owned(),
            kind,
            severity,
            detail: detail.into(),
        }
    }
}

/// Short selector-like label for an element, e.g. `p#intro.text-gray-400`.
pub(crate) fn describe(el: ElementRef<'_>) -> String {
    let value = el.value();
    let mut out = value.name().to_owned();
    if let Some(id) = value.id() {
        out.push('#');
        out.push_str(id);
    }
    for class in value.classes().take(3) {
        out.push('.');
        out.push_str(class);
    }
    out
}

/// First `max` characters of the element's collapsed text.
pub(crate) fn snippet(el: ElementRef<'_>, max: usize) -> String {
    let text = collapsed_text(el);
    if text.chars().count() <= max {
        text
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}…")
    }
}

pub(crate) fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    #[test]
    fn describe_includes_id_and_classes() {
        let doc = Html::parse_fragment(r#"<p id="intro" class="a b c d">Hello   <b>world</b></p>"#);
        let p = doc.select(&Selector::parse("p").unwrap()).next().unwrap();
        assert_eq!(describe(p), "p#intro.a.b.c");
        assert_eq!(collapsed_text(p), "Hello world");
        assert_eq!(snippet(p, 5), "Hello…");
    }

    #[test]
    fn serde_names() {
        let issue = Issue::new("a.html", IssueKind::MissingAlt, Severity::High, "img");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "missing_alt");
        assert_eq!(json["severity"], "high");
    }
}
