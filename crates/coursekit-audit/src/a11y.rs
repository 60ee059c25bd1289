//! Structural accessibility checks: images, headings, form labels, icons.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::issue::{Issue, IssueKind, Severity, describe};

static IMAGES: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static INPUTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());
static LABELS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("label[for]").unwrap());
static ICONS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("i[data-lucide]").unwrap());

/// Input types that take typed text and therefore need a visible or screen-reader label.
pub const TEXT_INPUT_TYPES: &[&str] = &["text", "email", "password", "number", "search", "tel", "url"];

#[must_use]
pub fn check(file: &str, doc: &Html) -> Vec<Issue> {
    let mut issues = missing_alt(file, doc);
    issues.extend(heading_skips(file, doc));
    issues.extend(unlabeled_inputs(file, doc));
    issues.extend(unlabeled_icons(file, doc));
    issues
}

pub(crate) fn needs_alt(el: ElementRef<'_>) -> bool {
    el.value().attr("alt").is_none_or(|alt| alt.trim().is_empty())
}

fn missing_alt(file: &str, doc: &Html) -> Vec<Issue> {
    doc.select(&IMAGES)
        .filter(|img| needs_alt(*img))
        .map(|img| {
            let src = img.value().attr("src").unwrap_or("(no src)");
            Issue::new(
                file,
                IssueKind::MissingAlt,
                Severity::High,
                format!("image without alt text: {src}"),
            )
        })
        .collect()
}

fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    el.value().name().strip_prefix('h')?.parse().ok()
}

fn heading_skips(file: &str, doc: &Html) -> Vec<Issue> {
    let levels: Vec<u8> = doc.select(&HEADINGS).filter_map(heading_level).collect();
    levels
        .windows(2)
        .filter(|pair| pair[1] > pair[0] + 1)
        .map(|pair| {
            Issue::new(
                file,
                IssueKind::HeadingSkip,
                Severity::Medium,
                format!("heading level skips from h{} to h{}", pair[0], pair[1]),
            )
        })
        .collect()
}

pub(crate) fn is_text_input(el: ElementRef<'_>) -> bool {
    el.value().attr("type").is_none_or(|t| {
        let t = t.trim().to_ascii_lowercase();
        TEXT_INPUT_TYPES.contains(&t.as_str())
    })
}

/// Ids referenced by `<label for=...>` anywhere in the document.
pub(crate) fn label_targets(doc: &Html) -> HashSet<String> {
    doc.select(&LABELS)
        .filter_map(|label| label.value().attr("for"))
        .map(str::to_owned)
        .collect()
}

pub(crate) fn has_label(el: ElementRef<'_>, targets: &HashSet<String>) -> bool {
    let by_for = el.value().id().is_some_and(|id| targets.contains(id));
    let wrapped = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "label");
    by_for || wrapped
}

fn unlabeled_inputs(file: &str, doc: &Html) -> Vec<Issue> {
    let targets = label_targets(doc);
    doc.select(&INPUTS)
        .filter(|input| is_text_input(*input) && !has_label(*input, &targets))
        .map(|input| {
            Issue::new(
                file,
                IssueKind::MissingLabel,
                Severity::High,
                format!("form input without a label: {}", describe(input)),
            )
        })
        .collect()
}

pub(crate) fn icon_needs_label(el: ElementRef<'_>) -> bool {
    let value = el.value();
    value.attr("aria-label").is_none() && value.attr("aria-hidden").is_none()
}

fn unlabeled_icons(file: &str, doc: &Html) -> Vec<Issue> {
    doc.select(&ICONS)
        .filter(|icon| icon_needs_label(*icon))
        .map(|icon| {
            let name = icon.value().attr("data-lucide").unwrap_or("");
            Issue::new(
                file,
                IssueKind::IconLabel,
                Severity::Low,
                format!("icon \"{name}\" has neither aria-label nor aria-hidden"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(html: &str) -> Vec<(IssueKind, Severity)> {
        check("page.html", &Html::parse_document(html))
            .into_iter()
            .map(|i| (i.kind, i.severity))
            .collect()
    }

    // --- images ---

    #[test]
    fn image_alt() {
        assert_eq!(
            kinds(r#"<img src="a.png"><img src="b.png" alt=""><img src="c.png" alt="Chart">"#),
            vec![
                (IssueKind::MissingAlt, Severity::High),
                (IssueKind::MissingAlt, Severity::High)
            ]
        );
    }

    // --- headings ---

    #[test]
    fn heading_skip_detected() {
        assert_eq!(
            kinds("<h1>A</h1><h3>B</h3>"),
            vec![(IssueKind::HeadingSkip, Severity::Medium)]
        );
    }

    #[test]
    fn heading_step_back_is_fine() {
        assert!(kinds("<h1>A</h1><h2>B</h2><h3>C</h3><h2>D</h2><h3>E</h3>").is_empty());
    }

    // --- inputs ---

    #[test]
    fn input_labels() {
        let html = r#"
            <label for="name">Name</label><input id="name" type="text">
            <label>Email <input type="email"></label>
            <input type="search" id="q">
            <input>
            <input type="checkbox">
            <input type="submit">
        "#;
        assert_eq!(
            kinds(html),
            vec![
                (IssueKind::MissingLabel, Severity::High),
                (IssueKind::MissingLabel, Severity::High)
            ]
        );
    }

    // --- icons ---

    #[test]
    fn icon_labels() {
        let html = r#"
            <i data-lucide="star"></i>
            <i data-lucide="home" aria-hidden="true"></i>
            <i data-lucide="menu" aria-label="Menu"></i>
        "#;
        assert_eq!(kinds(html), vec![(IssueKind::IconLabel, Severity::Low)]);
    }
}
