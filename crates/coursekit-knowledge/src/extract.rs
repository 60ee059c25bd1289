//! Pattern-driven extraction of formulas, concepts, procedures, examples and
//! writing guidance from a single document.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::base::Detail;
use crate::classify::chapter_key;
use crate::loader::{Category, SourceDocument, SourceFormat};

/// Extracted strings shorter than this are noise.
const MIN_FORMULA_LEN: usize = 4;
const MIN_PROCEDURE_STEPS: usize = 2;
const STEP_SEPARATOR: &str = " → ";

static FORMULA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\*\*([^*]+\s*=\s*[^*]+)\*\*",
        r"(?m)^([A-Z]\w*\s*=\s*.+)$",
        r"([A-Z]+\([^)]+\)\s*=\s*.+)",
        r"(E\(X\)\s*=\s*.+)",
        r"(z\s*=\s*.+)",
    ]
    .iter()
    .map(|s| Regex::new(s).unwrap())
    .collect()
});

static BOLD_DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*([^*]+)\*\*\s*[—-]\s*(.+)$").unwrap());
static TERM_DEFINITION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Z][^:\n]+):\s*(.+)$").unwrap());
static SECTION_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###\s+(.+)$").unwrap());
static CHAPTER_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+(.+)$").unwrap());
static MARKDOWN_EXAMPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Example[^*]*\*\*:?\s*(.+)$").unwrap());

static STEP_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Step\s*\d+").unwrap());
static NUMBERED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+\.)").unwrap());

static INLINE_EQUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]\w*\s*=\s*[^<>\n]+)").unwrap());

static MONO_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class*=\"font-mono\"]").unwrap());
static STRONG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("strong").unwrap());
static HEADINGS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2, h3").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "br", "tr", "td", "th",
    "section", "article", "header", "footer", "pre", "blockquote",
];
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExtractedItem {
    Formula(String),
    Concept(String),
    Procedure(String),
    Example(String),
    EssayInfo(Detail),
    WritingProcess(Detail),
    CitationInfo(Detail),
}

/// Extraction result for one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub path: String,
    pub category: Category,
    pub chapter: String,
    pub items: Vec<ExtractedItem>,
}

/// First-seen-order set used for per-document dedup.
#[derive(Default)]
struct Unique {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl Unique {
    fn push(&mut self, item: &str) {
        let item = item.trim();
        if item.is_empty() || self.seen.contains(item) {
            return;
        }
        self.seen.insert(item.to_owned());
        self.items.push(item.to_owned());
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[must_use]
pub fn extract_formulas(text: &str) -> Vec<String> {
    let mut out = Unique::default();
    collect_formulas(text, &mut out);
    out.into_vec()
}

fn collect_formulas(text: &str, out: &mut Unique) {
    for pattern in FORMULA_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let formula = caps[1].trim();
            if formula.chars().count() >= MIN_FORMULA_LEN {
                out.push(formula);
            }
        }
    }
}

#[must_use]
pub fn extract_concepts(text: &str) -> Vec<String> {
    let mut out = Unique::default();
    collect_concepts(text, &mut out);
    out.into_vec()
}

fn collect_concepts(text: &str, out: &mut Unique) {
    for re in [&*BOLD_DEFINITION_RE, &*TERM_DEFINITION_RE] {
        for caps in re.captures_iter(text) {
            out.push(&format!("{}: {}", caps[1].trim(), caps[2].trim()));
        }
    }
    for re in [&*SECTION_HEADING_RE, &*CHAPTER_HEADING_RE] {
        for caps in re.captures_iter(text) {
            out.push(&caps[1]);
        }
    }
}

#[must_use]
pub fn extract_examples(text: &str) -> Vec<String> {
    let mut out = Unique::default();
    for caps in MARKDOWN_EXAMPLE_RE.captures_iter(text) {
        out.push(&caps[1]);
    }
    out.into_vec()
}

/// Joins `Step N` / `N.` segments into one procedure string when there are at
/// least two of them.
#[must_use]
pub fn extract_procedures(text: &str) -> Vec<String> {
    let mut steps = Vec::new();

    for line in text.lines() {
        let mut starts: Vec<usize> = STEP_MARKER_RE.find_iter(line).map(|m| m.start()).collect();
        if let Some(caps) = NUMBERED_LINE_RE.captures(line)
            && let Some(m) = caps.get(1)
        {
            starts.push(m.start());
        }
        starts.sort_unstable();
        starts.dedup();

        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(line.len());
            let step = line[start..end].trim();
            if !step.is_empty() {
                steps.push(step.to_owned());
            }
        }
    }

    if steps.len() >= MIN_PROCEDURE_STEPS {
        vec![steps.join(STEP_SEPARATOR)]
    } else {
        Vec::new()
    }
}

/// Writing guidance for English documents, keyed by topic keywords.
#[must_use]
pub fn extract_english(content: &str) -> Vec<ExtractedItem> {
    let lower = content.to_lowercase();
    let mut items = Vec::new();

    if lower.contains("compare") && lower.contains("contrast") {
        items.push(ExtractedItem::EssayInfo(Detail::new(
            "compare/contrast",
            prefix(content, 500),
        )));
    }
    if lower.contains("argument") {
        items.push(ExtractedItem::EssayInfo(Detail::new(
            "argumentative",
            prefix(content, 500),
        )));
    }
    if lower.contains("revision") || lower.contains("editing") {
        items.push(ExtractedItem::WritingProcess(Detail::new(
            "revision_editing",
            prefix(content, 300),
        )));
    }
    if lower.contains("brainstorm") {
        items.push(ExtractedItem::WritingProcess(Detail::new(
            "brainstorming",
            prefix(content, 300),
        )));
    }
    if lower.contains("mla") || lower.contains("citation") {
        items.push(ExtractedItem::CitationInfo(Detail::new(
            "mla_format",
            prefix(content, 400),
        )));
    }
    if lower.contains("plagiarism") {
        items.push(ExtractedItem::CitationInfo(Detail::new(
            "plagiarism_prevention",
            prefix(content, 400),
        )));
    }

    items
}

fn prefix(s: &str, chars: usize) -> String {
    s.chars().take(chars).collect()
}

/// Structured pieces pulled out of an HTML page.
#[derive(Debug, Default)]
pub struct HtmlExtraction {
    /// Visible text with block boundaries as newlines.
    pub text: String,
    pub formulas: Vec<String>,
    pub examples: Vec<String>,
    pub headings: Vec<String>,
}

#[must_use]
pub fn extract_html(html: &str) -> HtmlExtraction {
    let document = Html::parse_document(html);
    let text = visible_text(&document);

    let mut formulas = Unique::default();
    for block in document.select(&MONO_BLOCK) {
        formulas.push(&block.text().collect::<String>());
    }
    for caps in INLINE_EQUATION_RE.captures_iter(&text) {
        let formula = caps[1].trim();
        if formula.chars().count() >= MIN_FORMULA_LEN {
            formulas.push(formula);
        }
    }

    let mut examples = Unique::default();
    for strong in document.select(&STRONG) {
        let label = strong.text().collect::<String>();
        let label = label.trim();
        if label.to_lowercase().starts_with("example")
            && label.ends_with(':')
            && let Some(next) = strong.next_sibling()
            && let Node::Text(t) = next.value()
        {
            examples.push(t);
        }
    }

    let mut headings = Unique::default();
    for heading in document.select(&HEADINGS) {
        headings.push(&heading.text().collect::<String>());
    }

    HtmlExtraction {
        text,
        formulas: formulas.into_vec(),
        examples: examples.into_vec(),
        headings: headings.into_vec(),
    }
}

fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        match node.value() {
            Node::Element(el) if BLOCK_TAGS.contains(&el.name()) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Node::Text(t) => {
                let hidden = node
                    .parent()
                    .and_then(ElementRef::wrap)
                    .is_some_and(|p| SKIPPED_TAGS.contains(&p.value().name()));
                if !hidden {
                    out.push_str(t);
                }
            }
            _ => {}
        }
    }
    out
}

/// Run every extractor that applies to `doc`.
#[must_use]
pub fn extract_document(doc: &SourceDocument) -> ExtractedDocument {
    let chapter = chapter_key(&doc.relative);

    let mut formulas = Unique::default();
    let mut concepts = Unique::default();
    let mut examples = Unique::default();

    let text = if doc.format == SourceFormat::Html {
        let html = extract_html(&doc.content);
        for f in &html.formulas {
            formulas.push(f);
        }
        for e in &html.examples {
            examples.push(e);
        }
        for h in &html.headings {
            concepts.push(h);
        }
        html.text
    } else {
        doc.content.clone()
    };

    for e in extract_examples(&text) {
        examples.push(&e);
    }

    let mut items = Vec::new();
    match doc.category {
        Category::English => {
            items.extend(extract_english(&text));
        }
        Category::Math | Category::General => {
            collect_formulas(&text, &mut formulas);
            collect_concepts(&text, &mut concepts);
            items.extend(formulas.into_vec().into_iter().map(ExtractedItem::Formula));
            items.extend(concepts.into_vec().into_iter().map(ExtractedItem::Concept));
            items.extend(
                extract_procedures(&text)
                    .into_iter()
                    .map(ExtractedItem::Procedure),
            );
        }
    }
    items.extend(examples.into_vec().into_iter().map(ExtractedItem::Example));

    tracing::debug!(file = %doc.relative, %chapter, items = items.len(), "document extracted");

    ExtractedDocument {
        path: doc.relative.clone(),
        category: doc.category,
        chapter,
        items,
    }
}
