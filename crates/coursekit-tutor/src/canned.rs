//! Canned HTML answers served without an LLM, and the fallback wrappers used
//! when one is unavailable.

use std::collections::HashSet;
use std::fmt::Write;
use std::sync::LazyLock;

use coursekit_knowledge::KnowledgeBase;
use regex::Regex;

use crate::topics::{
    GENERAL_STEPS, GENERAL_TIP, MathTopic, WritingTopic, chapter_key, chapter_topics, math_topics,
    writing_topic,
};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const RESOURCES: &[(&str, &str, &str)] = &[
    ("formula_lookup.html", "Formula Lookup", "quick reference for all formulas"),
    ("https://learn.hawkeslearning.com/", "Hawkes Learning", "interactive practice problems"),
];

/// Escape text for HTML element content and double-quoted attributes.
/// Apostrophes are left as typed.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn empty_question() -> String {
    "<p>Please ask me a specific question and I'll be happy to help!</p>".to_owned()
}

/// Strip markup and collapse whitespace. Extraction artifacts from page
/// scripts come back empty.
#[must_use]
pub fn clean_formula(formula: &str) -> String {
    let text = TAG.replace_all(formula, "");
    let text = SPACE.replace_all(&text, " ");
    let text = text.trim();
    if text.contains("HTML") || text.contains("getElementById") {
        return String::new();
    }
    text.to_owned()
}

/// Formulas for the chapter first, then any formula naming a detected topic.
/// Deduplicated, cleaned, at most `max`.
#[must_use]
pub fn relevant_formulas(
    knowledge: &KnowledgeBase,
    chapter_key: &str,
    topics: &[MathTopic],
    max: usize,
) -> Vec<String> {
    let by_topic = knowledge.all_formulas().filter_map(|(_, formula)| {
        let lower = formula.to_lowercase();
        topics
            .iter()
            .any(|t| lower.contains(t.name()))
            .then_some(formula)
    });
    let mut seen = HashSet::new();
    knowledge
        .formulas_for(chapter_key)
        .chain(by_topic)
        .map(clean_formula)
        .filter(|f| f.chars().count() > 5 && seen.insert(f.clone()))
        .take(max)
        .collect()
}

fn open_card(out: &mut String, bg: &str, heading_class: &str, heading: &str) {
    let _ = writeln!(
        out,
        r#"<div class="{bg} p-4 rounded-lg"><h4 class="font-semibold {heading_class} mb-2">{heading}</h4>"#
    );
}

fn write_list(out: &mut String, tag: &str, class: &str, items: &[&str]) {
    let _ = write!(out, r#"<{tag} class="{class}">"#);
    for item in items {
        let _ = write!(out, "<li>{item}</li>");
    }
    let _ = writeln!(out, "</{tag}>");
}

/// Topic detection, chapter formulas, a study tip, steps and encouragement.
#[must_use]
pub fn math_answer(
    question: &str,
    chapter: Option<&str>,
    knowledge: &KnowledgeBase,
    max_formulas: usize,
) -> String {
    let topics = math_topics(question);
    let key = chapter_key(chapter, &topics);
    let formulas = relevant_formulas(knowledge, &key, &topics, max_formulas);
    let primary = topics.first().copied();

    let mut out = String::from("<div class=\"space-y-4\">\n");
    out.push_str(
        "<p><strong>Great question!</strong> Let me help you with this step by step.</p>\n",
    );
    if !topics.is_empty() {
        let names: Vec<&str> = topics.iter().map(|t| t.name()).collect();
        let _ = writeln!(
            out,
            "<p>This looks like a question about: <strong>{}</strong></p>",
            names.join(", ")
        );
    }
    if !formulas.is_empty() {
        open_card(&mut out, "bg-blue-50", "text-blue-800", "Key Formulas");
        for formula in &formulas {
            let _ = writeln!(
                out,
                r#"<div class="bg-white text-gray-900 p-2 rounded font-mono text-sm">{}</div>"#,
                escape(formula)
            );
        }
        out.push_str("</div>\n");
    }

    open_card(&mut out, "bg-yellow-50", "text-yellow-800", "ADHD Study Tip");
    let _ = writeln!(
        out,
        r#"<p class="text-gray-900 text-sm">{}</p></div>"#,
        escape(primary.map_or(GENERAL_TIP, MathTopic::study_tip))
    );

    let (heading, steps) = primary
        .and_then(MathTopic::steps)
        .unwrap_or(("General Problem-Solving Steps", GENERAL_STEPS));
    open_card(&mut out, "bg-gray-50", "text-gray-900", heading);
    let steps: Vec<String> = steps.iter().map(|s| escape(s)).collect();
    let steps: Vec<&str> = steps.iter().map(String::as_str).collect();
    write_list(&mut out, "ol", "list-decimal list-inside text-sm text-gray-900", &steps);
    out.push_str("</div>\n");

    out.push_str(
        r#"<div class="bg-green-50 p-3 rounded"><p class="text-green-800"><strong>Remember:</strong> Asking questions is exactly how learning works. Take it one step at a time!</p></div>"#,
    );
    out.push_str("\n</div>");
    out
}

fn writing_card(topic: Option<WritingTopic>) -> (&'static str, &'static [&'static str]) {
    match topic {
        Some(WritingTopic::EssayStructure) => (
            "Essay Structure",
            &[
                "<strong>Introduction:</strong> hook, background, thesis",
                "<strong>Body paragraphs:</strong> topic sentence, evidence, analysis, transition",
                "<strong>Conclusion:</strong> restate the thesis, summarize, final thought",
            ],
        ),
        Some(WritingTopic::CompareContrast) => (
            "Compare/Contrast Structure",
            &[
                "<strong>Point by point:</strong> compare each aspect directly",
                "<strong>Subject by subject:</strong> discuss all of A, then all of B",
                "Use transitions like \"similarly\", \"however\" and \"in contrast\"",
            ],
        ),
        Some(WritingTopic::Citations) => (
            "MLA Citation Basics",
            &[
                "<strong>In-text:</strong> (Author Page)",
                "<strong>Works Cited:</strong> Author. \"Title.\" Source, Date.",
            ],
        ),
        Some(WritingTopic::Plagiarism) => (
            "Avoiding Plagiarism",
            &[
                "Always cite sources, even when paraphrasing",
                "Use quotation marks for exact words",
                "Put ideas in your own words",
                "When in doubt, cite it!",
            ],
        ),
        Some(WritingTopic::Revision) => (
            "Revision vs. Editing",
            &[
                "<strong>Revision:</strong> ideas, organization, clarity",
                "<strong>Editing:</strong> grammar, spelling, punctuation",
                "Always revise before editing",
            ],
        ),
        Some(WritingTopic::Thesis) => (
            "Strong Thesis Statements",
            &[
                "Make a clear argument or claim",
                "Be specific, not vague",
                "Preview your main points",
                "Put it at the end of your introduction",
            ],
        ),
        Some(WritingTopic::Brainstorm) | None => (
            "Writing Process Steps",
            &[
                "Brainstorm and choose a topic",
                "Create an outline",
                "Write a first draft",
                "Revise for content and organization",
                "Edit for grammar and style",
            ],
        ),
    }
}

const WRITING_TIPS: &[&str] = &[
    "Write in short bursts (15-25 minutes)",
    "Use outlines and graphic organizers",
    "Start with a brain dump to get ideas out first",
    "Revise in a separate session from writing",
];

#[must_use]
pub fn writing_answer(question: &str) -> String {
    let (heading, items) = writing_card(writing_topic(question));
    let mut out = String::from("<div class=\"space-y-4\">\n");
    out.push_str("<p><strong>I'm here to help with your writing!</strong></p>\n");
    open_card(&mut out, "bg-blue-50", "text-blue-800", heading);
    write_list(&mut out, "ul", "list-disc list-inside text-sm text-gray-900", items);
    out.push_str("</div>\n");
    open_card(&mut out, "bg-orange-50", "text-orange-800", "ADHD Writing Tips");
    write_list(&mut out, "ul", "list-disc list-inside text-sm text-gray-900", WRITING_TIPS);
    out.push_str("</div>\n");
    out.push_str(
        r#"<div class="bg-green-50 p-3 rounded"><p class="text-green-800"><strong>You're doing great!</strong> Writing is a process, and every draft gets better.</p></div>"#,
    );
    out.push_str("\n</div>");
    out
}

#[must_use]
pub fn general_answer(question: &str) -> String {
    format!(
        r#"<div class="space-y-3">
<p><strong>I'm here to help you with both math and writing!</strong></p>
<p>Your question: "{}"</p>
<div class="bg-blue-50 p-3 rounded"><h4 class="font-semibold text-blue-800">Math Help</h4><p class="text-sm text-gray-900">Ask about formulas, calculations, or specific math problems.</p></div>
<div class="bg-green-50 p-3 rounded"><h4 class="font-semibold text-green-800">Writing Help</h4><p class="text-sm text-gray-900">Ask about essays, citations, or the writing process.</p></div>
<p>Can you tell me more specifically what you need help with?</p>
</div>"#,
        escape(question)
    )
}

fn write_resources(out: &mut String, chapter: Option<&str>) {
    out.push_str("<p><strong>In the meantime, try these resources:</strong></p>\n<ul class=\"list-disc list-inside text-sm\">");
    let (href, title, note) = RESOURCES[0];
    let _ = write!(out, r#"<li><a href="{href}" class="text-green-800 underline">{title}</a>: {note}</li>"#);
    match chapter {
        Some(chapter) => {
            let chapter = escape(chapter);
            let _ = write!(
                out,
                r#"<li><a href="chapter-{chapter}.html" class="text-green-800 underline">Chapter {chapter} Page</a>: detailed explanations and examples</li>"#
            );
        }
        None => out.push_str(
            r#"<li><a href="tutor.html" class="text-green-800 underline">Chapter Pages</a>: detailed explanations and examples</li>"#,
        ),
    }
    let (href, title, note) = RESOURCES[1];
    let _ = writeln!(
        out,
        r#"<li><a href="{href}" target="_blank" rel="noopener" class="text-green-800 underline">{title}</a>: {note}</li></ul>"#
    );
}

/// Echoes `question` as the student typed it once rendered: the caller trims
/// it and markup characters are entity-escaped here, so `5 < 7` appears in the
/// source as `5 &lt; 7`.
fn notice(out: &mut String, question: &str, chapter: Option<&str>, bg: &str, title: &str, body: &str) {
    let _ = writeln!(out, r#"<p><strong>Question: "{}"</strong></p>"#, escape(question));
    if let Some(chapter) = chapter
        && let Some(topics) = chapter_topics(chapter)
    {
        let _ = writeln!(
            out,
            "<p><strong>Chapter {} covers:</strong> {}</p>",
            escape(chapter),
            escape(topics)
        );
    }
    let _ = writeln!(
        out,
        r#"<div class="{bg} p-3 rounded"><p class="text-gray-900"><strong>{title}</strong><br>{body}</p></div>"#
    );
}

/// Served when no API key is configured. Echoes the trimmed question, HTML-escaped,
/// then resources and the canned answer.
#[must_use]
pub fn setup_needed(question: &str, chapter: Option<&str>, api_key_env: &str, canned: &str) -> String {
    let mut out = String::from("<div class=\"space-y-3\">\n");
    notice(
        &mut out,
        question,
        chapter,
        "bg-yellow-50",
        "AI Tutor Setup Needed",
        &format!(
            "The AI tutor needs the {} environment variable to be configured.",
            escape(api_key_env)
        ),
    );
    write_resources(&mut out, chapter);
    out.push_str(canned);
    out.push_str("\n</div>");
    out
}

/// Served when the LLM call fails.
#[must_use]
pub fn temporary_issue(question: &str, chapter: Option<&str>, canned: &str) -> String {
    let mut out = String::from("<div class=\"space-y-3\">\n");
    notice(
        &mut out,
        question,
        chapter,
        "bg-red-50",
        "Temporary Service Issue",
        "The AI tutor is having a temporary problem. Here is what I can tell you from the course notes.",
    );
    write_resources(&mut out, chapter);
    out.push_str(canned);
    out.push_str("\n</div>");
    out
}

/// Model output as escaped paragraphs. Blank lines separate paragraphs; single
/// newlines become `<br>`.
#[must_use]
pub fn text_to_html(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape(l.trim_end())).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
