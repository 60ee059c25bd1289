use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::html::{escape, token};

pub const TUTOR_ENDPOINT: &str = "/api/ai-tutor";

const NAV_LINKS: &[(&str, &str)] = &[
    ("#overview", "Chapter Overview"),
    ("#tutorials", "Step-by-Step Tutorials"),
    ("#formulas", "Formula Sheet"),
    ("#practice", "Practice Problems"),
    ("#ai-help", "Ask AI Tutor"),
    ("#study-tips", "ADHD Study Tips"),
];

const CHECKLIST: &[(&str, &str)] = &[
    ("overview", "Read the overview"),
    ("tutorials", "Worked the tutorials"),
    ("formulas", "Reviewed the formulas"),
    ("practice", "Finished practice"),
    ("ai-help-used", "Asked the AI tutor"),
];

const STUDY_TIPS: &[&str] = &[
    "Work in 25-minute blocks with a 5-minute break.",
    "Copy each formula by hand once before using it.",
    "Say each step out loud before you write it down.",
    "Check your answer: does it make sense in the real world?",
];

/// Input for one chapter page. Every field has a default so partial
/// descriptors still render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterDescriptor {
    pub num: u32,
    pub title: String,
    pub description: String,
    pub color: String,
    pub icon: String,
}

impl Default for ChapterDescriptor {
    fn default() -> Self {
        Self {
            num: 0,
            title: String::new(),
            description: String::new(),
            color: "blue".into(),
            icon: "book-open".into(),
        }
    }
}

impl ChapterDescriptor {
    #[must_use]
    pub fn new(num: u32, title: &str, description: &str, color: &str, icon: &str) -> Self {
        Self {
            num,
            title: title.to_owned(),
            description: description.to_owned(),
            color: color.to_owned(),
            icon: icon.to_owned(),
        }
    }

    /// Output file name, `chapter-{num}.html`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("chapter-{}.html", self.num)
    }

    /// Knowledge base key for this chapter.
    #[must_use]
    pub fn chapter_key(&self) -> String {
        format!("chapter_{}", self.num)
    }
}

#[must_use]
pub fn default_chapters() -> Vec<ChapterDescriptor> {
    vec![
        ChapterDescriptor::new(
            1,
            "Mathematical Thinking",
            "Problem solving strategies, estimation, and inductive versus deductive reasoning.",
            "blue",
            "brain",
        ),
        ChapterDescriptor::new(
            4,
            "Proportions & Percentages",
            "Ratios, rates, proportions, and percent change in everyday situations.",
            "green",
            "percent",
        ),
        ChapterDescriptor::new(
            6,
            "Personal Finance",
            "Simple and compound interest, savings plans, and loan payments.",
            "purple",
            "dollar-sign",
        ),
    ]
}

/// Render a chapter page with a placeholder formula sheet.
#[must_use]
pub fn render_chapter_page(chapter: &ChapterDescriptor) -> String {
    render_chapter_page_with_formulas(chapter, &[])
}

/// Render a chapter page. `formulas` fill the formula sheet; an empty slice
/// renders a placeholder.
#[must_use]
pub fn render_chapter_page_with_formulas(chapter: &ChapterDescriptor, formulas: &[&str]) -> String {
    let num = chapter.num;
    let title = escape(&chapter.title);
    let color = token(&chapter.color, "blue");
    let icon = token(&chapter.icon, "book-open");

    let mut out = String::with_capacity(16 * 1024);
    let _ = write!(
        out,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Chapter {num}: {title} - Math Tutor</title>
    <link rel="stylesheet" href="design-system.css">
</head>
<body class="bg-white" data-chapter="{num}" data-tutor-endpoint="{TUTOR_ENDPOINT}">

<header class="bg-gray-900">
    <div class="max-w-6xl mx-auto px-4 py-6 flex items-center justify-between">
        <h1 class="text-2xl font-bold text-white flex items-center gap-2">
            <i data-lucide="{icon}" class="w-8 h-8" aria-hidden="true"></i>
            Chapter {num}: {title}
        </h1>
        <nav aria-label="Site">
            <a href="index.html" class="text-white underline">Back to Chapters</a>
        </nav>
    </div>
</header>

<main class="max-w-6xl mx-auto px-4 py-8">
"#
    );

    write_nav(&mut out, &color);
    write_overview(&mut out, chapter, &color);
    write_section_open(&mut out, "tutorials", "Step-by-Step Tutorials", "play-circle");
    out.push_str(
        r#"        <div id="tutorial-content">
            <p class="text-gray-700">Tutorials for this chapter are loading.</p>
        </div>
    </section>
"#,
    );
    write_formulas(&mut out, formulas);
    write_section_open(&mut out, "practice", "Practice Problems", "pencil");
    out.push_str(
        r#"        <div id="practice-content">
            <p class="text-gray-700">Practice sets live in Hawkes Learning. Use the formula sheet above while you work.</p>
        </div>
    </section>
"#,
    );
    write_tutor_widget(&mut out, num);
    write_study_tips(&mut out);
    write_progress(&mut out, num);

    out.push_str("</main>\n\n");
    out.push_str(r#"<script src="https://unpkg.com/lucide@latest/dist/umd/lucide.js"></script>"#);
    out.push_str("\n<script>\n");
    out.push_str(CHAPTER_SCRIPT);
    out.push_str("</script>\n\n</body>\n</html>\n");
    out
}

fn write_nav(out: &mut String, color: &str) {
    let _ = writeln!(
        out,
        r#"    <nav aria-label="Chapter sections" class="bg-white border-l-4 border-{color}-500 rounded-lg shadow-sm p-6 mb-8">
        <ul class="flex flex-wrap gap-4 text-sm">"#
    );
    for (href, label) in NAV_LINKS {
        let _ = writeln!(
            out,
            r#"            <li><a href="{href}" class="text-gray-900 underline">{label}</a></li>"#
        );
    }
    out.push_str("        </ul>\n    </nav>\n\n");
}

fn write_section_open(out: &mut String, id: &str, heading: &str, icon: &str) {
    let _ = write!(
        out,
        r#"    <section id="{id}" class="bg-white rounded-lg shadow-sm p-6 mb-8">
        <h2 class="text-xl font-semibold text-gray-900 flex items-center gap-2 mb-4">
            <i data-lucide="{icon}" class="w-5 h-5" aria-hidden="true"></i>
            {heading}
        </h2>
"#
    );
}

fn write_overview(out: &mut String, chapter: &ChapterDescriptor, color: &str) {
    write_section_open(out, "overview", "Chapter Overview", "compass");
    let description = escape(&chapter.description);
    let _ = write!(
        out,
        r#"        <p class="text-gray-700">{description}</p>
        <div class="grid md:grid-cols-2 gap-4 mt-4">
            <div class="bg-{color}-50 border-l-4 border-{color}-500 p-4">
                <h3 class="font-semibold text-gray-900 mb-2">What You'll Learn</h3>
                <div id="learning-objectives"></div>
            </div>
            <div class="bg-{color}-50 border-l-4 border-{color}-500 p-4">
                <h3 class="font-semibold text-gray-900 mb-2">Real-World Applications</h3>
                <div id="applications"></div>
            </div>
        </div>
    </section>
"#
    );
}

fn write_formulas(out: &mut String, formulas: &[&str]) {
    write_section_open(out, "formulas", "Formula Sheet", "sigma");
    if formulas.is_empty() {
        out.push_str(
            r#"        <p class="text-gray-700">No formulas have been extracted for this chapter yet.</p>
"#,
        );
    } else {
        out.push_str("        <div class=\"space-y-2\">\n");
        for formula in formulas {
            let _ = writeln!(
                out,
                r#"            <div class="font-mono bg-gray-50 text-gray-900 p-2 rounded border">{}</div>"#,
                escape(formula)
            );
        }
        out.push_str("        </div>\n");
    }
    out.push_str("    </section>\n");
}

fn write_tutor_widget(out: &mut String, num: u32) {
    write_section_open(out, "ai-help", "Ask Your AI Tutor", "bot");
    let _ = write!(
        out,
        r#"        <p class="text-gray-700">Stuck on something? Get personalized help right now.</p>
        <div class="border border-gray-200 rounded-lg p-4 mt-4">
            <label for="ai-question" class="sr-only">Question for the AI tutor</label>
            <textarea id="ai-question" class="w-full h-24 p-3 border border-gray-300 rounded"
                placeholder="Ask me anything about Chapter {num}..."></textarea>
            <button type="button" onclick="askAITutor({num})" class="btn btn-primary mt-3">
                <i data-lucide="send" class="w-4 h-4 mr-2" aria-hidden="true"></i>
                Get Help Now
            </button>
        </div>
        <div id="ai-response" class="hidden mt-4 p-4 bg-green-50 border border-green-200 rounded-lg" aria-live="polite">
            <h3 class="font-semibold text-green-800 mb-2">Your AI Tutor Says:</h3>
            <div id="ai-answer" class="text-gray-900"></div>
        </div>
    </section>
"#
    );
}

fn write_study_tips(out: &mut String) {
    write_section_open(out, "study-tips", "ADHD Study Tips", "lightbulb");
    out.push_str("        <ul class=\"list-disc list-inside text-gray-700 space-y-1\">\n");
    for tip in STUDY_TIPS {
        let _ = writeln!(out, "            <li>{tip}</li>");
    }
    out.push_str("        </ul>\n    </section>\n");
}

fn write_progress(out: &mut String, num: u32) {
    write_section_open(out, "progress", "Your Progress", "target");
    let _ = write!(
        out,
        r#"        <div class="flex items-center justify-between">
            <span class="text-gray-900">Chapter {num} Completion</span>
            <div class="flex items-center gap-2">
                <div class="w-32 h-2 bg-gray-200 rounded-full">
                    <div id="progress-bar-{num}" class="h-2 bg-yellow-500 rounded-full" style="width: 0%"></div>
                </div>
                <span id="progress-text-{num}" class="text-sm text-gray-700">0%</span>
            </div>
        </div>
        <div id="progress-checklist-{num}" class="grid grid-cols-2 md:grid-cols-5 gap-3 mt-4">
"#
    );
    for (key, label) in CHECKLIST {
        let _ = writeln!(
            out,
            r#"            <label class="text-gray-900"><input type="checkbox" data-progress="{key}"> {label}</label>"#
        );
    }
    out.push_str("        </div>\n    </section>\n\n");
}

const CHAPTER_SCRIPT: &str = r#"    const chapterNum = document.body.dataset.chapter;
    const tutorEndpoint = document.body.dataset.tutorEndpoint;
    const storageKey = 'chapter-progress-' + chapterNum;

    function getProgress() {
        try {
            return JSON.parse(localStorage.getItem(storageKey)) || {};
        } catch (e) {
            return {};
        }
    }

    function saveProgress(progress) {
        localStorage.setItem(storageKey, JSON.stringify(progress));
    }

    function updateProgressDisplay() {
        const progress = getProgress();
        const boxes = document.querySelectorAll('#progress-checklist-' + chapterNum + ' input[data-progress]');
        let done = 0;
        boxes.forEach(function (box) {
            box.checked = Boolean(progress[box.dataset.progress]);
            if (box.checked) done += 1;
        });
        const pct = boxes.length ? Math.round((done / boxes.length) * 100) : 0;
        document.getElementById('progress-bar-' + chapterNum).style.width = pct + '%';
        document.getElementById('progress-text-' + chapterNum).textContent = pct + '%';
    }

    function updateProgress(action, value) {
        const progress = getProgress();
        progress[action] = value !== false;
        saveProgress(progress);
        updateProgressDisplay();
    }

    async function askAITutor(chapter) {
        const question = document.getElementById('ai-question').value;
        if (!question.trim()) return;

        const responseDiv = document.getElementById('ai-response');
        const answerDiv = document.getElementById('ai-answer');
        responseDiv.classList.remove('hidden');
        answerDiv.textContent = 'Thinking...';

        try {
            const response = await fetch(tutorEndpoint, {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ question: question, chapter: chapter, context: 'math-tutorial' })
            });
            const data = await response.json();
            answerDiv.innerHTML = data.answer || data.response || '';
            updateProgress('ai-help-used');
        } catch (error) {
            answerDiv.textContent = 'Sorry, I had trouble connecting. Please try again in a moment.';
        }
    }

    document.addEventListener('DOMContentLoaded', function () {
        document.querySelectorAll('#progress-checklist-' + chapterNum + ' input[data-progress]').forEach(function (box) {
            box.addEventListener('change', function () { updateProgress(box.dataset.progress, box.checked); });
        });
        updateProgressDisplay();
        if (window.lucide) lucide.createIcons();
    });
"#;
