//! Read-only pass over the parsed page deciding what the rewriter changes.
//!
//! Plans are keyed by the element's position among elements matched by the same
//! selector in the rewriter (`[class]`, `p`, `input`). Each plan also records an
//! attribute of the original element so the rewriter can skip on a mismatch.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ego_tree::NodeId;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use super::FixKind;
use crate::a11y::{has_label, is_text_input, label_targets};
use crate::color::Rgb;
use crate::contrast::{BODY_ELEMENTS, ContrastChecker, FgSource, has_direct_text, is_non_rendered};
use crate::issue::collapsed_text;

static WITH_CLASS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[class]").unwrap());
static PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static INPUTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]+["')\]]*\s+"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassChange {
    pub original: String,
    pub updated: String,
    pub kinds: Vec<FixKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParagraphSplit {
    pub class: Option<String>,
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InputLabel {
    pub original_id: Option<String>,
    pub id: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub classes: HashMap<usize, ClassChange>,
    pub paragraphs: HashMap<usize, ParagraphSplit>,
    pub inputs: HashMap<usize, InputLabel>,
}

pub(crate) struct Planner<'a> {
    pub contrast: &'a ContrastChecker,
    pub dark_text: &'a str,
    pub light_text: &'a str,
    pub paragraph_limit: usize,
    pub split_paragraphs: bool,
}

impl Planner<'_> {
    pub fn plan(&self, doc: &Html) -> Plan {
        let mut plan = Plan::default();
        let updated = self.plan_classes(doc, &mut plan);
        if self.split_paragraphs {
            self.plan_paragraphs(doc, &updated, &mut plan);
        }
        plan_inputs(doc, &mut plan);
        plan
    }

    /// Classes are planned in document order so descendants resolve against
    /// their ancestors' updated classes. A failing text colour is replaced on
    /// the nearest classed element at or above the text, never above the
    /// element that declared the colour. Returns the updated class per element.
    fn plan_classes(&self, doc: &Html, plan: &mut Plan) -> HashMap<NodeId, String> {
        let table = self.contrast.table();
        let dark = table.text_color(self.dark_text).unwrap_or(Rgb::new(0x11, 0x18, 0x27));
        let light = table.text_color(self.light_text).unwrap_or(Rgb::WHITE);
        let in_body: HashSet<NodeId> = doc.select(&BODY_ELEMENTS).map(|el| el.id()).collect();
        let mut updated: HashMap<NodeId, String> = HashMap::new();
        let mut kinds: HashMap<NodeId, Vec<FixKind>> = HashMap::new();

        for el in doc.root_element().descendants().filter_map(ElementRef::wrap) {
            if let Some(original) = el.value().attr("class") {
                let tokens: Vec<&str> = original.split_whitespace().collect();
                let mut seen = HashSet::new();
                let deduped: Vec<&str> = tokens.iter().copied().filter(|t| seen.insert(*t)).collect();
                if deduped.len() != tokens.len() {
                    updated.insert(el.id(), deduped.join(" "));
                    kinds.entry(el.id()).or_default().push(FixKind::DuplicateClass);
                }
            }

            if !in_body.contains(&el.id()) || !has_direct_text(el) || is_non_rendered(el) {
                continue;
            }
            let resolved = self.contrast.resolve_with(el, |e| {
                updated
                    .get(&e.id())
                    .map(String::as_str)
                    .or_else(|| e.value().attr("class"))
            });
            if resolved.ratio() >= self.contrast.min_ratio() {
                continue;
            }
            let Some(target) = contrast_target(el, resolved.fg_source) else {
                tracing::debug!(element = %crate::issue::describe(el), "no class to carry a contrast fix");
                continue;
            };
            let applied = kinds.entry(target.id()).or_default();
            // One contrast change per element per pass keeps repeated runs stable.
            if applied.contains(&FixKind::Contrast) {
                continue;
            }
            let best = if self.contrast.prefer_dark(resolved.bg, dark, light) {
                self.dark_text
            } else {
                self.light_text
            };
            let current = updated
                .get(&target.id())
                .map(String::as_str)
                .or_else(|| target.value().attr("class"))
                .unwrap_or("");
            let fixed = current
                .split_whitespace()
                .filter(|t| !table.is_text_class(t))
                .chain(std::iter::once(best))
                .collect::<Vec<_>>()
                .join(" ");
            if fixed != current {
                applied.push(FixKind::Contrast);
                updated.insert(target.id(), fixed);
            }
        }

        for (index, el) in doc.select(&WITH_CLASS).enumerate() {
            let Some(applied) = kinds.remove(&el.id()).filter(|k| !k.is_empty()) else {
                continue;
            };
            if let Some(class) = updated.get(&el.id()) {
                plan.classes.insert(
                    index,
                    ClassChange {
                        original: el.value().attr("class").unwrap_or("").to_owned(),
                        updated: class.clone(),
                        kinds: applied,
                    },
                );
            }
        }
        updated
    }

    /// The recorded class is the one the element carries after class fixes.
    fn plan_paragraphs(&self, doc: &Html, updated: &HashMap<NodeId, String>, plan: &mut Plan) {
        for (index, p) in doc.select(&PARAGRAPHS).enumerate() {
            if !is_plain_text(p) {
                continue;
            }
            let text = collapsed_text(p);
            if text.chars().count() <= self.paragraph_limit {
                continue;
            }
            let chunks = group_sentences(&split_sentences(&text), self.paragraph_limit);
            if chunks.len() > 1 {
                plan.paragraphs.insert(
                    index,
                    ParagraphSplit {
                        class: updated
                            .get(&p.id())
                            .cloned()
                            .or_else(|| p.value().attr("class").map(str::to_owned)),
                        chunks,
                    },
                );
            }
        }
    }
}

fn plan_inputs(doc: &Html, plan: &mut Plan) {
    let targets = label_targets(doc);
    for (index, input) in doc.select(&INPUTS).enumerate() {
        if !is_text_input(input) || has_label(input, &targets) {
            continue;
        }
        let value = input.value();
        let original_id = value.id().map(str::to_owned);
        let id = original_id.clone().unwrap_or_else(|| {
            let key = format!("{index}:{}", input.html());
            format!("input-{}", &blake3::hash(key.as_bytes()).to_hex()[..8])
        });
        let text = ["aria-label", "placeholder", "name"]
            .iter()
            .find_map(|attr| value.attr(attr).filter(|v| !v.trim().is_empty()))
            .map_or_else(|| "Text input".to_owned(), |v| v.trim().to_owned());
        plan.inputs.insert(
            index,
            InputLabel {
                original_id,
                id,
                text,
            },
        );
    }
}

/// The element that takes the replacement text class: the nearest one with a
/// `class` attribute, starting at `el` and stopping at the colour's declaration.
/// An inline colour can only be overridden below the element that sets it.
fn contrast_target(el: ElementRef<'_>, source: FgSource) -> Option<ElementRef<'_>> {
    let (stop, stop_usable) = match source {
        FgSource::Default => (None, false),
        FgSource::Class(id) => (Some(id), true),
        FgSource::Inline(id) => (Some(id), false),
    };
    for node in std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap)) {
        let at_stop = stop == Some(node.id());
        if at_stop && !stop_usable {
            return None;
        }
        if node.value().attr("class").is_some() {
            return Some(node);
        }
        if at_stop {
            return None;
        }
    }
    None
}

fn is_plain_text(el: ElementRef<'_>) -> bool {
    el.children().all(|child| matches!(child.value(), Node::Text(_)))
}

/// Split after sentence punctuation followed by whitespace.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Greedily pack sentences into chunks of at most `limit` characters. A single
/// sentence longer than `limit` becomes its own chunk.
pub(crate) fn group_sentences(sentences: &[&str], limit: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for sentence in sentences {
        let fits = current.is_empty()
            || current.chars().count() + 1 + sentence.chars().count() <= limit;
        if !fits {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;

    fn plan(html: &str) -> Plan {
        let checker = ContrastChecker::new(&AuditConfig::default());
        let planner = Planner {
            contrast: &checker,
            dark_text: "text-gray-900",
            light_text: "text-white",
            paragraph_limit: 150,
            split_paragraphs: true,
        };
        planner.plan(&Html::parse_document(html))
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        assert_eq!(
            split_sentences("One. Two!  Three? \"Four.\" Five"),
            vec!["One.", "Two!", "Three?", "\"Four.\"", "Five"]
        );
        assert_eq!(split_sentences("3.5 percent is fine"), vec!["3.5 percent is fine"]);
    }

    #[test]
    fn grouping_respects_limit() {
        let chunks = group_sentences(&["aaaa.", "bbbb.", "cccc."], 11);
        assert_eq!(chunks, vec!["aaaa. bbbb.", "cccc."]);
        let long = group_sentences(&["x".repeat(20).as_str()], 5);
        assert_eq!(long.len(), 1);
    }

    #[test]
    fn duplicate_classes_collapse() {
        let plan = plan(r#"<div class="p-4 rounded p-4"></div>"#);
        let change = &plan.classes[&0];
        assert_eq!(change.updated, "p-4 rounded");
        assert_eq!(change.kinds, vec![FixKind::DuplicateClass]);
    }

    #[test]
    fn clean_classes_have_no_plan() {
        let plan = plan(r#"<div class="p-4  rounded"><p class="text-gray-900">ok</p></div>"#);
        assert!(plan.classes.is_empty());
    }

    #[test]
    fn failing_text_token_is_replaced() {
        let plan = plan(
            r#"<div class="bg-cream"><p class="text-white font-bold">Faint</p></div>"#,
        );
        let change = &plan.classes[&1];
        assert_eq!(change.updated, "font-bold text-gray-900");
        assert_eq!(change.kinds, vec![FixKind::Contrast]);
    }

    #[test]
    fn light_token_on_dark_background() {
        let plan = plan(r#"<header class="bg-gray-900"><h1 class="text-gray-800">T</h1></header>"#);
        assert_eq!(plan.classes[&1].updated, "text-white");
    }

    #[test]
    fn descendants_see_planned_ancestor_classes() {
        // Parent is fixed to dark text; the child inherits it on its light-blue card.
        let plan = plan(
            r#"<div class="bg-cream"><div class="text-white">Title<span class="bg-blue-50">inner</span></div></div>"#,
        );
        assert_eq!(plan.classes[&1].updated, "text-gray-900");
        assert!(!plan.classes.contains_key(&2));
    }

    #[test]
    fn container_colour_is_fixed_for_unclassed_text() {
        let plan = plan(r#"<div class="bg-cream text-white"><p>Faint words</p></div>"#);
        let change = &plan.classes[&0];
        assert_eq!(change.updated, "bg-cream text-gray-900");
        assert_eq!(change.kinds, vec![FixKind::Contrast]);
    }

    #[test]
    fn nearest_classed_ancestor_takes_the_fix() {
        // The card sits inside the white-text wrapper; only the card changes.
        let plan = plan(
            r#"<div class="text-white"><section class="bg-cream p-4"><p>Faint</p></section></div>"#,
        );
        assert!(!plan.classes.contains_key(&0));
        assert_eq!(plan.classes[&1].updated, "bg-cream p-4 text-gray-900");
    }

    #[test]
    fn inherited_inline_colour_is_left_alone() {
        let plan = plan(r#"<div class="bg-cream" style="color:#fff"><p>Faint</p></div>"#);
        assert!(plan.classes.is_empty());
    }

    #[test]
    fn inline_colour_is_left_alone() {
        let plan = plan(r#"<div class="bg-cream"><p class="x" style="color:#fff">Faint</p></div>"#);
        assert!(plan.classes.is_empty());
    }

    #[test]
    fn long_plain_paragraph_is_split() {
        let text = "This sentence is about forty characters. ".repeat(6);
        let plan = plan(&format!(r#"<p class="lead">{text}</p><p>short</p>"#));
        let split = &plan.paragraphs[&0];
        assert!(split.chunks.len() >= 2);
        assert!(split.chunks.iter().all(|c| c.chars().count() <= 150));
        assert_eq!(split.class.as_deref(), Some("lead"));
    }

    #[test]
    fn paragraph_with_markup_is_not_split() {
        let text = "This sentence is about forty characters. ".repeat(6);
        let plan = plan(&format!("<p>{text}<strong>bold</strong></p>"));
        assert!(plan.paragraphs.is_empty());
    }

    #[test]
    fn unlabeled_inputs_get_labels() {
        let plan = plan(
            r#"<label for="a">A</label><input id="a"><input id="b" placeholder="Search terms"><input type="checkbox"><input name="q">"#,
        );
        assert_eq!(plan.inputs.len(), 2);
        let b = &plan.inputs[&1];
        assert_eq!(b.id, "b");
        assert_eq!(b.text, "Search terms");
        let q = &plan.inputs[&3];
        assert!(q.id.starts_with("input-"));
        assert_eq!(q.id.len(), "input-".len() + 8);
        assert_eq!(q.original_id, None);
        assert_eq!(q.text, "q");
    }
}
