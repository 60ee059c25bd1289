//! Single streaming pass applying a [`Plan`] plus the stateless fixes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use coursekit_pages::html::escape;
use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, element};
use regex::Regex;

use super::FixKind;
use super::plan::Plan;
use crate::error::Result;
use crate::links::{LinkKind, classify, resolve_file, strip_suffixes, target_exists};

pub(crate) struct RewriteContext<'a> {
    pub plan: &'a Plan,
    pub rules: &'a [(Regex, String)],
    pub disable_missing_links: bool,
    pub root: &'a Path,
    pub source: &'a Path,
}

impl RewriteContext<'_> {
    /// A local file reference whose target is not on disk.
    fn is_missing(&self, url: &str) -> bool {
        classify(url) == Some(LinkKind::File)
            && !strip_suffixes(url.trim()).is_empty()
            && !target_exists(&resolve_file(self.root, self.source, url))
    }
}

pub(crate) fn rewrite(
    html: &str,
    ctx: &RewriteContext<'_>,
) -> Result<(String, BTreeMap<FixKind, usize>)> {
    let applied: RefCell<BTreeMap<FixKind, usize>> = RefCell::new(BTreeMap::new());
    let bump = |kind: FixKind| *applied.borrow_mut().entry(kind).or_insert(0) += 1;

    let mut class_index = 0usize;
    let mut paragraph_index = 0usize;
    let mut input_index = 0usize;
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("[class]", |el| {
                    let index = class_index;
                    class_index += 1;
                    if let Some(change) = ctx.plan.classes.get(&index) {
                        if el.get_attribute("class").as_deref() == Some(change.original.as_str()) {
                            el.set_attribute("class", &change.updated)?;
                            for kind in &change.kinds {
                                bump(*kind);
                            }
                        } else {
                            tracing::debug!(index, "class plan out of step with markup, skipping");
                        }
                    }
                    Ok(())
                }),
                element!("p", |el| {
                    let index = paragraph_index;
                    paragraph_index += 1;
                    if let Some(split) = ctx.plan.paragraphs.get(&index)
                        && el.get_attribute("class") == split.class
                    {
                        let attributes: Vec<(String, String)> = el
                            .attributes()
                            .iter()
                            .map(|a| (a.name(), a.value()))
                            .collect();
                        let mut replacement = String::new();
                        for (i, chunk) in split.chunks.iter().enumerate() {
                            if i > 0 {
                                replacement.push('\n');
                            }
                            replacement.push_str("<p");
                            for (name, value) in &attributes {
                                if name == "id" && i > 0 {
                                    continue;
                                }
                                let _ = write!(replacement, " {name}=\"{}\"", value.replace('"', "&quot;"));
                            }
                            let _ = write!(replacement, ">{}</p>", escape(chunk));
                        }
                        el.replace(&replacement, ContentType::Html);
                        bump(FixKind::ParagraphSplit);
                    }
                    Ok(())
                }),
                element!("img", |el| {
                    if el.get_attribute("alt").is_none_or(|alt| alt.trim().is_empty()) {
                        let alt = alt_from_src(el.get_attribute("src").as_deref());
                        el.set_attribute("alt", &alt)?;
                        bump(FixKind::AltText);
                    }
                    Ok(())
                }),
                element!("input", |el| {
                    let index = input_index;
                    input_index += 1;
                    if let Some(label) = ctx.plan.inputs.get(&index)
                        && el.get_attribute("id") == label.original_id
                    {
                        if label.original_id.is_none() {
                            el.set_attribute("id", &label.id)?;
                        }
                        el.before(
                            &format!(
                                r#"<label for="{}" class="sr-only">{}</label>"#,
                                escape(&label.id),
                                escape(&label.text)
                            ),
                            ContentType::Html,
                        );
                        bump(FixKind::InputLabel);
                    }
                    Ok(())
                }),
                element!("i[data-lucide]", |el| {
                    if !el.has_attribute("aria-label") && !el.has_attribute("aria-hidden") {
                        el.set_attribute("aria-hidden", "true")?;
                        bump(FixKind::IconHidden);
                    }
                    Ok(())
                }),
                element!("[href]", |el| {
                    let Some(mut href) = el.get_attribute("href") else {
                        return Ok(());
                    };
                    if let Some(rewritten) = apply_rules(ctx.rules, &href) {
                        el.set_attribute("href", &rewritten)?;
                        bump(FixKind::LinkRewrite);
                        href = rewritten;
                    }
                    if ctx.disable_missing_links && ctx.is_missing(&href) {
                        el.remove_attribute("href");
                        if el.tag_name() == "a" {
                            el.set_attribute("aria-disabled", "true")?;
                            bump(FixKind::DisabledLink);
                        } else {
                            bump(FixKind::DroppedReference);
                        }
                    }
                    Ok(())
                }),
                // Registered after `img` so alt text is derived from the original src.
                element!("[src]", |el| {
                    let Some(mut src) = el.get_attribute("src") else {
                        return Ok(());
                    };
                    if let Some(rewritten) = apply_rules(ctx.rules, &src) {
                        el.set_attribute("src", &rewritten)?;
                        bump(FixKind::LinkRewrite);
                        src = rewritten;
                    }
                    if ctx.disable_missing_links && ctx.is_missing(&src) {
                        el.remove_attribute("src");
                        bump(FixKind::DroppedReference);
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );
    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok((
        String::from_utf8_lossy(&output).into_owned(),
        applied.into_inner(),
    ))
}

fn apply_rules(rules: &[(Regex, String)], value: &str) -> Option<String> {
    let mut out = value.to_owned();
    for (pattern, replacement) in rules {
        out = pattern.replace_all(&out, replacement.as_str()).into_owned();
    }
    (out != value).then_some(out)
}

/// Human-readable alt text from an image path: `img/compound-interest_chart.png`
/// becomes `Compound interest chart`.
pub(crate) fn alt_from_src(src: Option<&str>) -> String {
    let file = src
        .map(strip_suffixes)
        .and_then(|s| s.rsplit('/').next())
        .unwrap_or("");
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    let words: Vec<&str> = stem
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return "Image".to_owned();
    }
    let text = words.join(" ");
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
