//! Text contrast against the resolved background of each element.

use std::sync::LazyLock;

use ego_tree::NodeId;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::color::{ColorTable, Rgb, contrast_ratio, style_color};
use crate::config::AuditConfig;
use crate::issue::{Issue, IssueKind, Severity, describe, snippet};

pub(crate) static BODY_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body *").unwrap());

const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template", "title", "head"];

/// Palette pairs that have caused trouble on course pages before.
pub const PALETTE_PAIRS: &[(&str, &str)] = &[
    ("#ffffff", "#faf7f0"),
    ("#ffffff", "#f2f2f2"),
    ("#ffffff", "#e2e8f0"),
    ("#000000", "#2d3748"),
];

/// Where the resolved text colour was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FgSource {
    /// Nothing in the chain sets a colour; the configured default applies.
    Default,
    Inline(NodeId),
    Class(NodeId),
}

/// Foreground and background after inheritance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub fg: Rgb,
    pub bg: Rgb,
    pub fg_source: FgSource,
}

impl Resolved {
    #[must_use]
    pub fn ratio(&self) -> f64 {
        contrast_ratio(self.fg, self.bg)
    }
}

#[derive(Debug, Clone)]
pub struct ContrastChecker {
    table: ColorTable,
    default_fg: Rgb,
    default_bg: Rgb,
    min_ratio: f64,
    severe_ratio: f64,
    check_palette: bool,
}

impl ContrastChecker {
    #[must_use]
    pub fn new(config: &AuditConfig) -> Self {
        let default_bg = Rgb::parse_css(&config.default_background).unwrap_or_else(|| {
            tracing::warn!(value = %config.default_background, "invalid default background, using #ffffff");
            Rgb::WHITE
        });
        let default_fg = Rgb::parse_css(&config.default_foreground).unwrap_or_else(|| {
            tracing::warn!(value = %config.default_foreground, "invalid default foreground, using #111827");
            Rgb::new(0x11, 0x18, 0x27)
        });
        Self {
            table: ColorTable::with_overrides(&config.colors),
            default_fg,
            default_bg,
            min_ratio: config.min_contrast,
            severe_ratio: config.severe_contrast,
            check_palette: config.check_palette,
        }
    }

    #[must_use]
    pub fn table(&self) -> &ColorTable {
        &self.table
    }

    #[must_use]
    pub fn min_ratio(&self) -> f64 {
        self.min_ratio
    }

    /// Walk from `el` to the root; the nearest declaration of each colour wins.
    /// Inline styles beat classes on the same element.
    #[must_use]
    pub fn resolve(&self, el: ElementRef<'_>) -> Resolved {
        self.resolve_with(el, |e| e.value().attr("class"))
    }

    /// Like [`resolve`](Self::resolve), reading each element's class list through `class_of`.
    pub fn resolve_with<'a, 'b>(
        &self,
        el: ElementRef<'a>,
        class_of: impl Fn(ElementRef<'a>) -> Option<&'b str>,
    ) -> Resolved
    where
        'a: 'b,
    {
        let mut fg = None;
        let mut bg = None;
        let mut fg_source = FgSource::Default;

        let chain = std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap));
        for node in chain {
            let value = node.value();
            let style = value.attr("style").unwrap_or("");
            let classes = class_of(node).unwrap_or("");
            if fg.is_none() {
                if let Some(color) = style_color(style, "color") {
                    fg = Some(color);
                    fg_source = FgSource::Inline(node.id());
                } else if let Some(color) = self.table.text_from_classes(classes) {
                    fg = Some(color);
                    fg_source = FgSource::Class(node.id());
                }
            }
            if bg.is_none() {
                bg = style_color(style, "background-color")
                    .or_else(|| self.table.background_from_classes(classes));
            }
            if fg.is_some() && bg.is_some() {
                break;
            }
        }

        Resolved {
            fg: fg.unwrap_or(self.default_fg),
            bg: bg.unwrap_or(self.default_bg),
            fg_source,
        }
    }

    /// Of the two candidate colours, the one with more contrast on `bg`.
    #[must_use]
    pub fn prefer_dark(&self, bg: Rgb, dark: Rgb, light: Rgb) -> bool {
        contrast_ratio(dark, bg) >= contrast_ratio(light, bg)
    }

    #[must_use]
    pub fn check(&self, file: &str, doc: &Html) -> Vec<Issue> {
        doc.select(&BODY_ELEMENTS)
            .filter(|el| has_direct_text(*el) && !is_non_rendered(*el))
            .filter_map(|el| {
                let resolved = self.resolve(el);
                let ratio = resolved.ratio();
                (ratio < self.min_ratio).then(|| {
                    let severity = if ratio < self.severe_ratio {
                        Severity::High
                    } else {
                        Severity::Medium
                    };
                    Issue::new(
                        file,
                        IssueKind::Contrast,
                        severity,
                        format!(
                            "{} text {} on {} has contrast {ratio:.2}:1 (needs {:.1}:1): \"{}\"",
                            describe(el),
                            resolved.fg,
                            resolved.bg,
                            self.min_ratio,
                            snippet(el, 40)
                        ),
                    )
                })
            })
            .collect()
    }

    /// Findings for the fixed palette pairs; empty unless enabled.
    #[must_use]
    pub fn palette_issues(&self) -> Vec<Issue> {
        if !self.check_palette {
            return Vec::new();
        }
        PALETTE_PAIRS
            .iter()
            .filter_map(|(fg, bg)| Some((Rgb::from_hex(fg)?, Rgb::from_hex(bg)?)))
            .filter_map(|(fg, bg)| {
                let ratio = contrast_ratio(fg, bg);
                (ratio < self.min_ratio).then(|| {
                    Issue::new(
                        "palette",
                        IssueKind::Palette,
                        Severity::High,
                        format!("{fg} on {bg} has contrast {ratio:.2}:1"),
                    )
                })
            })
            .collect()
    }
}

pub(crate) fn has_direct_text(el: ElementRef<'_>) -> bool {
    el.children().any(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    })
}

pub(crate) fn is_non_rendered(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|e| NON_RENDERED.contains(&e.value().name()))
}
