//! Colour parsing, WCAG contrast math and the class → colour lookup table.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional).
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_owned(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse a CSS colour value: hex, `rgb()`/`rgba()` or `white`/`black`.
    #[must_use]
    pub fn parse_css(value: &str) -> Option<Self> {
        let value = value.trim().trim_end_matches("!important").trim();
        let lower = value.to_ascii_lowercase();
        if lower.starts_with('#') {
            return Self::from_hex(&lower);
        }
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let mut parts = args.split([',', ' ']).filter(|p| !p.is_empty());
            let mut next = || parts.next()?.trim().parse::<u8>().ok();
            return Some(Self::new(next()?, next()?, next()?));
        }
        match lower.as_str() {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            _ => None,
        }
    }

    /// WCAG 2.x relative luminance.
    #[must_use]
    pub fn luminance(self) -> f64 {
        fn linear(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Contrast ratio between two colours, in `1.0..=21.0`. Order does not matter.
#[must_use]
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (a.luminance(), b.luminance());
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// Colour declared by an inline `style` for `property`.
///
/// `background` shorthand is accepted for `background-color`.
#[must_use]
pub fn style_color(style: &str, property: &str) -> Option<Rgb> {
    let mut found = None;
    for decl in style.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let matches = name == property || (property == "background-color" && name == "background");
        if matches
            && let Some(color) = Rgb::parse_css(value)
                .or_else(|| value.split_whitespace().find_map(Rgb::parse_css))
        {
            found = Some(color);
        }
    }
    found
}

const DEFAULT_TEXT: &[(&str, &str)] = &[
    ("text-white", "#ffffff"),
    ("text-black", "#000000"),
    ("text-gray-300", "#d1d5db"),
    ("text-gray-400", "#9ca3af"),
    ("text-gray-500", "#6b7280"),
    ("text-gray-600", "#4b5563"),
    ("text-gray-700", "#374151"),
    ("text-gray-800", "#1f2937"),
    ("text-gray-900", "#111827"),
    ("text-yellow-300", "#fde047"),
    ("text-orange-300", "#fdba74"),
    ("text-blue-600", "#2563eb"),
    ("text-blue-800", "#1e40af"),
    ("text-green-800", "#166534"),
    ("text-purple-800", "#6b21a8"),
    ("text-text-primary", "#1a202c"),
    ("text-text-secondary", "#4a5568"),
    ("card-title-dark", "#1a202c"),
];

const DEFAULT_BACKGROUND: &[(&str, &str)] = &[
    ("bg-white", "#ffffff"),
    ("bg-black", "#000000"),
    ("bg-gray-50", "#f9fafb"),
    ("bg-gray-100", "#f3f4f6"),
    ("bg-gray-200", "#e5e7eb"),
    ("bg-gray-800", "#1f2937"),
    ("bg-gray-900", "#111827"),
    ("bg-beige", "#f5f5dc"),
    ("bg-cream", "#faf7f0"),
    ("bg-yellow-50", "#fefce8"),
    ("bg-blue-50", "#eff6ff"),
    ("bg-green-50", "#f0fdf4"),
    ("bg-purple-50", "#faf5ff"),
    ("bg-background-secondary", "#f2f2f2"),
    ("header-dark", "#2d3748"),
];

/// Maps utility class names to the colours they apply.
#[derive(Debug, Clone)]
pub struct ColorTable {
    text: HashMap<String, Rgb>,
    background: HashMap<String, Rgb>,
}

impl Default for ColorTable {
    fn default() -> Self {
        let load = |entries: &[(&str, &str)]| {
            entries
                .iter()
                .filter_map(|(class, hex)| Some(((*class).to_owned(), Rgb::from_hex(hex)?)))
                .collect()
        };
        Self {
            text: load(DEFAULT_TEXT),
            background: load(DEFAULT_BACKGROUND),
        }
    }
}

impl ColorTable {
    /// Default table with `extra` merged on top. Entries whose class starts with
    /// `bg-` are backgrounds, everything else is text. Unparseable colours are skipped.
    #[must_use]
    pub fn with_overrides<'a>(extra: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut table = Self::default();
        for (class, hex) in extra {
            let Some(color) = Rgb::from_hex(hex) else {
                tracing::warn!(class, hex, "ignoring unparseable colour override");
                continue;
            };
            if class.starts_with("bg-") {
                table.background.insert(class.clone(), color);
            } else {
                table.text.insert(class.clone(), color);
            }
        }
        table
    }

    #[must_use]
    pub fn text_color(&self, class: &str) -> Option<Rgb> {
        self.text.get(class).copied()
    }

    #[must_use]
    pub fn background_color(&self, class: &str) -> Option<Rgb> {
        self.background.get(class).copied()
    }

    /// Text colour set by a class attribute. The last known token wins.
    #[must_use]
    pub fn text_from_classes(&self, classes: &str) -> Option<Rgb> {
        classes
            .split_whitespace()
            .filter_map(|c| self.text_color(c))
            .last()
    }

    #[must_use]
    pub fn background_from_classes(&self, classes: &str) -> Option<Rgb> {
        classes
            .split_whitespace()
            .filter_map(|c| self.background_color(c))
            .last()
    }

    #[must_use]
    pub fn is_text_class(&self, class: &str) -> bool {
        self.text.contains_key(class)
    }
}
