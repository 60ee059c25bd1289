use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::{ExtractedDocument, ExtractedItem};
use crate::loader::Category;

/// `chapter_key → items`, sorted by key.
pub type ChapterItems = BTreeMap<String, Vec<KnowledgeItem>>;

/// Typed English guidance entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

impl Detail {
    #[must_use]
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }
}

/// One stored entry: a plain string or a `{type, content}` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KnowledgeItem {
    Text(String),
    Detail(Detail),
}

impl KnowledgeItem {
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Detail(d) => &d.content,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MathKnowledge {
    #[serde(default)]
    pub formulas: ChapterItems,
    #[serde(default)]
    pub concepts: ChapterItems,
    #[serde(default)]
    pub examples: ChapterItems,
    #[serde(default)]
    pub procedures: ChapterItems,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnglishKnowledge {
    #[serde(default)]
    pub essay_types: ChapterItems,
    #[serde(default)]
    pub writing_process: ChapterItems,
    #[serde(default)]
    pub citations: ChapterItems,
    #[serde(default)]
    pub examples: ChapterItems,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Aggregated course knowledge, rebuilt from scratch on every extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub math: MathKnowledge,
    #[serde(default)]
    pub english: EnglishKnowledge,
    #[serde(default)]
    pub metadata: Metadata,
}

impl KnowledgeBase {
    /// Fold extraction results in the given order.
    #[must_use]
    pub fn from_documents(documents: &[ExtractedDocument]) -> Self {
        let mut kb = Self::default();
        for doc in documents {
            kb.metadata.sources.push(doc.path.clone());
            for item in &doc.items {
                kb.append(doc.category, &doc.chapter, item.clone());
            }
        }
        kb.metadata.last_updated = chrono::Utc::now().to_rfc3339();
        kb
    }

    /// Append `item` at `[category][kind][chapter]`, creating the list if absent.
    pub fn append(&mut self, category: Category, chapter: &str, item: ExtractedItem) {
        let (slot, value) = match item {
            ExtractedItem::Formula(s) => (&mut self.math.formulas, KnowledgeItem::Text(s)),
            ExtractedItem::Concept(s) => (&mut self.math.concepts, KnowledgeItem::Text(s)),
            ExtractedItem::Procedure(s) => (&mut self.math.procedures, KnowledgeItem::Text(s)),
            ExtractedItem::Example(s) if category == Category::English => {
                (&mut self.english.examples, KnowledgeItem::Text(s))
            }
            ExtractedItem::Example(s) => (&mut self.math.examples, KnowledgeItem::Text(s)),
            ExtractedItem::EssayInfo(d) => (&mut self.english.essay_types, KnowledgeItem::Detail(d)),
            ExtractedItem::WritingProcess(d) => {
                (&mut self.english.writing_process, KnowledgeItem::Detail(d))
            }
            ExtractedItem::CitationInfo(d) => {
                (&mut self.english.citations, KnowledgeItem::Detail(d))
            }
        };
        slot.entry(chapter.to_owned()).or_default().push(value);
    }

    /// Formula strings filed under `chapter`.
    pub fn formulas_for<'a>(&'a self, chapter: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.math
            .formulas
            .get(chapter)
            .into_iter()
            .flatten()
            .map(KnowledgeItem::as_text)
    }

    pub fn concepts_for<'a>(&'a self, chapter: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.math
            .concepts
            .get(chapter)
            .into_iter()
            .flatten()
            .map(KnowledgeItem::as_text)
    }

    /// Every formula with its chapter key, in key order.
    pub fn all_formulas(&self) -> impl Iterator<Item = (&str, &str)> {
        self.math.formulas.iter().flat_map(|(chapter, items)| {
            items
                .iter()
                .map(move |item| (chapter.as_str(), item.as_text()))
        })
    }

    #[must_use]
    pub fn formula_count(&self) -> usize {
        self.math.formulas.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formula_count() == 0
            && self.math.concepts.is_empty()
            && self.math.procedures.is_empty()
            && self.math.examples.is_empty()
            && self.english.essay_types.is_empty()
            && self.english.writing_process.is_empty()
            && self.english.citations.is_empty()
            && self.english.examples.is_empty()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    ///
    /// Returns an error if `json` is not a knowledge base document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the knowledge base to `path`, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::info!(path = %path.display(), formulas = self.formula_count(), "knowledge base saved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn sample() -> KnowledgeBase {
        let docs = vec![
            ExtractedDocument {
                path: "course_materials/chapter_6/interest.md".into(),
                category: Category::Math,
                chapter: "chapter_6".into(),
                items: vec![
                    ExtractedItem::Formula("I = Prt".into()),
                    ExtractedItem::Formula("A = P(1 + r/n)^(nt)".into()),
                    ExtractedItem::Concept("Principal: the starting amount".into()),
                ],
            },
            ExtractedDocument {
                path: "course_materials/probability.md".into(),
                category: Category::Math,
                chapter: "chapter_10".into(),
                items: vec![ExtractedItem::Formula("E(X) = Σ x·P(x)".into())],
            },
            ExtractedDocument {
                path: "english/unit_1/essay.md".into(),
                category: Category::English,
                chapter: "unit_1".into(),
                items: vec![
                    ExtractedItem::EssayInfo(Detail::new("argumentative", "Take a side.")),
                    ExtractedItem::Example("A strong thesis names a claim.".into()),
                ],
            },
        ];
        KnowledgeBase::from_documents(&docs)
    }

    fn shape(items: &ChapterItems) -> Vec<(String, usize)> {
        items.iter().map(|(k, v)| (k.clone(), v.len())).collect()
    }

    #[test]
    fn fold_files_items_by_kind_and_chapter() {
        let kb = sample();
        assert_eq!(kb.math.formulas["chapter_6"].len(), 2);
        assert_eq!(kb.math.formulas["chapter_10"].len(), 1);
        assert_eq!(kb.math.concepts["chapter_6"].len(), 1);
        assert_eq!(kb.english.essay_types["unit_1"].len(), 1);
        assert_eq!(kb.english.examples["unit_1"].len(), 1);
        assert!(kb.math.examples.is_empty());
        assert_eq!(kb.metadata.sources.len(), 3);
        assert!(!kb.metadata.last_updated.is_empty());
    }

    #[test]
    fn json_round_trip_preserves_chapters_and_counts() {
        let kb = sample();
        let parsed = KnowledgeBase::from_json(&kb.to_json().unwrap()).unwrap();

        assert_eq!(shape(&parsed.math.formulas), shape(&kb.math.formulas));
        assert_eq!(shape(&parsed.math.concepts), shape(&kb.math.concepts));
        assert_eq!(
            shape(&parsed.english.essay_types),
            shape(&kb.english.essay_types)
        );
        let keys: BTreeSet<_> = parsed.math.formulas.keys().cloned().collect();
        assert_eq!(keys, BTreeSet::from([String::from("chapter_10"), String::from("chapter_6")]));
        assert_eq!(parsed, kb);
    }

    #[test]
    fn json_uses_source_layout() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["math"]["formulas"]["chapter_6"][0], "I = Prt");
        assert_eq!(
            json["english"]["essay_types"]["unit_1"][0]["type"],
            "argumentative"
        );
        assert!(json["metadata"]["sources"].is_array());
    }

    #[test]
    fn missing_sections_default() {
        let kb = KnowledgeBase::from_json(r#"{"math": {"formulas": {"general": ["x = 1 + 2"]}}}"#)
            .unwrap();
        assert_eq!(kb.formula_count(), 1);
        assert!(kb.english.citations.is_empty());
    }

    #[test]
    fn formulas_for_unknown_chapter_is_empty() {
        assert_eq!(sample().formulas_for("chapter_99").count(), 0);
        assert_eq!(sample().formulas_for("chapter_6").count(), 2);
    }

    #[tokio::test]
    async fn save_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("ai_knowledge_base.json");

        sample().save(&path).await.unwrap();
        KnowledgeBase::default().save(&path).await.unwrap();

        let loaded = KnowledgeBase::load(&path).await.unwrap();
        assert!(loaded.is_empty());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
