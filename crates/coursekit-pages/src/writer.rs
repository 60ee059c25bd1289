use std::path::{Path, PathBuf};

use coursekit_knowledge::KnowledgeBase;

use crate::chapter::{ChapterDescriptor, render_chapter_page_with_formulas};
use crate::error::PagesError;

/// Writes rendered chapter pages into an output directory.
pub struct PageWriter {
    output_dir: PathBuf,
    max_formulas: usize,
}

impl PageWriter {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, max_formulas: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_formulas,
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render and write one page, filling the formula sheet from `knowledge`
    /// when it is given.
    ///
    /// # Errors
    ///
    /// Returns `PagesError::Io` if the directory or file cannot be written.
    pub async fn write(
        &self,
        chapter: &ChapterDescriptor,
        knowledge: Option<&KnowledgeBase>,
    ) -> Result<PathBuf, PagesError> {
        let formulas: Vec<&str> = knowledge
            .map(|kb| {
                kb.formulas_for(&chapter.chapter_key())
                    .take(self.max_formulas)
                    .collect()
            })
            .unwrap_or_default();
        let html = render_chapter_page_with_formulas(chapter, &formulas);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| PagesError::Io {
                path: self.output_dir.display().to_string(),
                source,
            })?;
        let path = self.output_dir.join(chapter.file_name());
        tokio::fs::write(&path, html)
            .await
            .map_err(|source| PagesError::Io {
                path: path.display().to_string(),
                source,
            })?;
        tracing::info!(
            chapter = chapter.num,
            formulas = formulas.len(),
            path = %path.display(),
            "chapter page written"
        );
        Ok(path)
    }

    /// Write every chapter in order. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub async fn write_all(
        &self,
        chapters: &[ChapterDescriptor],
        knowledge: Option<&KnowledgeBase>,
    ) -> Result<Vec<PathBuf>, PagesError> {
        let mut written = Vec::with_capacity(chapters.len());
        for chapter in chapters {
            written.push(self.write(chapter, knowledge).await?);
        }
        Ok(written)
    }
}
