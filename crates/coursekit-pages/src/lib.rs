//! Chapter page rendering. Rendering is pure; [`PageWriter`] does the I/O.

pub mod chapter;
pub mod config;
pub mod error;
pub mod html;
pub mod writer;

pub use chapter::{
    ChapterDescriptor, default_chapters, render_chapter_page, render_chapter_page_with_formulas,
};
pub use config::PagesConfig;
pub use error::PagesError;
pub use writer::PageWriter;
