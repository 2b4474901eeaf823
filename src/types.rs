//! Shared types used across all pipeline stages.
//!
//! A [`Document`] is produced by the loader and owned by its
//! [`DocumentSet`](crate::load::DocumentSet); every later stage refers to it
//! by identity. A [`RenderedPage`] is created fresh on every build and never
//! mutated once the assembler receives it.

use chrono::NaiveDate;
use serde::Deserialize;

/// Collection name given to documents that do not declare one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// The closed set of page layouts the renderer knows about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Dated article with series breadcrumb and previous/next navigation.
    #[default]
    Post,
    /// Standalone page: title and body, no date or series navigation.
    Page,
    /// Body only, no page chrome.
    #[serde(rename = "default")]
    Bare,
}

/// One loaded content source.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Source path relative to the input root, without extension,
    /// `/`-separated. Unique across the document set.
    pub id: String,
    /// File stem with any date prefix removed.
    pub slug: String,
    pub title: String,
    pub layout: Layout,
    /// Declared collection (series) name, if any.
    pub collection: Option<String>,
    /// Extra CSS classes for the article element.
    pub classes: Option<String>,
    pub date: Option<NaiveDate>,
    /// Body text after the front matter, byte-for-byte.
    pub body: String,
}

impl Document {
    /// The collection this document is indexed under.
    pub fn collection_name(&self) -> &str {
        self.collection.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// A document body turned into HTML plus its place in the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Identity of the source document.
    pub id: String,
    /// Output path relative to the output root.
    pub path: String,
    /// Rendered body HTML (without page chrome).
    pub html: String,
    /// Identity of the previous document in the same collection.
    pub previous: Option<String>,
    /// Identity of the next document in the same collection.
    pub next: Option<String>,
}

/// Output path of a document page, relative to the output root.
pub fn document_path(id: &str) -> String {
    format!("{id}/index.html")
}

/// Output path of a collection index page, relative to the output root.
pub fn collection_path(slug: &str) -> String {
    format!("collections/{slug}/index.html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_parses_lowercase_names() {
        let post: Layout = serde_yaml::from_str("post").unwrap();
        let page: Layout = serde_yaml::from_str("page").unwrap();
        let bare: Layout = serde_yaml::from_str("default").unwrap();
        assert_eq!(post, Layout::Post);
        assert_eq!(page, Layout::Page);
        assert_eq!(bare, Layout::Bare);
    }

    #[test]
    fn layout_rejects_unknown_names() {
        let result: Result<Layout, _> = serde_yaml::from_str("gallery");
        assert!(result.is_err());
    }

    #[test]
    fn collection_name_falls_back_to_uncategorized() {
        let doc = Document {
            id: "about".to_string(),
            slug: "about".to_string(),
            title: "About".to_string(),
            layout: Layout::Page,
            collection: None,
            classes: None,
            date: None,
            body: String::new(),
        };
        assert_eq!(doc.collection_name(), UNCATEGORIZED);
    }

    #[test]
    fn output_paths() {
        assert_eq!(
            document_path("_posts/2019-05-04-api"),
            "_posts/2019-05-04-api/index.html"
        );
        assert_eq!(collection_path("demo"), "collections/demo/index.html");
    }
}
