//! Shared test utilities for the simple-posts test suite.
//!
//! Provides the fixture copy, a terse [`Document`] builder and lookup helpers
//! that panic with the available candidates on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let loaded = load(tmp.path(), &SiteConfig::default(), &[]).unwrap();
//!
//! let post = find_document(&loaded.documents, "wrap-model-in-api");
//! assert_eq!(post.collection.as_deref(), Some("Deploying an ML model"));
//! ```

use chrono::NaiveDate;
use std::path::Path;
use tempfile::TempDir;

use crate::assemble::{OutputUnit, Site};
use crate::load::DocumentSet;
use crate::types::{Document, Layout};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Builders
// =========================================================================

/// A post with an empty body. `date` is `YYYY-MM-DD`.
pub fn doc(id: &str, title: &str, collection: Option<&str>, date: Option<&str>) -> Document {
    doc_with_body(id, title, collection, date, "")
}

pub fn doc_with_body(
    id: &str,
    title: &str,
    collection: Option<&str>,
    date: Option<&str>,
    body: &str,
) -> Document {
    let stem = id.rsplit('/').next().unwrap_or(id);
    Document {
        id: id.to_string(),
        slug: stem.to_string(),
        title: title.to_string(),
        layout: Layout::Post,
        collection: collection.map(str::to_string),
        classes: None,
        date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
        body: body.to_string(),
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a document by slug. Panics if not found.
pub fn find_document<'a>(documents: &'a DocumentSet, slug: &str) -> &'a Document {
    documents
        .iter()
        .find(|d| d.slug == slug)
        .unwrap_or_else(|| {
            let slugs: Vec<&str> = documents.iter().map(|d| d.slug.as_str()).collect();
            panic!("document '{slug}' not found. Available: {slugs:?}")
        })
}

/// Find an output unit by path. Panics if not found.
pub fn find_unit<'a>(site: &'a Site, path: &str) -> &'a OutputUnit {
    site.get(path).unwrap_or_else(|| {
        let paths: Vec<&str> = site.units.iter().map(|u| u.path.as_str()).collect();
        panic!("unit '{path}' not found. Available: {paths:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Titles of a collection's members in reading order.
pub fn member_titles<'a>(
    documents: &'a DocumentSet,
    index: &crate::index::CollectionIndex,
    collection: &str,
) -> Vec<&'a str> {
    let collection = index.get(collection).unwrap_or_else(|| {
        let names: Vec<&str> = index.collections().iter().map(|c| c.name.as_str()).collect();
        panic!("collection '{collection}' not found. Available: {names:?}")
    });
    collection
        .members
        .iter()
        .map(|id| documents.get(id).map(|d| d.title.as_str()).unwrap())
        .collect()
}
