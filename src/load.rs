//! Content loading.
//!
//! Stage 1 of the build pipeline. Walks the content directory, splits each
//! Markdown source into its front matter and body, and produces the
//! [`DocumentSet`] that every later stage borrows from.
//!
//! ## Directory Structure
//!
//! ```text
//! content/                                # Content root
//! ├── config.toml                         # Site configuration (optional)
//! ├── about.md                            # Page
//! ├── _posts/
//! │   ├── 2019-05-04-wrap-model-in-api.md # Dated post
//! │   └── 2019-05-11-containerize.md
//! └── .drafts/                            # Hidden = skipped
//! ```
//!
//! ## Front Matter
//!
//! A source may start with a YAML block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: "Wrapping a model in a REST API"
//! layout: post
//! collection: Deploying ML models
//! classes: wide
//! date: 2019-05-04
//! ---
//! ```
//!
//! Recognized keys are `title`, `layout`, `collection` (or `series`),
//! `classes`, `date` and `published`; anything else is ignored. A block that
//! is unterminated, is not a YAML mapping, has a wrongly typed value, names
//! an unknown layout, or carries an unparseable date is a fatal
//! [`LoadError::MalformedMetadata`]. Sources without front matter load with
//! defaults.
//!
//! ## Fallbacks
//!
//! - **Title**: front matter, else the first `# ` heading outside code
//!   fences, else the file name with dashes turned into spaces.
//! - **Date**: front matter, else the `YYYY-MM-DD-` file name prefix.

use crate::config::{DuplicatePolicy, SiteConfig};
use crate::diagnostics::Warning;
use crate::fence::{self, Segment};
use crate::naming::parse_entry_name;
use crate::types::{Document, Layout};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Malformed metadata in {id}: {reason}")]
    MalformedMetadata { id: String, reason: String },
}

/// All loaded documents, keyed and iterated by identity.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    documents: BTreeMap<String, Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Returns `false` (and keeps the existing one) if the
    /// identity is already present.
    pub fn insert(&mut self, document: Document) -> bool {
        match self.documents.entry(document.id.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(document);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Documents in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn remove(&mut self, id: &str) -> Option<Document> {
        self.documents.remove(id)
    }
}

impl FromIterator<Document> for DocumentSet {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut set = DocumentSet::new();
        for document in iter {
            set.insert(document);
        }
        set
    }
}

/// Result of the load stage.
#[derive(Debug)]
pub struct Loaded {
    pub documents: DocumentSet,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    title: Option<String>,
    layout: Option<Layout>,
    #[serde(alias = "series", deserialize_with = "scalar_string")]
    collection: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    classes: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    date: Option<String>,
    published: Option<bool>,
}

/// Accept any YAML scalar as text (`title: 404`, `collection: 2019`).
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Tagged(tagged) => Err(D::Error::custom(format!(
            "expected a plain value, found tag {}",
            tagged.tag
        ))),
        Value::Sequence(_) => Err(D::Error::custom("expected a single value, found a list")),
        Value::Mapping(_) => Err(D::Error::custom("expected a single value, found a mapping")),
    }
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["_site", "node_modules", "target"];

/// Load every Markdown source under `root`.
///
/// `skip` lists paths (typically the output directory) that must not be
/// read even when they sit inside the content root.
pub fn load(root: &Path, config: &SiteConfig, skip: &[PathBuf]) -> Result<Loaded, LoadError> {
    let mut documents = DocumentSet::new();
    let mut warnings = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e, skip));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let id = identity(relative);
        let text = fs::read_to_string(entry.path())?;
        let (document, published) = parse(&id, &text)?;
        // `post.md` and `post.markdown` share an identity; the first one wins.
        if (published || config.build.drafts) && !documents.insert(document) {
            warnings.push(Warning::DuplicateDocument {
                kept: id,
                dropped: relative.to_string_lossy().into_owned(),
            });
        }
    }

    if config.build.duplicates == DuplicatePolicy::First {
        warnings.extend(drop_duplicates(&mut documents));
    }

    Ok(Loaded {
        documents,
        warnings,
    })
}

/// Parse one source into a [`Document`].
pub fn parse_source(id: &str, text: &str) -> Result<Document, LoadError> {
    parse(id, text).map(|(document, _)| document)
}

fn parse(id: &str, text: &str) -> Result<(Document, bool), LoadError> {
    let malformed = |reason: String| LoadError::MalformedMetadata {
        id: id.to_string(),
        reason,
    };

    let (yaml, body) = split_front_matter(text).map_err(malformed)?;
    let front = match yaml {
        Some(yaml) => parse_front_matter(yaml).map_err(malformed)?,
        None => FrontMatter::default(),
    };

    let stem = id.rsplit('/').next().unwrap_or(id);
    let name = parse_entry_name(stem);

    let date = match front.date.as_deref() {
        Some(raw) => Some(parse_date(raw).map_err(malformed)?),
        None => name.date,
    };

    let title = front
        .title
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| {
            if name.display_title.is_empty() {
                stem.to_string()
            } else {
                name.display_title.clone()
            }
        });

    let slug = if name.slug.is_empty() {
        stem.to_string()
    } else {
        name.slug
    };

    let document = Document {
        id: id.to_string(),
        slug,
        title,
        layout: front.layout.unwrap_or_default(),
        collection: front.collection.filter(|c| !c.trim().is_empty()),
        classes: front.classes,
        date,
        body: body.to_string(),
    };
    Ok((document, front.published.unwrap_or(true)))
}

/// Split `text` into its YAML front matter (if any) and body.
///
/// The body is returned as a slice of `text`, starting right after the
/// closing delimiter line.
fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((None, text));
    };
    if first.trim_end() != "---" {
        return Ok((None, text));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return Ok((Some(&text[yaml_start..offset]), &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err("front matter is not terminated by a '---' line".to_string())
}

fn parse_front_matter(yaml: &str) -> Result<FrontMatter, String> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    match value {
        serde_yaml::Value::Null => Ok(FrontMatter::default()),
        serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| e.to_string()),
        _ => Err("front matter must be a mapping of keys to values".to_string()),
    }
}

/// Parse `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let day = raw
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| format!("invalid date '{raw}': {e}"))
}

/// First `# ` heading outside fenced code blocks.
fn first_heading(body: &str) -> Option<String> {
    fence::split(body).into_iter().find_map(|segment| match segment {
        Segment::Prose { text, .. } => text
            .lines()
            .find_map(|line| line.strip_prefix("# "))
            .map(|heading| heading.trim().to_string())
            .filter(|heading| !heading.is_empty()),
        Segment::Fence(_) => None,
    })
}

/// Apply the `first` duplicate policy: within a collection, only the
/// smallest identity of each title survives.
fn drop_duplicates(documents: &mut DocumentSet) -> Vec<Warning> {
    let mut seen: BTreeMap<(String, String), String> = BTreeMap::new();
    let mut dropped = Vec::new();
    for document in documents.iter() {
        let key = (
            document.collection_name().to_string(),
            document.title.clone(),
        );
        match seen.get(&key) {
            Some(kept) => dropped.push(Warning::DuplicateDocument {
                kept: kept.clone(),
                dropped: document.id.clone(),
            }),
            None => {
                seen.insert(key, document.id.clone());
            }
        }
    }
    for warning in &dropped {
        if let Warning::DuplicateDocument { dropped, .. } = warning {
            documents.remove(dropped);
        }
    }
    dropped
}

fn identity(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_skipped(entry: &DirEntry, skip: &[PathBuf]) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    if entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()) {
        return true;
    }
    skip.iter().any(|s| entry.path() == s.as_path())
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
}
