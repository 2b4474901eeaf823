//! Collection indexing.
//!
//! Stage 2 of the build pipeline. Groups documents by their collection name
//! (documents without one go to [`UNCATEGORIZED`](crate::types::UNCATEGORIZED))
//! and orders each group with a deterministic comparator:
//!
//! 1. publish date ascending, undated documents last
//! 2. title, lexicographic
//! 3. identity, as a final tie-break
//!
//! When the third key is what decides the order, the two documents share an
//! ordering key; that is reported as [`Warning::DuplicateOrderingKey`] but
//! never fails the build.

use crate::diagnostics::Warning;
use crate::load::DocumentSet;
use crate::naming::slugify;
use crate::types::Document;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A named, ordered series of documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    /// Name as declared in front matter.
    pub name: String,
    /// URL segment derived from the name, unique across the index.
    pub slug: String,
    /// Member identities in reading order.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionIndex {
    collections: Vec<Collection>,
    #[serde(skip)]
    positions: HashMap<String, (usize, usize)>,
    #[serde(skip)]
    warnings: Vec<Warning>,
}

pub fn index(documents: &DocumentSet) -> CollectionIndex {
    let mut groups: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
    for document in documents.iter() {
        groups
            .entry(document.collection_name())
            .or_default()
            .push(document);
    }

    let mut collections = Vec::with_capacity(groups.len());
    let mut positions = HashMap::with_capacity(documents.len());
    let mut warnings = Vec::new();
    let mut slugs = HashSet::new();

    for (name, mut members) in groups {
        members.sort_by(|a, b| compare(a, b));

        for pair in members.windows(2) {
            if same_ordering_key(pair[0], pair[1]) {
                warnings.push(Warning::DuplicateOrderingKey {
                    collection: name.to_string(),
                    first: pair[0].id.clone(),
                    second: pair[1].id.clone(),
                });
            }
        }

        let slot = collections.len();
        for (i, member) in members.iter().enumerate() {
            positions.insert(member.id.clone(), (slot, i));
        }

        let slug = unique_slug(name, &mut slugs);
        collections.push(Collection {
            name: name.to_string(),
            slug,
            members: members.iter().map(|d| d.id.clone()).collect(),
        });
    }

    CollectionIndex {
        collections,
        positions,
        warnings,
    }
}

/// Slug for `name`, suffixed `-2`, `-3`, ... when an earlier collection
/// (in name order) already took it.
fn unique_slug(name: &str, taken: &mut HashSet<String>) -> String {
    let base = match slugify(name) {
        s if s.is_empty() => "untitled".to_string(),
        s => s,
    };
    let mut slug = base.clone();
    let mut n = 2;
    while !taken.insert(slug.clone()) {
        slug = format!("{base}-{n}");
        n += 1;
    }
    slug
}

/// The ordering used within a collection.
pub fn compare(a: &Document, b: &Document) -> Ordering {
    date_key(a)
        .cmp(&date_key(b))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

fn date_key(document: &Document) -> (bool, Option<chrono::NaiveDate>) {
    (document.date.is_none(), document.date)
}

fn same_ordering_key(a: &Document, b: &Document) -> bool {
    a.date == b.date && a.title == b.title
}

impl CollectionIndex {
    /// All collections, ordered by name.
    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// The collection a document was indexed under.
    pub fn collection_of(&self, id: &str) -> Option<&Collection> {
        self.positions
            .get(id)
            .map(|&(slot, _)| &self.collections[slot])
    }

    /// The document before `id` in its collection, `None` at the start.
    pub fn previous(&self, id: &str) -> Option<&str> {
        let &(slot, i) = self.positions.get(id)?;
        let prev = i.checked_sub(1)?;
        self.collections[slot].members.get(prev).map(String::as_str)
    }

    /// The document after `id` in its collection, `None` at the end.
    pub fn next(&self, id: &str) -> Option<&str> {
        let &(slot, i) = self.positions.get(id)?;
        self.collections[slot].members.get(i + 1).map(String::as_str)
    }

    /// Every indexed identity: collections by name, members in reading order.
    pub fn ordered_ids(&self) -> impl Iterator<Item = &str> {
        self.collections
            .iter()
            .flat_map(|c| c.members.iter().map(String::as_str))
    }

    /// Position of `id` in [`ordered_ids`](Self::ordered_ids), for sorting.
    pub fn rank(&self, id: &str) -> Option<usize> {
        let &(slot, i) = self.positions.get(id)?;
        let before: usize = self.collections[..slot]
            .iter()
            .map(|c| c.members.len())
            .sum();
        Some(before + i)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
