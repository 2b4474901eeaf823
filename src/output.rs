//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (collection, document) is its semantic identity: title
//! and positional index. Source identities are secondary context on indented
//! `Source:` lines.
//!
//! # Output Format
//!
//! ## Load / Index
//!
//! ```text
//! Collections
//! 001 Deploying an ML model (4 documents)
//!     001 Wrapping a model in a REST API
//!         Source: _posts/2019-05-04-wrap-model-in-api
//!         Date: 2019-05-04
//! 002 uncategorized (1 document)
//!     001 About
//!         Source: about
//! ```
//!
//! ## Render
//!
//! One block per document as workers finish, so order varies between runs:
//!
//! ```text
//!     Rendered Wrapping a model in a REST API
//!         Source: _posts/2019-05-04-wrap-model-in-api
//!         Unresolved: 1 directive
//! ```
//!
//! ## Assemble
//!
//! ```text
//! Home → index.html
//! Stylesheet → style.css
//! 001 Deploying an ML model → collections/deploying-an-ml-model/index.html
//!     001 Wrapping a model in a REST API → _posts/2019-05-04-wrap-model-in-api/index.html
//!
//! Generated 2 collections, 5 documents
//! ```
//!
//! Warnings go to stderr, one per line, prefixed `warning:`.
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::assemble::{Site, UnitKind};
use crate::diagnostics::Warning;
use crate::index::CollectionIndex;
use crate::load::DocumentSet;
use crate::pipeline::{BuildEvent, Phase};
use crate::types::{collection_path, document_path};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional count.
///
/// ```text
/// 001 Deploying an ML model (4 documents)
/// 001 Wrapping a model in a REST API
/// ```
fn entity_header(index: usize, title: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({})", format_index(index), title, plural(n, "document")),
        None => format!("{} {}", format_index(index), title),
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

// ============================================================================
// Stage 1–2: Load and index output
// ============================================================================

/// Format the loaded content as an inventory, grouped by collection in
/// reading order.
pub fn format_index_output(documents: &DocumentSet, index: &CollectionIndex) -> Vec<String> {
    let mut lines = vec!["Collections".to_string()];

    for (i, collection) in index.collections().iter().enumerate() {
        lines.push(entity_header(
            i + 1,
            &collection.name,
            Some(collection.members.len()),
        ));
        for (j, id) in collection.members.iter().enumerate() {
            let Some(document) = documents.get(id) else {
                continue;
            };
            lines.push(format!("{}{}", indent(1), entity_header(j + 1, &document.title, None)));
            lines.push(format!("{}Source: {}", indent(2), document.id));
            if let Some(date) = document.date {
                lines.push(format!("{}Date: {}", indent(2), date.format("%Y-%m-%d")));
            }
        }
    }

    if index.collections().is_empty() {
        lines.push(format!("{}(no documents)", indent(1)));
    }
    lines
}

/// Print index output to stdout.
pub fn print_index_output(documents: &DocumentSet, index: &CollectionIndex) {
    for line in format_index_output(documents, index) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Render progress
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::PhaseEntered(phase) => match phase {
            Phase::Loading => vec!["==> Stage 1: Loading documents".to_string()],
            Phase::Indexing => vec!["==> Stage 2: Indexing collections".to_string()],
            Phase::Rendering => vec!["==> Stage 3: Rendering".to_string()],
            Phase::Assembling => vec!["==> Stage 4: Assembling site".to_string()],
            Phase::Idle | Phase::Done | Phase::Failed => Vec::new(),
        },
        BuildEvent::DocumentRendered {
            id,
            title,
            unresolved,
        } => {
            let mut lines = vec![
                format!("{}Rendered {}", indent(1), title),
                format!("{}Source: {}", indent(2), id),
            ];
            if *unresolved > 0 {
                lines.push(format!(
                    "{}Unresolved: {}",
                    indent(2),
                    plural(*unresolved, "directive")
                ));
            }
            lines
        }
    }
}

// ============================================================================
// Stage 4: Assemble output
// ============================================================================

/// Format the assembled site: one line per unit, `title → path`.
pub fn format_assemble_output(
    site: &Site,
    documents: &DocumentSet,
    index: &CollectionIndex,
) -> Vec<String> {
    let mut lines = Vec::new();

    for unit in site.units_of(UnitKind::Index) {
        lines.push(format!("Home \u{2192} {}", unit.path));
    }
    for unit in site.units_of(UnitKind::Stylesheet) {
        lines.push(format!("{} \u{2192} {}", unit.title, unit.path));
    }

    for (i, collection) in index.collections().iter().enumerate() {
        lines.push(format!(
            "{} \u{2192} {}",
            entity_header(i + 1, &collection.name, None),
            collection_path(&collection.slug)
        ));
        for (j, id) in collection.members.iter().enumerate() {
            let title = documents.get(id).map(|d| d.title.as_str()).unwrap_or(id);
            lines.push(format!(
                "{}{} \u{2192} {}",
                indent(1),
                entity_header(j + 1, title, None),
                document_path(id)
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}",
        plural(site.units_of(UnitKind::Collection).count(), "collection"),
        plural(site.units_of(UnitKind::Document).count(), "document"),
    ));
    lines
}

/// Print assemble output to stdout.
pub fn print_assemble_output(site: &Site, documents: &DocumentSet, index: &CollectionIndex) {
    for line in format_assemble_output(site, documents, index) {
        println!("{}", line);
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

pub fn format_warnings(warnings: &[Warning]) -> Vec<String> {
    warnings.iter().map(|w| format!("warning: {w}")).collect()
}

/// Print warnings to stderr.
pub fn print_warnings(warnings: &[Warning]) {
    for line in format_warnings(warnings) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
