//! Site assembly.
//!
//! Stage 4 of the build pipeline. Takes the rendered pages and the collection
//! index and produces every output unit of the site, in memory:
//!
//! ```text
//! _site/
//! ├── index.html                              # Global index: all collections
//! ├── style.css
//! ├── collections/
//! │   └── deploying-an-ml-model/index.html    # Collection index: members in order
//! └── _posts/
//!     └── 2019-05-04-wrap-model-in-api/
//!         └── index.html                      # Document page
//! ```
//!
//! Writing to disk is the pipeline's job; assembly either returns a complete
//! [`Site`] or an error.
//!
//! ## Link Integrity
//!
//! Every previous/next link and every collection listing must point at a
//! page produced in the same pass. A dangling reference means the loader and
//! indexer disagree, so it aborts with [`AssembleError::BrokenCollectionLink`]
//! rather than publishing a site with dead links.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Rendered document bodies are inserted pre-escaped; every other value is
//! escaped by maud.

use crate::config::SiteConfig;
use crate::index::{Collection, CollectionIndex};
use crate::load::DocumentSet;
use crate::types::{Document, Layout, RenderedPage, collection_path, document_path};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Broken collection link: {document} links to {target}, which was not produced")]
    BrokenCollectionLink { document: String, target: String },
    #[error("Rendered page {0} has no loaded document")]
    UnknownDocument(String),
    #[error("Two output units share the path {0}")]
    OutputCollision(String),
}

const STYLESHEET: &str = include_str!("../static/style.css");
const STYLESHEET_PATH: &str = "style.css";
const INDEX_PATH: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Document,
    Collection,
    Index,
    Stylesheet,
}

/// One file of the finished site.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputUnit {
    /// Path relative to the output root, `/`-separated.
    pub path: String,
    pub kind: UnitKind,
    /// Human-readable label for CLI output.
    pub title: String,
    pub contents: String,
}

/// The assembled site, ready to publish.
#[derive(Debug, Clone, Default)]
pub struct Site {
    pub units: Vec<OutputUnit>,
}

impl Site {
    pub fn get(&self, path: &str) -> Option<&OutputUnit> {
        self.units.iter().find(|u| u.path == path)
    }

    pub fn units_of(&self, kind: UnitKind) -> impl Iterator<Item = &OutputUnit> {
        self.units.iter().filter(move |u| u.kind == kind)
    }
}

pub fn assemble(
    documents: &DocumentSet,
    index: &CollectionIndex,
    mut pages: Vec<RenderedPage>,
    config: &SiteConfig,
) -> Result<Site, AssembleError> {
    // Render workers finish in any order; output follows the index.
    pages.sort_by(|a, b| {
        let rank = |p: &RenderedPage| index.rank(&p.id).unwrap_or(usize::MAX);
        rank(a).cmp(&rank(b)).then_with(|| a.id.cmp(&b.id))
    });

    let mut sources = Vec::with_capacity(pages.len());
    for page in &pages {
        let document = documents
            .get(&page.id)
            .ok_or_else(|| AssembleError::UnknownDocument(page.id.clone()))?;
        sources.push(document);
    }

    check_links(&pages, index)?;

    let ctx = Context {
        config,
        documents,
        index,
    };
    let mut builder = SiteBuilder::default();

    builder.push(OutputUnit {
        path: INDEX_PATH.to_string(),
        kind: UnitKind::Index,
        title: config.title.clone(),
        contents: render_global_index(&ctx).into_string(),
    })?;
    builder.push(OutputUnit {
        path: STYLESHEET_PATH.to_string(),
        kind: UnitKind::Stylesheet,
        title: "Stylesheet".to_string(),
        contents: STYLESHEET.to_string(),
    })?;

    for collection in index.collections() {
        builder.push(OutputUnit {
            path: collection_path(&collection.slug),
            kind: UnitKind::Collection,
            title: collection.name.clone(),
            contents: render_collection_page(&ctx, collection).into_string(),
        })?;
    }

    for (page, document) in pages.iter().zip(sources) {
        builder.push(OutputUnit {
            path: page.path.clone(),
            kind: UnitKind::Document,
            title: document.title.clone(),
            contents: render_document_page(&ctx, document, page).into_string(),
        })?;
    }

    Ok(builder.finish())
}

/// Every previous/next target and every collection member must be a page
/// produced in this pass.
fn check_links(pages: &[RenderedPage], index: &CollectionIndex) -> Result<(), AssembleError> {
    let produced: HashSet<&str> = pages.iter().map(|p| p.id.as_str()).collect();

    for page in pages {
        for target in [&page.previous, &page.next].into_iter().flatten() {
            if !produced.contains(target.as_str()) {
                return Err(AssembleError::BrokenCollectionLink {
                    document: page.id.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    for collection in index.collections() {
        for member in &collection.members {
            if !produced.contains(member.as_str()) {
                return Err(AssembleError::BrokenCollectionLink {
                    document: collection.name.clone(),
                    target: member.clone(),
                });
            }
        }
    }
    Ok(())
}

#[derive(Default)]
struct SiteBuilder {
    units: Vec<OutputUnit>,
    paths: HashSet<String>,
}

impl SiteBuilder {
    fn push(&mut self, unit: OutputUnit) -> Result<(), AssembleError> {
        if !self.paths.insert(unit.path.clone()) {
            return Err(AssembleError::OutputCollision(unit.path));
        }
        self.units.push(unit);
        Ok(())
    }

    fn finish(self) -> Site {
        Site { units: self.units }
    }
}

struct Context<'a> {
    config: &'a SiteConfig,
    documents: &'a DocumentSet,
    index: &'a CollectionIndex,
}

impl Context<'_> {
    /// Site-absolute URL for an output path; `index.html` is implied.
    fn url(&self, path: &str) -> String {
        let path = path.strip_suffix(INDEX_PATH).unwrap_or(path);
        format!("{}/{}", self.config.baseurl, path)
    }

    fn document_url(&self, id: &str) -> String {
        self.url(&document_path(id))
    }

    fn title_of<'d>(&'d self, id: &'d str) -> &'d str {
        self.documents.get(id).map(|d| d.title.as_str()).unwrap_or(id)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(
    ctx: &Context<'_>,
    title: &str,
    body_class: Option<&str>,
    content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(ctx.url(STYLESHEET_PATH));
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// Renders the site header with breadcrumb
fn site_header(breadcrumb: Markup) -> Markup {
    html! {
        header.site-header {
            nav.breadcrumb {
                (breadcrumb)
            }
        }
    }
}

fn home_link(ctx: &Context<'_>) -> Markup {
    html! {
        a href=(ctx.url(INDEX_PATH)) { (ctx.config.title) }
    }
}

fn format_date(date: chrono::NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Previous/next links within a collection.
fn series_nav(ctx: &Context<'_>, page: &RenderedPage) -> Markup {
    html! {
        @if page.previous.is_some() || page.next.is_some() {
            nav.series-nav {
                @if let Some(prev) = &page.previous {
                    a.previous rel="prev" href=(ctx.document_url(prev)) {
                        "← " (ctx.title_of(prev))
                    }
                }
                @if let Some(next) = &page.next {
                    a.next rel="next" href=(ctx.document_url(next)) {
                        (ctx.title_of(next)) " →"
                    }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_document_page(ctx: &Context<'_>, document: &Document, page: &RenderedPage) -> Markup {
    let collection = ctx.index.collection_of(&document.id);
    let breadcrumb = html! {
        (home_link(ctx))
        @if let Some(collection) = collection {
            " › "
            a href=(ctx.url(&collection_path(&collection.slug))) { (collection.name) }
        }
    };
    let body = PreEscaped(page.html.as_str());

    let content = html! {
        (site_header(breadcrumb))
        main.document-page {
            @match document.layout {
                Layout::Post => {
                    article class=(article_class("post", document)) {
                        header.post-header {
                            h1 { (document.title) }
                            @if let Some(date) = document.date {
                                p.post-meta {
                                    time datetime=(date.format("%Y-%m-%d").to_string()) { (format_date(date)) }
                                }
                            }
                        }
                        div.post-body { (body) }
                        (series_nav(ctx, page))
                    }
                }
                Layout::Page => {
                    article class=(article_class("page", document)) {
                        h1 { (document.title) }
                        (body)
                    }
                }
                Layout::Bare => {
                    (body)
                }
            }
        }
    };

    let title = format!("{} | {}", document.title, ctx.config.title);
    base_document(ctx, &title, Some(layout_class(document.layout)), content)
}

/// The layout's own class followed by any front matter `classes`.
fn article_class(base: &str, document: &Document) -> String {
    match document.classes.as_deref().map(str::trim) {
        Some(extra) if !extra.is_empty() => format!("{base} {extra}"),
        _ => base.to_string(),
    }
}

fn layout_class(layout: Layout) -> &'static str {
    match layout {
        Layout::Post => "layout-post",
        Layout::Page => "layout-page",
        Layout::Bare => "layout-default",
    }
}

fn render_collection_page(ctx: &Context<'_>, collection: &Collection) -> Markup {
    let breadcrumb = html! {
        (home_link(ctx))
        " › "
        (collection.name)
    };

    let content = html! {
        (site_header(breadcrumb))
        main.collection-page {
            h1 { (collection.name) }
            ol.document-list {
                @for id in &collection.members {
                    li {
                        a href=(ctx.document_url(id)) { (ctx.title_of(id)) }
                        @if let Some(date) = ctx.documents.get(id).and_then(|d| d.date) {
                            time datetime=(date.format("%Y-%m-%d").to_string()) { (format_date(date)) }
                        }
                    }
                }
            }
        }
    };

    let title = format!("{} | {}", collection.name, ctx.config.title);
    base_document(ctx, &title, Some("collection"), content)
}

fn render_global_index(ctx: &Context<'_>) -> Markup {
    let content = html! {
        (site_header(home_link(ctx)))
        main.index-page {
            h1 { (ctx.config.title) }
            ul.collection-list {
                @for collection in ctx.index.collections() {
                    li {
                        a href=(ctx.url(&collection_path(&collection.slug))) { (collection.name) }
                        span.count { "(" (collection.members.len()) ")" }
                    }
                }
            }
        }
    };

    base_document(ctx, &ctx.config.title, None, content)
}

// ============================================================================
// Tests
// ============================================================================
