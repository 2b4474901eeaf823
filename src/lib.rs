//! # Simple Posts
//!
//! A static site builder for Markdown posts grouped into ordered collections
//! (tutorial series, multi-part write-ups). Each post is rendered to its own
//! page with previous/next links inside its collection, and every collection
//! gets an index page.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Load       content/      →  DocumentSet       (front matter + body per source)
//! 2. Index      DocumentSet   →  CollectionIndex   (grouping + reading order)
//! 3. Render     Document      →  RenderedPage      (directives + Markdown, in parallel)
//! 4. Assemble   pages + index →  Site              (HTML units, link integrity)
//! ```
//!
//! The stages run in memory, driven by [`pipeline::Pipeline`]. Output is only
//! written by [`pipeline::publish`] after assembly succeeded, so a build either
//! produces the complete site or nothing.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`load`] | Stage 1: walks the content directory, parses front matter, applies fallbacks |
//! | [`index`] | Stage 2: groups documents into collections and orders them |
//! | [`render`] | Stage 3: Markdown to HTML with fenced code kept verbatim |
//! | [`assemble`] | Stage 4: Maud templates for document, collection and index pages |
//! | [`pipeline`] | Phase state machine, parallel rendering, atomic publishing |
//! | [`config`] | `config.toml` loading, stock defaults, CLI overrides, validation |
//! | [`directive`] | `{{ … }}` / `{% … %}` substitution against the site variables |
//! | [`fence`] | Splits a body into prose and fenced code segments |
//! | [`naming`] | `YYYY-MM-DD-slug` file name convention and slugs |
//! | [`types`] | Documents, layouts, rendered pages and output paths |
//! | [`diagnostics`] | Non-fatal warnings collected across stages |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fences Never Reach the Template Layer
//!
//! Posts about deployment are full of code that looks like template syntax:
//! GitHub Actions `${{ secrets.X }}`, Jinja, Go templates. Fenced blocks are
//! cut out of the body before directives are resolved and spliced back after
//! Markdown conversion, so their bytes come out exactly as written.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed templates are build errors and every interpolated
//! value is escaped unless explicitly marked pre-escaped.
//!
//! ## Deterministic Output
//!
//! Documents are keyed by identity in a sorted map, collections are ordered
//! by name and members by (date, title, identity). Rendering runs on a thread
//! pool but the assembler re-sorts pages, so the same input always produces
//! the same site.

pub mod assemble;
pub mod config;
pub mod diagnostics;
pub mod directive;
pub mod fence;
pub mod index;
pub mod load;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
