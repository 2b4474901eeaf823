//! Document body rendering.
//!
//! Turns one Markdown body into HTML. The order of operations matters:
//!
//! 1. [`fence::split`] cuts the body into prose and fenced code segments,
//!    including fences nested in list items and block quotes.
//! 2. Prose goes through the directive [`Resolver`]; fences are swapped for
//!    an HTML comment placeholder so Markdown never sees their content. The
//!    placeholder sits where the opening marker was, so it stays inside the
//!    fence's container.
//! 3. The prose is converted with `pulldown-cmark`.
//! 4. Placeholders are replaced by `<pre><code>` blocks built from the
//!    original fence content.
//!
//! Fence content therefore reaches the output exactly as written, with only
//! the enclosing markup (and HTML escaping, which a browser undoes) added.
//! Nothing in a fence is executed or interpreted.
//!
//! [`render`] is a pure function of the body and the [`SiteVars`]: the same
//! inputs always produce the same output.

use crate::config::SiteVars;
use crate::directive::{Resolver, Unresolved};
use crate::fence::{self, Fence, Segment};
use maud::html;
use pulldown_cmark::{Options, Parser, html as md_html};

/// Output of rendering one body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub unresolved: Vec<Unresolved>,
}

const PLACEHOLDER_PREFIX: &str = "<!--simple-posts:fence:";
const PLACEHOLDER_SUFFIX: &str = "-->";

pub fn render(body: &str, vars: &SiteVars) -> Rendered {
    let mut resolver = Resolver::new(vars);
    let mut markdown = String::with_capacity(body.len());
    let mut blocks = Vec::new();

    for segment in fence::split(body) {
        match segment {
            Segment::Prose { text, line } => markdown.push_str(&resolver.resolve(text, line)),
            Segment::Fence(fence) => {
                markdown.push_str(&" ".repeat(fence.indent()));
                markdown.push_str(&placeholder(blocks.len()));
                if fence.raw.ends_with('\n') {
                    markdown.push('\n');
                }
                blocks.push(code_block(&fence));
            }
        }
    }

    let mut html = markdown_to_html(&markdown);
    for (i, block) in blocks.iter().enumerate() {
        html = html.replacen(&placeholder(i), block, 1);
    }

    Rendered {
        html,
        unresolved: resolver.finish(),
    }
}

fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}{index}{PLACEHOLDER_SUFFIX}")
}

/// Extensions used both for fence detection and for the final conversion.
pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut out, parser);
    out
}

/// A fence as HTML. Maud escapes the content; the bytes are otherwise untouched.
fn code_block(fence: &Fence<'_>) -> String {
    let class = fence.language().map(|lang| format!("language-{lang}"));
    html! {
        pre { code class=[class] { (&fence.content) } }
    }
    .into_string()
}
