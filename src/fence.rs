//! Fenced code block detection.
//!
//! Splits a document body into prose and fenced code segments before any
//! other processing happens. Block boundaries come from `pulldown-cmark`'s
//! offset iterator, so fences nested in list items and block quotes are
//! found with the same rules the final Markdown conversion applies.
//! Concatenating the raw text of all segments reproduces the body.
//!
//! A fence's `content` is the code as Markdown defines it: container
//! prefixes (`> `, list indentation) removed, every other byte kept. An
//! unclosed fence runs to the end of its container.

use crate::render::markdown_options;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use std::ops::Range;

/// A piece of a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any fence. `line` is the 1-based line it starts on.
    Prose { text: &'a str, line: usize },
    Fence(Fence<'a>),
}

impl Segment<'_> {
    /// Length of the source text this segment covers.
    pub fn raw_len(&self) -> usize {
        match self {
            Segment::Prose { text, .. } => text.len(),
            Segment::Fence(f) => f.raw.len(),
        }
    }
}

/// A fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence<'a> {
    /// Source text of the block, from the opening marker through the
    /// closing line's ending. Continuation lines keep their container
    /// prefixes.
    pub raw: &'a str,
    /// Info string after the opening fence.
    pub info: String,
    /// The code itself.
    pub content: String,
    /// 1-based line number of the opening fence.
    pub line: usize,
}

impl Fence<'_> {
    /// First word of the info string, used as the highlighting language.
    pub fn language(&self) -> Option<&str> {
        self.info.split_whitespace().next()
    }

    /// Spaces before the opening marker that belong to the block's own range.
    pub fn indent(&self) -> usize {
        self.raw.len() - self.raw.trim_start_matches(' ').len()
    }
}

struct Block {
    range: Range<usize>,
    info: String,
    content: String,
}

pub fn split(body: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut prose_start = 0;

    for block in fenced_blocks(body) {
        if block.range.start > prose_start {
            segments.push(Segment::Prose {
                text: &body[prose_start..block.range.start],
                line: line_at(body, prose_start),
            });
        }
        segments.push(Segment::Fence(Fence {
            raw: &body[block.range.clone()],
            info: block.info,
            content: block.content,
            line: line_at(body, block.range.start),
        }));
        prose_start = block.range.end;
    }

    if body.len() > prose_start {
        segments.push(Segment::Prose {
            text: &body[prose_start..],
            line: line_at(body, prose_start),
        });
    }
    segments
}

fn fenced_blocks(body: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open: Option<Block> = None;

    for (event, range) in Parser::new_ext(body, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                open = Some(Block {
                    range,
                    info: info.trim().to_string(),
                    content: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(block) = open.as_mut() {
                    block.content.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut block) = open.take() {
                    block.range.end = through_line_ending(body, block.range.end);
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }
    blocks
}

/// Extend `end` past the line ending that terminates the block, if any.
fn through_line_ending(body: &str, end: usize) -> usize {
    let rest = &body[end..];
    if body[..end].ends_with('\n') {
        end
    } else if rest.starts_with("\r\n") {
        end + 2
    } else if rest.starts_with('\n') {
        end + 1
    } else {
        end
    }
}

fn line_at(body: &str, offset: usize) -> usize {
    body[..offset].matches('\n').count() + 1
}
