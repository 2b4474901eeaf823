//! Templating directive resolution.
//!
//! Blog posts written for Liquid-based site generators sprinkle a few
//! directives through their prose. The supported subset is resolved by plain
//! textual substitution against [`SiteVars`]:
//!
//! | Directive | Result |
//! |-----------|--------|
//! | `{{ site.url }}`, `{{ site.baseurl }}`, `{{ site.title }}` | configured value |
//! | `{{ "/assets/x.png" \| relative_url }}` | baseurl + path |
//! | `{{ "/assets/x.png" \| absolute_url }}` | url + baseurl + path |
//! | `{% raw %}` … `{% endraw %}` | markers dropped, content passed through untouched |
//!
//! Everything else (`{% include … %}`, unknown variables, unknown filters) is
//! left in the text as written and reported as [`Unresolved`]. A directive
//! without a closing delimiter is ordinary text.
//!
//! The resolver only ever sees prose; fenced code blocks are split out
//! before it runs. Raw regions may span several prose segments (a raw block
//! wrapped around a code fence), so the raw state lives on the resolver.

use crate::config::SiteVars;

/// A directive left in the output because it could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// 1-based line in the document body.
    pub line: usize,
    /// The directive exactly as written.
    pub directive: String,
}

pub struct Resolver<'v> {
    vars: &'v SiteVars,
    in_raw: bool,
    unresolved: Vec<Unresolved>,
}

enum Kind {
    Output,
    Tag,
}

impl<'v> Resolver<'v> {
    pub fn new(vars: &'v SiteVars) -> Self {
        Self {
            vars,
            in_raw: false,
            unresolved: Vec::new(),
        }
    }

    /// Resolve every directive in `text`, which starts on body line `first_line`.
    pub fn resolve(&mut self, text: &str, first_line: usize) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];

            if self.in_raw {
                match find_tag(rest, "endraw") {
                    Some((start, end)) => {
                        out.push_str(&rest[..start]);
                        pos += end;
                        self.in_raw = false;
                    }
                    None => {
                        out.push_str(rest);
                        break;
                    }
                }
                continue;
            }

            let Some((start, kind)) = next_opening(rest) else {
                out.push_str(rest);
                break;
            };
            out.push_str(&rest[..start]);

            let close = match kind {
                Kind::Output => "}}",
                Kind::Tag => "%}",
            };
            let Some(close_at) = rest[start + 2..].find(close) else {
                out.push_str(&rest[start..]);
                break;
            };
            let end = start + 2 + close_at + 2;
            let directive = &rest[start..end];
            let inner = strip_whitespace_control(&rest[start + 2..end - 2]);

            let resolved = match kind {
                Kind::Output => self.evaluate(inner),
                Kind::Tag if tag_name(inner) == "raw" => {
                    self.in_raw = true;
                    Some(String::new())
                }
                Kind::Tag => None,
            };

            match resolved {
                Some(value) => out.push_str(&value),
                None => {
                    let line = first_line + text[..pos + start].matches('\n').count();
                    self.unresolved.push(Unresolved {
                        line,
                        directive: directive.to_string(),
                    });
                    out.push_str(directive);
                }
            }
            pos += end;
        }
        out
    }

    /// Directives that could not be resolved, in document order.
    pub fn finish(self) -> Vec<Unresolved> {
        self.unresolved
    }

    fn evaluate(&self, expr: &str) -> Option<String> {
        let mut parts = expr.split('|').map(str::trim);
        let head = parts.next()?;
        let mut value = match string_literal(head) {
            Some(literal) => literal.to_string(),
            None => self.vars.lookup(head)?.to_string(),
        };
        for filter in parts {
            value = match filter {
                "relative_url" => self.vars.relative_url(&value),
                "absolute_url" => self.vars.absolute_url(&value),
                _ => return None,
            };
        }
        Some(value)
    }
}

fn next_opening(text: &str) -> Option<(usize, Kind)> {
    let output = text.find("{{");
    let tag = text.find("{%");
    match (output, tag) {
        (Some(o), Some(t)) if t < o => Some((t, Kind::Tag)),
        (Some(o), _) => Some((o, Kind::Output)),
        (None, Some(t)) => Some((t, Kind::Tag)),
        (None, None) => None,
    }
}

/// Find the first `{% name %}` tag, returning its byte span.
fn find_tag(text: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(rel) = text[from..].find("{%") {
        let start = from + rel;
        let close = text[start + 2..].find("%}")?;
        let end = start + 2 + close + 2;
        if tag_name(strip_whitespace_control(&text[start + 2..end - 2])) == name {
            return Some((start, end));
        }
        from = start + 2;
    }
    None
}

fn strip_whitespace_control(inner: &str) -> &str {
    let inner = inner.strip_prefix('-').unwrap_or(inner);
    let inner = inner.strip_suffix('-').unwrap_or(inner);
    inner.trim()
}

fn tag_name(inner: &str) -> &str {
    inner.split_whitespace().next().unwrap_or("")
}

fn string_literal(expr: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        expr.strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
            .filter(|s| !s.contains(quote))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> SiteVars {
        SiteVars {
            url: "https://example.github.io".to_string(),
            baseurl: "/ml-api".to_string(),
            title: "Shipping Models".to_string(),
        }
    }

    fn resolve(text: &str) -> (String, Vec<Unresolved>) {
        let vars = vars();
        let mut resolver = Resolver::new(&vars);
        let out = resolver.resolve(text, 1);
        (out, resolver.finish())
    }

    #[test]
    fn plain_text_unchanged() {
        let (out, unresolved) = resolve("No directives here.\n");
        assert_eq!(out, "No directives here.\n");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn site_variables_substituted() {
        let (out, unresolved) =
            resolve("![diagram]({{ site.baseurl }}/assets/arch.png) on {{site.url}}");
        assert_eq!(
            out,
            "![diagram](/ml-api/assets/arch.png) on https://example.github.io"
        );
        assert!(unresolved.is_empty());
    }

    #[test]
    fn site_title_substituted() {
        let (out, _) = resolve("Welcome to {{ site.title }}.");
        assert_eq!(out, "Welcome to Shipping Models.");
    }

    #[test]
    fn relative_and_absolute_url_filters() {
        let (out, _) = resolve(r#"{{ "/assets/a.png" | relative_url }} {{ '/b' | absolute_url }}"#);
        assert_eq!(out, "/ml-api/assets/a.png https://example.github.io/ml-api/b");
    }

    #[test]
    fn whitespace_control_dashes_accepted() {
        let (out, _) = resolve("{{- site.baseurl -}}");
        assert_eq!(out, "/ml-api");
    }

    #[test]
    fn include_left_untouched_and_reported() {
        let (out, unresolved) = resolve("before\n{% include image.html url=\"x\" %}\nafter\n");
        assert_eq!(out, "before\n{% include image.html url=\"x\" %}\nafter\n");
        assert_eq!(
            unresolved,
            vec![Unresolved {
                line: 2,
                directive: "{% include image.html url=\"x\" %}".to_string()
            }]
        );
    }

    #[test]
    fn unknown_variable_reported() {
        let (out, unresolved) = resolve("by {{ page.author }}");
        assert_eq!(out, "by {{ page.author }}");
        assert_eq!(unresolved[0].directive, "{{ page.author }}");
    }

    #[test]
    fn unknown_filter_reported() {
        let (out, unresolved) = resolve("{{ site.url | upcase }}");
        assert_eq!(out, "{{ site.url | upcase }}");
        assert_eq!(unresolved.len(), 1);
    }

    #[test]
    fn raw_block_passes_content_through() {
        let (out, unresolved) =
            resolve("{% raw %}{{ request.json }} and {% include x %}{% endraw %} then {{ site.baseurl }}");
        assert_eq!(out, "{{ request.json }} and {% include x %} then /ml-api");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn raw_state_spans_segments() {
        let vars = vars();
        let mut resolver = Resolver::new(&vars);
        let first = resolver.resolve("{% raw %}\n", 1);
        let second = resolver.resolve("{{ kept }}\n{% endraw %}\n{{ site.url }}\n", 5);
        assert_eq!(first, "\n");
        assert_eq!(second, "{{ kept }}\n\nhttps://example.github.io\n");
        assert!(resolver.finish().is_empty());
    }

    #[test]
    fn unterminated_directive_is_text() {
        let (out, unresolved) = resolve("a {{ site.url and more");
        assert_eq!(out, "a {{ site.url and more");
        assert!(unresolved.is_empty());
    }

    #[test]
    fn stray_endraw_reported() {
        let (out, unresolved) = resolve("{% endraw %}");
        assert_eq!(out, "{% endraw %}");
        assert_eq!(unresolved.len(), 1);
    }

    #[test]
    fn line_numbers_offset_by_first_line() {
        let vars = vars();
        let mut resolver = Resolver::new(&vars);
        resolver.resolve("one\ntwo {% include a %}\n", 10);
        assert_eq!(resolver.finish()[0].line, 11);
    }

    #[test]
    fn string_literal_quotes() {
        assert_eq!(string_literal("\"/a\""), Some("/a"));
        assert_eq!(string_literal("'/a'"), Some("/a"));
        assert_eq!(string_literal("site.url"), None);
        assert_eq!(string_literal("\"a"), None);
    }
}
