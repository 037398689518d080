//! # Placeholder Templates
//!
//! Compute-field expressions embed references to sibling mapping fields as
//! `{name}` placeholders, e.g. `"({last} - {open}) / {open}"`. This module
//! parses such a string once into a small AST of literal segments and
//! placeholder references. Both the dependency resolver (reference
//! extraction) and the code generator (rendering against resolved locals)
//! consume the same parsed form, so the brace grammar lives in exactly one
//! place.
//!
//! A placeholder is `{` + identifier + `}` where the identifier starts with
//! a letter or underscore. Anything else — unmatched braces, `{1x}`,
//! `{a.b}`, empty braces — is treated as literal text, matching how the
//! generated expressions use braces.
//!
//! ## Example
//!
//! ```rust
//! use edlc::template::Template;
//!
//! let t = Template::parse("({last} - {open}) / {open}");
//! assert_eq!(t.references(), vec!["last", "open", "open"]);
//! let code = t.render(|name| format!("result.{}", name));
//! assert_eq!(code, "(result.last - result.open) / result.open");
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char},
    combinator::recognize,
    multi::many0_count,
    sequence::{delimited, pair},
    IResult,
};

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim text
    Literal(String),
    /// A `{name}` field reference
    Placeholder(String),
}

/// A compute-expression string parsed into literal and placeholder segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    pub segments: Vec<Segment>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn placeholder(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), identifier, char('}'))(input)
}

impl Template {
    /// Parses a template string. Total: malformed brace sequences fall back
    /// to literal text rather than failing.
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = input;

        while !rest.is_empty() {
            if rest.starts_with('{') {
                if let Ok((remaining, name)) = placeholder(rest) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                    rest = remaining;
                    continue;
                }
            }
            // Not a placeholder start: consume one char as literal text
            let ch = rest.chars().next().unwrap();
            literal.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Template { segments }
    }

    /// Placeholder names in left-to-right order, duplicates preserved.
    pub fn references(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// True when the template contains at least one placeholder.
    pub fn has_references(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(_)))
    }

    /// Renders the template, substituting each placeholder through `subst`.
    pub fn render(&self, mut subst: impl FnMut(&str) -> String) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => out.push_str(&subst(name)),
            }
        }
        out
    }
}

/// Extracts placeholder references from a compute expression string,
/// preserving order and duplicates.
pub fn extract_field_references(expr: &str) -> Vec<String> {
    Template::parse(expr)
        .references()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_references_in_order_with_duplicates() {
        assert_eq!(
            extract_field_references("({last} - {open}) / {open}"),
            vec!["last", "open", "open"]
        );
    }

    #[test]
    fn plain_text_is_one_literal() {
        let t = Template::parse("1 + 2");
        assert_eq!(t.segments, vec![Segment::Literal("1 + 2".to_string())]);
        assert!(!t.has_references());
    }

    #[test]
    fn malformed_braces_stay_literal() {
        assert_eq!(extract_field_references("{}"), Vec::<String>::new());
        assert_eq!(extract_field_references("{1abc}"), Vec::<String>::new());
        assert_eq!(extract_field_references("{a.b}"), Vec::<String>::new());
        assert_eq!(extract_field_references("{unclosed"), Vec::<String>::new());
        // The inner braces still form a valid placeholder
        assert_eq!(extract_field_references("{{price}}"), vec!["price"]);
    }

    #[test]
    fn underscore_identifiers() {
        assert_eq!(
            extract_field_references("{_raw} + {base_volume2}"),
            vec!["_raw", "base_volume2"]
        );
    }

    #[test]
    fn render_substitutes_placeholders_only() {
        let t = Template::parse("{change} / {open} * 100");
        let rendered = t.render(|name| format!("row['{}']", name));
        assert_eq!(rendered, "row['change'] / row['open'] * 100");
    }

    #[test]
    fn parse_render_identity_without_substitution() {
        let source = "({high} + {low}) / 2";
        let t = Template::parse(source);
        assert_eq!(t.render(|name| format!("{{{}}}", name)), source);
    }
}
