// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Document tree for class listings.
//!
//! **DDD Context:** Class Writing
//!
//! Listing functions return `Document` values that are rendered in a final
//! pass, so indentation is tracked by the tree instead of by hand.
//!
//! ```
//! use bytesmith_core::writer::document::{Document, line, nest};
//! use bytesmith_core::docvec;
//!
//! let doc = docvec!["class A {", nest(4, docvec![line(), "int x;"]), line(), "}"];
//! assert_eq!(doc.to_pretty_string(), "class A {\n    int x;\n}");
//! ```

/// Indentation width of one nesting level.
pub const INDENT: isize = 4;

/// A printable document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document<'a> {
    Str(&'a str),
    String(String),
    /// A newline followed by the current indentation.
    Line,
    Nest(isize, Box<Document<'a>>),
    Vec(Vec<Document<'a>>),
    Nil,
}

/// Coerce a value into a `Document`.
pub trait Documentable<'a> {
    fn to_doc(self) -> Document<'a>;
}

impl<'a> Documentable<'a> for &'a str {
    fn to_doc(self) -> Document<'a> {
        Document::Str(self)
    }
}

impl<'a> Documentable<'a> for String {
    fn to_doc(self) -> Document<'a> {
        Document::String(self)
    }
}

impl<'a> Documentable<'a> for Document<'a> {
    fn to_doc(self) -> Document<'a> {
        self
    }
}

impl<'a> Documentable<'a> for Vec<Document<'a>> {
    fn to_doc(self) -> Document<'a> {
        Document::Vec(self)
    }
}

impl<'a> Documentable<'a> for usize {
    fn to_doc(self) -> Document<'a> {
        Document::String(self.to_string())
    }
}

/// Concatenates documents; each element goes through [`Documentable`].
#[macro_export]
macro_rules! docvec {
    () => {
        $crate::writer::document::Document::Vec(Vec::new())
    };

    ($($item:expr),+ $(,)?) => {
        $crate::writer::document::Document::Vec(vec![
            $($crate::writer::document::Documentable::to_doc($item)),+
        ])
    };
}

#[must_use]
pub fn line() -> Document<'static> {
    Document::Line
}

#[must_use]
pub fn nil() -> Document<'static> {
    Document::Nil
}

/// Increases indentation for the lines inside `doc`.
#[must_use]
pub fn nest(indent: isize, doc: Document<'_>) -> Document<'_> {
    Document::Nest(indent, Box::new(doc))
}

/// Joins documents with a separator between each pair.
#[must_use]
pub fn join<'a>(
    docs: impl IntoIterator<Item = Document<'a>>,
    separator: &Document<'a>,
) -> Document<'a> {
    let mut result = Vec::new();
    for doc in docs {
        if !result.is_empty() {
            result.push(separator.clone());
        }
        result.push(doc);
    }
    if result.is_empty() {
        Document::Nil
    } else {
        Document::Vec(result)
    }
}

#[must_use]
pub fn concat<'a>(docs: impl IntoIterator<Item = Document<'a>>) -> Document<'a> {
    Document::Vec(docs.into_iter().collect())
}

impl Document<'_> {
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        let mut output = String::new();
        self.render_to(&mut output, 0);
        output
    }

    fn render_to(&self, output: &mut String, indent: isize) {
        match self {
            Document::Str(s) => output.push_str(s),
            Document::String(s) => output.push_str(s),
            Document::Nil => {}
            Document::Line => {
                output.push('\n');
                for _ in 0..indent {
                    output.push(' ');
                }
            }
            Document::Nest(extra, doc) => doc.render_to(output, indent + extra),
            Document::Vec(docs) => {
                for doc in docs {
                    doc.render_to(output, indent);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nest_indents_following_lines() {
        let doc = docvec!["a", nest(INDENT, docvec![line(), "b", line(), "c"]), line(), "d"];
        assert_eq!(doc.to_pretty_string(), "a\n    b\n    c\nd");
    }

    #[test]
    fn join_places_separators_between() {
        let doc = join(
            ["x", "y", "z"].into_iter().map(Document::Str),
            &Document::Str(", "),
        );
        assert_eq!(doc.to_pretty_string(), "x, y, z");
        assert_eq!(join(std::iter::empty(), &line()), nil());
    }

    #[test]
    fn owned_and_numeric_parts() {
        let doc = docvec![String::from("n="), 3usize, concat([nil(), "!".to_doc()])];
        assert_eq!(doc.to_pretty_string(), "n=3!");
    }
}
