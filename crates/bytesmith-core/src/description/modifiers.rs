// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Access flags and visibility.
//!
//! **DDD Context:** Entity Model — Value Objects

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// JVM access flags shared by types, methods and fields.
    ///
    /// `BRIDGE` and `VARARGS` reuse the bits that mean `volatile` and
    /// `transient` on fields, matching the class file format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
    }
}

impl Modifiers {
    /// The bits that encode visibility.
    pub const VISIBILITY_MASK: Self = Self::PUBLIC.union(Self::PRIVATE).union(Self::PROTECTED);

    /// Returns the visibility encoded in these modifiers.
    #[must_use]
    pub fn visibility(self) -> Visibility {
        if self.contains(Self::PUBLIC) {
            Visibility::Public
        } else if self.contains(Self::PROTECTED) {
            Visibility::Protected
        } else if self.contains(Self::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::PackagePrivate
        }
    }

    /// Replaces the visibility bits with those of `visibility`.
    #[must_use]
    pub fn with_visibility(self, visibility: Visibility) -> Self {
        (self - Self::VISIBILITY_MASK) | visibility.mask()
    }

    /// Renders the modifiers as Java source keywords (e.g. `public static final`).
    #[must_use]
    pub fn keywords(self) -> String {
        const KEYWORDS: &[(Modifiers, &str)] = &[
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::FINAL, "final"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::NATIVE, "native"),
            (Modifiers::STRICT, "strictfp"),
            (Modifiers::SYNTHETIC, "synthetic"),
            (Modifiers::BRIDGE, "bridge"),
        ];
        KEYWORDS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, keyword)| *keyword)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Visibility of a type member, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    Private,
    PackagePrivate,
    Protected,
    Public,
}

impl Visibility {
    /// Returns the wider of the two visibilities.
    #[must_use]
    pub fn expand_to(self, other: Visibility) -> Visibility {
        self.max(other)
    }

    /// Returns the modifier bits representing this visibility.
    #[must_use]
    pub fn mask(self) -> Modifiers {
        match self {
            Visibility::Public => Modifiers::PUBLIC,
            Visibility::Protected => Modifiers::PROTECTED,
            Visibility::PackagePrivate => Modifiers::empty(),
            Visibility::Private => Modifiers::PRIVATE,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::PackagePrivate => "package-private",
            Visibility::Private => "private",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_from_modifiers() {
        assert_eq!(Modifiers::PUBLIC.visibility(), Visibility::Public);
        assert_eq!(
            (Modifiers::PROTECTED | Modifiers::STATIC).visibility(),
            Visibility::Protected
        );
        assert_eq!(Modifiers::FINAL.visibility(), Visibility::PackagePrivate);
        assert_eq!(Modifiers::PRIVATE.visibility(), Visibility::Private);
    }

    #[test]
    fn expand_to_picks_wider() {
        assert_eq!(
            Visibility::PackagePrivate.expand_to(Visibility::Protected),
            Visibility::Protected
        );
        assert_eq!(
            Visibility::Public.expand_to(Visibility::Private),
            Visibility::Public
        );
    }

    #[test]
    fn with_visibility_replaces_bits() {
        let modifiers = (Modifiers::PRIVATE | Modifiers::FINAL).with_visibility(Visibility::Public);
        assert_eq!(modifiers, Modifiers::PUBLIC | Modifiers::FINAL);
    }

    #[test]
    fn keywords_in_source_order() {
        let modifiers = Modifiers::STATIC | Modifiers::PUBLIC | Modifiers::FINAL;
        assert_eq!(modifiers.keywords(), "public static final");
    }
}
