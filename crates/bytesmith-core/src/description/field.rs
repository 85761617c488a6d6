// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Field descriptions and their detached tokens.
//!
//! **DDD Context:** Entity Model

use ecow::EcoString;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::annotation::AnnotationDescription;
use super::modifiers::Modifiers;
use super::pool::TypePool;
use super::types::{TypeDescription, TypeRef};

/// A field declared on a type. Identity is the declaring type and the name.
#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub declaring_type: EcoString,
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub type_ref: TypeRef,
    pub annotations: Vec<AnnotationDescription>,
}

impl PartialEq for FieldDescription {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type && self.name == other.name
    }
}

impl Eq for FieldDescription {}

impl Hash for FieldDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring_type.hash(state);
        self.name.hash(state);
    }
}

impl FieldDescription {
    #[must_use]
    pub fn new(
        declaring_type: impl Into<EcoString>,
        name: impl Into<EcoString>,
        modifiers: Modifiers,
        type_ref: TypeRef,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            modifiers,
            type_ref,
            annotations: Vec::new(),
        }
    }

    /// Materialises a detached token on `declaring_type`.
    #[must_use]
    pub fn latent(declaring_type: &str, token: &FieldToken) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: token.name.clone(),
            modifiers: token.modifiers,
            type_ref: token.type_ref.attach(declaring_type),
            annotations: token.annotations.clone(),
        }
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    /// Returns true if `accessor` may read this field.
    #[must_use]
    pub fn is_visible_to(&self, accessor: &TypeDescription, pool: &TypePool) -> bool {
        pool.is_member_visible(&self.declaring_type, self.modifiers, accessor)
    }

    #[must_use]
    pub fn as_token(&self) -> FieldToken {
        FieldToken {
            name: self.name.clone(),
            modifiers: self.modifiers,
            type_ref: self.type_ref.detach(&self.declaring_type),
            annotations: self.annotations.clone(),
        }
    }

    #[must_use]
    pub fn as_signature_token(&self) -> SignatureToken {
        SignatureToken {
            name: self.name.clone(),
            type_ref: self.type_ref.erasure(),
        }
    }
}

impl fmt::Display for FieldDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keywords = self.modifiers.keywords();
        if !keywords.is_empty() {
            write!(f, "{keywords} ")?;
        }
        write!(f, "{} {}.{}", self.type_ref, self.declaring_type, self.name)
    }
}

/// A field detached from its declaring type. Equality covers the name and type.
#[derive(Debug, Clone)]
pub struct FieldToken {
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub type_ref: TypeRef,
    pub annotations: Vec<AnnotationDescription>,
}

impl FieldToken {
    #[must_use]
    pub fn new(name: impl Into<EcoString>, modifiers: Modifiers, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers,
            type_ref,
            annotations: Vec::new(),
        }
    }
}

impl PartialEq for FieldToken {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.type_ref == other.type_ref
    }
}

impl Eq for FieldToken {}

impl Hash for FieldToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.type_ref.hash(state);
    }
}

/// A field's name and erased type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureToken {
    pub name: EcoString,
    pub type_ref: TypeRef,
}
