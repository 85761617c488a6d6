// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method and method-name transformers.
//!
//! **DDD Context:** Implementation
//!
//! A [`MethodTransformer`] adjusts the shape of a matched method before it
//! is recorded (currently its modifiers). A [`MethodNameTransformer`] picks
//! the name under which a rebased method's original code is kept.

use ecow::EcoString;
use sha2::{Digest, Sha256};

use crate::description::{FieldDescription, MethodDescription, Modifiers, TypeDescription};

/// Rewrites a matched method. Identity (owner, name, erased signature) is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MethodTransformer {
    #[default]
    NoOp,
    /// Adds the `set` modifiers and then removes the `clear` modifiers.
    ForModifiers { set: Modifiers, clear: Modifiers },
    Compound(Vec<MethodTransformer>),
}

impl MethodTransformer {
    #[must_use]
    pub fn transform(
        &self,
        instrumented_type: &TypeDescription,
        method: &MethodDescription,
    ) -> MethodDescription {
        match self {
            MethodTransformer::NoOp => method.clone(),
            MethodTransformer::ForModifiers { set, clear } => {
                let mut transformed = method.clone();
                transformed.modifiers = (method.modifiers | *set) - *clear;
                transformed
            }
            MethodTransformer::Compound(transformers) => transformers
                .iter()
                .fold(method.clone(), |current, transformer| {
                    transformer.transform(instrumented_type, &current)
                }),
        }
    }
}

/// Rewrites the modifiers of a matched field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldTransformer {
    #[default]
    NoOp,
    ForModifiers { set: Modifiers, clear: Modifiers },
}

impl FieldTransformer {
    #[must_use]
    pub fn transform(&self, field: &FieldDescription) -> FieldDescription {
        match self {
            FieldTransformer::NoOp => field.clone(),
            FieldTransformer::ForModifiers { set, clear } => {
                let mut transformed = field.clone();
                transformed.modifiers = (field.modifiers | *set) - *clear;
                transformed
            }
        }
    }
}

/// Chooses the internal name of a rebased method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodNameTransformer {
    /// `name$suffix$digest`, where the digest is derived from the signature.
    Suffixing(EcoString),
    /// `prefix` followed by the name with its first letter capitalised.
    Prefixing(EcoString),
}

impl Default for MethodNameTransformer {
    fn default() -> Self {
        MethodNameTransformer::Suffixing("original".into())
    }
}

impl MethodNameTransformer {
    /// Returns the rebased name of `method`.
    ///
    /// The result is deterministic and differs for every distinct signature
    /// of the same name.
    #[must_use]
    pub fn transform(&self, method: &MethodDescription) -> EcoString {
        match self {
            MethodNameTransformer::Suffixing(suffix) => {
                let digest = digest(&[
                    method.declaring_type.as_str(),
                    method.name.as_str(),
                    method.descriptor().as_str(),
                ]);
                ecow::eco_format!("{}${suffix}${digest}", method.name)
            }
            MethodNameTransformer::Prefixing(prefix) => {
                let mut chars = method.name.chars();
                let capitalised: String = chars
                    .next()
                    .map(|first| first.to_uppercase().chain(chars).collect())
                    .unwrap_or_default();
                ecow::eco_format!("{prefix}{capitalised}")
            }
        }
    }
}

/// Short stable hex digest of the given parts (first 4 bytes of SHA-256).
pub(crate) fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    hex_encode(&hasher.finalize()[..4])
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{Primitive, TypeRef};

    fn method(parameters: Vec<TypeRef>) -> MethodDescription {
        MethodDescription::new("a.Calc", "sum", Modifiers::PUBLIC, TypeRef::Void)
            .with_parameters(parameters)
    }

    #[test]
    fn modifier_transformer_keeps_identity() {
        let original = method(vec![]);
        let ty = TypeDescription::class("a.Calc", Modifiers::PUBLIC, TypeRef::object());
        let transformer = MethodTransformer::ForModifiers {
            set: Modifiers::FINAL | Modifiers::SYNCHRONIZED,
            clear: Modifiers::SYNCHRONIZED,
        };
        let transformed = transformer.transform(&ty, &original);
        assert_eq!(transformed, original);
        assert_eq!(transformed.modifiers, Modifiers::PUBLIC | Modifiers::FINAL);
    }

    #[test]
    fn suffixing_is_deterministic_per_signature() {
        let transformer = MethodNameTransformer::default();
        let int = method(vec![TypeRef::Primitive(Primitive::Int)]);
        let long = method(vec![TypeRef::Primitive(Primitive::Long)]);
        let first = transformer.transform(&int);
        assert_eq!(first, transformer.transform(&int));
        assert_ne!(first, transformer.transform(&long));
        assert!(first.starts_with("sum$original$"));
        assert_eq!(first.len(), "sum$original$".len() + 8);
    }

    #[test]
    fn prefixing_capitalises() {
        let transformer = MethodNameTransformer::Prefixing("original".into());
        assert_eq!(transformer.transform(&method(vec![])), "originalSum");
    }
}
