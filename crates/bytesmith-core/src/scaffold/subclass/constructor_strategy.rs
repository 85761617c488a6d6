// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Constructor policies for subclasses.
//!
//! **DDD Context:** Subclass Builder
//!
//! A strategy does two things: it extracts the constructor tokens the new
//! type declares, and it injects the rule that implements them. Every
//! injected constructor calls the matching super constructor.

use ecow::eco_format;
use serde::Deserialize;
use tracing::debug;

use crate::description::{MethodToken, Modifiers, TypeDescription, TypePool, Visibility};
use crate::error::{BuildError, Result};
use crate::implementation::Implementation;
use crate::matcher::MethodMatcher;
use crate::scaffold::method_registry::{Entry, Handler, MethodRegistry};

/// Which constructors a subclass receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstructorStrategy {
    /// No constructors; the type cannot be instantiated.
    NoConstructors,
    /// A public no-argument constructor. The superclass must declare a
    /// visible no-argument constructor.
    DefaultConstructor,
    /// Every superclass constructor visible to the subclass, with its modifiers.
    ImitateSuperClass,
    /// Every public superclass constructor.
    ImitateSuperClassPublic,
    /// Every superclass constructor visible to the subclass, made public.
    #[default]
    ImitateSuperClassOpening,
}

impl ConstructorStrategy {
    /// The constructors `instrumented_type` declares under this policy.
    pub fn extract_constructors(
        self,
        instrumented_type: &TypeDescription,
        pool: &TypePool,
    ) -> Result<Vec<MethodToken>> {
        if self == ConstructorStrategy::NoConstructors {
            return Ok(Vec::new());
        }
        let Some(superclass) = instrumented_type.superclass.as_ref() else {
            return Ok(Vec::new());
        };
        let super_name = superclass.raw_name().ok_or_else(|| {
            BuildError::illegal_argument(eco_format!("{superclass} cannot be subclassed"))
        })?;
        let super_type = pool.resolve(super_name)?;
        let bindings = super_type.bindings_for(superclass);
        let visible = super_type
            .declared_methods()
            .iter()
            .filter(|method| {
                method.is_constructor() && method.is_visible_to(instrumented_type, pool)
            });

        let tokens: Vec<MethodToken> = match self {
            ConstructorStrategy::NoConstructors => Vec::new(),
            ConstructorStrategy::DefaultConstructor => {
                if !visible.clone().any(|constructor| constructor.parameters.is_empty()) {
                    return Err(BuildError::illegal_argument(eco_format!(
                        "{super_name} declares no constructor without arguments visible to {}",
                        instrumented_type.name
                    )));
                }
                vec![MethodToken::constructor(Modifiers::PUBLIC, Vec::new())]
            }
            ConstructorStrategy::ImitateSuperClass => visible
                .map(|constructor| constructor.in_generic_shape(&bindings).as_token())
                .collect(),
            ConstructorStrategy::ImitateSuperClassPublic => visible
                .filter(|constructor| constructor.is_public())
                .map(|constructor| constructor.in_generic_shape(&bindings).as_token())
                .collect(),
            ConstructorStrategy::ImitateSuperClassOpening => visible
                .map(|constructor| {
                    let mut token = constructor.in_generic_shape(&bindings).as_token();
                    token.modifiers = token.modifiers.with_visibility(Visibility::Public);
                    token
                })
                .collect(),
        };
        debug!(strategy = ?self, constructors = tokens.len(), "extracted constructors");
        Ok(tokens)
    }

    /// Adds the rule implementing the extracted constructors.
    #[must_use]
    pub fn inject(self, registry: &MethodRegistry) -> MethodRegistry {
        match self {
            ConstructorStrategy::NoConstructors => registry.clone(),
            _ => registry.append(Entry::new(
                MethodMatcher::IsConstructor,
                Handler::ForImplementation(Implementation::SuperMethodCall),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{MethodDescription, Primitive, STRING, TypeRef, TypeVariableToken};

    fn base() -> TypeDescription {
        let mut base = TypeDescription::class("a.Base", Modifiers::PUBLIC, TypeRef::object());
        base.methods.push(MethodDescription::constructor("a.Base", Modifiers::PUBLIC, vec![]));
        base.methods.push(MethodDescription::constructor(
            "a.Base",
            Modifiers::PROTECTED,
            vec![TypeRef::Primitive(Primitive::Int)],
        ));
        base.methods.push(MethodDescription::constructor(
            "a.Base",
            Modifiers::PRIVATE,
            vec![TypeRef::class(STRING)],
        ));
        base
    }

    fn sub(superclass: TypeRef) -> TypeDescription {
        TypeDescription::class("b.Sub", Modifiers::PUBLIC, superclass)
    }

    fn extract(strategy: ConstructorStrategy) -> Result<Vec<MethodToken>> {
        let pool = TypePool::with_builtins().with_type(base());
        strategy.extract_constructors(&sub(TypeRef::class("a.Base")), &pool)
    }

    #[test]
    fn no_constructors() {
        assert!(extract(ConstructorStrategy::NoConstructors).unwrap().is_empty());
        let registry = ConstructorStrategy::NoConstructors.inject(&MethodRegistry::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn imitate_skips_private_constructors() {
        let tokens = extract(ConstructorStrategy::ImitateSuperClass).unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[1].modifiers.contains(Modifiers::PROTECTED));
    }

    #[test]
    fn imitate_public_only() {
        let tokens = extract(ConstructorStrategy::ImitateSuperClassPublic).unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].parameters.is_empty());
    }

    #[test]
    fn opening_makes_constructors_public() {
        let tokens = extract(ConstructorStrategy::ImitateSuperClassOpening).unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|token| token.modifiers.contains(Modifiers::PUBLIC)));
        assert!(!tokens[1].modifiers.contains(Modifiers::PROTECTED));
    }

    #[test]
    fn default_constructor_requires_visible_no_arg_constructor() {
        let tokens = extract(ConstructorStrategy::DefaultConstructor).unwrap();
        assert_eq!(tokens, vec![MethodToken::constructor(Modifiers::PUBLIC, vec![])]);

        let mut bare = TypeDescription::class("a.Bare", Modifiers::PUBLIC, TypeRef::object());
        bare.methods.push(MethodDescription::constructor(
            "a.Bare",
            Modifiers::PUBLIC,
            vec![TypeRef::Primitive(Primitive::Int)],
        ));
        let pool = TypePool::with_builtins().with_type(bare);
        let err = ConstructorStrategy::DefaultConstructor
            .extract_constructors(&sub(TypeRef::class("a.Bare")), &pool)
            .unwrap_err();
        assert!(matches!(err, BuildError::IllegalArgument(_)));
    }

    #[test]
    fn generic_superclass_constructor_is_resolved() {
        let mut boxed = TypeDescription::class("a.Box", Modifiers::PUBLIC, TypeRef::object());
        boxed.type_variables.push(TypeVariableToken::new("T"));
        boxed.methods.push(MethodDescription::constructor(
            "a.Box",
            Modifiers::PUBLIC,
            vec![TypeRef::variable("T")],
        ));
        let pool = TypePool::with_builtins().with_type(boxed);
        let superclass = TypeRef::Parameterized {
            raw: "a.Box".into(),
            arguments: vec![TypeRef::class(STRING)],
        };
        let tokens = ConstructorStrategy::ImitateSuperClass
            .extract_constructors(&sub(superclass), &pool)
            .unwrap();
        assert_eq!(tokens[0].parameters[0].type_ref, TypeRef::class(STRING));
    }

    #[test]
    fn unknown_superclass_is_reported() {
        let err = extract_from(TypeRef::class("z.Missing")).unwrap_err();
        assert!(matches!(err, BuildError::UnresolvedType(_)));
    }

    fn extract_from(superclass: TypeRef) -> Result<Vec<MethodToken>> {
        ConstructorStrategy::ImitateSuperClass
            .extract_constructors(&sub(superclass), &TypePool::with_builtins())
    }

    #[test]
    fn injected_rule_calls_super() {
        let registry = ConstructorStrategy::DefaultConstructor.inject(&MethodRegistry::new());
        let entry = registry.entries().next().unwrap();
        assert_eq!(
            entry.handler,
            Handler::ForImplementation(Implementation::SuperMethodCall)
        );
    }
}
