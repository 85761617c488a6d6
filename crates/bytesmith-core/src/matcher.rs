// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method matchers.
//!
//! **DDD Context:** Method Registry — Specifications
//!
//! A [`MethodMatcher`] is a predicate tree evaluated against a method. A
//! [`LatentMatcher`] is a matcher that still needs the instrumented type
//! (for example "declared by the type under construction") and is resolved
//! into a [`MethodMatcher`] once that type is known.

use ecow::EcoString;

use crate::description::{
    FieldDescription, MethodDescription, MethodToken, SignatureToken, TypeDescription, TypePool,
    TypeRef,
};

/// A predicate over method descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    Any,
    None,
    Named(EcoString),
    NameStartsWith(EcoString),
    NameEndsWith(EcoString),
    /// Exact parameter count.
    TakesArguments(usize),
    /// Exact erased parameter types.
    TakesArgumentTypes(Vec<TypeRef>),
    /// Exact erased return type.
    Returns(TypeRef),
    IsConstructor,
    IsTypeInitializer,
    /// Ordinary methods (neither constructors nor the type initializer).
    IsMethod,
    IsVirtual,
    IsStatic,
    IsFinal,
    IsAbstract,
    IsPublic,
    IsSynthetic,
    IsBridge,
    DeclaredBy(EcoString),
    /// The method may be invoked from the given type.
    VisibleTo(Box<TypeDescription>),
    HasSignature(SignatureToken),
    /// The method detached from its declaring type equals the token.
    HasToken(Box<MethodToken>),
    And(Vec<MethodMatcher>),
    Or(Vec<MethodMatcher>),
    Not(Box<MethodMatcher>),
}

impl MethodMatcher {
    #[must_use]
    pub fn named(name: impl Into<EcoString>) -> Self {
        MethodMatcher::Named(name.into())
    }

    #[must_use]
    pub fn declared_by(name: impl Into<EcoString>) -> Self {
        MethodMatcher::DeclaredBy(name.into())
    }

    #[must_use]
    pub fn and(self, other: MethodMatcher) -> Self {
        match self {
            MethodMatcher::And(mut matchers) => {
                matchers.push(other);
                MethodMatcher::And(matchers)
            }
            first => MethodMatcher::And(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: MethodMatcher) -> Self {
        match self {
            MethodMatcher::Or(mut matchers) => {
                matchers.push(other);
                MethodMatcher::Or(matchers)
            }
            first => MethodMatcher::Or(vec![first, other]),
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        MethodMatcher::Not(Box::new(self))
    }

    /// Evaluates the predicate. `pool` answers visibility questions.
    #[must_use]
    pub fn matches(&self, method: &MethodDescription, pool: &TypePool) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::None => false,
            MethodMatcher::Named(name) => method.name == *name,
            MethodMatcher::NameStartsWith(prefix) => method.name.starts_with(prefix.as_str()),
            MethodMatcher::NameEndsWith(suffix) => method.name.ends_with(suffix.as_str()),
            MethodMatcher::TakesArguments(count) => method.parameters.len() == *count,
            MethodMatcher::TakesArgumentTypes(types) => {
                method.parameters.len() == types.len()
                    && method
                        .parameters
                        .iter()
                        .zip(types)
                        .all(|(parameter, ty)| parameter.type_ref.erasure() == ty.erasure())
            }
            MethodMatcher::Returns(ty) => method.return_type.erasure() == ty.erasure(),
            MethodMatcher::IsConstructor => method.is_constructor(),
            MethodMatcher::IsTypeInitializer => method.is_type_initializer(),
            MethodMatcher::IsMethod => method.is_method(),
            MethodMatcher::IsVirtual => method.is_virtual(),
            MethodMatcher::IsStatic => method.is_static(),
            MethodMatcher::IsFinal => method.is_final(),
            MethodMatcher::IsAbstract => method.is_abstract(),
            MethodMatcher::IsPublic => method.is_public(),
            MethodMatcher::IsSynthetic => method.is_synthetic(),
            MethodMatcher::IsBridge => method.is_bridge(),
            MethodMatcher::DeclaredBy(name) => method.declaring_type == *name,
            MethodMatcher::VisibleTo(ty) => method.is_visible_to(ty, pool),
            MethodMatcher::HasSignature(token) => method.as_signature_token() == *token,
            MethodMatcher::HasToken(token) => method.as_token() == **token,
            MethodMatcher::And(matchers) => matchers.iter().all(|m| m.matches(method, pool)),
            MethodMatcher::Or(matchers) => matchers.iter().any(|m| m.matches(method, pool)),
            MethodMatcher::Not(matcher) => !matcher.matches(method, pool),
        }
    }
}

/// A matcher that is resolved against the instrumented type before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatentMatcher {
    /// Already independent of the instrumented type.
    Resolved(MethodMatcher),
    /// Methods declared (or, with `false`, not declared) by the instrumented type.
    ForSelfDeclaredMethod { declared: bool },
    /// The method described by a token once attached to the instrumented type.
    ForMethodToken(Box<MethodToken>),
    /// Methods the instrumented type may override, plus its own declarations.
    ///
    /// Inherited methods must be virtual, non-final, visible to the type and
    /// not matched by `ignored`.
    Instrumentable { ignored: Box<LatentMatcher> },
    Conjunction(Vec<LatentMatcher>),
    Disjunction(Vec<LatentMatcher>),
    Not(Box<LatentMatcher>),
}

impl LatentMatcher {
    /// Matches any method.
    #[must_use]
    pub fn any() -> Self {
        LatentMatcher::Resolved(MethodMatcher::Any)
    }

    /// Matches no method.
    #[must_use]
    pub fn none() -> Self {
        LatentMatcher::Resolved(MethodMatcher::None)
    }

    #[must_use]
    pub fn or(self, other: LatentMatcher) -> Self {
        match self {
            LatentMatcher::Disjunction(mut matchers) => {
                matchers.push(other);
                LatentMatcher::Disjunction(matchers)
            }
            first => LatentMatcher::Disjunction(vec![first, other]),
        }
    }

    #[must_use]
    pub fn and(self, other: LatentMatcher) -> Self {
        match self {
            LatentMatcher::Conjunction(mut matchers) => {
                matchers.push(other);
                LatentMatcher::Conjunction(matchers)
            }
            first => LatentMatcher::Conjunction(vec![first, other]),
        }
    }

    /// Binds the matcher to `instrumented_type`.
    #[must_use]
    pub fn resolve(&self, instrumented_type: &TypeDescription) -> MethodMatcher {
        match self {
            LatentMatcher::Resolved(matcher) => matcher.clone(),
            LatentMatcher::ForSelfDeclaredMethod { declared } => {
                let matcher = MethodMatcher::declared_by(instrumented_type.name.clone());
                if *declared { matcher } else { matcher.negate() }
            }
            LatentMatcher::ForMethodToken(token) => {
                MethodMatcher::declared_by(instrumented_type.name.clone())
                    .and(MethodMatcher::HasToken(token.clone()))
            }
            LatentMatcher::Instrumentable { ignored } => MethodMatcher::And(vec![
                MethodMatcher::IsVirtual,
                MethodMatcher::IsFinal.negate(),
                MethodMatcher::VisibleTo(Box::new(instrumented_type.clone())),
                ignored.resolve(instrumented_type).negate(),
            ])
            .or(MethodMatcher::declared_by(instrumented_type.name.clone())),
            LatentMatcher::Conjunction(matchers) => MethodMatcher::And(
                matchers
                    .iter()
                    .map(|matcher| matcher.resolve(instrumented_type))
                    .collect(),
            ),
            LatentMatcher::Disjunction(matchers) => MethodMatcher::Or(
                matchers
                    .iter()
                    .map(|matcher| matcher.resolve(instrumented_type))
                    .collect(),
            ),
            LatentMatcher::Not(matcher) => matcher.resolve(instrumented_type).negate(),
        }
    }
}

impl From<MethodMatcher> for LatentMatcher {
    fn from(matcher: MethodMatcher) -> Self {
        LatentMatcher::Resolved(matcher)
    }
}

/// A predicate over field descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatcher {
    Any,
    Named(EcoString),
    /// Erased field type equality.
    HasType(TypeRef),
    IsStatic,
    And(Vec<FieldMatcher>),
    Not(Box<FieldMatcher>),
}

impl FieldMatcher {
    #[must_use]
    pub fn named(name: impl Into<EcoString>) -> Self {
        FieldMatcher::Named(name.into())
    }

    #[must_use]
    pub fn matches(&self, field: &FieldDescription) -> bool {
        match self {
            FieldMatcher::Any => true,
            FieldMatcher::Named(name) => field.name == *name,
            FieldMatcher::HasType(ty) => field.type_ref.erasure() == ty.erasure(),
            FieldMatcher::IsStatic => field.is_static(),
            FieldMatcher::And(matchers) => matchers.iter().all(|m| m.matches(field)),
            FieldMatcher::Not(matcher) => !matcher.matches(field),
        }
    }
}
