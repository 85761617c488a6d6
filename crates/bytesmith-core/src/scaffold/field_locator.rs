// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Field lookup by name.
//!
//! **DDD Context:** Scaffold — Domain Service
//!
//! A locator searches one scope for a field visible to an accessing type.
//! A lookup succeeds only if exactly one candidate matches; no match and
//! several matches both yield [`FieldResolution::Illegal`]. Failure is an
//! ordinary value: callers decide how to fall back.

use ecow::EcoString;

use crate::description::{FieldDescription, TypeDescription, TypePool, TypeRef};

/// Outcome of a field lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResolution {
    /// No unique field was found.
    Illegal,
    Simple(FieldDescription),
}

impl FieldResolution {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldResolution::Simple(_))
    }

    #[must_use]
    pub fn field(&self) -> Option<&FieldDescription> {
        match self {
            FieldResolution::Simple(field) => Some(field),
            FieldResolution::Illegal => None,
        }
    }

    fn of(mut candidates: Vec<&FieldDescription>) -> Self {
        match (candidates.pop(), candidates.is_empty()) {
            (Some(field), true) => FieldResolution::Simple(field.clone()),
            _ => FieldResolution::Illegal,
        }
    }
}

/// Locator that never finds anything.
pub const NO_OP: FieldLocator<'static> = FieldLocator::NoOp;

/// A field lookup scope.
#[derive(Debug, Clone, Copy)]
pub enum FieldLocator<'a> {
    NoOp,
    /// Fields declared directly on `target`.
    ForExactType {
        target: &'a TypeDescription,
        accessor: &'a TypeDescription,
        pool: &'a TypePool,
    },
    /// `target` and its supertypes; the first level with a visible match decides.
    ForClassHierarchy {
        target: &'a TypeDescription,
        accessor: &'a TypeDescription,
        pool: &'a TypePool,
    },
    /// Fields declared on the accessing type only.
    ForTopLevelType {
        accessor: &'a TypeDescription,
        pool: &'a TypePool,
    },
}

impl<'a> FieldLocator<'a> {
    /// Searches `ty`'s hierarchy on behalf of `ty` itself.
    #[must_use]
    pub fn for_class_hierarchy(ty: &'a TypeDescription, pool: &'a TypePool) -> Self {
        FieldLocator::ForClassHierarchy {
            target: ty,
            accessor: ty,
            pool,
        }
    }

    /// Searches the fields `ty` declares on behalf of `ty` itself.
    #[must_use]
    pub fn for_top_level_type(ty: &'a TypeDescription, pool: &'a TypePool) -> Self {
        FieldLocator::ForTopLevelType { accessor: ty, pool }
    }

    /// Searches fields declared on `target` on behalf of `accessor`.
    #[must_use]
    pub fn for_exact_type(
        target: &'a TypeDescription,
        accessor: &'a TypeDescription,
        pool: &'a TypePool,
    ) -> Self {
        FieldLocator::ForExactType {
            target,
            accessor,
            pool,
        }
    }

    /// Locates a visible field by name.
    #[must_use]
    pub fn locate(&self, name: &str) -> FieldResolution {
        self.resolve(|field| field.name == name)
    }

    /// Locates a visible field by name and exact (erased) type.
    #[must_use]
    pub fn locate_typed(&self, name: &str, ty: &TypeRef) -> FieldResolution {
        let erased = ty.erasure();
        self.resolve(|field| field.name == name && field.type_ref.erasure() == erased)
    }

    fn resolve(&self, matches: impl Fn(&FieldDescription) -> bool) -> FieldResolution {
        match *self {
            FieldLocator::NoOp => FieldResolution::Illegal,
            FieldLocator::ForExactType {
                target,
                accessor,
                pool,
            } => FieldResolution::of(candidates(target, accessor, pool, &matches)),
            FieldLocator::ForClassHierarchy {
                target,
                accessor,
                pool,
            } => pool
                .hierarchy(target)
                .into_iter()
                .map(|level| candidates(level, accessor, pool, &matches))
                .find(|level| !level.is_empty())
                .map_or(FieldResolution::Illegal, FieldResolution::of),
            FieldLocator::ForTopLevelType { accessor, pool } => {
                FieldResolution::of(candidates(accessor, accessor, pool, &matches))
            }
        }
    }
}

fn candidates<'t>(
    ty: &'t TypeDescription,
    accessor: &TypeDescription,
    pool: &TypePool,
    matches: &impl Fn(&FieldDescription) -> bool,
) -> Vec<&'t FieldDescription> {
    ty.fields
        .iter()
        .filter(|field| matches(field) && field.is_visible_to(accessor, pool))
        .collect()
}

/// Creates a locator for an instrumented type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldLocatorFactory {
    NoOp,
    #[default]
    ForClassHierarchy,
    ForTopLevelType,
    /// Searches the named type on behalf of the instrumented type.
    ForExactType(EcoString),
}

impl FieldLocatorFactory {
    /// Binds the factory to `instrumented_type`.
    ///
    /// Returns `None` if an exact target type is not known to the pool.
    #[must_use]
    pub fn make<'a>(
        &self,
        instrumented_type: &'a TypeDescription,
        pool: &'a TypePool,
    ) -> Option<FieldLocator<'a>> {
        Some(match self {
            FieldLocatorFactory::NoOp => NO_OP,
            FieldLocatorFactory::ForClassHierarchy => {
                FieldLocator::for_class_hierarchy(instrumented_type, pool)
            }
            FieldLocatorFactory::ForTopLevelType => {
                FieldLocator::for_top_level_type(instrumented_type, pool)
            }
            FieldLocatorFactory::ForExactType(name) if *name == instrumented_type.name => {
                FieldLocator::for_exact_type(instrumented_type, instrumented_type, pool)
            }
            FieldLocatorFactory::ForExactType(name) => {
                FieldLocator::for_exact_type(pool.describe(name)?, instrumented_type, pool)
            }
        })
    }
}
