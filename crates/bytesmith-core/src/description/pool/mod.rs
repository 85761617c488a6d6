// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Registry of known type descriptions.
//!
//! **DDD Context:** Entity Model — Repository
//!
//! The pool answers the hierarchy and visibility questions the pipeline asks
//! about types it does not build itself: superclass chains, interface
//! closure, assignability and member access. The instrumented type is
//! usually not registered; operations that start from it take the
//! description directly.
//!
//! Names the pool does not know are treated as public, non-interface types
//! without members, so a partial pool never blocks a build.

use ecow::EcoString;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{BuildError, Result};

use super::modifiers::Modifiers;
use super::types::{TypeDescription, TypeRef, package_of};

mod builtins;

/// Known types keyed by binary name.
#[derive(Debug, Clone, Default)]
pub struct TypePool {
    types: HashMap<EcoString, TypeDescription>,
}

impl TypePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool seeded with the `java.lang` types the pipeline relies on.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut pool = Self::new();
        for ty in builtins::builtin_types() {
            pool.register(ty);
        }
        pool
    }

    /// Adds or replaces a type.
    pub fn register(&mut self, ty: TypeDescription) {
        self.types.insert(ty.name.clone(), ty);
    }

    /// Builder-style [`TypePool::register`].
    #[must_use]
    pub fn with_type(mut self, ty: TypeDescription) -> Self {
        self.register(ty);
        self
    }

    /// Looks up a type by binary name.
    #[must_use]
    pub fn describe(&self, name: &str) -> Option<&TypeDescription> {
        self.types.get(name)
    }

    /// Looks up a type, failing with [`BuildError::UnresolvedType`].
    pub fn resolve(&self, name: &str) -> Result<&TypeDescription> {
        self.describe(name)
            .ok_or_else(|| BuildError::UnresolvedType(name.into()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns the known superclasses of `root`, nearest first.
    ///
    /// The walk stops at the first unknown name or when a cycle is detected.
    #[must_use]
    pub fn superclass_chain<'a>(&'a self, root: &'a TypeDescription) -> Vec<&'a TypeDescription> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(root.name.clone());
        let mut current = root;

        loop {
            let Some(superclass) = current.superclass.as_ref().and_then(TypeRef::raw_name) else {
                break;
            };
            if !visited.insert(superclass.clone()) {
                break; // Cycle detected
            }
            let Some(next) = self.describe(superclass) else {
                break;
            };
            chain.push(next);
            current = next;
        }

        chain
    }

    /// Returns `root`, its superclasses, then all reachable interfaces breadth-first.
    ///
    /// Each type appears once.
    #[must_use]
    pub fn hierarchy<'a>(&'a self, root: &'a TypeDescription) -> Vec<&'a TypeDescription> {
        let mut types = vec![root];
        types.extend(self.superclass_chain(root));
        let mut seen: HashSet<EcoString> = types.iter().map(|ty| ty.name.clone()).collect();

        let mut queue: VecDeque<&TypeRef> = types.iter().flat_map(|ty| &ty.interfaces).collect();
        while let Some(interface) = queue.pop_front() {
            let Some(name) = interface.raw_name() else {
                continue;
            };
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(ty) = self.describe(name) {
                types.push(ty);
                queue.extend(&ty.interfaces);
            }
        }
        types
    }

    /// Returns true if `root` is `name` or inherits from it.
    #[must_use]
    pub fn is_subtype_of(&self, root: &TypeDescription, name: &str) -> bool {
        root.name == name
            || self.hierarchy(root).iter().any(|ty| ty.name == name)
            || root
                .superclass
                .as_ref()
                .and_then(TypeRef::raw_name)
                .is_some_and(|superclass| superclass == name)
    }

    /// Returns true if a value of type `source` can be assigned to `target`.
    #[must_use]
    pub fn is_assignable(&self, target: &str, source: &str) -> bool {
        if target == source || target == super::types::OBJECT {
            return true;
        }
        self.describe(source)
            .is_some_and(|ty| self.is_subtype_of(ty, target))
    }

    /// Returns true if the named type is public. Unknown types count as public.
    #[must_use]
    pub fn is_type_public(&self, name: &str) -> bool {
        self.describe(name).is_none_or(TypeDescription::is_public)
    }

    /// Returns true if the named type is an interface. Unknown types are classes.
    #[must_use]
    pub fn is_interface(&self, name: &str) -> bool {
        self.describe(name).is_some_and(TypeDescription::is_interface)
    }

    /// Returns true if code in `accessor` can name `ty`.
    #[must_use]
    pub fn is_type_visible_to(&self, ty: &TypeRef, accessor: &TypeDescription) -> bool {
        match ty.erasure() {
            TypeRef::Array(component) => self.is_type_visible_to(&component, accessor),
            TypeRef::Class(name) => {
                name == accessor.name
                    || self.is_type_public(&name)
                    || package_of(&name) == accessor.package()
            }
            _ => true,
        }
    }

    /// Applies the JVM member access rules for a member of `declaring_type`.
    ///
    /// A member is visible when it is public, when the accessor is the
    /// declaring type, when it is protected and the accessor is a subtype,
    /// or when it is not private and both types share a package.
    #[must_use]
    pub fn is_member_visible(
        &self,
        declaring_type: &str,
        modifiers: Modifiers,
        accessor: &TypeDescription,
    ) -> bool {
        if modifiers.contains(Modifiers::PUBLIC) || declaring_type == accessor.name {
            return true;
        }
        if modifiers.contains(Modifiers::PRIVATE) {
            return false;
        }
        (modifiers.contains(Modifiers::PROTECTED) && self.is_subtype_of(accessor, declaring_type))
            || package_of(declaring_type) == accessor.package()
    }
}
