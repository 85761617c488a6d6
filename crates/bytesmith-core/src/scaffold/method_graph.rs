// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method graph compilation.
//!
//! **DDD Context:** Method Registry — Domain Service
//!
//! The method graph reduces the virtual methods of a type and its whole
//! hierarchy to one node per signature family. A family is keyed by the
//! method name and the erasure of its parameter types *as seen from the
//! instrumented type*, that is after resolving type variables through
//! parameterized supertypes. Return types do not take part, so covariant
//! overrides join their family.
//!
//! Each node carries:
//! - the representative (the most specific declaration),
//! - every declaration in the family,
//! - the erased [`TypeToken`] of every declaration, from which bridge
//!   requirements are derived,
//! - the widest visibility of any declaration,
//! - a [`NodeSort`].
//!
//! The walk visits the superclass chain first, then interfaces, then the
//! type's own declarations, so declarations closer to the type win.

use ecow::EcoString;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use crate::description::{
    MethodDescription, SignatureToken, TypeDescription, TypePool, TypeRef, TypeToken, Visibility,
};

/// Strategy for collecting the virtual methods of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MethodGraphCompiler {
    /// Walk the full hierarchy.
    #[default]
    Default,
    /// Only the type's own virtual methods; no super graph.
    #[serde(rename = "declared-only")]
    ForDeclaredMethods,
}

/// How a family's representative was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeSort {
    /// A single most specific declaration exists.
    Resolved,
    /// Unrelated interfaces contribute conflicting implementations.
    Ambiguous,
    /// The type redeclares an inherited method as a visibility bridge.
    Visible,
}

impl NodeSort {
    /// Returns true if the representative is the only candidate for dispatch.
    #[must_use]
    pub fn is_unique(self) -> bool {
        !matches!(self, NodeSort::Ambiguous)
    }

    /// Returns true if an existing bridge already exposes the method.
    #[must_use]
    pub fn is_made_visible(self) -> bool {
        matches!(self, NodeSort::Visible)
    }
}

/// One signature family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub representative: MethodDescription,
    pub declarations: Vec<MethodDescription>,
    pub method_types: IndexSet<TypeToken>,
    pub visibility: Visibility,
    pub sort: NodeSort,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    name: EcoString,
    parameters: Vec<TypeRef>,
}

impl Key {
    fn of(generic_shape: &MethodDescription) -> Self {
        Self {
            name: generic_shape.name.clone(),
            parameters: generic_shape.erased_parameter_types(),
        }
    }
}

/// The compiled graph of one type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodGraph {
    nodes: IndexMap<Key, Node>,
}

impl MethodGraph {
    /// Nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the node answering a call with the given name and erased signature.
    #[must_use]
    pub fn locate(&self, token: &SignatureToken) -> Option<&Node> {
        let key = Key {
            name: token.name.clone(),
            parameters: token.parameter_types.clone(),
        };
        if let Some(node) = self.nodes.get(&key) {
            return Some(node);
        }
        let type_token = TypeToken {
            return_type: token.return_type.clone(),
            parameter_types: token.parameter_types.clone(),
        };
        self.nodes
            .values()
            .find(|node| {
                node.representative.name == token.name && node.method_types.contains(&type_token)
            })
    }
}

/// A type's graph linked to the graph of its superclass.
///
/// The super graph is empty when the superclass is unknown or when only
/// declared methods were considered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkedGraph {
    pub graph: MethodGraph,
    pub super_graph: MethodGraph,
}

impl LinkedGraph {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.nodes()
    }

    #[must_use]
    pub fn locate(&self, token: &SignatureToken) -> Option<&Node> {
        self.graph.locate(token)
    }
}

impl MethodGraphCompiler {
    /// Compiles the graph of `ty`, linked with its superclass graph.
    #[must_use]
    pub fn compile(self, ty: &TypeDescription, pool: &TypePool) -> LinkedGraph {
        match self {
            MethodGraphCompiler::ForDeclaredMethods => {
                let mut store = Store::default();
                for method in ty.methods.iter().filter(|m| m.is_virtual() && !m.is_bridge()) {
                    store.declare(method.clone(), method);
                }
                LinkedGraph {
                    graph: store.into_graph(),
                    super_graph: MethodGraph::default(),
                }
            }
            MethodGraphCompiler::Default => {
                let graph = analyze(ty, &HashMap::new(), pool, &mut HashSet::new()).into_graph();
                let super_graph = ty
                    .superclass
                    .as_ref()
                    .and_then(|superclass| {
                        let super_type = pool.describe(superclass.raw_name()?)?;
                        let bindings = super_type.bindings_for(superclass);
                        let mut visited = HashSet::from([ty.name.clone()]);
                        Some(analyze(super_type, &bindings, pool, &mut visited).into_graph())
                    })
                    .unwrap_or_default();
                LinkedGraph { graph, super_graph }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    entries: IndexMap<Key, Node>,
}

impl Store {
    /// Registers a declaration of the type being analysed, overriding inherited ones.
    fn declare(&mut self, generic_shape: MethodDescription, defined: &MethodDescription) {
        let key = Key::of(&generic_shape);
        let own_type = defined.as_type_token();
        if defined.is_bridge() {
            // Compiler bridges are derived from the graph, not part of it.
            if let Some(node) = self.entries.get_mut(&key) {
                if node.method_types.contains(&own_type) {
                    node.visibility = node.visibility.expand_to(defined.visibility());
                    node.sort = NodeSort::Visible;
                }
            }
            return;
        }
        match self.entries.get_mut(&key) {
            Some(node) => {
                node.method_types.insert(generic_shape.as_type_token());
                node.method_types.insert(own_type);
                node.declarations.insert(0, defined.clone());
                node.visibility = node.visibility.expand_to(defined.visibility());
                node.representative = defined.clone();
                node.sort = NodeSort::Resolved;
            }
            None => {
                let mut method_types = IndexSet::new();
                method_types.insert(own_type);
                method_types.insert(generic_shape.as_type_token());
                self.entries.insert(
                    key,
                    Node {
                        representative: defined.clone(),
                        declarations: vec![defined.clone()],
                        method_types,
                        visibility: defined.visibility(),
                        sort: NodeSort::Resolved,
                    },
                );
            }
        }
    }

    /// Merges the store of a sibling interface.
    ///
    /// A family present in both with different non-abstract representatives
    /// from unrelated types becomes ambiguous.
    fn combine(&mut self, other: Store, pool: &TypePool) {
        for (key, incoming) in other.entries {
            match self.entries.get_mut(&key) {
                None => {
                    self.entries.insert(key, incoming);
                }
                Some(existing) => {
                    let same = existing.representative == incoming.representative;
                    let related = related(pool, &existing.representative, &incoming.representative);
                    merge_types(existing, &incoming);
                    if same {
                        continue;
                    }
                    if related.is_some_and(|incoming_is_more_specific| incoming_is_more_specific) {
                        existing.representative = incoming.representative.clone();
                    } else if related.is_none()
                        && (!existing.representative.is_abstract()
                            || !incoming.representative.is_abstract())
                    {
                        existing.sort = NodeSort::Ambiguous;
                    }
                }
            }
        }
    }

    /// Adds the interface store beneath the class store; class methods dominate.
    fn inject(&mut self, interfaces: Store) {
        for (key, incoming) in interfaces.entries {
            match self.entries.get_mut(&key) {
                None => {
                    self.entries.insert(key, incoming);
                }
                Some(existing) => merge_types(existing, &incoming),
            }
        }
    }

    fn into_graph(self) -> MethodGraph {
        MethodGraph {
            nodes: self.entries,
        }
    }
}

fn merge_types(existing: &mut Node, incoming: &Node) {
    existing
        .method_types
        .extend(incoming.method_types.iter().cloned());
    for declaration in &incoming.declarations {
        if !existing.declarations.contains(declaration) {
            existing.declarations.push(declaration.clone());
        }
    }
    existing.visibility = existing.visibility.expand_to(incoming.visibility);
}

/// `Some(true)` if `incoming` is declared by a subtype of `existing`'s owner,
/// `Some(false)` for the reverse, `None` if unrelated.
fn related(
    pool: &TypePool,
    existing: &MethodDescription,
    incoming: &MethodDescription,
) -> Option<bool> {
    let is_subtype = |sub: &str, sup: &str| {
        pool.describe(sub)
            .is_some_and(|ty| pool.is_subtype_of(ty, sup))
    };
    if existing.declaring_type == incoming.declaring_type {
        Some(false)
    } else if is_subtype(&incoming.declaring_type, &existing.declaring_type) {
        Some(true)
    } else if is_subtype(&existing.declaring_type, &incoming.declaring_type) {
        Some(false)
    } else {
        None
    }
}

/// Looks up a supertype reference and binds its type variables.
fn resolve_supertype<'p>(
    pool: &'p TypePool,
    reference: &TypeRef,
    bindings: &HashMap<EcoString, TypeRef>,
) -> Option<(&'p TypeDescription, HashMap<EcoString, TypeRef>)> {
    let super_type = pool.describe(reference.raw_name()?)?;
    let reference = reference.substitute(bindings);
    Some((super_type, super_type.bindings_for(&reference)))
}

fn analyze(
    ty: &TypeDescription,
    bindings: &HashMap<EcoString, TypeRef>,
    pool: &TypePool,
    visited: &mut HashSet<EcoString>,
) -> Store {
    if !visited.insert(ty.name.clone()) {
        return Store::default(); // Cycle detected
    }

    let mut store = match ty
        .superclass
        .as_ref()
        .and_then(|superclass| resolve_supertype(pool, superclass, bindings))
    {
        Some((super_type, super_bindings)) => analyze(super_type, &super_bindings, pool, visited),
        None => Store::default(),
    };

    let mut interfaces = Store::default();
    for interface in &ty.interfaces {
        if let Some((interface_type, interface_bindings)) =
            resolve_supertype(pool, interface, bindings)
        {
            let interface_store =
                analyze(interface_type, &interface_bindings, pool, &mut visited.clone());
            interfaces.combine(interface_store, pool);
        }
    }
    store.inject(interfaces);

    for method in ty.methods.iter().filter(|m| m.is_virtual()) {
        store.declare(method.in_generic_shape(bindings), method);
    }

    visited.remove(&ty.name);
    store
}
