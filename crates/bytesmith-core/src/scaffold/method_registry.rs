// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The method registry: ordered interception rules bound to methods.
//!
//! **DDD Context:** Method Registry — Aggregate Root
//!
//! A registry moves through three states:
//!
//! 1. [`MethodRegistry`] holds the rules. [`prepend`](MethodRegistry::prepend)
//!    and [`append`](MethodRegistry::append) return new registries; existing
//!    values are never modified.
//! 2. [`PreparedRegistry`] is the result of applying the rules to an
//!    instrumented type: every handler has prepared the type once, helper
//!    methods added by handlers are captured, and each relevant method of
//!    the method graph is bound to the first rule that matches it.
//! 3. [`CompiledRegistry`] binds every handler to an implementation target
//!    and answers [`MethodPool::target`] for the writer.
//!
//! Rules are matched in registration order and the first match wins. A
//! method bound once is never rebound by a later rule.

use std::collections::hash_map::Entry as CacheEntry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ecow::EcoString;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, instrument, trace};

use crate::bytecode::InvocationKind;
use crate::config::ClassFileVersion;
use crate::description::{
    AnnotationValue, MethodDescription, Modifiers, OBJECT, TypeDescription, TypePool, TypeToken,
    Visibility,
};
use crate::error::{BuildError, Result};
use crate::implementation::attribute::{MethodAttributeAppender, MethodAttributeAppenderFactory};
use crate::implementation::transformer::MethodTransformer;
use crate::implementation::{ByteCodeAppender, Implementation, ImplementationTarget, TargetFactory};
use crate::matcher::{LatentMatcher, MethodMatcher};
use crate::writer::method_pool::{MethodPool, MethodRecord};

use super::instrumented::{InstrumentedType, TypeValidation};
use super::method_graph::{LinkedGraph, MethodGraphCompiler, Node};
use super::type_initializer::{LoadedTypeInitializer, TypeInitializer};

/// What answers a matched method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Declares the method without code.
    ForAbstractMethod,
    /// Redeclares an inherited method on the instrumented type.
    ///
    /// Only the registry creates this handler; it cannot prepare a type.
    ForVisibilityBridge,
    /// Implements the method with generated code.
    ForImplementation(Implementation),
    /// Declares an annotation element with a default value.
    ForAnnotationValue(AnnotationValue),
}

impl Handler {
    /// Lets the handler extend the instrumented type.
    pub fn prepare(&self, instrumented_type: InstrumentedType) -> Result<InstrumentedType> {
        match self {
            Handler::ForAbstractMethod | Handler::ForAnnotationValue(_) => Ok(instrumented_type),
            Handler::ForImplementation(implementation) => implementation.prepare(instrumented_type),
            Handler::ForVisibilityBridge => Err(BuildError::illegal_state(
                "a visibility bridge handler cannot prepare an instrumented type",
            )),
        }
    }

    /// Binds the handler to `target`.
    #[must_use]
    pub fn compile(&self, target: &Arc<ImplementationTarget>) -> CompiledHandler {
        match self {
            Handler::ForAbstractMethod => CompiledHandler::ForAbstractMethod,
            Handler::ForVisibilityBridge => CompiledHandler::ForVisibilityBridge {
                instrumented_type: target.instrumented_type().name.clone(),
                super_type: target
                    .superclass_name()
                    .cloned()
                    .unwrap_or_else(|| OBJECT.into()),
            },
            Handler::ForImplementation(implementation) => {
                CompiledHandler::ForImplementation(implementation.appender(target))
            }
            Handler::ForAnnotationValue(value) => {
                CompiledHandler::ForAnnotationValue(value.clone())
            }
        }
    }
}

/// A handler bound to an implementation target.
#[derive(Debug, Clone)]
pub enum CompiledHandler {
    ForAbstractMethod,
    ForVisibilityBridge {
        instrumented_type: EcoString,
        super_type: EcoString,
    },
    ForImplementation(ByteCodeAppender),
    ForAnnotationValue(AnnotationValue),
}

impl CompiledHandler {
    /// Produces the record written for `method`.
    #[must_use]
    pub fn assemble(
        &self,
        method: &MethodDescription,
        attributes: MethodAttributeAppender,
        visibility: Visibility,
    ) -> MethodRecord {
        match self {
            CompiledHandler::ForAbstractMethod => MethodRecord::WithoutBody {
                method: method.clone(),
                attributes,
                visibility,
            },
            CompiledHandler::ForImplementation(appender) => MethodRecord::WithBody {
                method: method.clone(),
                appender: appender.clone(),
                attributes,
                visibility,
            },
            CompiledHandler::ForAnnotationValue(value) => MethodRecord::AnnotationDefault {
                method: method.clone(),
                value: value.clone(),
                attributes,
            },
            CompiledHandler::ForVisibilityBridge {
                instrumented_type,
                super_type,
            } => {
                let mut bridge = method.clone();
                bridge.declaring_type = instrumented_type.clone();
                bridge.modifiers = (method.modifiers | Modifiers::SYNTHETIC | Modifiers::BRIDGE)
                    - Modifiers::NATIVE;
                MethodRecord::VisibilityBridge {
                    bridge,
                    target: method.clone(),
                    super_type: super_type.clone(),
                    attributes,
                }
            }
        }
    }
}

/// One interception rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub matcher: LatentMatcher,
    pub handler: Handler,
    pub attributes: MethodAttributeAppenderFactory,
    pub transformer: MethodTransformer,
}

impl Entry {
    /// A rule without attributes or transformation.
    #[must_use]
    pub fn new(matcher: impl Into<LatentMatcher>, handler: Handler) -> Self {
        Self {
            matcher: matcher.into(),
            handler,
            attributes: MethodAttributeAppenderFactory::NoOp,
            transformer: MethodTransformer::NoOp,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: MethodAttributeAppenderFactory) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_transformer(mut self, transformer: MethodTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    fn bind(
        &self,
        instrumented_type: &TypeDescription,
        method: &MethodDescription,
        bridge_types: IndexSet<TypeToken>,
        visibility: Visibility,
    ) -> PreparedEntry {
        PreparedEntry {
            handler: self.handler.clone(),
            attributes: self.attributes.clone(),
            method: self.transformer.transform(instrumented_type, method),
            bridge_types,
            visibility,
            bridge: false,
        }
    }
}

/// The ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    entries: Vec<Arc<Entry>>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry in which `entry` takes precedence over every existing rule.
    #[must_use]
    pub fn prepend(&self, entry: Entry) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.push(Arc::new(entry));
        entries.extend(self.entries.iter().cloned());
        Self { entries }
    }

    /// A registry in which every existing rule takes precedence over `entry`.
    #[must_use]
    pub fn append(&self, entry: Entry) -> Self {
        let mut entries = self.entries.clone();
        entries.push(Arc::new(entry));
        Self { entries }
    }

    /// Rules in matching order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies the rules to `instrumented_type`.
    ///
    /// `instrumentable` selects the methods rules may claim; methods it
    /// rejects are still listed but left unbound.
    #[instrument(skip_all, fields(ty = %instrumented_type.name(), entries = self.entries.len()))]
    pub fn prepare(
        &self,
        instrumented_type: InstrumentedType,
        compiler: MethodGraphCompiler,
        validation: TypeValidation,
        pool: Arc<TypePool>,
        instrumentable: &LatentMatcher,
    ) -> Result<PreparedRegistry> {
        let mut implementations: IndexMap<MethodDescription, PreparedEntry> = IndexMap::new();
        let mut prepared_handlers: HashSet<Handler> = HashSet::new();
        let mut helper_methods: HashSet<MethodDescription> =
            instrumented_type.declared_methods().iter().cloned().collect();
        let mut instrumented_type = instrumented_type;
        for entry in &self.entries {
            if !prepared_handlers.insert(entry.handler.clone()) {
                continue;
            }
            instrumented_type = entry.handler.prepare(instrumented_type)?;
            for method in instrumented_type.declared_methods() {
                if helper_methods.insert(method.clone()) {
                    debug!(method = %method, "captured helper method");
                    implementations.insert(
                        method.clone(),
                        PreparedEntry {
                            handler: entry.handler.clone(),
                            attributes: MethodAttributeAppenderFactory::of_method(method),
                            method: method.clone(),
                            bridge_types: IndexSet::new(),
                            visibility: method.visibility(),
                            bridge: false,
                        },
                    );
                }
            }
        }

        let description = instrumented_type.description().clone();
        let graph = compiler.compile(&description, &pool);
        let instrumentable = instrumentable.resolve(&description);
        let matchers: Vec<(&Entry, MethodMatcher)> = self
            .entries
            .iter()
            .map(|entry| (entry.as_ref(), entry.matcher.resolve(&description)))
            .collect();
        let is_relevant = |method: &MethodDescription,
                           implementations: &IndexMap<MethodDescription, PreparedEntry>| {
            !implementations.contains_key(method)
                && pool.is_type_visible_to(&method.return_type, &description)
                && method
                    .parameters
                    .iter()
                    .all(|parameter| pool.is_type_visible_to(&parameter.type_ref, &description))
                && instrumentable.matches(method, &pool)
        };
        let first_match = |method: &MethodDescription| {
            matchers
                .iter()
                .find(|(_, matcher)| matcher.matches(method, &pool))
                .map(|(entry, _)| *entry)
        };

        let mut methods = Vec::new();
        let bridges_allowed = description.is_public() && !description.is_interface();
        for node in graph.nodes() {
            let method = &node.representative;
            let mut visibility_bridge = bridges_allowed;
            if is_relevant(method, &implementations) {
                if let Some(entry) = first_match(method) {
                    trace!(method = %method, "bound to rule");
                    implementations.insert(
                        method.clone(),
                        entry.bind(
                            &description,
                            method,
                            node.method_types.clone(),
                            node.visibility,
                        ),
                    );
                    visibility_bridge = false;
                } else {
                    trace!(method = %method, "no rule matched");
                }
            }
            if visibility_bridge && requires_visibility_bridge(node, &description, &pool) {
                implementations.entry(method.clone()).or_insert_with(|| {
                    debug!(method = %method, "synthesised visibility bridge");
                    PreparedEntry {
                        handler: Handler::ForVisibilityBridge,
                        attributes: MethodAttributeAppenderFactory::of_method(method),
                        method: method.clone(),
                        bridge_types: IndexSet::new(),
                        visibility: node.visibility,
                        bridge: true,
                    }
                });
            }
            methods.push(method.clone());
        }

        let non_virtual = description
            .declared_methods()
            .iter()
            .filter(|method| {
                !method.is_virtual()
                    && !method.is_type_initializer()
                    && is_relevant(method, &implementations)
            })
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
            .chain([MethodDescription::type_initializer(description.name.clone())]);
        for method in non_virtual {
            if let Some(entry) = first_match(&method) {
                trace!(method = %method, "bound to rule");
                implementations.insert(
                    method.clone(),
                    entry.bind(&description, &method, IndexSet::new(), method.visibility()),
                );
            }
            methods.push(method);
        }

        if validation.is_enabled() {
            instrumented_type.validated(&pool)?;
        }
        debug!(
            methods = methods.len(),
            implemented = implementations.len(),
            "registry prepared"
        );
        Ok(PreparedRegistry {
            instrumented_type,
            graph,
            implementations,
            methods,
            pool,
        })
    }
}

/// True for a public, concrete, overridable method inherited from a
/// package-private type that no existing bridge exposes.
fn requires_visibility_bridge(
    node: &Node,
    instrumented_type: &TypeDescription,
    pool: &TypePool,
) -> bool {
    let method = &node.representative;
    if node.sort.is_made_visible()
        || !method.is_public()
        || method.is_abstract()
        || method.is_final()
        || method.declaring_type == instrumented_type.name
    {
        return false;
    }
    pool.describe(&method.declaring_type)
        .is_some_and(TypeDescription::is_package_private)
}

/// A method bound to a rule during preparation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEntry {
    pub handler: Handler,
    pub attributes: MethodAttributeAppenderFactory,
    /// The method after the rule's transformer ran.
    pub method: MethodDescription,
    /// Every erased signature of the method's family.
    pub bridge_types: IndexSet<TypeToken>,
    pub visibility: Visibility,
    /// True for synthesised visibility bridges.
    pub bridge: bool,
}

impl PreparedEntry {
    /// Signatures that need an access bridge: all family signatures except the method's own.
    #[must_use]
    pub fn resolve_bridge_types(&self) -> IndexSet<TypeToken> {
        let own = self.method.as_type_token();
        self.bridge_types
            .iter()
            .filter(|token| **token != own)
            .cloned()
            .collect()
    }
}

/// A registry applied to its instrumented type.
#[derive(Debug, Clone)]
pub struct PreparedRegistry {
    instrumented_type: InstrumentedType,
    graph: LinkedGraph,
    implementations: IndexMap<MethodDescription, PreparedEntry>,
    methods: Vec<MethodDescription>,
    pool: Arc<TypePool>,
}

impl PreparedRegistry {
    /// The instrumented type after every handler prepared it.
    #[must_use]
    pub fn instrumented_type(&self) -> &InstrumentedType {
        &self.instrumented_type
    }

    #[must_use]
    pub fn method_graph(&self) -> &LinkedGraph {
        &self.graph
    }

    /// Every method considered: graph representatives, then non-virtual
    /// declarations, then the type initializer.
    #[must_use]
    pub fn methods(&self) -> &[MethodDescription] {
        &self.methods
    }

    /// Bound methods in binding order, without the type initializer.
    #[must_use]
    pub fn instrumented_methods(&self) -> Vec<MethodDescription> {
        instrumented_methods(self.implementations.keys())
    }

    #[must_use]
    pub fn entry(&self, method: &MethodDescription) -> Option<&PreparedEntry> {
        self.implementations.get(method)
    }

    #[must_use]
    pub fn type_initializer(&self) -> &TypeInitializer {
        self.instrumented_type.type_initializer()
    }

    #[must_use]
    pub fn loaded_type_initializer(&self) -> &LoadedTypeInitializer {
        self.instrumented_type.loaded_type_initializer()
    }

    /// Binds every handler to a target built by `factory`.
    ///
    /// Each distinct handler and attribute factory is compiled once.
    #[instrument(
        skip_all,
        fields(ty = %self.instrumented_type.name(), version = %class_file_version)
    )]
    pub fn compile(
        &self,
        factory: &TargetFactory,
        class_file_version: ClassFileVersion,
    ) -> CompiledRegistry {
        let description = self.instrumented_type.description();
        let target = Arc::new(factory.make(
            description.clone(),
            &self.graph,
            Arc::clone(&self.pool),
            class_file_version,
        ));
        let mut handlers: HashMap<&Handler, Arc<CompiledHandler>> = HashMap::new();
        let mut appenders: HashMap<&MethodAttributeAppenderFactory, MethodAttributeAppender> =
            HashMap::new();
        let mut implementations = IndexMap::with_capacity(self.implementations.len());
        for (method, entry) in &self.implementations {
            let handler = match handlers.entry(&entry.handler) {
                CacheEntry::Occupied(cached) => {
                    trace!(method = %method, "compiled handler reused");
                    Arc::clone(cached.get())
                }
                CacheEntry::Vacant(slot) => {
                    Arc::clone(slot.insert(Arc::new(entry.handler.compile(&target))))
                }
            };
            let attributes = appenders
                .entry(&entry.attributes)
                .or_insert_with(|| entry.attributes.make(description))
                .clone();
            implementations.insert(
                method.clone(),
                CompiledEntry {
                    handler,
                    attributes,
                    method: entry.method.clone(),
                    bridge_types: entry.resolve_bridge_types(),
                    visibility: entry.visibility,
                    bridge: entry.bridge,
                },
            );
        }
        debug!(
            handlers = handlers.len(),
            appenders = appenders.len(),
            "registry compiled"
        );
        CompiledRegistry {
            instrumented_type: self.instrumented_type.clone(),
            implementations,
            methods: self.methods.clone(),
            supports_bridges: class_file_version.supports_bridges(),
            target,
        }
    }
}

fn instrumented_methods<'a>(
    methods: impl Iterator<Item = &'a MethodDescription>,
) -> Vec<MethodDescription> {
    methods
        .filter(|method| !method.is_type_initializer())
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
struct CompiledEntry {
    handler: Arc<CompiledHandler>,
    attributes: MethodAttributeAppender,
    method: MethodDescription,
    bridge_types: IndexSet<TypeToken>,
    visibility: Visibility,
    bridge: bool,
}

impl CompiledEntry {
    fn bind(&self, instrumented_type: &TypeDescription, supports_bridges: bool) -> MethodRecord {
        if self.bridge && !supports_bridges {
            return MethodRecord::NonImplemented(self.method.clone());
        }
        let record = self
            .handler
            .assemble(&self.method, self.attributes.clone(), self.visibility);
        if !supports_bridges {
            return record;
        }
        let bridge_types: IndexSet<TypeToken> = self
            .bridge_types
            .iter()
            .filter(|token| self.method.is_bridge_compatible(token))
            .cloned()
            .collect();
        if bridge_types.is_empty()
            || (instrumented_type.is_interface() && !record.sort().is_implemented())
        {
            return record;
        }
        MethodRecord::AccessBridgeWrapper {
            delegate: Box::new(record),
            instrumented_type: instrumented_type.name.clone(),
            invocation: if instrumented_type.is_interface() {
                InvocationKind::Interface
            } else {
                InvocationKind::Virtual
            },
            bridge_target: self.method.clone(),
            bridge_types,
            attributes: self.attributes.clone(),
        }
    }
}

/// A prepared registry bound to an implementation target.
#[derive(Debug, Clone)]
pub struct CompiledRegistry {
    instrumented_type: InstrumentedType,
    implementations: IndexMap<MethodDescription, CompiledEntry>,
    methods: Vec<MethodDescription>,
    supports_bridges: bool,
    target: Arc<ImplementationTarget>,
}

impl CompiledRegistry {
    #[must_use]
    pub fn instrumented_type(&self) -> &InstrumentedType {
        &self.instrumented_type
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDescription] {
        &self.methods
    }

    /// Bound methods in binding order, without the type initializer.
    #[must_use]
    pub fn instrumented_methods(&self) -> Vec<MethodDescription> {
        instrumented_methods(self.implementations.keys())
    }

    #[must_use]
    pub fn type_initializer(&self) -> &TypeInitializer {
        self.instrumented_type.type_initializer()
    }

    #[must_use]
    pub fn loaded_type_initializer(&self) -> &LoadedTypeInitializer {
        self.instrumented_type.loaded_type_initializer()
    }

    #[must_use]
    pub fn implementation_target(&self) -> &Arc<ImplementationTarget> {
        &self.target
    }

    #[must_use]
    pub fn supports_bridges(&self) -> bool {
        self.supports_bridges
    }

    /// The compiled handler bound to `method`, shared between methods of the same handler.
    #[must_use]
    pub fn handler(&self, method: &MethodDescription) -> Option<&Arc<CompiledHandler>> {
        self.implementations.get(method).map(|entry| &entry.handler)
    }
}

impl MethodPool for CompiledRegistry {
    fn target(&self, method: &MethodDescription) -> MethodRecord {
        match self.implementations.get(method) {
            Some(entry) => entry.bind(self.instrumented_type.description(), self.supports_bridges),
            None => MethodRecord::NonImplemented(method.clone()),
        }
    }
}

impl std::fmt::Display for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::ForAbstractMethod => f.write_str("abstract"),
            Handler::ForVisibilityBridge => f.write_str("visibility bridge"),
            Handler::ForImplementation(implementation) => write!(f, "{implementation:?}"),
            Handler::ForAnnotationValue(value) => write!(f, "default {value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Instruction;
    use crate::description::{MethodToken, Primitive, STRING, TypeRef, TypeVariableToken};
    use crate::implementation::Constant;
    use crate::writer::method_pool::RecordSort;

    fn int() -> TypeRef {
        TypeRef::Primitive(Primitive::Int)
    }

    fn base() -> TypeDescription {
        let mut base = TypeDescription::class("a.Base", Modifiers::PUBLIC, TypeRef::object());
        base.methods.push(MethodDescription::new("a.Base", "size", Modifiers::PUBLIC, int()));
        base.methods.push(MethodDescription::new(
            "a.Base",
            "name",
            Modifiers::PUBLIC,
            TypeRef::class(STRING),
        ));
        base.methods.push(MethodDescription::constructor("a.Base", Modifiers::PUBLIC, vec![]));
        base
    }

    fn pool_with(types: Vec<TypeDescription>) -> Arc<TypePool> {
        Arc::new(types.into_iter().fold(TypePool::with_builtins(), TypePool::with_type))
    }

    fn sub() -> InstrumentedType {
        InstrumentedType::subclass("a.Sub", Modifiers::PUBLIC, TypeRef::class("a.Base"))
    }

    fn inherited(name: &str) -> MethodDescription {
        base().methods.into_iter().find(|m| m.name == name).unwrap()
    }

    fn instrumentable() -> LatentMatcher {
        LatentMatcher::Instrumentable {
            ignored: Box::new(LatentMatcher::none()),
        }
    }

    fn fixed(value: i32) -> Handler {
        Handler::ForImplementation(Implementation::FixedValue(Constant::Int(value)))
    }

    fn package_private_base() -> TypeDescription {
        let mut base = TypeDescription::class("a.PkgBase", Modifiers::empty(), TypeRef::object());
        base.methods.push(MethodDescription::new(
            "a.PkgBase",
            "run",
            Modifiers::PUBLIC,
            TypeRef::Void,
        ));
        base.methods.push(MethodDescription::constructor("a.PkgBase", Modifiers::PUBLIC, vec![]));
        base
    }

    fn public_sub(superclass: TypeRef) -> InstrumentedType {
        InstrumentedType::subclass("a.PublicSub", Modifiers::PUBLIC, superclass)
    }

    /// Names of the methods bound to a synthesised visibility bridge.
    fn visibility_bridges(prepared: &PreparedRegistry) -> Vec<String> {
        prepared
            .instrumented_methods()
            .iter()
            .filter(|m| {
                prepared
                    .entry(m)
                    .is_some_and(|entry| entry.handler == Handler::ForVisibilityBridge)
            })
            .map(|m| m.name.to_string())
            .collect()
    }

    fn prepare(
        registry: &MethodRegistry,
        ty: InstrumentedType,
        pool: Arc<TypePool>,
    ) -> PreparedRegistry {
        registry
            .prepare(
                ty,
                MethodGraphCompiler::Default,
                TypeValidation::Enabled,
                pool,
                &instrumentable(),
            )
            .unwrap()
    }

    #[test]
    fn registries_are_persistent() {
        let empty = MethodRegistry::new();
        let one = empty.append(Entry::new(MethodMatcher::named("size"), fixed(1)));
        let two = one.prepend(Entry::new(MethodMatcher::Any, Handler::ForAbstractMethod));
        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(two.len(), 2);
        assert_eq!(two.entries().next().unwrap().handler, Handler::ForAbstractMethod);
    }

    #[test]
    fn first_registered_rule_wins() {
        let registry = MethodRegistry::new()
            .append(Entry::new(MethodMatcher::named("size"), fixed(1)))
            .append(Entry::new(MethodMatcher::named("size"), fixed(2)))
            .prepend(Entry::new(MethodMatcher::named("size"), fixed(3)));
        let prepared = prepare(&registry, sub(), pool_with(vec![base()]));
        assert_eq!(prepared.entry(&inherited("size")).unwrap().handler, fixed(3));
    }

    #[test]
    fn unmatched_methods_are_not_implemented() {
        let registry =
            MethodRegistry::new().append(Entry::new(MethodMatcher::named("size"), fixed(1)));
        let compiled = prepare(&registry, sub(), pool_with(vec![base()]))
            .compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V8);
        let record = compiled.target(&inherited("name"));
        assert_eq!(record.sort(), RecordSort::Skipped);
        let unknown = MethodDescription::new("x.Y", "z", Modifiers::PUBLIC, TypeRef::Void);
        assert!(matches!(compiled.target(&unknown), MethodRecord::NonImplemented(_)));
        assert!(compiled.target(&inherited("size")).sort().is_implemented());
    }

    #[test]
    fn methods_list_graph_then_non_virtual_then_initializer() {
        let registry = MethodRegistry::new();
        let ty = sub().with_method(&MethodToken::constructor(Modifiers::PUBLIC, vec![]));
        let prepared = prepare(&registry, ty, pool_with(vec![base()]));
        let methods = prepared.methods();
        let last = methods.last().unwrap();
        assert!(last.is_type_initializer());
        assert!(methods[methods.len() - 2].is_constructor());
        assert!(methods.iter().any(|m| m.name == "toString"));
        assert!(prepared.instrumented_methods().is_empty());
    }

    #[test]
    fn type_initializer_is_bound_without_relevance_check() {
        let registry = MethodRegistry::new().append(Entry::new(
            MethodMatcher::IsTypeInitializer,
            Handler::ForImplementation(Implementation::StubValue),
        ));
        let prepared = prepare(&registry, sub(), pool_with(vec![base()]));
        let clinit = MethodDescription::type_initializer("a.Sub");
        assert!(prepared.entry(&clinit).is_some());
        assert!(prepared.instrumented_methods().iter().all(|m| !m.is_type_initializer()));
    }

    #[test]
    fn helper_methods_are_bound_to_their_handler() {
        let helper = Handler::ForImplementation(Implementation::InvokeHelper {
            name: "compute".into(),
            return_type: int(),
            value: Constant::Int(9),
        });
        let registry = MethodRegistry::new()
            .append(Entry::new(MethodMatcher::Any, Handler::ForAbstractMethod))
            .append(Entry::new(MethodMatcher::named("size"), helper.clone()));
        let prepared = prepare(&registry, sub(), pool_with(vec![base()]));
        let compute = prepared
            .instrumented_type()
            .declared_methods()
            .iter()
            .find(|m| m.name == "compute")
            .cloned()
            .unwrap();
        let entry = prepared.entry(&compute).unwrap();
        assert_eq!(entry.handler, helper);
        assert!(entry.bridge_types.is_empty());
        assert!(!entry.bridge);
        assert_eq!(entry.visibility, Visibility::Private);
    }

    #[test]
    fn shared_handlers_prepare_once() {
        let helper = Handler::ForImplementation(Implementation::InvokeHelper {
            name: "compute".into(),
            return_type: int(),
            value: Constant::Int(9),
        });
        let registry = MethodRegistry::new()
            .append(Entry::new(MethodMatcher::named("size"), helper.clone()))
            .append(Entry::new(MethodMatcher::named("hashCode"), helper));
        let prepared = prepare(&registry, sub(), pool_with(vec![base()]));
        let helpers = prepared
            .instrumented_type()
            .declared_methods()
            .iter()
            .filter(|m| m.name == "compute")
            .count();
        assert_eq!(helpers, 1);
    }

    #[test]
    fn visibility_bridge_for_package_private_base() {
        let ty = public_sub(TypeRef::class("a.PkgBase"));
        let prepared = prepare(&MethodRegistry::new(), ty, pool_with(vec![package_private_base()]));
        let run = MethodDescription::new("a.PkgBase", "run", Modifiers::PUBLIC, TypeRef::Void);
        let entry = prepared.entry(&run).unwrap();
        assert_eq!(entry.handler, Handler::ForVisibilityBridge);
        assert!(entry.bridge);

        let compiled = prepared.compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V8);
        let MethodRecord::VisibilityBridge {
            bridge, super_type, ..
        } = compiled.target(&run)
        else {
            panic!("expected a visibility bridge");
        };
        assert_eq!(bridge.declaring_type, "a.PublicSub");
        assert!(bridge.is_bridge() && bridge.is_synthetic());
        assert_eq!(super_type, "a.PkgBase");

        let legacy = prepared.compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V4);
        assert!(matches!(legacy.target(&run), MethodRecord::NonImplemented(_)));
    }

    #[test]
    fn visibility_bridge_ignores_generic_family_signatures() {
        let mut hidden = TypeDescription::class("a.PkgBase", Modifiers::empty(), TypeRef::object());
        hidden.type_variables.push(TypeVariableToken::new("T"));
        hidden.methods.push(
            MethodDescription::new("a.PkgBase", "run", Modifiers::PUBLIC, TypeRef::Void)
                .with_parameters(vec![TypeRef::variable("T")]),
        );
        hidden
            .methods
            .push(MethodDescription::constructor("a.PkgBase", Modifiers::PUBLIC, vec![]));
        let ty = public_sub(TypeRef::Parameterized {
            raw: "a.PkgBase".into(),
            arguments: vec![TypeRef::class(STRING)],
        });
        let prepared = prepare(&MethodRegistry::new(), ty, pool_with(vec![hidden]));
        let run = prepared
            .instrumented_methods()
            .into_iter()
            .find(|m| m.name == "run")
            .unwrap();
        let entry = prepared.entry(&run).unwrap();
        assert_eq!(entry.handler, Handler::ForVisibilityBridge);
        assert!(entry.bridge_types.is_empty());

        let compiled = prepared.compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V8);
        let record = compiled.target(&run);
        assert!(matches!(record, MethodRecord::VisibilityBridge { .. }));
        let bodies = record.apply().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].name, "run");
    }

    #[test]
    fn package_private_type_gets_no_visibility_bridges() {
        let ty =
            InstrumentedType::subclass("a.PkgSub", Modifiers::empty(), TypeRef::class("a.PkgBase"));
        let prepared = prepare(&MethodRegistry::new(), ty, pool_with(vec![package_private_base()]));
        assert!(visibility_bridges(&prepared).is_empty());
    }

    #[test]
    fn interface_gets_no_visibility_bridges() {
        let mut hidden = TypeDescription::interface("a.Hidden", Modifiers::empty());
        hidden.methods.push(MethodDescription::new(
            "a.Hidden",
            "run",
            Modifiers::PUBLIC,
            TypeRef::Void,
        ));
        let ty = InstrumentedType::new(TypeDescription::interface("a.Api", Modifiers::PUBLIC))
            .with_interfaces([TypeRef::class("a.Hidden")]);
        let prepared = prepare(&MethodRegistry::new(), ty, pool_with(vec![hidden]));
        assert!(visibility_bridges(&prepared).is_empty());
    }

    #[test]
    fn final_and_abstract_methods_get_no_visibility_bridges() {
        let mut hidden =
            TypeDescription::class("a.PkgBase", Modifiers::ABSTRACT, TypeRef::object());
        hidden.methods.push(MethodDescription::new(
            "a.PkgBase",
            "run",
            Modifiers::PUBLIC,
            TypeRef::Void,
        ));
        hidden.methods.push(MethodDescription::new(
            "a.PkgBase",
            "stop",
            Modifiers::PUBLIC | Modifiers::FINAL,
            TypeRef::Void,
        ));
        hidden.methods.push(MethodDescription::new(
            "a.PkgBase",
            "plan",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            TypeRef::Void,
        ));
        hidden
            .methods
            .push(MethodDescription::constructor("a.PkgBase", Modifiers::PUBLIC, vec![]));
        let ty = InstrumentedType::subclass(
            "a.PublicSub",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            TypeRef::class("a.PkgBase"),
        );
        let prepared = prepare(&MethodRegistry::new(), ty, pool_with(vec![hidden]));
        assert_eq!(visibility_bridges(&prepared), vec!["run".to_string()]);
    }

    #[test]
    fn matched_method_suppresses_visibility_bridge() {
        let ty = public_sub(TypeRef::class("a.PkgBase"));
        let registry = MethodRegistry::new().append(Entry::new(
            MethodMatcher::named("run"),
            Handler::ForImplementation(Implementation::StubValue),
        ));
        let prepared = prepare(&registry, ty, pool_with(vec![package_private_base()]));
        let run = MethodDescription::new("a.PkgBase", "run", Modifiers::PUBLIC, TypeRef::Void);
        assert!(!prepared.entry(&run).unwrap().bridge);
    }

    #[test]
    fn visibility_bridge_handler_cannot_prepare() {
        let registry = MethodRegistry::new()
            .append(Entry::new(MethodMatcher::Any, Handler::ForVisibilityBridge));
        let err = registry
            .prepare(
                sub(),
                MethodGraphCompiler::Default,
                TypeValidation::Enabled,
                pool_with(vec![base()]),
                &instrumentable(),
            )
            .unwrap_err();
        assert!(matches!(err, BuildError::IllegalState(_)));
    }

    #[test]
    fn validation_failure_aborts_preparation() {
        let ty = InstrumentedType::subclass(
            "a.Sub",
            Modifiers::PUBLIC | Modifiers::ABSTRACT | Modifiers::FINAL,
            TypeRef::class("a.Base"),
        );
        let result = MethodRegistry::new().prepare(
            ty.clone(),
            MethodGraphCompiler::Default,
            TypeValidation::Enabled,
            pool_with(vec![base()]),
            &instrumentable(),
        );
        assert!(matches!(result, Err(BuildError::Validation(_))));
        let unchecked = MethodRegistry::new().prepare(
            ty,
            MethodGraphCompiler::Default,
            TypeValidation::Disabled,
            pool_with(vec![base()]),
            &instrumentable(),
        );
        assert!(unchecked.is_ok());
    }

    #[test]
    fn compiled_handlers_are_shared() {
        let shared = fixed(5);
        let registry = MethodRegistry::new()
            .append(Entry::new(MethodMatcher::named("size"), shared.clone()))
            .append(Entry::new(MethodMatcher::named("hashCode"), shared));
        let compiled = prepare(&registry, sub(), pool_with(vec![base()]))
            .compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V8);
        let hash_code = compiled
            .methods()
            .iter()
            .find(|m| m.name == "hashCode")
            .cloned()
            .unwrap();
        let first = compiled.handler(&inherited("size")).unwrap();
        let second = compiled.handler(&hash_code).unwrap();
        assert!(Arc::ptr_eq(first, second));
    }

    #[test]
    fn transformer_shapes_the_recorded_method() {
        let registry = MethodRegistry::new().append(
            Entry::new(MethodMatcher::named("size"), fixed(1)).with_transformer(
                MethodTransformer::ForModifiers {
                    set: Modifiers::FINAL,
                    clear: Modifiers::empty(),
                },
            ),
        );
        let prepared = prepare(&registry, sub(), pool_with(vec![base()]));
        assert!(prepared.entry(&inherited("size")).unwrap().method.is_final());
    }

    #[test]
    fn generic_override_gets_access_bridge() {
        let mut generic = TypeDescription::class("a.Holder", Modifiers::PUBLIC, TypeRef::object());
        generic.type_variables.push(TypeVariableToken::new("T"));
        generic.methods.push(
            MethodDescription::new("a.Holder", "accept", Modifiers::PUBLIC, TypeRef::Void)
                .with_parameters(vec![TypeRef::variable("T")]),
        );
        generic.methods.push(MethodDescription::constructor("a.Holder", Modifiers::PUBLIC, vec![]));
        let ty = InstrumentedType::subclass(
            "a.StringHolder",
            Modifiers::PUBLIC,
            TypeRef::Parameterized {
                raw: "a.Holder".into(),
                arguments: vec![TypeRef::class(STRING)],
            },
        )
        .with_method(&MethodToken::new(
            "accept",
            Modifiers::PUBLIC,
            TypeRef::Void,
            vec![TypeRef::class(STRING)],
        ));
        let registry = MethodRegistry::new().append(Entry::new(
            MethodMatcher::named("accept"),
            Handler::ForImplementation(Implementation::StubValue),
        ));
        let prepared = prepare(&registry, ty, pool_with(vec![generic]));
        let compiled = prepared.compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V8);
        let accept =
            MethodDescription::new("a.StringHolder", "accept", Modifiers::PUBLIC, TypeRef::Void)
                .with_parameters(vec![TypeRef::class(STRING)]);
        let record = compiled.target(&accept);
        let MethodRecord::AccessBridgeWrapper { bridge_types, .. } = &record else {
            panic!("expected an access bridge wrapper");
        };
        assert_eq!(bridge_types.len(), 1);
        let bodies = record.apply().unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[1].descriptor(), "(Ljava/lang/Object;)V");
        let code = bodies[1].code.as_ref().unwrap();
        assert!(code.instructions.contains(&Instruction::CheckCast("java/lang/String".into())));

        let legacy = prepared.compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V4);
        assert!(!matches!(legacy.target(&accept), MethodRecord::AccessBridgeWrapper { .. }));
    }
}
