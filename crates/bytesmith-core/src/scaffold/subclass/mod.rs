// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Subclass creation.
//!
//! **DDD Context:** Subclass Builder
//!
//! [`SubclassBuilder`] collects the shape of a new type (declared fields and
//! methods, interfaces, interception rules, field rules, initializers) and
//! runs the pipeline in [`make`](SubclassBuilder::make):
//!
//! 1. the constructor strategy extracts constructors and injects their rule
//! 2. the method registry prepares against the instrumented type
//! 3. the registry compiles against a super-class implementation target
//! 4. the field registry prepares and compiles
//! 5. the type writer consumes both pools
//!
//! Later rules take precedence over earlier ones; constructor rules are
//! appended and so lose to any explicit rule.

mod constructor_strategy;

use std::sync::Arc;

use ecow::{EcoString, eco_format};
use tracing::{debug, instrument};

use crate::config::BuildConfig;
use crate::description::{AnnotationValue, FieldToken, MethodToken, Modifiers, TypePool, TypeRef};
use crate::error::{BuildError, Result};
use crate::implementation::{ByteCodeAppender, Implementation, TargetFactory};
use crate::matcher::{LatentMatcher, MethodMatcher};
use crate::writer::{DynamicType, TypeResolutionStrategy, TypeWriter};

use super::field_registry::{FieldEntry, FieldRegistry};
use super::instrumented::InstrumentedType;
use super::method_registry::{Entry, Handler, MethodRegistry};
use super::type_initializer::{DefaultDrain, LoadedTypeInitializer};

pub use constructor_strategy::ConstructorStrategy;

/// Builds a new type extending an existing class.
#[derive(Debug, Clone)]
pub struct SubclassBuilder {
    instrumented_type: InstrumentedType,
    pool: Arc<TypePool>,
    config: BuildConfig,
    method_registry: MethodRegistry,
    field_registry: FieldRegistry,
    ignored: LatentMatcher,
    auxiliary_types: Vec<DynamicType>,
}

impl SubclassBuilder {
    /// A public class `name` extending `superclass`, resolved through `pool`.
    ///
    /// Synthetic methods and the default finalizer are ignored unless
    /// declared by the new type.
    #[must_use]
    pub fn new(name: impl Into<EcoString>, superclass: TypeRef, pool: Arc<TypePool>) -> Self {
        let default_finalizer =
            MethodMatcher::named("finalize").and(MethodMatcher::TakesArguments(0));
        Self {
            instrumented_type: InstrumentedType::subclass(name, Modifiers::PUBLIC, superclass),
            pool,
            config: BuildConfig::default(),
            method_registry: MethodRegistry::new(),
            field_registry: FieldRegistry::new(),
            ignored: MethodMatcher::IsSynthetic.or(default_finalizer).into(),
            auxiliary_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the modifiers of the new type.
    #[must_use]
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.instrumented_type = self.instrumented_type.with_modifiers(modifiers);
        self
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[must_use]
    pub fn instrumented_type(&self) -> &InstrumentedType {
        &self.instrumented_type
    }

    #[must_use]
    pub fn method_registry(&self) -> &MethodRegistry {
        &self.method_registry
    }

    /// Adds interfaces to the new type.
    #[must_use]
    pub fn implement(mut self, interfaces: impl IntoIterator<Item = TypeRef>) -> Self {
        self.instrumented_type = self.instrumented_type.with_interfaces(interfaces);
        self
    }

    /// Declares a field on the new type.
    #[must_use]
    pub fn define_field(mut self, token: FieldToken) -> Self {
        self.instrumented_type = self.instrumented_type.with_field(&token);
        self
    }

    /// Declares a method on the new type; the returned definition decides its body.
    #[must_use]
    pub fn define_method(self, token: MethodToken) -> MethodDefinition {
        MethodDefinition {
            builder: self,
            token,
        }
    }

    /// Implements every matching method with `implementation`.
    ///
    /// Constructors and the type initializer are never matched.
    #[must_use]
    pub fn intercept(self, matcher: MethodMatcher, implementation: Implementation) -> Self {
        self.intercept_with(Entry::new(
            MethodMatcher::IsMethod.and(matcher),
            Handler::ForImplementation(implementation),
        ))
    }

    /// Registers a rule as given, with precedence over every earlier rule.
    #[must_use]
    pub fn intercept_with(mut self, entry: Entry) -> Self {
        self.method_registry = self.method_registry.prepend(entry);
        self
    }

    /// Registers a field rule, with precedence over every earlier field rule.
    #[must_use]
    pub fn field_rule(mut self, entry: FieldEntry) -> Self {
        self.field_registry = self.field_registry.prepend(entry);
        self
    }

    /// Appends code to the static initializer.
    #[must_use]
    pub fn initializer(mut self, appender: ByteCodeAppender) -> Self {
        self.instrumented_type = self.instrumented_type.with_initializer(appender);
        self
    }

    /// Appends a load-time initializer.
    #[must_use]
    pub fn loaded_initializer(mut self, initializer: LoadedTypeInitializer) -> Self {
        self.instrumented_type = self.instrumented_type.with_loaded_initializer(initializer);
        self
    }

    /// Excludes inherited methods matching `matcher` from interception.
    #[must_use]
    pub fn ignore_also(mut self, matcher: impl Into<LatentMatcher>) -> Self {
        self.ignored = self.ignored.or(matcher.into());
        self
    }

    /// Writes `auxiliary` alongside the new type.
    #[must_use]
    pub fn with_auxiliary_type(mut self, auxiliary: DynamicType) -> Self {
        self.auxiliary_types.push(auxiliary);
        self
    }

    /// Runs the pipeline and writes the new type.
    #[instrument(skip_all, fields(ty = %self.instrumented_type.name()))]
    pub fn make(self, resolution: TypeResolutionStrategy) -> Result<DynamicType> {
        let Self {
            instrumented_type,
            pool,
            config,
            method_registry,
            field_registry,
            ignored,
            auxiliary_types,
        } = self;
        let strategy = config.constructor_strategy;
        let instrumented_type = if instrumented_type.description().is_interface() {
            instrumented_type
        } else {
            strategy
                .extract_constructors(instrumented_type.description(), &pool)?
                .iter()
                .fold(instrumented_type.clone(), |ty, token| ty.with_method(token))
        };
        let instrumentable = LatentMatcher::Instrumentable {
            ignored: Box::new(ignored),
        };
        let compiled = strategy
            .inject(&method_registry)
            .prepare(
                instrumented_type,
                config.method_graph,
                config.type_validation.into(),
                Arc::clone(&pool),
                &instrumentable,
            )?
            .compile(&TargetFactory::SuperClass, config.class_file_version);
        let fields = field_registry.prepare(compiled.instrumented_type())?.compile();
        let drain = DefaultDrain::new(compiled.instrumented_type().name().clone());
        let instrumented_methods = compiled.instrumented_methods();
        debug!(
            methods = instrumented_methods.len(),
            version = %config.class_file_version,
            "writing subclass"
        );
        TypeWriter::for_creation(
            compiled.instrumented_type(),
            config.class_file_version,
            &fields,
            &compiled,
            &instrumented_methods,
            &drain,
        )
        .with_auxiliary_types(auxiliary_types)
        .make(resolution)
    }
}

/// A declared method awaiting its body.
#[derive(Debug, Clone)]
#[must_use = "a method definition does nothing until it is given a body"]
pub struct MethodDefinition {
    builder: SubclassBuilder,
    token: MethodToken,
}

impl MethodDefinition {
    /// Implements the method with `implementation`.
    pub fn intercept(self, implementation: Implementation) -> SubclassBuilder {
        let mut token = self.token;
        token.modifiers -= Modifiers::ABSTRACT | Modifiers::NATIVE;
        self.builder.declare(token, Handler::ForImplementation(implementation))
    }

    /// Declares the method abstract.
    pub fn without_code(self) -> SubclassBuilder {
        let mut token = self.token;
        token.modifiers |= Modifiers::ABSTRACT;
        self.builder.declare(token, Handler::ForAbstractMethod)
    }

    /// Declares an annotation element returning `value` by default.
    pub fn with_default_value(self, value: AnnotationValue) -> Result<SubclassBuilder> {
        let mut token = self.token;
        if !value.is_compatible_with(&token.return_type) {
            return Err(BuildError::illegal_argument(eco_format!(
                "{value} is not a valid default value for {}",
                token.return_type
            )));
        }
        token.modifiers |= Modifiers::ABSTRACT;
        token.default_value = Some(value.clone());
        Ok(self.builder.declare(token, Handler::ForAnnotationValue(value)))
    }
}

impl SubclassBuilder {
    fn declare(mut self, token: MethodToken, handler: Handler) -> Self {
        self.instrumented_type = self.instrumented_type.with_method(&token);
        self.intercept_with(Entry::new(
            LatentMatcher::ForMethodToken(Box::new(token)),
            handler,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Instruction, InvocationKind};
    use crate::description::{
        AnnotationDescription, MethodDescription, Primitive, STRING, TypeDescription,
    };
    use crate::implementation::Constant;
    use crate::matcher::FieldMatcher;

    fn int() -> TypeRef {
        TypeRef::Primitive(Primitive::Int)
    }

    fn pool() -> Arc<TypePool> {
        let mut base = TypeDescription::class("a.Base", Modifiers::PUBLIC, TypeRef::object());
        base.methods.push(MethodDescription::constructor("a.Base", Modifiers::PUBLIC, vec![]));
        base.methods.push(MethodDescription::new("a.Base", "size", Modifiers::PUBLIC, int()));
        Arc::new(TypePool::with_builtins().with_type(base))
    }

    fn builder() -> SubclassBuilder {
        SubclassBuilder::new("a.Sub", TypeRef::class("a.Base"), pool())
    }

    #[test]
    fn default_build_imitates_constructors() {
        let ty = builder().make(TypeResolutionStrategy::Passive).unwrap();
        let init = ty.class_file.method("<init>").unwrap();
        assert!(init.modifiers.contains(Modifiers::PUBLIC));
        let code = init.code.as_ref().unwrap();
        assert!(code.instructions.iter().any(|instruction| matches!(
            instruction,
            Instruction::Invoke {
                kind: InvocationKind::Special,
                method,
            } if method.owner == "a/Base"
        )));
        assert!(ty.class_file.method("size").is_none());
    }

    #[test]
    fn intercepted_method_is_written() {
        let ty = builder()
            .intercept(MethodMatcher::named("size"), Implementation::FixedValue(Constant::Int(7)))
            .make(TypeResolutionStrategy::Passive)
            .unwrap();
        let size = ty.class_file.method("size").unwrap();
        assert_eq!(size.code.as_ref().unwrap().instructions[0], Instruction::Iconst(7));
    }

    #[test]
    fn later_interception_wins() {
        let ty = builder()
            .intercept(MethodMatcher::named("size"), Implementation::FixedValue(Constant::Int(1)))
            .intercept(MethodMatcher::Any, Implementation::StubValue)
            .make(TypeResolutionStrategy::Passive)
            .unwrap();
        let size = ty.class_file.method("size").unwrap();
        assert_eq!(size.code.as_ref().unwrap().instructions[0], Instruction::Iconst(0));
        assert!(ty.class_file.method("<init>").is_some());
    }

    #[test]
    fn defined_method_and_field() {
        let ty = builder()
            .define_field(FieldToken::new("count", Modifiers::PRIVATE, int()))
            .define_method(MethodToken::new("count", Modifiers::PUBLIC, int(), vec![]))
            .intercept(Implementation::FieldAccessor {
                name: "count".into(),
                define: None,
            })
            .make(TypeResolutionStrategy::Passive)
            .unwrap();
        assert!(ty.class_file.field("count").is_some());
        let count = ty.class_file.method("count").unwrap();
        let code = count.code.as_ref().unwrap();
        assert!(code.instructions.iter().any(|i| matches!(i, Instruction::GetField(_))));
    }

    #[test]
    fn abstract_methods_need_an_abstract_type() {
        let err = builder()
            .define_method(MethodToken::new("run", Modifiers::PUBLIC, TypeRef::Void, vec![]))
            .without_code()
            .make(TypeResolutionStrategy::Passive)
            .unwrap_err();
        assert!(matches!(err, BuildError::Validation(_)));

        let ty = builder()
            .modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .define_method(MethodToken::new("run", Modifiers::PUBLIC, TypeRef::Void, vec![]))
            .without_code()
            .make(TypeResolutionStrategy::Passive)
            .unwrap();
        let run = ty.class_file.method("run").unwrap();
        assert!(run.modifiers.contains(Modifiers::ABSTRACT));
        assert!(run.code.is_none());
    }

    #[test]
    fn default_value_must_match_return_type() {
        let result = builder()
            .define_method(MethodToken::new(
                "name",
                Modifiers::PUBLIC,
                TypeRef::class(STRING),
                vec![],
            ))
            .with_default_value(AnnotationValue::Int(3));
        assert!(matches!(result, Err(BuildError::IllegalArgument(_))));
    }

    #[test]
    fn field_rules_decorate_fields() {
        let ty = builder()
            .define_field(FieldToken::new(
                "LIMIT",
                Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
                int(),
            ))
            .field_rule(
                FieldEntry::new(FieldMatcher::named("LIMIT"))
                    .with_annotation(AnnotationDescription::marker("a.Tag"))
                    .with_default_value(AnnotationValue::Int(42)),
            )
            .make(TypeResolutionStrategy::Passive)
            .unwrap();
        let limit = ty.class_file.field("LIMIT").unwrap();
        assert_eq!(limit.constant, Some(AnnotationValue::Int(42)));
        assert_eq!(limit.annotations.len(), 1);
    }

    #[test]
    fn ignored_methods_are_left_alone() {
        let ty = builder()
            .ignore_also(MethodMatcher::named("size"))
            .intercept(MethodMatcher::Any, Implementation::StubValue)
            .make(TypeResolutionStrategy::Passive)
            .unwrap();
        assert!(ty.class_file.method("size").is_none());
        assert!(ty.class_file.method("toString").is_some());
        assert!(ty.class_file.method("finalize").is_none());
    }

    #[test]
    fn no_constructors_strategy() {
        let config = BuildConfig {
            constructor_strategy: ConstructorStrategy::NoConstructors,
            ..BuildConfig::default()
        };
        let ty = builder().with_config(config).make(TypeResolutionStrategy::Passive).unwrap();
        assert!(ty.class_file.method("<init>").is_none());
    }

    #[test]
    fn initializer_writes_type_initializer() {
        let ty = builder()
            .define_field(FieldToken::new(
                "COUNTER",
                Modifiers::PUBLIC | Modifiers::STATIC,
                int(),
            ))
            .initializer(ByteCodeAppender::Simple(crate::bytecode::StackManipulation::Trivial))
            .loaded_initializer(LoadedTypeInitializer::ForStaticField {
                field: "COUNTER".into(),
                value: AnnotationValue::Int(1),
            })
            .make(TypeResolutionStrategy::Active)
            .unwrap();
        assert!(ty.class_file.method("<clinit>").is_some());
        assert_eq!(TypeResolutionStrategy::Active.initialize(&ty).len(), 1);
    }
}
