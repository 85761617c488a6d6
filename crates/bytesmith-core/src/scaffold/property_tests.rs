// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the method registry.
//!
//! 1. **First match wins**: a method is bound to the earliest rule that matches it
//! 2. **No cross-talk**: rules for other methods never change a method's binding
//! 3. **Unmatched is non-implemented**: methods no rule claims are skipped
//! 4. **Compilation is repeatable**: compiling twice writes identical bodies
//!
//! **DDD Context:** Method Registry

use std::sync::Arc;

use proptest::prelude::*;

use crate::config::ClassFileVersion;
use crate::description::{
    MethodDescription, Modifiers, Primitive, TypeDescription, TypePool, TypeRef,
};
use crate::implementation::{Constant, Implementation, TargetFactory};
use crate::matcher::{LatentMatcher, MethodMatcher};
use crate::writer::method_pool::{MethodPool, MethodRecord};

use super::instrumented::{InstrumentedType, TypeValidation};
use super::method_graph::MethodGraphCompiler;
use super::method_registry::{Entry, Handler, MethodRegistry, PreparedRegistry};

// ============================================================================
// Generators
// ============================================================================

/// Methods declared by the superclass; `missing` matches nothing.
const NAMES: &[&str] = &["alpha", "beta", "gamma", "delta", "missing"];
const DECLARED: &[&str] = &["alpha", "beta", "gamma", "delta"];

/// A rule as (method name, constant returned).
fn rule() -> impl Strategy<Value = (&'static str, i32)> {
    (prop::sample::select(NAMES), -3..100i32)
}

fn rules() -> impl Strategy<Value = Vec<(&'static str, i32)>> {
    prop::collection::vec(rule(), 0..8)
}

// ============================================================================
// Helpers
// ============================================================================

fn base() -> TypeDescription {
    let mut base = TypeDescription::class("a.Base", Modifiers::PUBLIC, TypeRef::object());
    for name in DECLARED {
        base.methods.push(method(name));
    }
    base
}

fn method(name: &str) -> MethodDescription {
    MethodDescription::new("a.Base", name, Modifiers::PUBLIC, TypeRef::Primitive(Primitive::Int))
}

fn handler(value: i32) -> Handler {
    Handler::ForImplementation(Implementation::FixedValue(Constant::Int(value)))
}

fn appended(rules: &[(&str, i32)]) -> MethodRegistry {
    rules.iter().fold(MethodRegistry::new(), |registry, (name, value)| {
        registry.append(Entry::new(MethodMatcher::named(*name), handler(*value)))
    })
}

fn prepare(registry: &MethodRegistry) -> PreparedRegistry {
    let pool = Arc::new(TypePool::with_builtins().with_type(base()));
    let ty = InstrumentedType::subclass("a.Sub", Modifiers::PUBLIC, TypeRef::class("a.Base"));
    registry
        .prepare(
            ty,
            MethodGraphCompiler::Default,
            TypeValidation::Enabled,
            pool,
            &LatentMatcher::Instrumentable {
                ignored: Box::new(LatentMatcher::none()),
            },
        )
        .unwrap()
}

// ============================================================================
// Property tests
// ============================================================================

fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: the earliest matching rule is the one bound, whether the
    /// registry was built by appending or by prepending in reverse.
    #[test]
    fn first_match_wins(rules in rules()) {
        let appended = prepare(&appended(&rules));
        let reversed = rules.iter().rev().fold(MethodRegistry::new(), |registry, (name, value)| {
            registry.prepend(Entry::new(MethodMatcher::named(*name), handler(*value)))
        });
        let prepended = prepare(&reversed);
        for name in DECLARED {
            let expected = rules
                .iter()
                .find(|(rule, _)| rule == name)
                .map(|(_, value)| handler(*value));
            let bound = appended.entry(&method(name)).map(|entry| entry.handler.clone());
            prop_assert_eq!(&bound, &expected);
            let bound = prepended.entry(&method(name)).map(|entry| entry.handler.clone());
            prop_assert_eq!(&bound, &expected);
        }
    }

    /// Property 2: dropping every rule for other methods leaves a binding unchanged.
    #[test]
    fn no_cross_talk(rules in rules(), name in prop::sample::select(DECLARED)) {
        let all = prepare(&appended(&rules));
        let own: Vec<_> = rules.iter().copied().filter(|(rule, _)| *rule == name).collect();
        let isolated = prepare(&appended(&own));
        prop_assert_eq!(
            all.entry(&method(name)).map(|entry| entry.handler.clone()),
            isolated.entry(&method(name)).map(|entry| entry.handler.clone())
        );
    }

    /// Property 3: methods named by no rule compile to non-implemented records.
    #[test]
    fn unmatched_is_non_implemented(rules in rules()) {
        let compiled = prepare(&appended(&rules))
            .compile(&TargetFactory::SuperClass, ClassFileVersion::JAVA_V8);
        for name in DECLARED {
            let record = compiled.target(&method(name));
            let claimed = rules.iter().any(|(rule, _)| rule == name);
            prop_assert_eq!(!claimed, matches!(record, MethodRecord::NonImplemented(_)));
        }
    }

    /// Property 4: two compilations of one prepared registry write the same bodies.
    #[test]
    fn compilation_is_repeatable(
        rules in rules(),
        version in prop::sample::select(vec![4u16, 8, 17])
    ) {
        let version = ClassFileVersion::of_release(version).unwrap();
        let prepared = prepare(&appended(&rules));
        let first = prepared.compile(&TargetFactory::SuperClass, version);
        let second = prepared.compile(&TargetFactory::SuperClass, version);
        prop_assert_eq!(first.instrumented_methods(), second.instrumented_methods());
        for method in first.instrumented_methods() {
            prop_assert_eq!(
                first.target(&method).apply().unwrap(),
                second.target(&method).apply().unwrap()
            );
        }
    }
}
