// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Implementation targets: where `super` calls go.
//!
//! **DDD Context:** Implementation
//!
//! A target is built once per registry compilation. It knows the
//! instrumented type, its method graph and the class file version, and
//! answers which concrete method a super call for a given signature must
//! invoke. A subclass target calls into the superclass. A rebase target
//! first consults the rebase resolver so that calls reach the renamed
//! original bodies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ecow::EcoString;

use crate::bytecode::{InvocationKind, StackManipulation};
use crate::config::ClassFileVersion;
use crate::description::{
    MethodDescription, SignatureToken, TypeDescription, TypePool, TypeRef,
};
use crate::scaffold::inline::{MethodRebaseResolver, Resolution};
use crate::scaffold::method_graph::{LinkedGraph, MethodGraph};

/// A call that bypasses virtual dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialMethodInvocation {
    /// No such method can be invoked.
    Illegal,
    Simple {
        method: MethodDescription,
        /// The class named as the receiver in the invoke instruction.
        owner: EcoString,
        kind: InvocationKind,
        /// Pushed after the regular arguments.
        additional_arguments: StackManipulation,
    },
}

impl SpecialMethodInvocation {
    fn of(method: &MethodDescription, owner: &str) -> Self {
        if method.is_abstract() {
            return SpecialMethodInvocation::Illegal;
        }
        SpecialMethodInvocation::Simple {
            method: method.clone(),
            owner: owner.into(),
            kind: InvocationKind::Special,
            additional_arguments: StackManipulation::Trivial,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, SpecialMethodInvocation::Simple { .. })
    }

    #[must_use]
    pub fn method(&self) -> Option<&MethodDescription> {
        match self {
            SpecialMethodInvocation::Simple { method, .. } => Some(method),
            SpecialMethodInvocation::Illegal => None,
        }
    }

    /// The additional arguments followed by the invoke instruction.
    ///
    /// The receiver and the regular arguments must already be on the stack.
    #[must_use]
    pub fn stack(&self) -> StackManipulation {
        match self {
            SpecialMethodInvocation::Illegal => StackManipulation::Illegal,
            SpecialMethodInvocation::Simple {
                method,
                owner,
                kind,
                additional_arguments,
            } => StackManipulation::compound([
                additional_arguments.clone(),
                StackManipulation::invoke_on(method, owner, *kind),
            ]),
        }
    }
}

#[derive(Clone)]
enum Origin {
    SuperClass,
    Rebase(HashMap<SignatureToken, Resolution>),
}

/// The context generated code is compiled against.
#[derive(Clone)]
pub struct ImplementationTarget {
    instrumented_type: TypeDescription,
    pool: Arc<TypePool>,
    super_graph: MethodGraph,
    class_file_version: ClassFileVersion,
    origin: Origin,
}

impl fmt::Debug for ImplementationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationTarget")
            .field("instrumented_type", &self.instrumented_type.name)
            .field("class_file_version", &self.class_file_version)
            .field(
                "origin",
                &match self.origin {
                    Origin::SuperClass => "super-class",
                    Origin::Rebase(_) => "rebase",
                },
            )
            .finish_non_exhaustive()
    }
}

impl ImplementationTarget {
    #[must_use]
    pub fn instrumented_type(&self) -> &TypeDescription {
        &self.instrumented_type
    }

    #[must_use]
    pub fn pool(&self) -> &TypePool {
        &self.pool
    }

    #[must_use]
    pub fn class_file_version(&self) -> ClassFileVersion {
        self.class_file_version
    }

    /// The direct superclass of the instrumented type, by binary name.
    #[must_use]
    pub fn superclass_name(&self) -> Option<&EcoString> {
        self.instrumented_type
            .superclass
            .as_ref()
            .and_then(TypeRef::raw_name)
    }

    /// Resolves a super call for the method with the given signature.
    #[must_use]
    pub fn invoke_super(&self, token: &SignatureToken) -> SpecialMethodInvocation {
        if let Origin::Rebase(resolutions) = &self.origin {
            if let Some(resolution) = resolutions.get(token) {
                return self.invoke_rebased(resolution);
            }
        }
        if token.name == crate::description::CONSTRUCTOR_NAME {
            self.invoke_constructor(token)
        } else {
            self.invoke_method(token)
        }
    }

    fn invoke_rebased(&self, resolution: &Resolution) -> SpecialMethodInvocation {
        let method = resolution.resolved_method();
        match resolution.additional_arguments() {
            Ok(additional_arguments) => SpecialMethodInvocation::Simple {
                method: method.clone(),
                owner: self.instrumented_type.name.clone(),
                kind: if method.is_static() {
                    InvocationKind::Static
                } else {
                    InvocationKind::Special
                },
                additional_arguments,
            },
            Err(_) => SpecialMethodInvocation::of(method, &self.instrumented_type.name),
        }
    }

    fn invoke_constructor(&self, token: &SignatureToken) -> SpecialMethodInvocation {
        let Some(superclass) = self.superclass_name() else {
            return SpecialMethodInvocation::Illegal;
        };
        let Some(super_type) = self.pool.describe(superclass) else {
            return SpecialMethodInvocation::Illegal;
        };
        super_type
            .declared_methods()
            .iter()
            .find(|method| {
                method.is_constructor()
                    && method.erased_parameter_types() == token.parameter_types
                    && method.is_visible_to(&self.instrumented_type, &self.pool)
            })
            .map_or(SpecialMethodInvocation::Illegal, |constructor| {
                SpecialMethodInvocation::of(constructor, superclass)
            })
    }

    fn invoke_method(&self, token: &SignatureToken) -> SpecialMethodInvocation {
        let Some(superclass) = self.superclass_name() else {
            return SpecialMethodInvocation::Illegal;
        };
        match self.super_graph.locate(token) {
            Some(node) if node.sort.is_unique() => {
                SpecialMethodInvocation::of(&node.representative, superclass)
            }
            _ => SpecialMethodInvocation::Illegal,
        }
    }
}

/// Creates the [`ImplementationTarget`] for a compilation.
#[derive(Debug, Clone, Default)]
pub enum TargetFactory {
    /// Super calls go to the superclass.
    #[default]
    SuperClass,
    /// Super calls go to rebased originals first.
    Rebase(Arc<MethodRebaseResolver>),
}

impl TargetFactory {
    #[must_use]
    pub fn make(
        &self,
        instrumented_type: TypeDescription,
        graph: &LinkedGraph,
        pool: Arc<TypePool>,
        class_file_version: ClassFileVersion,
    ) -> ImplementationTarget {
        let origin = match self {
            TargetFactory::SuperClass => Origin::SuperClass,
            TargetFactory::Rebase(resolver) => Origin::Rebase(resolver.as_token_map()),
        };
        ImplementationTarget {
            instrumented_type,
            pool,
            super_graph: graph.super_graph.clone(),
            class_file_version,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{MethodToken, Modifiers, OBJECT, STRING};
    use crate::implementation::transformer::MethodNameTransformer;
    use crate::scaffold::method_graph::MethodGraphCompiler;
    use std::collections::HashSet;

    fn pool() -> Arc<TypePool> {
        let mut base =
            TypeDescription::class("com.example.Base", Modifiers::PUBLIC, TypeRef::object());
        base.methods.push(MethodDescription::new(
            "com.example.Base",
            "greet",
            Modifiers::PUBLIC,
            TypeRef::class(STRING),
        ));
        base.methods.push(MethodDescription::new(
            "com.example.Base",
            "shape",
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
            TypeRef::Void,
        ));
        base.methods.push(MethodDescription::constructor(
            "com.example.Base",
            Modifiers::PROTECTED,
            vec![TypeRef::class(STRING)],
        ));
        base.methods.push(MethodDescription::constructor(
            "com.example.Base",
            Modifiers::PRIVATE,
            vec![],
        ));
        base.modifiers |= Modifiers::ABSTRACT;
        Arc::new(TypePool::with_builtins().with_type(base))
    }

    fn sub() -> TypeDescription {
        TypeDescription::class(
            "com.example.Sub",
            Modifiers::PUBLIC,
            TypeRef::class("com.example.Base"),
        )
    }

    fn target(factory: &TargetFactory, ty: TypeDescription) -> ImplementationTarget {
        let pool = pool();
        let graph = MethodGraphCompiler::Default.compile(&ty, &pool);
        factory.make(ty, &graph, pool, ClassFileVersion::default())
    }

    fn token(name: &str, return_type: TypeRef, parameters: Vec<TypeRef>) -> SignatureToken {
        SignatureToken {
            name: name.into(),
            return_type,
            parameter_types: parameters,
        }
    }

    #[test]
    fn super_method_is_invoked_on_superclass() {
        let target = target(&TargetFactory::SuperClass, sub());
        let invocation = target.invoke_super(&token("greet", TypeRef::class(STRING), vec![]));
        let SpecialMethodInvocation::Simple { owner, kind, method, .. } = &invocation else {
            panic!("expected a valid invocation");
        };
        assert_eq!(owner, "com.example.Base");
        assert_eq!(*kind, InvocationKind::Special);
        assert_eq!(method.declaring_type, "com.example.Base");

        let to_string = target.invoke_super(&token("toString", TypeRef::class(STRING), vec![]));
        assert_eq!(to_string.method().map(|m| m.declaring_type.as_str()), Some(OBJECT));
    }

    #[test]
    fn abstract_and_missing_methods_are_illegal() {
        let target = target(&TargetFactory::SuperClass, sub());
        assert!(!target.invoke_super(&token("shape", TypeRef::Void, vec![])).is_valid());
        assert!(!target.invoke_super(&token("absent", TypeRef::Void, vec![])).is_valid());
        assert_eq!(
            SpecialMethodInvocation::Illegal.stack(),
            StackManipulation::Illegal
        );
    }

    #[test]
    fn only_visible_super_constructors_resolve() {
        let target = target(&TargetFactory::SuperClass, sub());
        let visible = target.invoke_super(&token(
            crate::description::CONSTRUCTOR_NAME,
            TypeRef::Void,
            vec![TypeRef::class(STRING)],
        ));
        assert!(visible.is_valid());
        let constructor = token(crate::description::CONSTRUCTOR_NAME, TypeRef::Void, vec![]);
        let hidden = target.invoke_super(&constructor);
        assert!(!hidden.is_valid());
    }

    #[test]
    fn rebase_target_calls_renamed_original() {
        let mut ty = sub();
        ty.methods.push(MethodDescription::new(
            "com.example.Sub",
            "greet",
            Modifiers::PUBLIC,
            TypeRef::class(STRING),
        ));
        ty.methods
            .push(MethodDescription::constructor("com.example.Sub", Modifiers::PUBLIC, vec![]));
        let rebaseable: HashSet<MethodToken> =
            ty.methods.iter().map(MethodDescription::as_token).collect();
        let resolver = MethodRebaseResolver::make(
            &ty,
            &rebaseable,
            ClassFileVersion::default(),
            "auxiliary",
            &MethodNameTransformer::default(),
        );
        let target = target(&TargetFactory::Rebase(Arc::new(resolver)), ty.clone());

        let greet = target.invoke_super(&ty.methods[0].as_signature_token());
        let SpecialMethodInvocation::Simple { method, owner, .. } = &greet else {
            panic!("expected a valid invocation");
        };
        assert_eq!(owner, "com.example.Sub");
        assert!(method.name.starts_with("greet$original$"));

        let constructor = target.invoke_super(&ty.methods[1].as_signature_token());
        let SpecialMethodInvocation::Simple {
            additional_arguments,
            method,
            ..
        } = &constructor
        else {
            panic!("expected a valid invocation");
        };
        assert_eq!(*additional_arguments, StackManipulation::null_constant());
        assert_eq!(method.parameters.len(), 1);

        let inherited = target.invoke_super(&token("toString", TypeRef::class(STRING), vec![]));
        assert_eq!(inherited.method().map(|m| m.declaring_type.as_str()), Some(OBJECT));
    }
}
