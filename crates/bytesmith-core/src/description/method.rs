// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method descriptions and their detached tokens.
//!
//! **DDD Context:** Entity Model
//!
//! A [`MethodDescription`] is always held in its *defined shape*: parameter
//! and return types exactly as declared, type variables unresolved. The
//! *generic shape* seen through a parameterized supertype is produced on
//! demand by [`MethodDescription::in_generic_shape`].
//!
//! Identity (equality and hashing) is the declaring type, the internal name
//! and the erased signature; modifiers, annotations and parameter names do
//! not take part.

use ecow::EcoString;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::annotation::{AnnotationDescription, AnnotationValue};
use super::modifiers::{Modifiers, Visibility};
use super::pool::TypePool;
use super::types::{TypeDescription, TypeRef, TypeVariableToken};

/// Internal name of instance constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Internal name of the static type initializer.
pub const TYPE_INITIALIZER_NAME: &str = "<clinit>";

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterDescription {
    /// Declared name, if known.
    pub name: Option<EcoString>,
    /// Declared (possibly generic) type.
    pub type_ref: TypeRef,
    /// Parameter flags (`final`, `synthetic`).
    pub modifiers: Modifiers,
}

impl ParameterDescription {
    /// An unnamed parameter of the given type.
    #[must_use]
    pub fn of(type_ref: TypeRef) -> Self {
        Self {
            name: None,
            type_ref,
            modifiers: Modifiers::empty(),
        }
    }

    /// A named parameter of the given type.
    #[must_use]
    pub fn named(name: impl Into<EcoString>, type_ref: TypeRef) -> Self {
        Self {
            name: Some(name.into()),
            type_ref,
            modifiers: Modifiers::empty(),
        }
    }
}

/// A method, constructor or type initializer declared on a type.
#[derive(Debug, Clone)]
pub struct MethodDescription {
    pub declaring_type: EcoString,
    /// Internal name (`<init>` for constructors, `<clinit>` for the type initializer).
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub type_variables: Vec<TypeVariableToken>,
    pub return_type: TypeRef,
    pub parameters: Vec<ParameterDescription>,
    pub exceptions: Vec<TypeRef>,
    pub annotations: Vec<AnnotationDescription>,
    /// Default value of an annotation element.
    pub default_value: Option<AnnotationValue>,
}

impl PartialEq for MethodDescription {
    fn eq(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type
            && self.name == other.name
            && self.return_type.erasure() == other.return_type.erasure()
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(left, right)| left.type_ref.erasure() == right.type_ref.erasure())
    }
}

impl Eq for MethodDescription {}

impl Hash for MethodDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.declaring_type.hash(state);
        self.name.hash(state);
        self.return_type.erasure().hash(state);
        for parameter in &self.parameters {
            parameter.type_ref.erasure().hash(state);
        }
    }
}

impl MethodDescription {
    /// A method with no parameters, exceptions or annotations.
    #[must_use]
    pub fn new(
        declaring_type: impl Into<EcoString>,
        name: impl Into<EcoString>,
        modifiers: Modifiers,
        return_type: TypeRef,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            modifiers,
            type_variables: Vec::new(),
            return_type,
            parameters: Vec::new(),
            exceptions: Vec::new(),
            annotations: Vec::new(),
            default_value: None,
        }
    }

    /// A constructor with the given parameter types.
    #[must_use]
    pub fn constructor(
        declaring_type: impl Into<EcoString>,
        modifiers: Modifiers,
        parameters: Vec<TypeRef>,
    ) -> Self {
        Self::new(declaring_type, CONSTRUCTOR_NAME, modifiers, TypeRef::Void)
            .with_parameters(parameters)
    }

    /// The static type initializer placeholder of `declaring_type`.
    #[must_use]
    pub fn type_initializer(declaring_type: impl Into<EcoString>) -> Self {
        Self::new(
            declaring_type,
            TYPE_INITIALIZER_NAME,
            Modifiers::STATIC,
            TypeRef::Void,
        )
    }

    /// Materialises a detached token on `declaring_type`.
    #[must_use]
    pub fn latent(declaring_type: &str, token: &MethodToken) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: token.name.clone(),
            modifiers: token.modifiers,
            type_variables: token
                .type_variables
                .iter()
                .map(|variable| TypeVariableToken {
                    symbol: variable.symbol.clone(),
                    bound: variable.bound.attach(declaring_type),
                })
                .collect(),
            return_type: token.return_type.attach(declaring_type),
            parameters: token
                .parameters
                .iter()
                .map(|parameter| ParameterDescription {
                    name: parameter.name.clone(),
                    type_ref: parameter.type_ref.attach(declaring_type),
                    modifiers: parameter.modifiers,
                })
                .collect(),
            exceptions: token
                .exceptions
                .iter()
                .map(|exception| exception.attach(declaring_type))
                .collect(),
            annotations: token.annotations.clone(),
            default_value: token.default_value.clone(),
        }
    }

    /// Replaces the parameter list with unnamed parameters of the given types.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<TypeRef>) -> Self {
        self.parameters = parameters.into_iter().map(ParameterDescription::of).collect();
        self
    }

    #[must_use]
    pub fn with_exceptions(mut self, exceptions: Vec<TypeRef>) -> Self {
        self.exceptions = exceptions;
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: AnnotationDescription) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn with_default_value(mut self, value: AnnotationValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Returns this method with type variables resolved through `bindings`.
    ///
    /// The declaring type is unchanged, so the result may compare unequal to
    /// `self` if a variable erased differently before substitution.
    #[must_use]
    pub fn in_generic_shape(&self, bindings: &HashMap<EcoString, TypeRef>) -> Self {
        if bindings.is_empty() {
            return self.clone();
        }
        let mut shaped = self.clone();
        shaped.return_type = self.return_type.substitute(bindings);
        for parameter in &mut shaped.parameters {
            parameter.type_ref = parameter.type_ref.substitute(bindings);
        }
        shaped
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    #[must_use]
    pub fn is_type_initializer(&self) -> bool {
        self.name == TYPE_INITIALIZER_NAME
    }

    /// Returns true for ordinary methods (neither constructor nor type initializer).
    #[must_use]
    pub fn is_method(&self) -> bool {
        !self.is_constructor() && !self.is_type_initializer()
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        self.modifiers.contains(Modifiers::NATIVE)
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.modifiers.contains(Modifiers::PROTECTED)
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.modifiers.contains(Modifiers::PRIVATE)
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.modifiers.contains(Modifiers::SYNTHETIC)
    }

    #[must_use]
    pub fn is_bridge(&self) -> bool {
        self.modifiers.contains(Modifiers::BRIDGE)
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    /// Returns true if the method is dispatched virtually.
    ///
    /// Constructors, the type initializer, static and private methods are not.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.is_method() && !self.is_static() && !self.is_private()
    }

    /// Returns true if the method can serve as an annotation element default.
    #[must_use]
    pub fn is_default_value_compatible(&self, value: &AnnotationValue) -> bool {
        self.is_method()
            && !self.is_static()
            && self.parameters.is_empty()
            && value.is_compatible_with(&self.return_type)
    }

    /// Number of local variable slots taken by `this` and the parameters.
    #[must_use]
    pub fn stack_size(&self) -> u16 {
        let receiver = u16::from(!self.is_static());
        receiver
            + self
                .parameters
                .iter()
                .map(|parameter| parameter.type_ref.stack_slots())
                .sum::<u16>()
    }

    /// Local variable offset of the parameter at `index`.
    #[must_use]
    pub fn parameter_offset(&self, index: usize) -> u16 {
        let receiver = u16::from(!self.is_static());
        receiver
            + self
                .parameters
                .iter()
                .take(index)
                .map(|parameter| parameter.type_ref.stack_slots())
                .sum::<u16>()
    }

    /// Erased parameter types.
    #[must_use]
    pub fn erased_parameter_types(&self) -> Vec<TypeRef> {
        self.parameters
            .iter()
            .map(|parameter| parameter.type_ref.erasure())
            .collect()
    }

    /// JVM method descriptor (e.g. `(ILjava/lang/String;)V`).
    #[must_use]
    pub fn descriptor(&self) -> String {
        let parameters: String = self
            .parameters
            .iter()
            .map(|parameter| parameter.type_ref.descriptor())
            .collect();
        format!("({parameters}){}", self.return_type.descriptor())
    }

    /// Returns true if `accessor` may invoke this method.
    #[must_use]
    pub fn is_visible_to(&self, accessor: &TypeDescription, pool: &TypePool) -> bool {
        pool.is_member_visible(&self.declaring_type, self.modifiers, accessor)
    }

    /// Detaches this method from its declaring type.
    #[must_use]
    pub fn as_token(&self) -> MethodToken {
        let owner = self.declaring_type.as_str();
        MethodToken {
            name: self.name.clone(),
            modifiers: self.modifiers,
            type_variables: self
                .type_variables
                .iter()
                .map(|variable| TypeVariableToken {
                    symbol: variable.symbol.clone(),
                    bound: variable.bound.detach(owner),
                })
                .collect(),
            return_type: self.return_type.detach(owner),
            parameters: self
                .parameters
                .iter()
                .map(|parameter| ParameterDescription {
                    name: parameter.name.clone(),
                    type_ref: parameter.type_ref.detach(owner),
                    modifiers: parameter.modifiers,
                })
                .collect(),
            exceptions: self
                .exceptions
                .iter()
                .map(|exception| exception.detach(owner))
                .collect(),
            annotations: self.annotations.clone(),
            default_value: self.default_value.clone(),
        }
    }

    /// Name and erased signature.
    #[must_use]
    pub fn as_signature_token(&self) -> SignatureToken {
        SignatureToken {
            name: self.name.clone(),
            return_type: self.return_type.erasure(),
            parameter_types: self.erased_parameter_types(),
        }
    }

    /// Erased signature without the name.
    #[must_use]
    pub fn as_type_token(&self) -> TypeToken {
        TypeToken {
            return_type: self.return_type.erasure(),
            parameter_types: self.erased_parameter_types(),
        }
    }

    /// Returns true if a bridge with the `token` signature may forward to this method.
    ///
    /// Arity must agree; positions where either side is primitive (or `void`)
    /// must match exactly, reference positions may differ.
    #[must_use]
    pub fn is_bridge_compatible(&self, token: &TypeToken) -> bool {
        let parameters = self.erased_parameter_types();
        if parameters.len() != token.parameter_types.len() {
            return false;
        }
        let compatible = |own: &TypeRef, bridge: &TypeRef| {
            own == bridge || (!is_primitive_or_void(own) && !is_primitive_or_void(bridge))
        };
        parameters
            .iter()
            .zip(&token.parameter_types)
            .all(|(own, bridge)| compatible(own, bridge))
            && compatible(&self.return_type.erasure(), &token.return_type)
    }
}

fn is_primitive_or_void(ty: &TypeRef) -> bool {
    ty.is_primitive() || ty.is_void()
}

impl fmt::Display for MethodDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keywords = self.modifiers.keywords();
        if !keywords.is_empty() {
            write!(f, "{keywords} ")?;
        }
        if self.is_method() {
            write!(f, "{} ", self.return_type)?;
        }
        write!(f, "{}.{}(", self.declaring_type, self.name)?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", parameter.type_ref)?;
        }
        f.write_str(")")?;
        if !self.exceptions.is_empty() {
            f.write_str(" throws ")?;
            for (index, exception) in self.exceptions.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{exception}")?;
            }
        }
        Ok(())
    }
}

/// A method detached from its declaring type.
///
/// References to the declaring type are replaced by [`TypeRef::Target`], so
/// the same token can be applied to any type. Equality covers the name, the
/// return type and the parameter types.
#[derive(Debug, Clone)]
pub struct MethodToken {
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub type_variables: Vec<TypeVariableToken>,
    pub return_type: TypeRef,
    pub parameters: Vec<ParameterDescription>,
    pub exceptions: Vec<TypeRef>,
    pub annotations: Vec<AnnotationDescription>,
    pub default_value: Option<AnnotationValue>,
}

impl MethodToken {
    /// A token for a method with the given shape.
    #[must_use]
    pub fn new(
        name: impl Into<EcoString>,
        modifiers: Modifiers,
        return_type: TypeRef,
        parameters: Vec<TypeRef>,
    ) -> Self {
        Self {
            name: name.into(),
            modifiers,
            type_variables: Vec::new(),
            return_type,
            parameters: parameters.into_iter().map(ParameterDescription::of).collect(),
            exceptions: Vec::new(),
            annotations: Vec::new(),
            default_value: None,
        }
    }

    /// A constructor token with the given parameter types.
    #[must_use]
    pub fn constructor(modifiers: Modifiers, parameters: Vec<TypeRef>) -> Self {
        Self::new(CONSTRUCTOR_NAME, modifiers, TypeRef::Void, parameters)
    }

    #[must_use]
    pub fn with_exceptions(mut self, exceptions: Vec<TypeRef>) -> Self {
        self.exceptions = exceptions;
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: AnnotationDescription) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl PartialEq for MethodToken {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.return_type == other.return_type
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(left, right)| left.type_ref == right.type_ref)
    }
}

impl Eq for MethodToken {}

impl Hash for MethodToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.return_type.hash(state);
        for parameter in &self.parameters {
            parameter.type_ref.hash(state);
        }
    }
}

/// A method's name and erased signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureToken {
    pub name: EcoString,
    pub return_type: TypeRef,
    pub parameter_types: Vec<TypeRef>,
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (index, parameter) in self.parameter_types.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}

/// A method's erased parameter and return types.
///
/// Used to name the bridge methods a representative must answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeToken {
    pub return_type: TypeRef,
    pub parameter_types: Vec<TypeRef>,
}

impl TypeToken {
    /// JVM descriptor of this signature.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let parameters: String = self
            .parameter_types
            .iter()
            .map(TypeRef::descriptor)
            .collect();
        format!("({parameters}){}", self.return_type.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::types::{OBJECT, Primitive, STRING};

    fn accept(declaring: &str, parameter: TypeRef) -> MethodDescription {
        MethodDescription::new(declaring, "accept", Modifiers::PUBLIC, TypeRef::Void)
            .with_parameters(vec![parameter])
    }

    #[test]
    fn identity_uses_erased_signature() {
        let generic = accept("com.example.Sink", TypeRef::variable("T"));
        let raw = accept("com.example.Sink", TypeRef::object());
        assert_eq!(generic, raw);

        let other_owner = accept("com.example.Other", TypeRef::object());
        assert_ne!(generic, other_owner);
    }

    #[test]
    fn identity_ignores_modifiers() {
        let public = accept("com.example.Sink", TypeRef::object());
        let mut private = public.clone();
        private.modifiers = Modifiers::PRIVATE;
        assert_eq!(public, private);
    }

    #[test]
    fn virtual_classification() {
        let method = accept("com.example.Sink", TypeRef::object());
        assert!(method.is_virtual());
        let constructor =
            MethodDescription::constructor("com.example.Sink", Modifiers::PUBLIC, vec![]);
        assert!(!constructor.is_virtual());
        assert!(!MethodDescription::type_initializer("com.example.Sink").is_virtual());
        let mut hidden = method.clone();
        hidden.modifiers = Modifiers::PRIVATE;
        assert!(!hidden.is_virtual());
    }

    #[test]
    fn token_round_trips_through_latent() {
        let owner = "com.example.Node";
        let method = MethodDescription::new(owner, "next", Modifiers::PUBLIC, TypeRef::class(owner))
            .with_parameters(vec![TypeRef::class(owner)]);
        let token = method.as_token();
        assert_eq!(token.return_type, TypeRef::Target);
        assert_eq!(MethodDescription::latent(owner, &token), method);

        let moved = MethodDescription::latent("com.example.Other", &token);
        assert_eq!(moved.return_type, TypeRef::class("com.example.Other"));
    }

    #[test]
    fn descriptor_and_offsets() {
        let method =
            MethodDescription::new("com.example.Calc", "mix", Modifiers::PUBLIC, TypeRef::Void)
                .with_parameters(vec![TypeRef::Primitive(Primitive::Long), TypeRef::class(STRING)]);
        assert_eq!(method.descriptor(), "(JLjava/lang/String;)V");
        assert_eq!(method.parameter_offset(0), 1);
        assert_eq!(method.parameter_offset(1), 3);
        assert_eq!(method.stack_size(), 4);
    }

    #[test]
    fn bridge_compatibility() {
        let method = accept("com.example.Sink", TypeRef::class(STRING));
        let widened = TypeToken {
            return_type: TypeRef::Void,
            parameter_types: vec![TypeRef::class(OBJECT)],
        };
        assert!(method.is_bridge_compatible(&widened));

        let primitive = TypeToken {
            return_type: TypeRef::Void,
            parameter_types: vec![TypeRef::Primitive(Primitive::Int)],
        };
        assert!(!method.is_bridge_compatible(&primitive));

        let wrong_return = TypeToken {
            return_type: TypeRef::class(OBJECT),
            parameter_types: vec![TypeRef::class(OBJECT)],
        };
        assert!(!method.is_bridge_compatible(&wrong_return));
    }

    #[test]
    fn generic_shape_substitutes_variables() {
        let method = accept("com.example.Sink", TypeRef::variable("T"));
        let mut bindings = HashMap::new();
        bindings.insert(EcoString::from("T"), TypeRef::class(STRING));
        let shaped = method.in_generic_shape(&bindings);
        assert_eq!(shaped.erased_parameter_types(), vec![TypeRef::class(STRING)]);
    }
}
