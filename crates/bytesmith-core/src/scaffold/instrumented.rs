// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The type under construction.
//!
//! **DDD Context:** Scaffold — Aggregate Root
//!
//! An [`InstrumentedType`] is a [`TypeDescription`] that can still grow:
//! handlers add helper methods and fields while the method registry
//! prepares, and implementations contribute static initializer code. Every
//! extension returns a new value.
//!
//! Structural validation runs once, after preparation, when
//! [`TypeValidation::Enabled`] is in force.

use std::collections::HashSet;

use ecow::EcoString;

use crate::description::{
    FieldDescription, FieldToken, MethodDescription, MethodToken, Modifiers, TypeDescription,
    TypePool, TypeRef,
};
use crate::error::{Result, ValidationError};
use crate::implementation::ByteCodeAppender;

use super::type_initializer::{LoadedTypeInitializer, TypeInitializer};

/// Whether the instrumented type is checked for structural well-formedness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeValidation {
    #[default]
    Enabled,
    Disabled,
}

impl TypeValidation {
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self == TypeValidation::Enabled
    }
}

impl From<bool> for TypeValidation {
    fn from(enabled: bool) -> Self {
        if enabled {
            TypeValidation::Enabled
        } else {
            TypeValidation::Disabled
        }
    }
}

/// A type description plus the initializers contributed while building it.
#[derive(Debug, Clone)]
pub struct InstrumentedType {
    description: TypeDescription,
    type_initializer: TypeInitializer,
    loaded_initializer: LoadedTypeInitializer,
}

impl InstrumentedType {
    #[must_use]
    pub fn new(description: TypeDescription) -> Self {
        Self {
            description,
            type_initializer: TypeInitializer::None,
            loaded_initializer: LoadedTypeInitializer::NoOp,
        }
    }

    /// A new class named `name` extending `superclass`.
    #[must_use]
    pub fn subclass(name: impl Into<EcoString>, modifiers: Modifiers, superclass: TypeRef) -> Self {
        Self::new(TypeDescription::class(name, modifiers, superclass))
    }

    #[must_use]
    pub fn description(&self) -> &TypeDescription {
        &self.description
    }

    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.description.name
    }

    #[must_use]
    pub fn declared_methods(&self) -> &[MethodDescription] {
        self.description.declared_methods()
    }

    #[must_use]
    pub fn type_initializer(&self) -> &TypeInitializer {
        &self.type_initializer
    }

    #[must_use]
    pub fn loaded_type_initializer(&self) -> &LoadedTypeInitializer {
        &self.loaded_initializer
    }

    /// Declares a method described by `token`.
    #[must_use]
    pub fn with_method(mut self, token: &MethodToken) -> Self {
        let method = MethodDescription::latent(&self.description.name, token);
        self.description.methods.push(method);
        self
    }

    /// Declares a field described by `token`.
    #[must_use]
    pub fn with_field(mut self, token: &FieldToken) -> Self {
        let field = FieldDescription::latent(&self.description.name, token);
        self.description.fields.push(field);
        self
    }

    /// Adds interfaces not already implemented.
    #[must_use]
    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = TypeRef>) -> Self {
        for interface in interfaces {
            if !self.description.interfaces.contains(&interface) {
                self.description.interfaces.push(interface);
            }
        }
        self
    }

    /// Replaces the type's modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.description.modifiers = modifiers;
        self
    }

    /// Appends static initializer code.
    #[must_use]
    pub fn with_initializer(mut self, appender: ByteCodeAppender) -> Self {
        self.type_initializer = self.type_initializer.expand_with(appender);
        self
    }

    /// Appends a load-time initializer.
    #[must_use]
    pub fn with_loaded_initializer(mut self, initializer: LoadedTypeInitializer) -> Self {
        self.loaded_initializer = self.loaded_initializer.and_then(initializer);
        self
    }

    /// Checks the type for structural well-formedness.
    ///
    /// Returns the validated description on success.
    pub fn validated(&self, pool: &TypePool) -> Result<TypeDescription> {
        let ty = &self.description;
        validate_type(ty, pool)?;
        validate_fields(ty)?;
        validate_methods(ty)?;
        Ok(ty.clone())
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while",
];

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        && !KEYWORDS.contains(&segment)
}

fn has_multiple_visibilities(modifiers: Modifiers) -> bool {
    (modifiers & Modifiers::VISIBILITY_MASK).bits().count_ones() > 1
}

fn validate_type(ty: &TypeDescription, pool: &TypePool) -> Result<()> {
    if !ty.name.split('.').all(is_identifier) {
        return Err(ValidationError::IllegalTypeName(ty.name.clone()).into());
    }
    let illegal = |reason| ValidationError::IllegalTypeModifiers {
        type_name: ty.name.clone(),
        reason,
    };
    if has_multiple_visibilities(ty.modifiers) {
        return Err(illegal("more than one visibility modifier").into());
    }
    if ty.is_abstract() && ty.is_final() {
        return Err(illegal("a type cannot be both abstract and final").into());
    }
    if ty.is_interface() && (!ty.is_abstract() || ty.is_final()) {
        return Err(illegal("an interface must be abstract and cannot be final").into());
    }
    if ty.is_annotation() && !ty.is_interface() {
        return Err(illegal("an annotation type must be an interface").into());
    }
    if let Some(superclass) = ty.superclass.as_ref() {
        let illegal_superclass = |reason| ValidationError::IllegalSuperclass {
            type_name: ty.name.clone(),
            superclass: EcoString::from(superclass.to_string()),
            reason,
        };
        if ty.is_interface() {
            return Err(illegal_superclass("an interface cannot declare a superclass").into());
        }
        match superclass.raw_name().and_then(|name| pool.describe(name)) {
            Some(parent) if parent.is_final() => {
                return Err(illegal_superclass("the superclass is final").into());
            }
            Some(parent) if parent.is_interface() => {
                return Err(illegal_superclass("the superclass is an interface").into());
            }
            _ if superclass.raw_name().is_none() => {
                return Err(illegal_superclass("the superclass is not a class type").into());
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_fields(ty: &TypeDescription) -> Result<()> {
    let mut seen = HashSet::new();
    for field in &ty.fields {
        let illegal = |reason| ValidationError::IllegalField {
            type_name: ty.name.clone(),
            field: field.name.clone(),
            reason,
        };
        if !is_identifier(&field.name) {
            return Err(illegal("not a legal field name").into());
        }
        if !seen.insert(field.name.clone()) {
            return Err(ValidationError::DuplicateField {
                type_name: ty.name.clone(),
                field: field.name.clone(),
            }
            .into());
        }
        if field.type_ref.is_void() {
            return Err(illegal("a field cannot be of type void").into());
        }
        if has_multiple_visibilities(field.modifiers) {
            return Err(illegal("more than one visibility modifier").into());
        }
        let constant = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        if ty.is_interface() && !field.modifiers.contains(constant) {
            return Err(illegal("interface fields must be public, static and final").into());
        }
    }
    Ok(())
}

fn validate_methods(ty: &TypeDescription) -> Result<()> {
    let mut seen = HashSet::new();
    for method in &ty.methods {
        let signature = EcoString::from(format!("{}{}", method.name, method.descriptor()));
        let illegal = |reason| ValidationError::IllegalMethod {
            type_name: ty.name.clone(),
            method: signature.clone(),
            reason,
        };
        if method.is_method() && !is_identifier(&method.name) {
            return Err(illegal("not a legal method name").into());
        }
        if !seen.insert(signature.clone()) {
            return Err(ValidationError::DuplicateMethod {
                type_name: ty.name.clone(),
                method: signature.clone(),
            }
            .into());
        }
        if has_multiple_visibilities(method.modifiers) {
            return Err(illegal("more than one visibility modifier").into());
        }
        if method.is_constructor() {
            if ty.is_interface() {
                return Err(illegal("an interface cannot declare a constructor").into());
            }
            if method.modifiers.intersects(
                Modifiers::STATIC | Modifiers::ABSTRACT | Modifiers::FINAL | Modifiers::NATIVE,
            ) {
                return Err(illegal("illegal constructor modifiers").into());
            }
            if !method.return_type.is_void() {
                return Err(illegal("a constructor must return void").into());
            }
        }
        if method.is_abstract() {
            if !ty.is_abstract() {
                return Err(illegal("an abstract method requires an abstract type").into());
            }
            let forbidden = Modifiers::PRIVATE
                | Modifiers::STATIC
                | Modifiers::FINAL
                | Modifiers::NATIVE
                | Modifiers::SYNCHRONIZED
                | Modifiers::STRICT;
            if method.modifiers.intersects(forbidden) {
                return Err(illegal("illegal combination with the abstract modifier").into());
            }
        }
        if let Some(value) = method.default_value.as_ref() {
            if !ty.is_annotation() {
                return Err(illegal("only annotation types may declare default values").into());
            }
            if !method.is_default_value_compatible(value) {
                return Err(illegal("default value is incompatible with the return type").into());
            }
        }
        if method.parameters.iter().any(|p| p.type_ref.is_void()) {
            return Err(illegal("a parameter cannot be of type void").into());
        }
    }
    Ok(())
}
