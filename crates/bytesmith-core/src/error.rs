// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for the class synthesis pipeline.
//!
//! **DDD Context:** Shared Kernel
//!
//! Lookup failures (field location, unmatched methods) are ordinary return
//! values and never appear here. Everything in this module aborts a build:
//! contract violations are reported at the point of detection, structural
//! validation failures before compilation starts.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while preparing, compiling or writing a type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BuildError {
    /// A component was used in a way its contract forbids.
    #[error("illegal state: {0}")]
    #[diagnostic(
        code(bytesmith::illegal_state),
        help("this is an internal consistency error in the build pipeline")
    )]
    IllegalState(EcoString),

    /// An argument does not describe something the pipeline can build.
    #[error("illegal argument: {0}")]
    #[diagnostic(code(bytesmith::illegal_argument))]
    IllegalArgument(EcoString),

    /// A referenced type is not known to the type pool.
    #[error("cannot resolve type `{0}`")]
    #[diagnostic(
        code(bytesmith::unresolved_type),
        help("register the type with the type pool before building")
    )]
    UnresolvedType(EcoString),

    /// The instrumented type failed structural validation.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// The build configuration could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// Creates an [`BuildError::IllegalState`] error.
    #[must_use]
    pub fn illegal_state(message: impl Into<EcoString>) -> Self {
        Self::IllegalState(message.into())
    }

    /// Creates an [`BuildError::IllegalArgument`] error.
    #[must_use]
    pub fn illegal_argument(message: impl Into<EcoString>) -> Self {
        Self::IllegalArgument(message.into())
    }
}

/// Structural well-formedness failures of an instrumented type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ValidationError {
    /// The type name is not a legal binary name.
    #[error("illegal type name `{0}`")]
    #[diagnostic(code(bytesmith::validation::type_name))]
    IllegalTypeName(EcoString),

    /// The type combines modifiers that cannot appear together.
    #[error("illegal modifiers for type `{type_name}`: {reason}")]
    #[diagnostic(code(bytesmith::validation::type_modifiers))]
    IllegalTypeModifiers {
        /// The offending type.
        type_name: EcoString,
        /// Why the combination is rejected.
        reason: &'static str,
    },

    /// The superclass cannot be extended.
    #[error("cannot extend `{superclass}` from `{type_name}`: {reason}")]
    #[diagnostic(code(bytesmith::validation::superclass))]
    IllegalSuperclass {
        /// The instrumented type.
        type_name: EcoString,
        /// The rejected superclass.
        superclass: EcoString,
        /// Why the superclass is rejected.
        reason: &'static str,
    },

    /// Two fields share a name.
    #[error("duplicate field `{field}` in `{type_name}`")]
    #[diagnostic(code(bytesmith::validation::duplicate_field))]
    DuplicateField {
        /// The instrumented type.
        type_name: EcoString,
        /// The duplicated field name.
        field: EcoString,
    },

    /// A field declaration is not legal for its declaring type.
    #[error("illegal field `{field}` in `{type_name}`: {reason}")]
    #[diagnostic(code(bytesmith::validation::field))]
    IllegalField {
        /// The instrumented type.
        type_name: EcoString,
        /// The offending field.
        field: EcoString,
        /// Why the field is rejected.
        reason: &'static str,
    },

    /// Two methods share a name and descriptor.
    #[error("duplicate method `{method}` in `{type_name}`")]
    #[diagnostic(code(bytesmith::validation::duplicate_method))]
    DuplicateMethod {
        /// The instrumented type.
        type_name: EcoString,
        /// Name and descriptor of the duplicated method.
        method: EcoString,
    },

    /// A method declaration is not legal for its declaring type.
    #[error("illegal method `{method}` in `{type_name}`: {reason}")]
    #[diagnostic(code(bytesmith::validation::method))]
    IllegalMethod {
        /// The instrumented type.
        type_name: EcoString,
        /// Name and descriptor of the offending method.
        method: EcoString,
        /// Why the method is rejected.
        reason: &'static str,
    },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_state_display() {
        let err = BuildError::illegal_state("bridge handlers cannot prepare");
        assert_eq!(err.to_string(), "illegal state: bridge handlers cannot prepare");
    }

    #[test]
    fn validation_error_is_transparent() {
        let err: BuildError = ValidationError::DuplicateField {
            type_name: "com.example.Foo".into(),
            field: "x".into(),
        }
        .into();
        assert_eq!(err.to_string(), "duplicate field `x` in `com.example.Foo`");
    }
}
