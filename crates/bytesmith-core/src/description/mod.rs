// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Entity model: types, methods, fields and their detached tokens.
//!
//! **DDD Context:** Entity Model
//!
//! Descriptions are immutable values. A *token* is a description detached
//! from its declaring type; tokens serve as hierarchy-independent keys and
//! are re-attached with `latent` when applied to a concrete type.

pub mod annotation;
pub mod field;
pub mod method;
pub mod modifiers;
pub mod pool;
pub mod types;

pub use annotation::{AnnotationDescription, AnnotationValue};
pub use field::{FieldDescription, FieldToken, SignatureToken as FieldSignatureToken};
pub use method::{
    CONSTRUCTOR_NAME, MethodDescription, MethodToken, ParameterDescription, SignatureToken,
    TYPE_INITIALIZER_NAME, TypeToken,
};
pub use modifiers::{Modifiers, Visibility};
pub use pool::TypePool;
pub use types::{OBJECT, Primitive, STRING, TypeDescription, TypeRef, TypeVariableToken};
