// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Annotations and annotation values.
//!
//! **DDD Context:** Entity Model — Value Objects

use ecow::EcoString;
use std::fmt;

use super::types::{Primitive, STRING, TypeRef};

/// An annotation instance: its type and explicitly given element values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationDescription {
    /// Binary name of the annotation type.
    pub annotation_type: EcoString,
    /// Element values in declaration order.
    pub values: Vec<(EcoString, AnnotationValue)>,
}

impl AnnotationDescription {
    /// A marker annotation without values.
    #[must_use]
    pub fn marker(annotation_type: impl Into<EcoString>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            values: Vec::new(),
        }
    }

    /// Adds an element value.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<EcoString>, value: AnnotationValue) -> Self {
        self.values.push((name.into(), value));
        self
    }

    /// Looks up an element value by name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for AnnotationDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.annotation_type)?;
        if self.values.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (index, (name, value)) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

/// A constant value usable as an annotation element or default value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationValue {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Char(char),
    String(EcoString),
    /// An enumeration constant.
    Enum {
        type_name: EcoString,
        constant: EcoString,
    },
    /// A class literal.
    Type(TypeRef),
    Array(Vec<AnnotationValue>),
    Annotation(Box<AnnotationDescription>),
}

impl AnnotationValue {
    /// Returns true if this value can be returned from an annotation element of type `ty`.
    #[must_use]
    pub fn is_compatible_with(&self, ty: &TypeRef) -> bool {
        match (self, ty.erasure()) {
            (AnnotationValue::Boolean(_), TypeRef::Primitive(Primitive::Boolean))
            | (AnnotationValue::Int(_), TypeRef::Primitive(Primitive::Int))
            | (AnnotationValue::Long(_), TypeRef::Primitive(Primitive::Long))
            | (AnnotationValue::Char(_), TypeRef::Primitive(Primitive::Char)) => true,
            (AnnotationValue::String(_), TypeRef::Class(name)) => name == STRING,
            (AnnotationValue::Type(_), TypeRef::Class(name)) => name == "java.lang.Class",
            (AnnotationValue::Enum { type_name, .. }, TypeRef::Class(name)) => *type_name == name,
            (AnnotationValue::Annotation(annotation), TypeRef::Class(name)) => {
                annotation.annotation_type == name
            }
            (AnnotationValue::Array(values), TypeRef::Array(component)) => {
                values.iter().all(|value| value.is_compatible_with(&component))
            }
            _ => false,
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Boolean(value) => write!(f, "{value}"),
            AnnotationValue::Int(value) => write!(f, "{value}"),
            AnnotationValue::Long(value) => write!(f, "{value}L"),
            AnnotationValue::Char(value) => write!(f, "'{value}'"),
            AnnotationValue::String(value) => write!(f, "{value:?}"),
            AnnotationValue::Enum {
                type_name,
                constant,
            } => write!(f, "{type_name}.{constant}"),
            AnnotationValue::Type(ty) => write!(f, "{ty}.class"),
            AnnotationValue::Array(values) => {
                f.write_str("{")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
            AnnotationValue::Annotation(annotation) => write!(f, "{annotation}"),
        }
    }
}
