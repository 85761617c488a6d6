// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Field pool records.
//!
//! **DDD Context:** Class Writing

use crate::description::{AnnotationDescription, AnnotationValue, FieldDescription};

use super::FieldBody;

/// Answers the record for any field of the instrumented type.
pub trait FieldPool {
    fn target(&self, field: &FieldDescription) -> FieldRecord;
}

/// The writer's plan for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    pub field: FieldDescription,
    /// Annotations added on top of those the field declares.
    pub annotations: Vec<AnnotationDescription>,
    pub default_value: Option<AnnotationValue>,
    /// True when no registered rule matched the field.
    pub implicit: bool,
}

impl FieldRecord {
    /// The record for a field no rule matched: written as declared.
    #[must_use]
    pub fn implicit(field: &FieldDescription) -> Self {
        Self {
            field: field.clone(),
            annotations: Vec::new(),
            default_value: None,
            implicit: true,
        }
    }

    #[must_use]
    pub fn apply(&self) -> FieldBody {
        let mut body = FieldBody::for_field(&self.field);
        for annotation in &self.annotations {
            if !body
                .annotations
                .iter()
                .any(|existing| existing.annotation_type == annotation.annotation_type)
            {
                body.annotations.push(annotation.clone());
            }
        }
        body.constant = self.default_value.clone();
        body
    }
}
