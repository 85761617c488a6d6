// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The field registry: rules that decorate declared fields.
//!
//! **DDD Context:** Scaffold
//!
//! Rules are prepended, so the most recently registered rule is consulted
//! first. A field no rule matches is written as declared.

use std::sync::Arc;

use ecow::eco_format;
use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

use crate::description::{AnnotationDescription, AnnotationValue, FieldDescription};
use crate::error::{BuildError, Result};
use crate::implementation::transformer::FieldTransformer;
use crate::matcher::FieldMatcher;
use crate::writer::field_pool::{FieldPool, FieldRecord};

use super::instrumented::InstrumentedType;

/// One field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    pub matcher: FieldMatcher,
    pub annotations: Vec<AnnotationDescription>,
    /// Constant value for static fields.
    pub default_value: Option<AnnotationValue>,
    pub transformer: FieldTransformer,
}

impl FieldEntry {
    #[must_use]
    pub fn new(matcher: FieldMatcher) -> Self {
        Self {
            matcher,
            annotations: Vec::new(),
            default_value: None,
            transformer: FieldTransformer::NoOp,
        }
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

    #[must_use]
    pub fn with_transformer(mut self, transformer: FieldTransformer) -> Self {
        self.transformer = transformer;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    entries: Vec<Arc<FieldEntry>>,
}

impl FieldRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry in which `entry` is consulted before every existing rule.
    #[must_use]
    pub fn prepend(&self, entry: FieldEntry) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.push(Arc::new(entry));
        entries.extend(self.entries.iter().cloned());
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binds every declared field of `instrumented_type` to its first matching rule.
    ///
    /// Default values must fit a static field of a compatible type.
    #[instrument(skip_all, fields(ty = %instrumented_type.name(), entries = self.entries.len()))]
    pub fn prepare(&self, instrumented_type: &InstrumentedType) -> Result<PreparedFieldRegistry> {
        let mut bindings = IndexMap::new();
        for field in instrumented_type.description().declared_fields() {
            let Some(entry) = self.entries.iter().find(|entry| entry.matcher.matches(field)) else {
                trace!(field = %field, "no field rule matched");
                continue;
            };
            let transformed = entry.transformer.transform(field);
            if let Some(value) = &entry.default_value {
                if !transformed.is_static() {
                    return Err(BuildError::illegal_argument(eco_format!(
                        "cannot define a default value for non-static field {transformed}"
                    )));
                }
                if !value.is_compatible_with(&transformed.type_ref) {
                    return Err(BuildError::illegal_argument(eco_format!(
                        "{value} is not a valid default value for {transformed}"
                    )));
                }
            }
            bindings.insert(field.clone(), (Arc::clone(entry), transformed));
        }
        debug!(bound = bindings.len(), "field registry prepared");
        Ok(PreparedFieldRegistry { bindings })
    }
}

/// Fields bound to their rules.
#[derive(Debug, Clone)]
pub struct PreparedFieldRegistry {
    bindings: IndexMap<FieldDescription, (Arc<FieldEntry>, FieldDescription)>,
}

impl PreparedFieldRegistry {
    /// The rule bound to `field`, if any.
    #[must_use]
    pub fn entry(&self, field: &FieldDescription) -> Option<&FieldEntry> {
        self.bindings.get(field).map(|(entry, _)| entry.as_ref())
    }

    #[must_use]
    pub fn compile(&self) -> CompiledFieldRegistry {
        let records = self
            .bindings
            .iter()
            .map(|(field, (entry, transformed))| {
                let record = FieldRecord {
                    field: transformed.clone(),
                    annotations: entry.annotations.clone(),
                    default_value: entry.default_value.clone(),
                    implicit: false,
                };
                (field.clone(), record)
            })
            .collect();
        CompiledFieldRegistry { records }
    }
}

/// Answers [`FieldPool::target`] for the writer.
#[derive(Debug, Clone)]
pub struct CompiledFieldRegistry {
    records: IndexMap<FieldDescription, FieldRecord>,
}

impl FieldPool for CompiledFieldRegistry {
    fn target(&self, field: &FieldDescription) -> FieldRecord {
        self.records
            .get(field)
            .cloned()
            .unwrap_or_else(|| FieldRecord::implicit(field))
    }
}
