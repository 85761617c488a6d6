// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method attribute appenders.
//!
//! **DDD Context:** Implementation
//!
//! An attribute appender decides which annotations are written for a method.
//! Factories are registered with interception rules and instantiated once
//! per instrumented type during registry compilation.

use crate::description::{AnnotationDescription, MethodDescription, TypeDescription};
use crate::writer::MethodBody;

/// Creates a [`MethodAttributeAppender`] for an instrumented type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum MethodAttributeAppenderFactory {
    /// Writes no annotations.
    #[default]
    NoOp,
    /// Copies the annotations declared on the instrumented method.
    ForInstrumentedMethod,
    /// Writes a fixed list of annotations.
    Explicit(Vec<AnnotationDescription>),
    Compound(Vec<MethodAttributeAppenderFactory>),
}

impl MethodAttributeAppenderFactory {
    /// An explicit factory reproducing the annotations of `method`.
    #[must_use]
    pub fn of_method(method: &MethodDescription) -> Self {
        MethodAttributeAppenderFactory::Explicit(method.annotations.clone())
    }

    #[must_use]
    pub fn make(&self, instrumented_type: &TypeDescription) -> MethodAttributeAppender {
        match self {
            MethodAttributeAppenderFactory::NoOp => MethodAttributeAppender::NoOp,
            MethodAttributeAppenderFactory::ForInstrumentedMethod => {
                MethodAttributeAppender::ForInstrumentedMethod
            }
            MethodAttributeAppenderFactory::Explicit(annotations) => {
                MethodAttributeAppender::Explicit(annotations.clone())
            }
            MethodAttributeAppenderFactory::Compound(factories) => {
                MethodAttributeAppender::Compound(
                    factories
                        .iter()
                        .map(|factory| factory.make(instrumented_type))
                        .collect(),
                )
            }
        }
    }
}

/// Writes annotations onto a method body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodAttributeAppender {
    NoOp,
    ForInstrumentedMethod,
    Explicit(Vec<AnnotationDescription>),
    Compound(Vec<MethodAttributeAppender>),
}

impl MethodAttributeAppender {
    /// Adds this appender's annotations for `method` to `body`, skipping duplicates.
    pub fn apply(&self, body: &mut MethodBody, method: &MethodDescription) {
        match self {
            MethodAttributeAppender::NoOp => {}
            MethodAttributeAppender::ForInstrumentedMethod => {
                append_all(body, &method.annotations);
            }
            MethodAttributeAppender::Explicit(annotations) => append_all(body, annotations),
            MethodAttributeAppender::Compound(appenders) => {
                for appender in appenders {
                    appender.apply(body, method);
                }
            }
        }
    }
}

fn append_all(body: &mut MethodBody, annotations: &[AnnotationDescription]) {
    for annotation in annotations {
        if !body
            .annotations
            .iter()
            .any(|existing| existing.annotation_type == annotation.annotation_type)
        {
            body.annotations.push(annotation.clone());
        }
    }
}
