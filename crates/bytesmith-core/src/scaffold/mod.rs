// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The scaffold pipeline: everything between a type description and the writer.
//!
//! **DDD Context:** Scaffold
//!
//! - [`instrumented`]: the type under construction and its validation
//! - [`method_graph`]: signature families across a type hierarchy
//! - [`method_registry`]: interception rules, prepared and compiled
//! - [`field_registry`]: field rules, prepared and compiled
//! - [`field_locator`]: field lookup for generated accessors
//! - [`type_initializer`]: static and load-time initialization
//! - [`inline`]: rebase resolution for in-place redefinition
//! - [`subclass`]: the builder driving the pipeline for new subclasses

pub mod field_locator;
pub mod field_registry;
pub mod inline;
pub mod instrumented;
pub mod method_graph;
pub mod method_registry;
pub mod subclass;
pub mod type_initializer;

#[cfg(test)]
mod property_tests;

pub use instrumented::{InstrumentedType, TypeValidation};
pub use method_registry::{Entry, Handler, MethodRegistry};
