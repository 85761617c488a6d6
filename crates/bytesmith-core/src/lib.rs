// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Bytesmith class synthesis core.
//!
//! This crate computes the method table of a type under construction and
//! binds every entry to the code generator that answers it:
//! - Entity model (types, methods, fields and their detached tokens)
//! - Method graph compilation across a type hierarchy
//! - Method registry (ordered interception rules, first match wins)
//! - Rebase resolution, field location and type initializers
//! - A symbolic class writer consuming the compiled registry
//!
//! The pipeline is synchronous and allocation-driven: every registry
//! transition returns a new value, so independent builds never share
//! mutable state.

pub mod bytecode;
pub mod config;
pub mod description;
pub mod error;
pub mod implementation;
pub mod matcher;
pub mod scaffold;
pub mod writer;

pub use error::{BuildError, Result, ValidationError};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::config::{BuildConfig, ClassFileVersion};
    pub use crate::description::{
        FieldDescription, FieldToken, MethodDescription, MethodToken, Modifiers, TypeDescription,
        TypePool, TypeRef, Visibility,
    };
    pub use crate::implementation::Implementation;
    pub use crate::matcher::{LatentMatcher, MethodMatcher};
    pub use crate::scaffold::subclass::SubclassBuilder;
    pub use crate::writer::DynamicType;
}
