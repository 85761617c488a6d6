// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Rebase resolution: where an original method body lives after redefinition.
//!
//! **DDD Context:** Scaffold — Inline
//!
//! When a redefined type replaces a method but must keep calling the
//! original code, the original is moved to a synthetic private method.
//! Ordinary methods are renamed. Constructors cannot be renamed, so their
//! copy gains a trailing parameter of a placeholder type instead; callers
//! pass `null` for it. The placeholder type is created once per resolver
//! and must be written alongside the redefined type.

use std::collections::{HashMap, HashSet};

use ecow::{EcoString, eco_format};
use indexmap::IndexMap;
use tracing::debug;

use crate::bytecode::StackManipulation;
use crate::config::ClassFileVersion;
use crate::description::{
    MethodDescription, MethodToken, Modifiers, ParameterDescription, SignatureToken,
    TypeDescription, TypeRef,
};
use crate::error::{BuildError, Result};
use crate::implementation::transformer::{MethodNameTransformer, digest};
use crate::writer::DynamicType;

/// How one original method is reached after rebasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The method keeps its identity; nothing was moved.
    Preserved(MethodDescription),
    /// The original body lives in a renamed synthetic method.
    RebasedMethod(MethodDescription),
    /// The original body lives in a constructor taking an extra placeholder argument.
    RebasedConstructor {
        constructor: MethodDescription,
        placeholder: EcoString,
    },
}

impl Resolution {
    #[must_use]
    pub fn is_rebased(&self) -> bool {
        !matches!(self, Resolution::Preserved(_))
    }

    /// The method a caller of the original must invoke.
    #[must_use]
    pub fn resolved_method(&self) -> &MethodDescription {
        match self {
            Resolution::Preserved(method) | Resolution::RebasedMethod(method) => method,
            Resolution::RebasedConstructor { constructor, .. } => constructor,
        }
    }

    /// Arguments to push after the original arguments.
    ///
    /// Asking a preserved resolution is a usage error.
    pub fn additional_arguments(&self) -> Result<StackManipulation> {
        match self {
            Resolution::Preserved(method) => Err(BuildError::illegal_state(eco_format!(
                "cannot process additional arguments for non-rebased method: {method}"
            ))),
            Resolution::RebasedMethod(_) => Ok(StackManipulation::Trivial),
            Resolution::RebasedConstructor { .. } => Ok(StackManipulation::null_constant()),
        }
    }

    fn for_method(
        instrumented_type: &TypeDescription,
        method: &MethodDescription,
        transformer: &MethodNameTransformer,
    ) -> Self {
        let kept = method.modifiers & (Modifiers::STATIC | Modifiers::NATIVE);
        let visibility = if instrumented_type.is_interface() {
            Modifiers::PUBLIC
        } else {
            Modifiers::PRIVATE
        };
        let mut rebased = MethodDescription::new(
            instrumented_type.name.clone(),
            transformer.transform(method),
            Modifiers::SYNTHETIC | kept | visibility,
            method.return_type.erasure(),
        )
        .with_parameters(method.erased_parameter_types())
        .with_exceptions(method.exceptions.iter().map(TypeRef::erasure).collect());
        for (parameter, original) in rebased.parameters.iter_mut().zip(&method.parameters) {
            parameter.name.clone_from(&original.name);
        }
        Resolution::RebasedMethod(rebased)
    }

    fn for_constructor(constructor: &MethodDescription, placeholder: &EcoString) -> Self {
        let mut rebased = MethodDescription::constructor(
            constructor.declaring_type.clone(),
            Modifiers::SYNTHETIC | Modifiers::PRIVATE,
            constructor.erased_parameter_types(),
        )
        .with_exceptions(constructor.exceptions.iter().map(TypeRef::erasure).collect());
        rebased
            .parameters
            .push(ParameterDescription::of(TypeRef::Class(placeholder.clone())));
        Resolution::RebasedConstructor {
            constructor: rebased,
            placeholder: placeholder.clone(),
        }
    }
}

/// The disabled resolver; every method is preserved.
pub const DISABLED: MethodRebaseResolver = MethodRebaseResolver::Disabled;

/// Maps the methods of a redefined type to their rebase resolutions.
#[derive(Debug, Clone, Default)]
pub enum MethodRebaseResolver {
    #[default]
    Disabled,
    Default {
        resolutions: IndexMap<MethodDescription, Resolution>,
        auxiliary_types: Vec<DynamicType>,
    },
}

impl MethodRebaseResolver {
    /// Plans the rebasing of every declared method whose token is in `rebaseable`.
    #[must_use]
    pub fn make(
        instrumented_type: &TypeDescription,
        rebaseable: &HashSet<MethodToken>,
        class_file_version: ClassFileVersion,
        auxiliary_suffix: &str,
        transformer: &MethodNameTransformer,
    ) -> Self {
        let mut placeholder: Option<TypeDescription> = None;
        let mut resolutions = IndexMap::new();
        for method in instrumented_type.declared_methods() {
            if !rebaseable.contains(&method.as_token()) {
                continue;
            }
            let resolution = if method.is_constructor() {
                let placeholder = placeholder.get_or_insert_with(|| {
                    placeholder_type(instrumented_type, auxiliary_suffix)
                });
                Resolution::for_constructor(method, &placeholder.name)
            } else {
                Resolution::for_method(instrumented_type, method, transformer)
            };
            debug!(
                method = %method,
                resolved = %resolution.resolved_method().name,
                "rebased"
            );
            resolutions.insert(method.clone(), resolution);
        }
        MethodRebaseResolver::Default {
            resolutions,
            auxiliary_types: placeholder
                .map(|ty| DynamicType::auxiliary(ty, class_file_version))
                .into_iter()
                .collect(),
        }
    }

    /// The resolution of `method`; unknown methods are preserved.
    #[must_use]
    pub fn resolve(&self, method: &MethodDescription) -> Resolution {
        match self {
            MethodRebaseResolver::Default { resolutions, .. } => resolutions.get(method),
            MethodRebaseResolver::Disabled => None,
        }
        .cloned()
        .unwrap_or_else(|| Resolution::Preserved(method.clone()))
    }

    /// Types that must be written together with the rebased type.
    #[must_use]
    pub fn auxiliary_types(&self) -> &[DynamicType] {
        match self {
            MethodRebaseResolver::Default {
                auxiliary_types, ..
            } => auxiliary_types,
            MethodRebaseResolver::Disabled => &[],
        }
    }

    /// Resolutions keyed by the signature of the original method.
    #[must_use]
    pub fn as_token_map(&self) -> HashMap<SignatureToken, Resolution> {
        match self {
            MethodRebaseResolver::Default { resolutions, .. } => resolutions
                .iter()
                .map(|(method, resolution)| (method.as_signature_token(), resolution.clone()))
                .collect(),
            MethodRebaseResolver::Disabled => HashMap::new(),
        }
    }
}

fn placeholder_type(instrumented_type: &TypeDescription, suffix: &str) -> TypeDescription {
    let digest = digest(&[instrumented_type.name.as_str(), suffix]);
    TypeDescription::class(
        eco_format!("{}${suffix}${digest}", instrumented_type.name),
        Modifiers::SYNTHETIC,
        TypeRef::object(),
    )
}
