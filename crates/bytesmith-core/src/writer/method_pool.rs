// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Method pool records.
//!
//! **DDD Context:** Class Writing
//!
//! A [`MethodRecord`] is the writer-facing answer to "what is written for
//! this method". Records are produced by a compiled method registry and
//! consumed once by the type writer; the type initializer drain may
//! [`prepend`](MethodRecord::prepend) code to the `<clinit>` record first.

use ecow::{EcoString, eco_format};
use indexmap::IndexSet;

use crate::bytecode::{InvocationKind, StackManipulation};
use crate::description::{
    AnnotationValue, MethodDescription, Modifiers, ParameterDescription, TypeToken, Visibility,
};
use crate::error::{BuildError, Result};
use crate::implementation::ByteCodeAppender;
use crate::implementation::attribute::MethodAttributeAppender;

use super::MethodBody;

/// Answers the record for any method of the instrumented type.
pub trait MethodPool {
    /// Unknown methods yield [`MethodRecord::NonImplemented`].
    fn target(&self, method: &MethodDescription) -> MethodRecord;
}

/// What a record contributes to the class file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordSort {
    /// Nothing is written.
    Skipped,
    /// A declaration without code.
    Defined,
    /// A declaration with code.
    Implemented,
}

impl RecordSort {
    #[must_use]
    pub fn is_defined(self) -> bool {
        !matches!(self, RecordSort::Skipped)
    }

    #[must_use]
    pub fn is_implemented(self) -> bool {
        matches!(self, RecordSort::Implemented)
    }
}

/// The writer's plan for one method.
#[derive(Debug, Clone)]
pub enum MethodRecord {
    /// The method is not written.
    NonImplemented(MethodDescription),
    /// Written as an abstract declaration.
    WithoutBody {
        method: MethodDescription,
        attributes: MethodAttributeAppender,
        visibility: Visibility,
    },
    /// Written with code produced by `appender`.
    WithBody {
        method: MethodDescription,
        appender: ByteCodeAppender,
        attributes: MethodAttributeAppender,
        visibility: Visibility,
    },
    /// An annotation element with a default value.
    AnnotationDefault {
        method: MethodDescription,
        value: AnnotationValue,
        attributes: MethodAttributeAppender,
    },
    /// Redeclares `target` on the instrumented type, forwarding to the superclass.
    VisibilityBridge {
        bridge: MethodDescription,
        target: MethodDescription,
        super_type: EcoString,
        attributes: MethodAttributeAppender,
    },
    /// Writes `delegate` plus one bridge per erased signature in `bridge_types`.
    AccessBridgeWrapper {
        delegate: Box<MethodRecord>,
        instrumented_type: EcoString,
        invocation: InvocationKind,
        bridge_target: MethodDescription,
        bridge_types: IndexSet<TypeToken>,
        attributes: MethodAttributeAppender,
    },
}

impl MethodRecord {
    #[must_use]
    pub fn sort(&self) -> RecordSort {
        match self {
            MethodRecord::NonImplemented(_) => RecordSort::Skipped,
            MethodRecord::WithoutBody { .. } | MethodRecord::AnnotationDefault { .. } => {
                RecordSort::Defined
            }
            MethodRecord::WithBody { .. } | MethodRecord::VisibilityBridge { .. } => {
                RecordSort::Implemented
            }
            MethodRecord::AccessBridgeWrapper { delegate, .. } => delegate.sort(),
        }
    }

    /// The method this record writes.
    #[must_use]
    pub fn method(&self) -> &MethodDescription {
        match self {
            MethodRecord::NonImplemented(method)
            | MethodRecord::WithoutBody { method, .. }
            | MethodRecord::WithBody { method, .. }
            | MethodRecord::AnnotationDefault { method, .. } => method,
            MethodRecord::VisibilityBridge { bridge, .. } => bridge,
            MethodRecord::AccessBridgeWrapper { delegate, .. } => delegate.method(),
        }
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        match self {
            MethodRecord::WithoutBody { visibility, .. }
            | MethodRecord::WithBody { visibility, .. } => *visibility,
            MethodRecord::AccessBridgeWrapper { delegate, .. } => delegate.visibility(),
            other => other.method().visibility(),
        }
    }

    /// Runs `appender` before the code of this record.
    ///
    /// A skipped record becomes a body returning the default value of the
    /// method's return type. Records without code of their own cannot be
    /// prepended to.
    pub fn prepend(self, appender: ByteCodeAppender) -> Result<MethodRecord> {
        match self {
            MethodRecord::NonImplemented(method) => {
                let tail = ByteCodeAppender::Simple(StackManipulation::compound([
                    StackManipulation::default_value(&method.return_type),
                    StackManipulation::method_return(&method.return_type),
                ]));
                Ok(MethodRecord::WithBody {
                    visibility: method.visibility(),
                    appender: ByteCodeAppender::compound([appender, tail]),
                    attributes: MethodAttributeAppender::NoOp,
                    method,
                })
            }
            MethodRecord::WithBody {
                method,
                appender: existing,
                attributes,
                visibility,
            } => Ok(MethodRecord::WithBody {
                method,
                appender: ByteCodeAppender::compound([appender, existing]),
                attributes,
                visibility,
            }),
            MethodRecord::AccessBridgeWrapper {
                delegate,
                instrumented_type,
                invocation,
                bridge_target,
                bridge_types,
                attributes,
            } => Ok(MethodRecord::AccessBridgeWrapper {
                delegate: Box::new(delegate.prepend(appender)?),
                instrumented_type,
                invocation,
                bridge_target,
                bridge_types,
                attributes,
            }),
            other => Err(BuildError::illegal_state(eco_format!(
                "cannot prepend code to {}, which has no code of its own",
                other.method()
            ))),
        }
    }

    /// Materialises the record into method bodies.
    pub fn apply(&self) -> Result<Vec<MethodBody>> {
        match self {
            MethodRecord::NonImplemented(_) => Ok(Vec::new()),
            MethodRecord::WithoutBody {
                method,
                attributes,
                visibility,
            } => {
                let mut body =
                    MethodBody::for_method(method, actual_modifiers(method, *visibility, false));
                attributes.apply(&mut body, method);
                Ok(vec![body])
            }
            MethodRecord::WithBody {
                method,
                appender,
                attributes,
                visibility,
            } => {
                let mut body =
                    MethodBody::for_method(method, actual_modifiers(method, *visibility, true));
                attributes.apply(&mut body, method);
                body.code = Some(appender.apply(method)?);
                Ok(vec![body])
            }
            MethodRecord::AnnotationDefault {
                method,
                value,
                attributes,
            } => {
                let mut body = MethodBody::for_method(
                    method,
                    actual_modifiers(method, method.visibility(), false),
                );
                attributes.apply(&mut body, method);
                body.default_value = Some(value.clone());
                Ok(vec![body])
            }
            MethodRecord::VisibilityBridge {
                bridge,
                target,
                super_type,
                attributes,
            } => {
                let mut body = MethodBody::for_method(bridge, bridge.modifiers);
                attributes.apply(&mut body, bridge);
                let stack = StackManipulation::compound([
                    StackManipulation::load_arguments(bridge, true),
                    StackManipulation::invoke_on(target, super_type, InvocationKind::Special),
                    StackManipulation::method_return(&bridge.return_type),
                ]);
                body.code = Some(ByteCodeAppender::Simple(stack).apply(bridge)?);
                Ok(vec![body])
            }
            MethodRecord::AccessBridgeWrapper {
                delegate,
                instrumented_type,
                invocation,
                bridge_target,
                bridge_types,
                attributes,
            } => {
                let mut bodies = delegate.apply()?;
                let modifiers = (delegate.method().modifiers
                    | Modifiers::BRIDGE
                    | Modifiers::SYNTHETIC)
                    - (Modifiers::ABSTRACT | Modifiers::NATIVE);
                for token in bridge_types {
                    let bridge = access_bridge(instrumented_type, bridge_target, token, modifiers);
                    let mut body = MethodBody::for_method(&bridge, bridge.modifiers);
                    attributes.apply(&mut body, &bridge);
                    let stack =
                        bridge_stack(&bridge, bridge_target, instrumented_type, *invocation);
                    body.code = Some(ByteCodeAppender::Simple(stack).apply(&bridge)?);
                    bodies.push(body);
                }
                Ok(bodies)
            }
        }
    }
}

/// Modifiers written for a method: implementation state decides `abstract`,
/// visibility is widened to the record's visibility.
fn actual_modifiers(
    method: &MethodDescription,
    visibility: Visibility,
    implemented: bool,
) -> Modifiers {
    let modifiers = if implemented {
        method.modifiers - (Modifiers::ABSTRACT | Modifiers::NATIVE)
    } else {
        (method.modifiers | Modifiers::ABSTRACT) - Modifiers::NATIVE
    };
    modifiers.with_visibility(method.visibility().expand_to(visibility))
}

fn access_bridge(
    instrumented_type: &EcoString,
    target: &MethodDescription,
    token: &TypeToken,
    modifiers: Modifiers,
) -> MethodDescription {
    let mut bridge = MethodDescription::new(
        instrumented_type.clone(),
        target.name.clone(),
        modifiers,
        token.return_type.clone(),
    );
    bridge.parameters = token
        .parameter_types
        .iter()
        .cloned()
        .map(ParameterDescription::of)
        .collect();
    bridge.exceptions = target.exceptions.clone();
    bridge
}

/// Loads every bridge argument cast to the target's parameter type and
/// dispatches to the target.
fn bridge_stack(
    bridge: &MethodDescription,
    target: &MethodDescription,
    instrumented_type: &str,
    invocation: InvocationKind,
) -> StackManipulation {
    let arguments = bridge.parameters.iter().zip(&target.parameters).enumerate().map(
        |(index, (parameter, target_parameter))| {
            StackManipulation::compound([
                StackManipulation::load(&parameter.type_ref, bridge.parameter_offset(index)),
                StackManipulation::checked_cast(&target_parameter.type_ref),
            ])
        },
    );
    StackManipulation::compound(
        std::iter::once(StackManipulation::load_this())
            .chain(arguments)
            .chain([
                StackManipulation::invoke_on(target, instrumented_type, invocation),
                StackManipulation::method_return(&bridge.return_type),
            ]),
    )
}
