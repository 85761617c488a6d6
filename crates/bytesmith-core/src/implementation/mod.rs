// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Code generators for intercepted methods.
//!
//! **DDD Context:** Implementation
//!
//! An [`Implementation`] takes part in two phases:
//! 1. **Prepare**: it may extend the instrumented type, for example with a
//!    field it accesses or a helper method it delegates to.
//! 2. **Compile**: bound to an [`ImplementationTarget`], it becomes a
//!    [`ByteCodeAppender`] that emits the body of every method it answers.
//!
//! Implementations compose: in a [`Implementation::Compound`] every part
//! but the last runs *non-terminally*, leaving the operand stack as it
//! found it, and only the last part returns.

pub mod attribute;
pub mod target;
pub mod transformer;

use std::fmt;
use std::sync::Arc;

use ecow::{EcoString, eco_format};

use crate::bytecode::{Code, InvocationKind, StackManipulation, StackSize};
use crate::description::{
    FieldToken, MethodDescription, MethodToken, Modifiers, STRING, TypePool, TypeRef,
};
use crate::error::{BuildError, Result};
use crate::scaffold::field_locator::FieldLocator;
use crate::scaffold::instrumented::InstrumentedType;

pub use target::{ImplementationTarget, SpecialMethodInvocation, TargetFactory};

const CLASS: &str = "java.lang.Class";
const THROWABLE: &str = "java.lang.Throwable";

/// A constant that can be pushed with a single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Null,
    Int(i32),
    Long(i64),
    Boolean(bool),
    Text(EcoString),
    /// A class literal.
    Type(TypeRef),
}

impl Constant {
    /// Pushes the constant.
    #[must_use]
    pub fn stack(&self) -> StackManipulation {
        match self {
            Constant::Null => StackManipulation::null_constant(),
            Constant::Int(value) => StackManipulation::int_constant(*value),
            Constant::Long(value) => StackManipulation::long_constant(*value),
            Constant::Boolean(value) => StackManipulation::int_constant(i32::from(*value)),
            Constant::Text(value) => StackManipulation::text_constant(value.clone()),
            Constant::Type(ty) => StackManipulation::class_constant(ty),
        }
    }

    /// Returns true if the constant can be stored in a variable of type `ty`.
    #[must_use]
    pub fn is_assignable_to(&self, ty: &TypeRef, pool: &TypePool) -> bool {
        use crate::description::Primitive;
        let erased = ty.erasure();
        match (self, &erased) {
            (Constant::Null, TypeRef::Class(_) | TypeRef::Array(_)) => true,
            (
                Constant::Int(_),
                TypeRef::Primitive(
                    Primitive::Int | Primitive::Short | Primitive::Byte | Primitive::Char,
                ),
            )
            | (Constant::Long(_), TypeRef::Primitive(Primitive::Long))
            | (Constant::Boolean(_), TypeRef::Primitive(Primitive::Boolean)) => true,
            (Constant::Text(_), TypeRef::Class(name)) => pool.is_assignable(name, STRING),
            (Constant::Type(_), TypeRef::Class(name)) => pool.is_assignable(name, CLASS),
            _ => false,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Int(value) => write!(f, "{value}"),
            Constant::Long(value) => write!(f, "{value}L"),
            Constant::Boolean(value) => write!(f, "{value}"),
            Constant::Text(value) => write!(f, "{value:?}"),
            Constant::Type(ty) => write!(f, "{ty}.class"),
        }
    }
}

/// A code generator for intercepted methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Implementation {
    /// Returns the default value of the return type.
    StubValue,
    /// Returns a constant.
    FixedValue(Constant),
    /// Calls the overridden method (or super constructor) with the same arguments.
    SuperMethodCall,
    /// Throws a new exception of the named type.
    ExceptionThrowing {
        exception: EcoString,
        message: Option<EcoString>,
    },
    /// A getter or setter for a field visible in the type hierarchy.
    ///
    /// With `define`, a private field of that type is added during preparation.
    FieldAccessor {
        name: EcoString,
        define: Option<TypeRef>,
    },
    /// Delegates to a private static helper method added during preparation.
    ///
    /// The helper returns `value`.
    InvokeHelper {
        name: EcoString,
        return_type: TypeRef,
        value: Constant,
    },
    /// Runs every part in order; only the last one returns.
    Compound(Vec<Implementation>),
}

impl Implementation {
    /// Adds the members this implementation depends on.
    pub fn prepare(&self, instrumented_type: InstrumentedType) -> Result<InstrumentedType> {
        match self {
            Implementation::FieldAccessor {
                name,
                define: Some(ty),
            } => Ok(instrumented_type.with_field(&FieldToken::new(
                name.clone(),
                Modifiers::PRIVATE,
                ty.clone(),
            ))),
            Implementation::InvokeHelper {
                name, return_type, ..
            } => Ok(instrumented_type.with_method(&helper_token(name, return_type))),
            Implementation::Compound(parts) => parts
                .iter()
                .try_fold(instrumented_type, |ty, part| part.prepare(ty)),
            _ => Ok(instrumented_type),
        }
    }

    /// Binds this implementation to `target`.
    #[must_use]
    pub fn appender(&self, target: &Arc<ImplementationTarget>) -> ByteCodeAppender {
        ByteCodeAppender::ForImplementation {
            implementation: self.clone(),
            target: Arc::clone(target),
        }
    }

    /// Generates the code for `method`.
    ///
    /// A terminal stack returns from the method; a non-terminal one leaves
    /// the operand stack unchanged.
    pub fn stack(
        &self,
        target: &ImplementationTarget,
        method: &MethodDescription,
        terminal: bool,
    ) -> Result<StackManipulation> {
        match self {
            Implementation::StubValue => Ok(if terminal {
                StackManipulation::compound([
                    StackManipulation::default_value(&method.return_type),
                    StackManipulation::method_return(&method.return_type),
                ])
            } else {
                StackManipulation::Trivial
            }),
            Implementation::FixedValue(constant) => {
                fixed_value(target.pool(), constant, method, terminal)
            }
            Implementation::SuperMethodCall => super_method_call(target, method, terminal),
            Implementation::ExceptionThrowing { exception, message } => {
                exception_throwing(target, exception, message.as_ref())
            }
            Implementation::FieldAccessor { name, .. } => {
                field_accessor(target, name, method, terminal)
            }
            Implementation::InvokeHelper {
                name,
                return_type,
                value,
            } => invoke_helper(target, name, return_type, value, method, terminal),
            Implementation::Compound(parts) => {
                let Some((last, init)) = parts.split_last() else {
                    return Err(BuildError::illegal_argument(eco_format!(
                        "an empty compound implementation cannot implement {method}"
                    )));
                };
                let mut stack = Vec::with_capacity(parts.len());
                for part in init {
                    stack.push(part.stack(target, method, false)?);
                }
                stack.push(last.stack(target, method, terminal)?);
                Ok(StackManipulation::compound(stack))
            }
        }
    }
}

fn helper_token(name: &EcoString, return_type: &TypeRef) -> MethodToken {
    MethodToken::new(
        name.clone(),
        Modifiers::PRIVATE | Modifiers::STATIC | Modifiers::SYNTHETIC,
        return_type.clone(),
        vec![],
    )
}

/// Converts the value on top of the stack from `source` to `target`.
///
/// Returns `None` if the assignment is not statically legal.
fn assign(pool: &TypePool, source: &TypeRef, target: &TypeRef) -> Option<StackManipulation> {
    let (source, target) = (source.erasure(), target.erasure());
    if source == target {
        return Some(StackManipulation::Trivial);
    }
    if source.is_primitive() || target.is_primitive() || source.is_void() || target.is_void() {
        return None;
    }
    match (source.raw_name(), target.raw_name()) {
        (Some(from), Some(to)) if pool.is_assignable(to, from) => Some(StackManipulation::Trivial),
        (None, Some(to)) if to.as_str() == crate::description::OBJECT => {
            Some(StackManipulation::Trivial)
        }
        _ => None,
    }
}

/// Returns from the method or, when not terminal, discards a value of `ty`.
fn finish(method: &MethodDescription, ty: &TypeRef, terminal: bool) -> StackManipulation {
    if terminal {
        StackManipulation::method_return(&method.return_type)
    } else {
        StackManipulation::remove(StackSize::of(ty))
    }
}

fn fixed_value(
    pool: &TypePool,
    constant: &Constant,
    method: &MethodDescription,
    terminal: bool,
) -> Result<StackManipulation> {
    if !constant.is_assignable_to(&method.return_type, pool) {
        return Err(BuildError::illegal_argument(eco_format!(
            "cannot return {constant} from {method}"
        )));
    }
    Ok(if terminal {
        StackManipulation::compound([
            constant.stack(),
            StackManipulation::method_return(&method.return_type),
        ])
    } else {
        StackManipulation::Trivial
    })
}

fn super_method_call(
    target: &ImplementationTarget,
    method: &MethodDescription,
    terminal: bool,
) -> Result<StackManipulation> {
    let invocation = target.invoke_super(&method.as_signature_token());
    let Some(invoked) = invocation.method() else {
        return Err(BuildError::illegal_state(eco_format!(
            "cannot call super (or default) method for {method}"
        )));
    };
    Ok(StackManipulation::compound([
        StackManipulation::load_arguments(method, !method.is_static()),
        invocation.stack(),
        finish(method, &invoked.return_type, terminal),
    ]))
}

fn exception_throwing(
    target: &ImplementationTarget,
    exception: &EcoString,
    message: Option<&EcoString>,
) -> Result<StackManipulation> {
    let pool = target.pool();
    let ty = pool.resolve(exception)?;
    if !pool.is_subtype_of(ty, THROWABLE) {
        return Err(BuildError::illegal_argument(eco_format!(
            "{exception} is not a throwable type"
        )));
    }
    let parameters: Vec<TypeRef> = message.iter().map(|_| TypeRef::class(STRING)).collect();
    let Some(constructor) = ty.declared_methods().iter().find(|candidate| {
        candidate.is_constructor()
            && candidate.erased_parameter_types() == parameters
            && candidate.is_visible_to(target.instrumented_type(), pool)
    }) else {
        return Err(BuildError::illegal_argument(eco_format!(
            "{exception} declares no accessible constructor for this message"
        )));
    };
    Ok(StackManipulation::compound([
        StackManipulation::new_instance(exception),
        message.map_or(StackManipulation::Trivial, |text| {
            StackManipulation::text_constant(text.clone())
        }),
        StackManipulation::invoke(constructor, InvocationKind::Special),
        StackManipulation::throw(),
    ]))
}

fn field_accessor(
    target: &ImplementationTarget,
    name: &EcoString,
    method: &MethodDescription,
    terminal: bool,
) -> Result<StackManipulation> {
    let pool = target.pool();
    let instrumented_type = target.instrumented_type();
    let resolution = FieldLocator::for_class_hierarchy(instrumented_type, pool).locate(name);
    let Some(field) = resolution.field() else {
        return Err(BuildError::illegal_argument(eco_format!(
            "no unique field `{name}` is visible from {}",
            instrumented_type.name
        )));
    };
    if method.is_static() && !field.is_static() {
        return Err(BuildError::illegal_argument(eco_format!(
            "cannot access instance field `{name}` from static {method}"
        )));
    }
    let receiver = if field.is_static() {
        StackManipulation::Trivial
    } else {
        StackManipulation::load_this()
    };
    let illegal_assignment = || {
        BuildError::illegal_argument(eco_format!(
            "field `{name}` of type {} does not fit {method}",
            field.type_ref
        ))
    };
    match method.parameters.as_slice() {
        [] if !method.return_type.is_void() => {
            if !terminal {
                return Ok(StackManipulation::Trivial);
            }
            let conversion = assign(pool, &field.type_ref, &method.return_type)
                .ok_or_else(illegal_assignment)?;
            Ok(StackManipulation::compound([
                receiver,
                StackManipulation::field_get(field),
                conversion,
                StackManipulation::method_return(&method.return_type),
            ]))
        }
        [parameter] if method.return_type.is_void() => {
            if field.is_final() {
                return Err(BuildError::illegal_argument(eco_format!(
                    "cannot set final field `{name}`"
                )));
            }
            let conversion = assign(pool, &parameter.type_ref, &field.type_ref)
                .ok_or_else(illegal_assignment)?;
            Ok(StackManipulation::compound([
                receiver,
                StackManipulation::load(&parameter.type_ref, method.parameter_offset(0)),
                conversion,
                StackManipulation::field_put(field),
                if terminal {
                    StackManipulation::method_return(&TypeRef::Void)
                } else {
                    StackManipulation::Trivial
                },
            ]))
        }
        _ => Err(BuildError::illegal_argument(eco_format!(
            "{method} is neither a getter nor a setter for field `{name}`"
        ))),
    }
}

fn invoke_helper(
    target: &ImplementationTarget,
    name: &EcoString,
    return_type: &TypeRef,
    value: &Constant,
    method: &MethodDescription,
    terminal: bool,
) -> Result<StackManipulation> {
    let pool = target.pool();
    let instrumented_type = target.instrumented_type();
    if !value.is_assignable_to(return_type, pool) {
        return Err(BuildError::illegal_argument(eco_format!(
            "helper `{name}` cannot return {value}"
        )));
    }
    let helper =
        MethodDescription::latent(&instrumented_type.name, &helper_token(name, return_type));
    if *method == helper {
        return Ok(StackManipulation::compound([
            value.stack(),
            StackManipulation::method_return(return_type),
        ]));
    }
    let call = StackManipulation::invoke(&helper, InvocationKind::Static);
    if !terminal || method.return_type.is_void() {
        return Ok(StackManipulation::compound([
            call,
            StackManipulation::remove(StackSize::of(return_type)),
            if terminal {
                StackManipulation::method_return(&TypeRef::Void)
            } else {
                StackManipulation::Trivial
            },
        ]));
    }
    let conversion = assign(pool, return_type, &method.return_type).ok_or_else(|| {
        BuildError::illegal_argument(eco_format!(
            "helper `{name}` returns {return_type}, which does not fit {method}"
        ))
    })?;
    Ok(StackManipulation::compound([
        call,
        conversion,
        finish(method, return_type, true),
    ]))
}

/// Emits the body of a method.
#[derive(Debug, Clone)]
pub enum ByteCodeAppender {
    /// A fixed sequence of instructions.
    Simple(StackManipulation),
    /// An implementation bound to its target.
    ForImplementation {
        implementation: Implementation,
        target: Arc<ImplementationTarget>,
    },
    /// Appenders applied in order.
    Compound(Vec<ByteCodeAppender>),
}

impl ByteCodeAppender {
    /// Combines appenders, flattening nested compounds.
    #[must_use]
    pub fn compound(appenders: impl IntoIterator<Item = ByteCodeAppender>) -> Self {
        let mut flattened = Vec::new();
        for appender in appenders {
            match appender {
                ByteCodeAppender::Compound(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }
        ByteCodeAppender::Compound(flattened)
    }

    /// Generates code for `method`.
    ///
    /// Fails if any part produces an illegal stack manipulation.
    pub fn apply(&self, method: &MethodDescription) -> Result<Code> {
        match self {
            ByteCodeAppender::Simple(stack) => code_for(stack, method),
            ByteCodeAppender::ForImplementation {
                implementation,
                target,
            } => code_for(&implementation.stack(target, method, true)?, method),
            ByteCodeAppender::Compound(appenders) => {
                let frame = Code {
                    max_locals: method.stack_size(),
                    ..Code::default()
                };
                appenders.iter().try_fold(frame, |code, appender| {
                    Ok(code.then(appender.apply(method)?))
                })
            }
        }
    }
}

fn code_for(stack: &StackManipulation, method: &MethodDescription) -> Result<Code> {
    if !stack.is_valid() {
        return Err(BuildError::illegal_state(eco_format!(
            "cannot generate valid code for {method}"
        )));
    }
    Ok(Code::of(stack, method.stack_size()))
}
