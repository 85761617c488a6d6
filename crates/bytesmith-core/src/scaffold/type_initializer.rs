// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Static initializer accumulation.
//!
//! **DDD Context:** Scaffold
//!
//! Two distinct operations meet here. Accumulation appends: code added by
//! [`TypeInitializer::expand_with`] runs after everything added before it.
//! Wrapping prepends: [`TypeInitializer::wrap`] places the accumulated code
//! in front of whatever body the method pool already assigns to `<clinit>`.

use ecow::EcoString;

use crate::bytecode::Code;
use crate::description::{AnnotationValue, MethodDescription};
use crate::error::Result;
use crate::implementation::ByteCodeAppender;
use crate::writer::method_pool::{MethodPool, MethodRecord};
use crate::writer::ClassFile;

/// Code contributed to the static initializer of the instrumented type.
#[derive(Debug, Clone, Default)]
pub enum TypeInitializer {
    /// Nothing to run; wrapping is the identity.
    #[default]
    None,
    Simple(ByteCodeAppender),
}

impl TypeInitializer {
    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(self, TypeInitializer::Simple(_))
    }

    /// Appends `appender` after the code accumulated so far.
    #[must_use]
    pub fn expand_with(self, appender: ByteCodeAppender) -> Self {
        match self {
            TypeInitializer::None => TypeInitializer::Simple(appender),
            TypeInitializer::Simple(existing) => {
                TypeInitializer::Simple(ByteCodeAppender::compound([existing, appender]))
            }
        }
    }

    /// Runs this initializer in front of the body `record` describes.
    pub fn wrap(&self, record: MethodRecord) -> Result<MethodRecord> {
        match self {
            TypeInitializer::None => Ok(record),
            TypeInitializer::Simple(appender) => record.prepend(appender.clone()),
        }
    }

    /// Materialises the accumulated code for `method`; empty when undefined.
    pub fn apply(&self, method: &MethodDescription) -> Result<Code> {
        match self {
            TypeInitializer::None => Ok(Code::default()),
            TypeInitializer::Simple(appender) => appender.apply(method),
        }
    }
}

/// Writes the static initializer into a class file.
pub trait TypeInitializerDrain {
    fn apply(
        &self,
        class_file: &mut ClassFile,
        initializer: &TypeInitializer,
        pool: &dyn MethodPool,
    ) -> Result<()>;
}

/// Wraps whatever the method pool assigns to `<clinit>` with the initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultDrain {
    instrumented_type: EcoString,
}

impl DefaultDrain {
    #[must_use]
    pub fn new(instrumented_type: impl Into<EcoString>) -> Self {
        Self {
            instrumented_type: instrumented_type.into(),
        }
    }
}

impl TypeInitializerDrain for DefaultDrain {
    fn apply(
        &self,
        class_file: &mut ClassFile,
        initializer: &TypeInitializer,
        pool: &dyn MethodPool,
    ) -> Result<()> {
        let method = MethodDescription::type_initializer(self.instrumented_type.clone());
        let record = initializer.wrap(pool.target(&method))?;
        class_file.methods.extend(record.apply()?);
        Ok(())
    }
}

/// Static field assignments performed once the type is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LoadedTypeInitializer {
    #[default]
    NoOp,
    /// Assigns `value` to the static field `field`.
    ForStaticField {
        field: EcoString,
        value: AnnotationValue,
    },
    Compound(Vec<LoadedTypeInitializer>),
}

impl LoadedTypeInitializer {
    /// Combines two initializers, running `self` first.
    #[must_use]
    pub fn and_then(self, next: LoadedTypeInitializer) -> Self {
        match (self, next) {
            (LoadedTypeInitializer::NoOp, other) | (other, LoadedTypeInitializer::NoOp) => other,
            (LoadedTypeInitializer::Compound(mut first), LoadedTypeInitializer::Compound(rest)) => {
                first.extend(rest);
                LoadedTypeInitializer::Compound(first)
            }
            (LoadedTypeInitializer::Compound(mut first), other) => {
                first.push(other);
                LoadedTypeInitializer::Compound(first)
            }
            (first, other) => LoadedTypeInitializer::Compound(vec![first, other]),
        }
    }

    /// Returns true if loading the type requires any action.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match self {
            LoadedTypeInitializer::NoOp => false,
            LoadedTypeInitializer::ForStaticField { .. } => true,
            LoadedTypeInitializer::Compound(parts) => parts.iter().any(Self::is_alive),
        }
    }

    /// Field assignments in execution order.
    #[must_use]
    pub fn assignments(&self) -> Vec<(&EcoString, &AnnotationValue)> {
        match self {
            LoadedTypeInitializer::NoOp => Vec::new(),
            LoadedTypeInitializer::ForStaticField { field, value } => vec![(field, value)],
            LoadedTypeInitializer::Compound(parts) => {
                parts.iter().flat_map(Self::assignments).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Instruction, StackManipulation, StackSize};
    use crate::description::TypeRef;
    use crate::implementation::attribute::MethodAttributeAppender;

    fn push(value: i32) -> ByteCodeAppender {
        ByteCodeAppender::Simple(StackManipulation::compound([
            StackManipulation::int_constant(value),
            StackManipulation::remove(StackSize::Single),
        ]))
    }

    fn clinit() -> MethodDescription {
        MethodDescription::type_initializer("a.Holder")
    }

    #[test]
    fn undefined_initializer_is_noop() {
        let initializer = TypeInitializer::None;
        assert!(!initializer.is_defined());
        assert!(initializer.apply(&clinit()).unwrap().is_empty());
        let record = initializer.wrap(MethodRecord::NonImplemented(clinit())).unwrap();
        assert!(matches!(record, MethodRecord::NonImplemented(_)));
    }

    #[test]
    fn expansion_appends_in_order() {
        let initializer = TypeInitializer::None.expand_with(push(1)).expand_with(push(2));
        assert!(initializer.is_defined());
        let code = initializer.apply(&clinit()).unwrap();
        assert_eq!(
            code.instructions,
            vec![
                Instruction::Iconst(1),
                Instruction::Pop,
                Instruction::Iconst(2),
                Instruction::Pop,
            ]
        );
    }

    #[test]
    fn wrapping_prepends_to_existing_body() {
        let existing = MethodRecord::WithBody {
            method: clinit(),
            appender: ByteCodeAppender::Simple(StackManipulation::method_return(&TypeRef::Void)),
            attributes: MethodAttributeAppender::NoOp,
            visibility: clinit().visibility(),
        };
        let wrapped = TypeInitializer::None.expand_with(push(7)).wrap(existing).unwrap();
        let bodies = wrapped.apply().unwrap();
        let code = bodies[0].code.as_ref().unwrap();
        assert_eq!(
            code.instructions,
            vec![Instruction::Iconst(7), Instruction::Pop, Instruction::Return(None)]
        );
    }

    #[test]
    fn wrapping_non_implemented_adds_return() {
        let wrapped = TypeInitializer::None
            .expand_with(push(3))
            .wrap(MethodRecord::NonImplemented(clinit()))
            .unwrap();
        let bodies = wrapped.apply().unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies[0].code.as_ref().unwrap().instructions.last(),
            Some(&Instruction::Return(None))
        );
    }

    #[test]
    fn loaded_initializers_compose() {
        let field = |name: &str, value: i32| LoadedTypeInitializer::ForStaticField {
            field: name.into(),
            value: AnnotationValue::Int(value),
        };
        let combined = LoadedTypeInitializer::NoOp
            .and_then(field("a", 1))
            .and_then(field("b", 2))
            .and_then(LoadedTypeInitializer::NoOp);
        assert!(combined.is_alive());
        let names: Vec<_> = combined.assignments().into_iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(!LoadedTypeInitializer::Compound(vec![]).is_alive());
    }
}
