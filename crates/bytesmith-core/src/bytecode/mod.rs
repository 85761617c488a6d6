// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Symbolic bytecode primitives.
//!
//! **DDD Context:** Bytecode
//!
//! Code generators compose [`StackManipulation`]s; applying one appends its
//! instructions to a buffer and reports the resulting [`Size`], from which
//! the maximal operand stack of a method is derived.

pub mod array_access;
pub mod instruction;

use ecow::EcoString;

use crate::description::{FieldDescription, MethodDescription, TypeRef};
use crate::description::types::internal_name;

pub use array_access::ArrayAccess;
pub use instruction::{ArraySort, Instruction, InvocationKind, MemberRef, ValueKind};

/// Number of operand stack slots a value occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackSize {
    Zero,
    Single,
    Double,
}

impl StackSize {
    /// The stack size of a value of `ty`.
    #[must_use]
    pub fn of(ty: &TypeRef) -> Self {
        match ty.stack_slots() {
            0 => StackSize::Zero,
            1 => StackSize::Single,
            _ => StackSize::Double,
        }
    }

    #[must_use]
    pub fn slots(self) -> i32 {
        match self {
            StackSize::Zero => 0,
            StackSize::Single => 1,
            StackSize::Double => 2,
        }
    }

    /// A size that pushes this many slots.
    #[must_use]
    pub fn to_increasing_size(self) -> Size {
        Size::new(self.slots(), self.slots())
    }

    /// A size that pops this many slots.
    #[must_use]
    pub fn to_decreasing_size(self) -> Size {
        Size::new(-self.slots(), 0)
    }
}

/// The effect of code on the operand stack.
///
/// `impact` is the net change, `maximal` the peak reached relative to the
/// stack height before the code ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub impact: i32,
    pub maximal: i32,
}

impl Size {
    pub const ZERO: Size = Size {
        impact: 0,
        maximal: 0,
    };

    #[must_use]
    pub fn new(impact: i32, maximal: i32) -> Self {
        Self { impact, maximal }
    }

    /// Sequential composition: `self` followed by `next`.
    #[must_use]
    pub fn aggregate(self, next: Size) -> Size {
        Size {
            impact: self.impact + next.impact,
            maximal: self.maximal.max(self.impact + next.maximal),
        }
    }
}

/// Generated code for one method body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Code {
    pub instructions: Vec<Instruction>,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl Code {
    /// Runs `manipulation` against an empty buffer for a method with `locals` slots.
    #[must_use]
    pub fn of(manipulation: &StackManipulation, locals: u16) -> Self {
        let mut instructions = Vec::new();
        let size = manipulation.apply(&mut instructions);
        Self {
            instructions,
            max_stack: u16::try_from(size.maximal.max(0)).unwrap_or(u16::MAX),
            max_locals: locals,
        }
    }

    /// Places `self` before `next`, keeping the larger frame.
    #[must_use]
    pub fn then(mut self, next: Code) -> Code {
        self.instructions.extend(next.instructions);
        self.max_stack = self.max_stack.max(next.max_stack);
        self.max_locals = self.max_locals.max(next.max_locals);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// A composable unit of code with a known stack effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StackManipulation {
    /// Emits nothing.
    Trivial,
    /// Cannot be expressed; the enclosing code is invalid.
    Illegal,
    /// A single instruction and its stack effect.
    Op { instruction: Instruction, size: Size },
    /// Manipulations applied in order.
    Compound(Vec<StackManipulation>),
}

impl StackManipulation {
    fn op(instruction: Instruction, size: Size) -> Self {
        StackManipulation::Op { instruction, size }
    }

    /// Flattens the given manipulations into one.
    #[must_use]
    pub fn compound(manipulations: impl IntoIterator<Item = StackManipulation>) -> Self {
        let mut flattened = Vec::new();
        for manipulation in manipulations {
            match manipulation {
                StackManipulation::Trivial => {}
                StackManipulation::Compound(inner) => flattened.extend(inner),
                other => flattened.push(other),
            }
        }
        StackManipulation::Compound(flattened)
    }

    /// Returns false if any part is [`StackManipulation::Illegal`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            StackManipulation::Illegal => false,
            StackManipulation::Compound(parts) => parts.iter().all(StackManipulation::is_valid),
            _ => true,
        }
    }

    /// Appends the instructions to `code` and returns the stack effect.
    pub fn apply(&self, code: &mut Vec<Instruction>) -> Size {
        match self {
            StackManipulation::Trivial | StackManipulation::Illegal => Size::ZERO,
            StackManipulation::Op { instruction, size } => {
                code.push(instruction.clone());
                *size
            }
            StackManipulation::Compound(parts) => parts
                .iter()
                .fold(Size::ZERO, |size, part| size.aggregate(part.apply(code))),
        }
    }

    // ------------------------------------------------------------------
    // Constants
    // ------------------------------------------------------------------

    /// Pushes `null`.
    #[must_use]
    pub fn null_constant() -> Self {
        Self::op(Instruction::AconstNull, StackSize::Single.to_increasing_size())
    }

    #[must_use]
    pub fn int_constant(value: i32) -> Self {
        Self::op(Instruction::Iconst(value), StackSize::Single.to_increasing_size())
    }

    #[must_use]
    pub fn long_constant(value: i64) -> Self {
        Self::op(Instruction::Lconst(value), StackSize::Double.to_increasing_size())
    }

    #[must_use]
    pub fn text_constant(value: impl Into<EcoString>) -> Self {
        Self::op(Instruction::Ldc(value.into()), StackSize::Single.to_increasing_size())
    }

    #[must_use]
    pub fn class_constant(ty: &TypeRef) -> Self {
        match ty.erasure().raw_name() {
            Some(name) => Self::op(
                Instruction::LdcType(internal_name(name).into()),
                StackSize::Single.to_increasing_size(),
            ),
            None => StackManipulation::Illegal,
        }
    }

    /// Pushes the zero value of `ty`; trivial for `void`.
    #[must_use]
    pub fn default_value(ty: &TypeRef) -> Self {
        match ValueKind::of(ty) {
            None => StackManipulation::Trivial,
            Some(ValueKind::Reference) => Self::null_constant(),
            Some(ValueKind::Long) => Self::long_constant(0),
            Some(ValueKind::Int) => Self::int_constant(0),
            Some(kind @ (ValueKind::Float | ValueKind::Double)) => Self::op(
                Instruction::FloatingZero(kind),
                kind.stack_size().to_increasing_size(),
            ),
        }
    }

    // ------------------------------------------------------------------
    // Stack shuffling
    // ------------------------------------------------------------------

    #[must_use]
    pub fn duplicate(size: StackSize) -> Self {
        match size {
            StackSize::Zero => StackManipulation::Trivial,
            StackSize::Single => Self::op(Instruction::Dup, size.to_increasing_size()),
            StackSize::Double => Self::op(Instruction::Dup2, size.to_increasing_size()),
        }
    }

    #[must_use]
    pub fn remove(size: StackSize) -> Self {
        match size {
            StackSize::Zero => StackManipulation::Trivial,
            StackSize::Single => Self::op(Instruction::Pop, size.to_decreasing_size()),
            StackSize::Double => Self::op(Instruction::Pop2, size.to_decreasing_size()),
        }
    }

    // ------------------------------------------------------------------
    // Local variables and returns
    // ------------------------------------------------------------------

    /// Loads the local variable of type `ty` at `offset`.
    #[must_use]
    pub fn load(ty: &TypeRef, offset: u16) -> Self {
        match ValueKind::of(ty) {
            Some(kind) => Self::op(
                Instruction::Load { kind, offset },
                kind.stack_size().to_increasing_size(),
            ),
            None => StackManipulation::Illegal,
        }
    }

    /// Loads `this`.
    #[must_use]
    pub fn load_this() -> Self {
        Self::op(
            Instruction::Load {
                kind: ValueKind::Reference,
                offset: 0,
            },
            StackSize::Single.to_increasing_size(),
        )
    }

    /// Loads every parameter of `method`, optionally preceded by `this`.
    #[must_use]
    pub fn load_arguments(method: &MethodDescription, with_this: bool) -> Self {
        let receiver = with_this.then(Self::load_this);
        Self::compound(receiver.into_iter().chain(
            method.parameters.iter().enumerate().map(|(index, parameter)| {
                Self::load(&parameter.type_ref, method.parameter_offset(index))
            }),
        ))
    }

    /// Returns a value of `ty` (or `void`).
    #[must_use]
    pub fn method_return(ty: &TypeRef) -> Self {
        let kind = ValueKind::of(ty);
        let size = kind.map_or(StackSize::Zero, ValueKind::stack_size);
        Self::op(Instruction::Return(kind), size.to_decreasing_size())
    }

    /// Casts the top of the stack to the erasure of `ty`; trivial for primitives.
    #[must_use]
    pub fn checked_cast(ty: &TypeRef) -> Self {
        match ty.erasure() {
            TypeRef::Class(name) => Self::op(
                Instruction::CheckCast(internal_name(&name).into()),
                Size::ZERO,
            ),
            array @ TypeRef::Array(_) => {
                Self::op(Instruction::CheckCast(array.descriptor().into()), Size::ZERO)
            }
            TypeRef::Void => StackManipulation::Illegal,
            _ => StackManipulation::Trivial,
        }
    }

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------

    /// Invokes `method` with the given dispatch kind.
    #[must_use]
    pub fn invoke(method: &MethodDescription, kind: InvocationKind) -> Self {
        Self::invoke_on(method, &method.declaring_type, kind)
    }

    /// Invokes `method` naming `owner` as the receiver class.
    #[must_use]
    pub fn invoke_on(method: &MethodDescription, owner: &str, kind: InvocationKind) -> Self {
        let arguments: i32 = method
            .parameters
            .iter()
            .map(|parameter| StackSize::of(&parameter.type_ref).slots())
            .sum::<i32>()
            + i32::from(kind != InvocationKind::Static);
        let result = StackSize::of(&method.return_type).slots();
        let impact = result - arguments;
        Self::op(
            Instruction::Invoke {
                kind,
                method: MemberRef {
                    owner: internal_name(owner).into(),
                    name: method.name.clone(),
                    descriptor: method.descriptor().into(),
                },
            },
            Size::new(impact, impact.max(0)),
        )
    }

    /// Reads `field`, expecting the receiver on the stack for instance fields.
    #[must_use]
    pub fn field_get(field: &FieldDescription) -> Self {
        let reference = field_ref(field);
        let value = StackSize::of(&field.type_ref).slots();
        if field.is_static() {
            Self::op(Instruction::GetStatic(reference), Size::new(value, value))
        } else {
            Self::op(Instruction::GetField(reference), Size::new(value - 1, value - 1))
        }
    }

    /// Writes `field` from the value (and receiver) on the stack.
    #[must_use]
    pub fn field_put(field: &FieldDescription) -> Self {
        let reference = field_ref(field);
        let value = StackSize::of(&field.type_ref).slots();
        if field.is_static() {
            Self::op(Instruction::PutStatic(reference), Size::new(-value, 0))
        } else {
            Self::op(Instruction::PutField(reference), Size::new(-value - 1, 0))
        }
    }

    /// Allocates an instance of `owner` and duplicates the reference.
    #[must_use]
    pub fn new_instance(owner: &str) -> Self {
        Self::compound([
            Self::op(
                Instruction::New(internal_name(owner).into()),
                StackSize::Single.to_increasing_size(),
            ),
            Self::duplicate(StackSize::Single),
        ])
    }

    /// Throws the exception reference on top of the stack.
    #[must_use]
    pub fn throw() -> Self {
        Self::op(Instruction::Athrow, StackSize::Single.to_decreasing_size())
    }
}

fn field_ref(field: &FieldDescription) -> MemberRef {
    MemberRef {
        owner: internal_name(&field.declaring_type).into(),
        name: field.name.clone(),
        descriptor: field.type_ref.descriptor().into(),
    }
}
