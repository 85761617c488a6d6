// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Symbolic JVM instructions.
//!
//! **DDD Context:** Bytecode
//!
//! Instructions carry resolved symbolic operands (owner, name, descriptor)
//! instead of constant pool indices; binary encoding is the writer's job.

use ecow::EcoString;
use std::fmt;

use crate::description::{Primitive, TypeRef};

use super::StackSize;

/// The computational category of a value on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `boolean`, `byte`, `short`, `char` and `int`.
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ValueKind {
    /// The stack category of `ty`, or `None` for `void`.
    #[must_use]
    pub fn of(ty: &TypeRef) -> Option<Self> {
        Some(match ty.erasure() {
            TypeRef::Void => return None,
            TypeRef::Primitive(Primitive::Long) => ValueKind::Long,
            TypeRef::Primitive(Primitive::Float) => ValueKind::Float,
            TypeRef::Primitive(Primitive::Double) => ValueKind::Double,
            TypeRef::Primitive(_) => ValueKind::Int,
            _ => ValueKind::Reference,
        })
    }

    #[must_use]
    pub fn stack_size(self) -> StackSize {
        match self {
            ValueKind::Long | ValueKind::Double => StackSize::Double,
            _ => StackSize::Single,
        }
    }

    fn prefix(self) -> char {
        match self {
            ValueKind::Int => 'i',
            ValueKind::Long => 'l',
            ValueKind::Float => 'f',
            ValueKind::Double => 'd',
            ValueKind::Reference => 'a',
        }
    }
}

/// Element sort of an array, selecting the `*aload`/`*astore` opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArraySort {
    /// `boolean[]` and `byte[]`.
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ArraySort {
    fn prefix(self) -> &'static str {
        match self {
            ArraySort::Byte => "b",
            ArraySort::Short => "s",
            ArraySort::Char => "c",
            ArraySort::Int => "i",
            ArraySort::Long => "l",
            ArraySort::Float => "f",
            ArraySort::Double => "d",
            ArraySort::Reference => "a",
        }
    }
}

/// Kind of method invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    Virtual,
    Interface,
    Special,
    Static,
}

/// A symbolic reference to a method or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Internal name of the owner (`java/lang/Object`).
    pub owner: EcoString,
    pub name: EcoString,
    pub descriptor: EcoString,
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.owner, self.name, self.descriptor)
    }
}

/// A single JVM instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    Nop,
    AconstNull,
    Iconst(i32),
    Lconst(i64),
    /// `fconst_0` or `dconst_0`.
    FloatingZero(ValueKind),
    /// Loads a string constant.
    Ldc(EcoString),
    /// Loads a class literal (internal name).
    LdcType(EcoString),
    Load { kind: ValueKind, offset: u16 },
    Store { kind: ValueKind, offset: u16 },
    ArrayLoad(ArraySort),
    ArrayStore(ArraySort),
    ArrayLength,
    Dup,
    Dup2,
    Pop,
    Pop2,
    New(EcoString),
    CheckCast(EcoString),
    Invoke { kind: InvocationKind, method: MemberRef },
    GetField(MemberRef),
    PutField(MemberRef),
    GetStatic(MemberRef),
    PutStatic(MemberRef),
    Athrow,
    /// Returns a value of the given kind, or `void` for `None`.
    Return(Option<ValueKind>),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Nop => f.write_str("nop"),
            Instruction::AconstNull => f.write_str("aconst_null"),
            Instruction::Iconst(value) => write!(f, "ldc {value}"),
            Instruction::Lconst(value) => write!(f, "ldc2_w {value}L"),
            Instruction::FloatingZero(kind) => write!(f, "{}const_0", kind.prefix()),
            Instruction::Ldc(text) => write!(f, "ldc {text:?}"),
            Instruction::LdcType(name) => write!(f, "ldc {name}.class"),
            Instruction::Load { kind, offset } => write!(f, "{}load {offset}", kind.prefix()),
            Instruction::Store { kind, offset } => write!(f, "{}store {offset}", kind.prefix()),
            Instruction::ArrayLoad(sort) => write!(f, "{}aload", sort.prefix()),
            Instruction::ArrayStore(sort) => write!(f, "{}astore", sort.prefix()),
            Instruction::ArrayLength => f.write_str("arraylength"),
            Instruction::Dup => f.write_str("dup"),
            Instruction::Dup2 => f.write_str("dup2"),
            Instruction::Pop => f.write_str("pop"),
            Instruction::Pop2 => f.write_str("pop2"),
            Instruction::New(owner) => write!(f, "new {owner}"),
            Instruction::CheckCast(ty) => write!(f, "checkcast {ty}"),
            Instruction::Invoke { kind, method } => {
                let opcode = match kind {
                    InvocationKind::Virtual => "invokevirtual",
                    InvocationKind::Interface => "invokeinterface",
                    InvocationKind::Special => "invokespecial",
                    InvocationKind::Static => "invokestatic",
                };
                write!(f, "{opcode} {method}")
            }
            Instruction::GetField(field) => write!(f, "getfield {field}"),
            Instruction::PutField(field) => write!(f, "putfield {field}"),
            Instruction::GetStatic(field) => write!(f, "getstatic {field}"),
            Instruction::PutStatic(field) => write!(f, "putstatic {field}"),
            Instruction::Athrow => f.write_str("athrow"),
            Instruction::Return(None) => f.write_str("return"),
            Instruction::Return(Some(kind)) => write!(f, "{}return", kind.prefix()),
        }
    }
}
