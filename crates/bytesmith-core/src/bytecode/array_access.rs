// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Array element access.
//!
//! **DDD Context:** Bytecode

use crate::description::{Primitive, TypeRef};

use super::{ArraySort, Instruction, Size, StackManipulation, StackSize};

/// Loads and stores elements of arrays with a given component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayAccess {
    sort: ArraySort,
    value_size: StackSize,
}

impl ArrayAccess {
    /// Access for arrays whose component type is `component`.
    ///
    /// Returns `None` for `void`, which cannot be an array component.
    #[must_use]
    pub fn of(component: &TypeRef) -> Option<Self> {
        let sort = match component.erasure() {
            TypeRef::Void => return None,
            TypeRef::Primitive(Primitive::Boolean | Primitive::Byte) => ArraySort::Byte,
            TypeRef::Primitive(Primitive::Short) => ArraySort::Short,
            TypeRef::Primitive(Primitive::Char) => ArraySort::Char,
            TypeRef::Primitive(Primitive::Int) => ArraySort::Int,
            TypeRef::Primitive(Primitive::Long) => ArraySort::Long,
            TypeRef::Primitive(Primitive::Float) => ArraySort::Float,
            TypeRef::Primitive(Primitive::Double) => ArraySort::Double,
            _ => ArraySort::Reference,
        };
        Some(Self {
            sort,
            value_size: StackSize::of(component),
        })
    }

    #[must_use]
    pub fn sort(self) -> ArraySort {
        self.sort
    }

    /// Replaces an array reference and index with the element.
    #[must_use]
    pub fn load(self) -> StackManipulation {
        let impact = self.value_size.slots() - 2;
        StackManipulation::Op {
            instruction: Instruction::ArrayLoad(self.sort),
            size: Size::new(impact, impact.max(0)),
        }
    }

    /// Consumes an array reference, index and value, storing the element.
    #[must_use]
    pub fn store(self) -> StackManipulation {
        StackManipulation::Op {
            instruction: Instruction::ArrayStore(self.sort),
            size: Size::new(-(self.value_size.slots() + 2), 0),
        }
    }

    /// Applies `process[i]` to element `i` of the array on top of the stack.
    ///
    /// The array reference is duplicated before each element is loaded and
    /// remains on the stack afterwards; each processing step must consume the
    /// loaded element.
    #[must_use]
    pub fn for_each(self, process: Vec<StackManipulation>) -> StackManipulation {
        StackManipulation::compound(process.into_iter().enumerate().map(|(index, step)| {
            let index = i32::try_from(index).unwrap_or(i32::MAX);
            StackManipulation::compound([
                StackManipulation::duplicate(StackSize::Single),
                StackManipulation::int_constant(index),
                self.load(),
                step,
            ])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Code;
    use crate::description::STRING;

    #[test]
    fn sort_per_component() {
        let of = |ty: TypeRef| ArrayAccess::of(&ty).map(ArrayAccess::sort);
        assert_eq!(of(TypeRef::Primitive(Primitive::Boolean)), Some(ArraySort::Byte));
        assert_eq!(of(TypeRef::Primitive(Primitive::Char)), Some(ArraySort::Char));
        assert_eq!(of(TypeRef::class(STRING)), Some(ArraySort::Reference));
        assert_eq!(
            of(TypeRef::array_of(TypeRef::Primitive(Primitive::Int))),
            Some(ArraySort::Reference)
        );
        assert_eq!(of(TypeRef::Void), None);
    }

    #[test]
    fn load_and_store_sizes() {
        let long = ArrayAccess::of(&TypeRef::Primitive(Primitive::Long)).unwrap();
        let StackManipulation::Op { size, .. } = long.load() else {
            panic!("expected a single instruction");
        };
        assert_eq!(size, Size::new(0, 0));
        let StackManipulation::Op { size, .. } = long.store() else {
            panic!("expected a single instruction");
        };
        assert_eq!(size, Size::new(-4, 0));
    }

    #[test]
    fn for_each_duplicates_array_per_element() {
        let access = ArrayAccess::of(&TypeRef::Primitive(Primitive::Int)).unwrap();
        let pop = StackManipulation::remove(StackSize::Single);
        let code = Code::of(&access.for_each(vec![pop.clone(), pop]), 1);
        assert_eq!(
            code.instructions,
            vec![
                Instruction::Dup,
                Instruction::Iconst(0),
                Instruction::ArrayLoad(ArraySort::Int),
                Instruction::Pop,
                Instruction::Dup,
                Instruction::Iconst(1),
                Instruction::ArrayLoad(ArraySort::Int),
                Instruction::Pop,
            ]
        );
        // dup + index on top of the array already on the stack
        assert_eq!(code.max_stack, 2);
    }
}
