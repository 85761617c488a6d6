// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Built-in `java.lang` type definitions.
//!
//! **DDD Context:** Entity Model
//!
//! Only the members the pipeline needs to reason about are modelled: the
//! virtual surface of `java.lang.Object`, the constructors used by super
//! calls and exception throwing, and a few generic interfaces.

use crate::description::method::MethodDescription;
use crate::description::modifiers::Modifiers;
use crate::description::types::{
    OBJECT, Primitive, STRING, TypeDescription, TypeRef, TypeVariableToken,
};

const PUBLIC: Modifiers = Modifiers::PUBLIC;

pub(super) fn builtin_types() -> Vec<TypeDescription> {
    vec![
        object(),
        string(),
        class_type(),
        char_sequence(),
        comparable(),
        runnable(),
        throwable("java.lang.Throwable", OBJECT),
        throwable("java.lang.Exception", "java.lang.Throwable"),
        throwable("java.lang.RuntimeException", "java.lang.Exception"),
        throwable("java.lang.IllegalStateException", "java.lang.RuntimeException"),
        throwable(
            "java.lang.UnsupportedOperationException",
            "java.lang.RuntimeException",
        ),
        throwable("java.lang.AbstractMethodError", "java.lang.Throwable"),
        throwable("java.lang.CloneNotSupportedException", "java.lang.Exception"),
    ]
}

fn object() -> TypeDescription {
    let boolean = TypeRef::Primitive(Primitive::Boolean);
    let int = TypeRef::Primitive(Primitive::Int);
    TypeDescription {
        name: OBJECT.into(),
        modifiers: PUBLIC,
        superclass: None,
        interfaces: Vec::new(),
        type_variables: Vec::new(),
        fields: Vec::new(),
        methods: vec![
            MethodDescription::constructor(OBJECT, PUBLIC, vec![]),
            MethodDescription::new(OBJECT, "equals", PUBLIC, boolean)
                .with_parameters(vec![TypeRef::object()]),
            MethodDescription::new(OBJECT, "hashCode", PUBLIC | Modifiers::NATIVE, int),
            MethodDescription::new(OBJECT, "toString", PUBLIC, TypeRef::class(STRING)),
            MethodDescription::new(
                OBJECT,
                "clone",
                Modifiers::PROTECTED | Modifiers::NATIVE,
                TypeRef::object(),
            )
            .with_exceptions(vec![TypeRef::class(
                "java.lang.CloneNotSupportedException",
            )]),
            MethodDescription::new(OBJECT, "finalize", Modifiers::PROTECTED, TypeRef::Void)
                .with_exceptions(vec![TypeRef::class("java.lang.Throwable")]),
            MethodDescription::new(
                OBJECT,
                "getClass",
                PUBLIC | Modifiers::FINAL | Modifiers::NATIVE,
                TypeRef::class("java.lang.Class"),
            ),
            MethodDescription::new(
                OBJECT,
                "notify",
                PUBLIC | Modifiers::FINAL | Modifiers::NATIVE,
                TypeRef::Void,
            ),
            MethodDescription::new(
                OBJECT,
                "wait",
                PUBLIC | Modifiers::FINAL,
                TypeRef::Void,
            )
            .with_exceptions(vec![TypeRef::class("java.lang.InterruptedException")]),
        ],
    }
}

fn string() -> TypeDescription {
    let mut ty = TypeDescription::class(STRING, PUBLIC | Modifiers::FINAL, TypeRef::object());
    ty.interfaces = vec![
        TypeRef::class("java.lang.CharSequence"),
        TypeRef::Parameterized {
            raw: "java.lang.Comparable".into(),
            arguments: vec![TypeRef::class(STRING)],
        },
    ];
    ty.methods = vec![
        MethodDescription::constructor(STRING, PUBLIC, vec![]),
        MethodDescription::new(STRING, "length", PUBLIC, TypeRef::Primitive(Primitive::Int)),
        MethodDescription::new(
            STRING,
            "isEmpty",
            PUBLIC,
            TypeRef::Primitive(Primitive::Boolean),
        ),
        MethodDescription::new(STRING, "toString", PUBLIC, TypeRef::class(STRING)),
        MethodDescription::new(
            STRING,
            "compareTo",
            PUBLIC,
            TypeRef::Primitive(Primitive::Int),
        )
        .with_parameters(vec![TypeRef::class(STRING)]),
    ];
    ty
}

fn class_type() -> TypeDescription {
    let mut ty = TypeDescription::class(
        "java.lang.Class",
        PUBLIC | Modifiers::FINAL,
        TypeRef::object(),
    );
    ty.type_variables.push(TypeVariableToken::new("T"));
    ty
}

fn char_sequence() -> TypeDescription {
    let name = "java.lang.CharSequence";
    let mut ty = TypeDescription::interface(name, PUBLIC);
    ty.methods = vec![
        MethodDescription::new(
            name,
            "length",
            PUBLIC | Modifiers::ABSTRACT,
            TypeRef::Primitive(Primitive::Int),
        ),
        MethodDescription::new(
            name,
            "toString",
            PUBLIC | Modifiers::ABSTRACT,
            TypeRef::class(STRING),
        ),
    ];
    ty
}

fn comparable() -> TypeDescription {
    let name = "java.lang.Comparable";
    let mut ty = TypeDescription::interface(name, PUBLIC);
    ty.type_variables.push(TypeVariableToken::new("T"));
    ty.methods = vec![
        MethodDescription::new(
            name,
            "compareTo",
            PUBLIC | Modifiers::ABSTRACT,
            TypeRef::Primitive(Primitive::Int),
        )
        .with_parameters(vec![TypeRef::variable("T")]),
    ];
    ty
}

fn runnable() -> TypeDescription {
    let name = "java.lang.Runnable";
    let mut ty = TypeDescription::interface(name, PUBLIC);
    ty.methods = vec![MethodDescription::new(
        name,
        "run",
        PUBLIC | Modifiers::ABSTRACT,
        TypeRef::Void,
    )];
    ty
}

fn throwable(name: &str, superclass: &str) -> TypeDescription {
    let mut ty = TypeDescription::class(name, PUBLIC, TypeRef::class(superclass));
    ty.methods = vec![
        MethodDescription::constructor(name, PUBLIC, vec![]),
        MethodDescription::constructor(name, PUBLIC, vec![TypeRef::class(STRING)]),
    ];
    ty
}
