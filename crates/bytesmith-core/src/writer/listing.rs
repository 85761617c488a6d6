// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Textual class file listings, in the spirit of `javap -c`.
//!
//! **DDD Context:** Class Writing

use crate::description::{AnnotationDescription, Modifiers, TypeRef};
use crate::docvec;

use super::document::{Document, INDENT, join, line, nest, nil};
use super::{ClassFile, FieldBody, MethodBody};

/// Renders `class_file` as text.
#[must_use]
pub fn render(class_file: &ClassFile) -> String {
    class_document(class_file).to_pretty_string()
}

fn class_document(class_file: &ClassFile) -> Document<'_> {
    let kind = if class_file.modifiers.contains(Modifiers::INTERFACE) {
        "interface"
    } else {
        "class"
    };
    let type_modifiers = class_file.modifiers - (Modifiers::INTERFACE | Modifiers::ABSTRACT);
    let abstract_keyword = if class_file.modifiers.contains(Modifiers::ABSTRACT)
        && !class_file.modifiers.contains(Modifiers::INTERFACE)
    {
        "abstract "
    } else {
        ""
    };
    let superclass = match &class_file.superclass {
        Some(superclass) => docvec![" extends ", superclass.to_string()],
        None => nil(),
    };
    let interfaces = if class_file.interfaces.is_empty() {
        nil()
    } else {
        docvec![
            " implements ",
            join(class_file.interfaces.iter().map(type_doc), &Document::Str(", ")),
        ]
    };
    let members: Vec<Document<'_>> = class_file
        .fields
        .iter()
        .map(field_document)
        .chain(class_file.methods.iter().map(method_document))
        .collect();
    let body = if members.is_empty() {
        nil()
    } else {
        nest(INDENT, docvec![line(), join(members, &docvec!["\n", line()])])
    };
    docvec![
        format!("// {}", class_file.version),
        line(),
        keywords(type_modifiers),
        abstract_keyword,
        kind,
        " ",
        class_file.name.as_str(),
        superclass,
        interfaces,
        " {",
        body,
        line(),
        "}",
    ]
}

fn type_doc(ty: &TypeRef) -> Document<'static> {
    Document::String(ty.to_string())
}

fn keywords(modifiers: Modifiers) -> Document<'static> {
    let keywords = modifiers.keywords();
    if keywords.is_empty() {
        nil()
    } else {
        Document::String(format!("{keywords} "))
    }
}

fn annotations_document<'a>(annotations: &[AnnotationDescription]) -> Document<'a> {
    Document::Vec(
        annotations
            .iter()
            .map(|annotation| docvec![annotation.to_string(), line()])
            .collect(),
    )
}

fn field_document(field: &FieldBody) -> Document<'_> {
    let constant = match &field.constant {
        Some(value) => Document::String(format!(" = {value}")),
        None => nil(),
    };
    docvec![
        annotations_document(&field.annotations),
        keywords(field.modifiers),
        type_doc(&field.type_ref),
        " ",
        field.name.as_str(),
        constant,
        ";",
    ]
}

fn method_document(method: &MethodBody) -> Document<'_> {
    let parameters = join(method.parameters.iter().map(type_doc), &Document::Str(", "));
    let default_value = match &method.default_value {
        Some(value) => Document::String(format!(" default {value}")),
        None => nil(),
    };
    let throws = if method.exceptions.is_empty() {
        nil()
    } else {
        docvec![
            " throws ",
            join(method.exceptions.iter().map(type_doc), &Document::Str(", ")),
        ]
    };
    let code = match &method.code {
        Some(code) => {
            let instructions = code
                .instructions
                .iter()
                .enumerate()
                .map(|(index, instruction)| {
                    docvec![line(), Document::String(format!("{index}: {instruction}"))]
                })
                .collect::<Vec<_>>();
            nest(
                INDENT,
                docvec![
                    line(),
                    Document::String(format!(
                        "Code: max_stack={}, max_locals={}",
                        code.max_stack, code.max_locals
                    )),
                    nest(INDENT, Document::Vec(instructions)),
                ],
            )
        }
        None => nil(),
    };
    docvec![
        annotations_document(&method.annotations),
        keywords(method.modifiers),
        type_doc(&method.return_type),
        " ",
        method.name.as_str(),
        "(",
        parameters,
        ")",
        throws,
        default_value,
        ";",
        code,
    ]
}
