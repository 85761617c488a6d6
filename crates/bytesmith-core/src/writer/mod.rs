// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Symbolic class writer.
//!
//! **DDD Context:** Class Writing
//!
//! The writer is the consumer of the scaffold pipeline. It asks the field
//! and method pools for one record per member, materialises the records into
//! a symbolic [`ClassFile`] and lets the type initializer drain emit
//! `<clinit>`. Binary encoding is out of scope: a class file here is a
//! structured listing of members and instructions.

pub mod document;
pub mod field_pool;
pub mod listing;
pub mod method_pool;

use ecow::EcoString;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::bytecode::Code;
use crate::config::ClassFileVersion;
use crate::description::{
    AnnotationDescription, AnnotationValue, FieldDescription, MethodDescription, Modifiers,
    TypeDescription, TypeRef,
};
use crate::error::Result;
use crate::scaffold::instrumented::InstrumentedType;
use crate::scaffold::type_initializer::{LoadedTypeInitializer, TypeInitializerDrain};

pub use field_pool::{FieldPool, FieldRecord};
pub use method_pool::{MethodPool, MethodRecord, RecordSort};

/// A method as written to the class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub return_type: TypeRef,
    pub parameters: Vec<TypeRef>,
    pub exceptions: Vec<TypeRef>,
    pub annotations: Vec<AnnotationDescription>,
    /// Annotation element default.
    pub default_value: Option<AnnotationValue>,
    /// `None` for abstract methods.
    pub code: Option<Code>,
}

impl MethodBody {
    /// A body-less entry for `method` carrying the given modifiers.
    #[must_use]
    pub fn for_method(method: &MethodDescription, modifiers: Modifiers) -> Self {
        Self {
            name: method.name.clone(),
            modifiers,
            return_type: method.return_type.clone(),
            parameters: method
                .parameters
                .iter()
                .map(|parameter| parameter.type_ref.clone())
                .collect(),
            exceptions: method.exceptions.clone(),
            annotations: Vec::new(),
            default_value: None,
            code: None,
        }
    }

    /// JVM descriptor of the erased signature.
    #[must_use]
    pub fn descriptor(&self) -> String {
        let parameters: String = self
            .parameters
            .iter()
            .map(|parameter| parameter.erasure().descriptor())
            .collect();
        format!("({parameters}){}", self.return_type.erasure().descriptor())
    }
}

/// A field as written to the class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBody {
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub type_ref: TypeRef,
    pub annotations: Vec<AnnotationDescription>,
    /// Constant value attribute.
    pub constant: Option<AnnotationValue>,
}

impl FieldBody {
    #[must_use]
    pub fn for_field(field: &FieldDescription) -> Self {
        Self {
            name: field.name.clone(),
            modifiers: field.modifiers,
            type_ref: field.type_ref.clone(),
            annotations: field.annotations.clone(),
            constant: None,
        }
    }
}

/// The symbolic form of a written type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub name: EcoString,
    pub modifiers: Modifiers,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub version: ClassFileVersion,
    pub fields: Vec<FieldBody>,
    pub methods: Vec<MethodBody>,
}

impl ClassFile {
    /// An empty class file with the header of `ty`.
    #[must_use]
    pub fn for_type(ty: &TypeDescription, version: ClassFileVersion) -> Self {
        Self {
            name: ty.name.clone(),
            modifiers: ty.modifiers,
            superclass: ty.superclass.clone(),
            interfaces: ty.interfaces.clone(),
            version,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// The first method written under `name`.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodBody> {
        self.methods.iter().find(|body| body.name == name)
    }

    /// Every method written under `name`, bridges included.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodBody> {
        self.methods.iter().filter(move |body| body.name == name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldBody> {
        self.fields.iter().find(|body| body.name == name)
    }
}

/// When the loaded type initializer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeResolutionStrategy {
    /// The caller applies the loaded initializer itself.
    #[default]
    Passive,
    /// The loaded initializer runs as soon as the type is resolved.
    Active,
}

impl TypeResolutionStrategy {
    /// Static field assignments to perform at resolution time.
    #[must_use]
    pub fn initialize<'a>(
        self,
        ty: &'a DynamicType,
    ) -> Vec<(&'a EcoString, &'a AnnotationValue)> {
        match self {
            TypeResolutionStrategy::Passive => Vec::new(),
            TypeResolutionStrategy::Active => ty.loaded_initializer.assignments(),
        }
    }
}

/// The result of a build: a written type plus everything it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicType {
    pub description: TypeDescription,
    pub class_file: ClassFile,
    pub auxiliary_types: Vec<DynamicType>,
    pub loaded_initializer: LoadedTypeInitializer,
    pub resolution: TypeResolutionStrategy,
}

impl DynamicType {
    /// A helper type written alongside the main one, with its declared fields only.
    #[must_use]
    pub fn auxiliary(description: TypeDescription, version: ClassFileVersion) -> Self {
        let mut class_file = ClassFile::for_type(&description, version);
        class_file.fields = description
            .declared_fields()
            .iter()
            .map(FieldBody::for_field)
            .collect();
        Self {
            description,
            class_file,
            auxiliary_types: Vec::new(),
            loaded_initializer: LoadedTypeInitializer::NoOp,
            resolution: TypeResolutionStrategy::Passive,
        }
    }

    /// This type followed by its auxiliary types, depth first.
    #[must_use]
    pub fn all_types(&self) -> Vec<&DynamicType> {
        let mut types = vec![self];
        for auxiliary in &self.auxiliary_types {
            types.extend(auxiliary.all_types());
        }
        types
    }

    /// Renders every class file as text.
    #[must_use]
    pub fn listing(&self) -> String {
        self.all_types()
            .iter()
            .map(|ty| listing::render(&ty.class_file))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Writes a new type from its compiled pools.
pub struct TypeWriter<'a> {
    instrumented_type: &'a InstrumentedType,
    class_file_version: ClassFileVersion,
    field_pool: &'a dyn FieldPool,
    method_pool: &'a dyn MethodPool,
    instrumented_methods: &'a [MethodDescription],
    drain: &'a dyn TypeInitializerDrain,
    auxiliary_types: Vec<DynamicType>,
}

impl<'a> TypeWriter<'a> {
    /// A writer for a type created from scratch.
    #[must_use]
    pub fn for_creation(
        instrumented_type: &'a InstrumentedType,
        class_file_version: ClassFileVersion,
        field_pool: &'a dyn FieldPool,
        method_pool: &'a dyn MethodPool,
        instrumented_methods: &'a [MethodDescription],
        drain: &'a dyn TypeInitializerDrain,
    ) -> Self {
        Self {
            instrumented_type,
            class_file_version,
            field_pool,
            method_pool,
            instrumented_methods,
            drain,
            auxiliary_types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_auxiliary_types(mut self, auxiliary_types: Vec<DynamicType>) -> Self {
        self.auxiliary_types.extend(auxiliary_types);
        self
    }

    /// Writes fields, then instrumented methods in registry order, then `<clinit>`.
    #[instrument(skip_all, fields(ty = %self.instrumented_type.name()))]
    pub fn make(self, resolution: TypeResolutionStrategy) -> Result<DynamicType> {
        let description = self.instrumented_type.description();
        let mut class_file = ClassFile::for_type(description, self.class_file_version);
        for field in description.declared_fields() {
            class_file.fields.push(self.field_pool.target(field).apply());
        }
        for method in self.instrumented_methods {
            let record = self.method_pool.target(method);
            debug!(method = %method, sort = ?record.sort(), "writing method");
            class_file.methods.extend(record.apply()?);
        }
        self.drain.apply(
            &mut class_file,
            self.instrumented_type.type_initializer(),
            self.method_pool,
        )?;
        debug!(
            fields = class_file.fields.len(),
            methods = class_file.methods.len(),
            auxiliary = self.auxiliary_types.len(),
            "type written"
        );
        Ok(DynamicType {
            description: description.clone(),
            class_file,
            auxiliary_types: self.auxiliary_types,
            loaded_initializer: self.instrumented_type.loaded_type_initializer().clone(),
            resolution,
        })
    }
}
