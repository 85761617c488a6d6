// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Type references and type descriptions.
//!
//! **DDD Context:** Entity Model — Value Objects
//!
//! A [`TypeRef`] is a reference to a type as it appears in a signature: it
//! may be generic (parameterized, a type variable) and can be erased to the
//! raw type the JVM sees. A [`TypeDescription`] is the declaration of a type
//! with its members.

use ecow::EcoString;
use std::collections::HashMap;
use std::fmt;

use super::field::FieldDescription;
use super::method::MethodDescription;
use super::modifiers::{Modifiers, Visibility};

/// Binary name of `java.lang.Object`, the root of every class hierarchy.
pub const OBJECT: &str = "java.lang.Object";

/// Binary name of `java.lang.String`.
pub const STRING: &str = "java.lang.String";

/// A primitive JVM type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    /// The Java keyword naming this primitive.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    /// The single-character JVM descriptor.
    #[must_use]
    pub fn descriptor(self) -> char {
        match self {
            Primitive::Boolean => 'Z',
            Primitive::Byte => 'B',
            Primitive::Short => 'S',
            Primitive::Char => 'C',
            Primitive::Int => 'I',
            Primitive::Long => 'J',
            Primitive::Float => 'F',
            Primitive::Double => 'D',
        }
    }

    /// Looks up a primitive by its Java keyword.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "char" => Primitive::Char,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }

    /// Returns true for `long` and `double`, which occupy two stack slots.
    #[must_use]
    pub fn is_wide(self) -> bool {
        matches!(self, Primitive::Long | Primitive::Double)
    }
}

/// A reference to a type as used in a member signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// The `void` pseudo-type (return types only).
    Void,
    /// A primitive type.
    Primitive(Primitive),
    /// A raw (non-generic) class or interface reference.
    Class(EcoString),
    /// A generic class reference with type arguments.
    Parameterized {
        raw: EcoString,
        arguments: Vec<TypeRef>,
    },
    /// A type variable; `bound` is what the variable erases to.
    Variable { symbol: EcoString, bound: Box<TypeRef> },
    /// An array of the component type.
    Array(Box<TypeRef>),
    /// A detached reference to the declaring type of a token.
    Target,
}

impl TypeRef {
    /// A raw class reference.
    #[must_use]
    pub fn class(name: impl Into<EcoString>) -> Self {
        TypeRef::Class(name.into())
    }

    /// `java.lang.Object`.
    #[must_use]
    pub fn object() -> Self {
        TypeRef::Class(OBJECT.into())
    }

    /// A type variable erasing to `java.lang.Object`.
    #[must_use]
    pub fn variable(symbol: impl Into<EcoString>) -> Self {
        TypeRef::Variable {
            symbol: symbol.into(),
            bound: Box::new(TypeRef::object()),
        }
    }

    /// An array of `component`.
    #[must_use]
    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    /// Returns the raw type the JVM sees for this reference.
    #[must_use]
    pub fn erasure(&self) -> TypeRef {
        match self {
            TypeRef::Parameterized { raw, .. } => TypeRef::Class(raw.clone()),
            TypeRef::Variable { bound, .. } => bound.erasure(),
            TypeRef::Array(component) => TypeRef::Array(Box::new(component.erasure())),
            other => other.clone(),
        }
    }

    /// Replaces type variables bound in `bindings`.
    ///
    /// Unbound variables are left in place.
    #[must_use]
    pub fn substitute(&self, bindings: &HashMap<EcoString, TypeRef>) -> TypeRef {
        match self {
            TypeRef::Variable { symbol, .. } => bindings
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeRef::Parameterized { raw, arguments } => TypeRef::Parameterized {
                raw: raw.clone(),
                arguments: arguments.iter().map(|a| a.substitute(bindings)).collect(),
            },
            TypeRef::Array(component) => TypeRef::Array(Box::new(component.substitute(bindings))),
            other => other.clone(),
        }
    }

    /// Replaces references to `owner` with [`TypeRef::Target`].
    #[must_use]
    pub fn detach(&self, owner: &str) -> TypeRef {
        match self {
            TypeRef::Class(name) if name == owner => TypeRef::Target,
            TypeRef::Parameterized { raw, arguments } => TypeRef::Parameterized {
                raw: raw.clone(),
                arguments: arguments.iter().map(|a| a.detach(owner)).collect(),
            },
            TypeRef::Array(component) => TypeRef::Array(Box::new(component.detach(owner))),
            TypeRef::Variable { symbol, bound } => TypeRef::Variable {
                symbol: symbol.clone(),
                bound: Box::new(bound.detach(owner)),
            },
            other => other.clone(),
        }
    }

    /// Replaces [`TypeRef::Target`] with a reference to `owner`.
    #[must_use]
    pub fn attach(&self, owner: &str) -> TypeRef {
        match self {
            TypeRef::Target => TypeRef::Class(owner.into()),
            TypeRef::Parameterized { raw, arguments } => TypeRef::Parameterized {
                raw: raw.clone(),
                arguments: arguments.iter().map(|a| a.attach(owner)).collect(),
            },
            TypeRef::Array(component) => TypeRef::Array(Box::new(component.attach(owner))),
            TypeRef::Variable { symbol, bound } => TypeRef::Variable {
                symbol: symbol.clone(),
                bound: Box::new(bound.attach(owner)),
            },
            other => other.clone(),
        }
    }

    /// Returns the binary name of the class this reference points to, if any.
    #[must_use]
    pub fn raw_name(&self) -> Option<&EcoString> {
        match self {
            TypeRef::Class(name) | TypeRef::Parameterized { raw: name, .. } => Some(name),
            TypeRef::Variable { bound, .. } => bound.raw_name(),
            _ => None,
        }
    }

    /// Returns true for primitive types (not `void`).
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    /// Returns true for `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Returns the number of stack slots a value of this type occupies.
    #[must_use]
    pub fn stack_slots(&self) -> u16 {
        match self {
            TypeRef::Void => 0,
            TypeRef::Primitive(p) if p.is_wide() => 2,
            _ => 1,
        }
    }

    /// Returns the JVM descriptor of the erasure (e.g. `Ljava/lang/String;`).
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self.erasure() {
            TypeRef::Void => "V".to_string(),
            TypeRef::Primitive(p) => p.descriptor().to_string(),
            TypeRef::Class(name) => format!("L{};", internal_name(&name)),
            TypeRef::Array(component) => format!("[{}", component.descriptor()),
            TypeRef::Target => "LTarget;".to_string(),
            TypeRef::Parameterized { .. } | TypeRef::Variable { .. } => {
                unreachable!("erasure removes generic references")
            }
        }
    }

    /// Parses a Java-style type name.
    ///
    /// Accepts `void`, primitives, binary class names, parameterized names
    /// (`java.util.List<T>`) and array suffixes. Names listed in `variables`
    /// become type variables erasing to their declared bound.
    ///
    /// Returns `None` if the text is not a well-formed type name.
    #[must_use]
    pub fn parse(text: &str, variables: &[TypeVariableToken]) -> Option<TypeRef> {
        let mut parser = TypeNameParser {
            text: text.trim(),
            position: 0,
            variables,
        };
        let parsed = parser.parse_type()?;
        (parser.position == parser.text.len()).then_some(parsed)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Primitive(p) => f.write_str(p.name()),
            TypeRef::Class(name) => f.write_str(name),
            TypeRef::Parameterized { raw, arguments } => {
                write!(f, "{raw}<")?;
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                f.write_str(">")
            }
            TypeRef::Variable { symbol, .. } => f.write_str(symbol),
            TypeRef::Array(component) => write!(f, "{component}[]"),
            TypeRef::Target => f.write_str("<target>"),
        }
    }
}

struct TypeNameParser<'a> {
    text: &'a str,
    position: usize,
    variables: &'a [TypeVariableToken],
}

impl TypeNameParser<'_> {
    fn parse_type(&mut self) -> Option<TypeRef> {
        self.skip_whitespace();
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                self.position += c.len_utf8();
            } else {
                break;
            }
        }
        let name = &self.text[start..self.position];
        if name.is_empty() || name.starts_with('.') || name.ends_with('.') {
            return None;
        }

        let mut parsed = if name == "void" {
            TypeRef::Void
        } else if let Some(primitive) = Primitive::from_name(name) {
            TypeRef::Primitive(primitive)
        } else if let Some(variable) = self.variables.iter().find(|v| v.symbol == name) {
            TypeRef::Variable {
                symbol: variable.symbol.clone(),
                bound: Box::new(variable.bound.erasure()),
            }
        } else {
            TypeRef::Class(name.into())
        };

        self.skip_whitespace();
        if self.peek() == Some('<') {
            let TypeRef::Class(raw) = parsed else {
                return None;
            };
            self.position += 1;
            let mut arguments = vec![self.parse_type()?];
            loop {
                self.skip_whitespace();
                match self.peek()? {
                    ',' => {
                        self.position += 1;
                        arguments.push(self.parse_type()?);
                    }
                    '>' => {
                        self.position += 1;
                        break;
                    }
                    _ => return None,
                }
            }
            parsed = TypeRef::Parameterized { raw, arguments };
        }

        loop {
            self.skip_whitespace();
            if self.text[self.position..].starts_with("[]") {
                if parsed.is_void() {
                    return None;
                }
                self.position += 2;
                parsed = TypeRef::array_of(parsed);
            } else {
                break;
            }
        }
        Some(parsed)
    }

    fn peek(&self) -> Option<char> {
        self.text[self.position..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }
}

/// Converts a binary name (`java.lang.Object`) to an internal name (`java/lang/Object`).
#[must_use]
pub fn internal_name(binary_name: &str) -> String {
    binary_name.replace('.', "/")
}

/// A declared type variable and its erasure bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariableToken {
    pub symbol: EcoString,
    pub bound: TypeRef,
}

impl TypeVariableToken {
    /// A type variable bounded by `java.lang.Object`.
    #[must_use]
    pub fn new(symbol: impl Into<EcoString>) -> Self {
        Self {
            symbol: symbol.into(),
            bound: TypeRef::object(),
        }
    }
}

/// A type declaration: its shape, supertypes and declared members.
///
/// **DDD Context:** Entity Model — Entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    /// Binary name (e.g. `com.example.Foo`).
    pub name: EcoString,
    /// Access flags of the type.
    pub modifiers: Modifiers,
    /// Generic superclass reference (`None` for `java.lang.Object` and interfaces).
    pub superclass: Option<TypeRef>,
    /// Generic interface references, in declaration order.
    pub interfaces: Vec<TypeRef>,
    /// Type variables declared by this type.
    pub type_variables: Vec<TypeVariableToken>,
    /// Fields declared directly on this type.
    pub fields: Vec<FieldDescription>,
    /// Methods, constructors and the type initializer declared on this type.
    pub methods: Vec<MethodDescription>,
}

impl TypeDescription {
    /// Creates a class extending `superclass` with no members.
    #[must_use]
    pub fn class(name: impl Into<EcoString>, modifiers: Modifiers, superclass: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers,
            superclass: Some(superclass),
            interfaces: Vec::new(),
            type_variables: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Creates an interface with no members.
    #[must_use]
    pub fn interface(name: impl Into<EcoString>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            modifiers: modifiers | Modifiers::INTERFACE | Modifiers::ABSTRACT,
            superclass: None,
            interfaces: Vec::new(),
            type_variables: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Returns the package part of the binary name (empty for the default package).
    #[must_use]
    pub fn package(&self) -> &str {
        package_of(&self.name)
    }

    /// Returns the name after the last package separator.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Returns the internal name (`com/example/Foo`).
    #[must_use]
    pub fn internal_name(&self) -> String {
        internal_name(&self.name)
    }

    /// Returns a raw reference to this type.
    #[must_use]
    pub fn as_type_ref(&self) -> TypeRef {
        TypeRef::Class(self.name.clone())
    }

    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    #[must_use]
    pub fn is_annotation(&self) -> bool {
        self.modifiers.contains(Modifiers::ANNOTATION)
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    #[must_use]
    pub fn is_package_private(&self) -> bool {
        self.modifiers.visibility() == Visibility::PackagePrivate
    }

    /// Returns true if both types live in the same package.
    #[must_use]
    pub fn is_same_package(&self, other: &TypeDescription) -> bool {
        self.package() == other.package()
    }

    /// Returns true if `accessor` may reference this type.
    #[must_use]
    pub fn is_visible_to(&self, accessor: &TypeDescription) -> bool {
        self.is_public() || self.name == accessor.name || self.is_same_package(accessor)
    }

    /// Methods declared on this type, in declaration order.
    #[must_use]
    pub fn declared_methods(&self) -> &[MethodDescription] {
        &self.methods
    }

    /// Fields declared on this type, in declaration order.
    #[must_use]
    pub fn declared_fields(&self) -> &[FieldDescription] {
        &self.fields
    }

    /// Binds this type's own type variables from a parameterized reference to it.
    ///
    /// Missing or surplus arguments are ignored (raw usage leaves variables unbound).
    #[must_use]
    pub fn bindings_for(&self, reference: &TypeRef) -> HashMap<EcoString, TypeRef> {
        let mut bindings = HashMap::new();
        if let TypeRef::Parameterized { arguments, .. } = reference {
            for (variable, argument) in self.type_variables.iter().zip(arguments) {
                bindings.insert(variable.symbol.clone(), argument.clone());
            }
        }
        bindings
    }
}

/// Returns the package part of a binary name.
#[must_use]
pub fn package_of(binary_name: &str) -> &str {
    binary_name.rsplit_once('.').map_or("", |(package, _)| package)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erasure_of_generic_references() {
        let list = TypeRef::Parameterized {
            raw: "java.util.List".into(),
            arguments: vec![TypeRef::variable("T")],
        };
        assert_eq!(list.erasure(), TypeRef::class("java.util.List"));
        assert_eq!(TypeRef::variable("T").erasure(), TypeRef::object());
        assert_eq!(
            TypeRef::array_of(TypeRef::variable("T")).erasure(),
            TypeRef::array_of(TypeRef::object())
        );
    }

    #[test]
    fn substitute_resolves_bound_variables() {
        let mut bindings = HashMap::new();
        bindings.insert(EcoString::from("T"), TypeRef::class(STRING));
        assert_eq!(
            TypeRef::variable("T").substitute(&bindings),
            TypeRef::class(STRING)
        );
        assert_eq!(
            TypeRef::variable("U").substitute(&bindings),
            TypeRef::variable("U")
        );
    }

    #[test]
    fn detach_then_attach_round_trips_owner() {
        let owner = "com.example.Node";
        let reference = TypeRef::array_of(TypeRef::class(owner));
        let detached = reference.detach(owner);
        assert_eq!(detached, TypeRef::array_of(TypeRef::Target));
        assert_eq!(detached.attach(owner), reference);
    }

    #[test]
    fn descriptors() {
        assert_eq!(TypeRef::Void.descriptor(), "V");
        assert_eq!(TypeRef::Primitive(Primitive::Long).descriptor(), "J");
        assert_eq!(TypeRef::class(STRING).descriptor(), "Ljava/lang/String;");
        assert_eq!(
            TypeRef::array_of(TypeRef::Primitive(Primitive::Int)).descriptor(),
            "[I"
        );
        assert_eq!(TypeRef::variable("T").descriptor(), "Ljava/lang/Object;");
    }

    #[test]
    fn parse_type_names() {
        let variables = [TypeVariableToken::new("T")];
        assert_eq!(TypeRef::parse("void", &[]), Some(TypeRef::Void));
        assert_eq!(
            TypeRef::parse("int[][]", &[]),
            Some(TypeRef::array_of(TypeRef::array_of(TypeRef::Primitive(
                Primitive::Int
            ))))
        );
        assert_eq!(
            TypeRef::parse("java.util.Map<java.lang.String, T>", &variables),
            Some(TypeRef::Parameterized {
                raw: "java.util.Map".into(),
                arguments: vec![TypeRef::class(STRING), TypeRef::variable("T")],
            })
        );
        assert_eq!(TypeRef::parse("T", &variables), Some(TypeRef::variable("T")));
    }

    #[test]
    fn parse_rejects_malformed_names() {
        assert_eq!(TypeRef::parse("", &[]), None);
        assert_eq!(TypeRef::parse("java.util.List<", &[]), None);
        assert_eq!(TypeRef::parse("void[]", &[]), None);
        assert_eq!(TypeRef::parse("int<T>", &[]), None);
        assert_eq!(TypeRef::parse("a b", &[]), None);
    }

    #[test]
    fn package_and_simple_name() {
        let ty = TypeDescription::class("com.example.Foo", Modifiers::PUBLIC, TypeRef::object());
        assert_eq!(ty.package(), "com.example");
        assert_eq!(ty.simple_name(), "Foo");
        assert_eq!(package_of("Foo"), "");
    }

    #[test]
    fn bindings_for_parameterized_reference() {
        let mut comparable = TypeDescription::interface("java.lang.Comparable", Modifiers::PUBLIC);
        comparable.type_variables.push(TypeVariableToken::new("T"));
        let reference = TypeRef::Parameterized {
            raw: "java.lang.Comparable".into(),
            arguments: vec![TypeRef::class(STRING)],
        };
        let bindings = comparable.bindings_for(&reference);
        assert_eq!(bindings.get("T"), Some(&TypeRef::class(STRING)));
    }
}
