// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Build plan parsing.
//!
//! **DDD Context:** Build System
//!
//! A plan is a TOML document describing one subclass build:
//!
//! ```toml
//! [build]
//! class-file-version = 8
//!
//! [[types]]
//! name = "a.Base"
//! constructors = [{ parameters = [] }]
//! methods = [{ name = "size", returns = "int" }]
//!
//! [subclass]
//! name = "a.Sub"
//! superclass = "a.Base"
//!
//! [[subclass.intercept]]
//! name = "size"
//! implementation = { kind = "fixed", value = 42 }
//! ```
//!
//! `[[types]]` entries populate the type pool on top of the built-in
//! `java.lang.Object` and `java.lang.String`. Interception rules listed later
//! take precedence over earlier ones and over defined method bodies.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::fs;
use std::sync::Arc;

use bytesmith_core::BuildError;
use bytesmith_core::config::{BuildConfig, ConfigError};
use bytesmith_core::description::{
    AnnotationDescription, AnnotationValue, FieldDescription, FieldToken, MethodDescription,
    MethodToken, Modifiers, OBJECT, Primitive, TypeDescription, TypePool, TypeRef,
    TypeVariableToken,
};
use bytesmith_core::implementation::{Constant, Implementation};
use bytesmith_core::matcher::{FieldMatcher, MethodMatcher};
use bytesmith_core::scaffold::field_registry::FieldEntry;
use bytesmith_core::scaffold::subclass::SubclassBuilder;
use bytesmith_core::writer::TypeResolutionStrategy;
use camino::Utf8Path;
use miette::{Context, Diagnostic, IntoDiagnostic};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors in the content of an otherwise readable plan.
#[derive(Debug, Error, Diagnostic)]
pub enum PlanError {
    #[error("invalid plan: {message}")]
    #[diagnostic(code(bytesmith::plan::parse))]
    Parse { message: String },

    #[error("invalid type name '{text}'")]
    #[diagnostic(
        code(bytesmith::plan::type_name),
        help("write types as `int`, `void`, `java.lang.String`, `java.util.List<T>` or `int[]`")
    )]
    InvalidType { text: String },

    #[error("unknown modifier '{keyword}'")]
    #[diagnostic(code(bytesmith::plan::modifier))]
    UnknownModifier { keyword: String },

    #[error("value {value} does not fit {target}")]
    #[diagnostic(code(bytesmith::plan::value))]
    InvalidValue { value: String, target: String },

    #[error("method '{method}' has both an implementation and a default value")]
    #[diagnostic(
        code(bytesmith::plan::conflicting_body),
        help("remove either `implementation` or `default`")
    )]
    ConflictingBody { method: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),
}

/// A parsed build plan.
#[derive(Debug, Clone)]
pub struct Plan {
    /// The `[build]` table, defaulted when absent.
    pub build: BuildConfig,
    /// Types registered with the pool.
    pub types: Vec<TypeSpec>,
    /// The type to synthesise.
    pub subclass: SubclassSpec,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PlanDocument {
    // Parsed separately by `BuildConfig::from_toml_str`.
    #[serde(default, rename = "build")]
    _build: Option<toml::Table>,
    #[serde(default)]
    types: Vec<TypeSpec>,
    subclass: SubclassSpec,
}

/// A `[[types]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TypeSpec {
    pub name: String,
    #[serde(default = "public")]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub interface: bool,
    /// Defaults to `java.lang.Object` for classes.
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub type_variables: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub constructors: Vec<ConstructorSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "public")]
    pub modifiers: Vec<String>,
    /// Constant value; only meaningful on static fields of the subclass.
    pub value: Option<ValueSpec>,
    /// Marker annotation types.
    #[serde(default)]
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConstructorSpec {
    #[serde(default = "public")]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default = "void")]
    pub returns: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "public")]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub exceptions: Vec<String>,
    /// Body of a method defined on the subclass.
    pub implementation: Option<ImplementationSpec>,
    /// Annotation default value of a method defined on the subclass.
    pub default: Option<ValueSpec>,
}

/// The `[subclass]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SubclassSpec {
    pub name: String,
    #[serde(default = "object")]
    pub superclass: String,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default = "public")]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub resolution: TypeResolutionStrategy,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub methods: Vec<MethodSpec>,
    #[serde(default)]
    pub intercept: Vec<InterceptSpec>,
    /// Names of inherited methods never to override.
    #[serde(default)]
    pub ignore: Vec<String>,
}

/// A `[[subclass.intercept]]` rule. Criteria combine with "and"; a rule
/// without criteria matches every method.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InterceptSpec {
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    pub declared_by: Option<String>,
    pub arguments: Option<usize>,
    pub implementation: ImplementationSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ImplementationSpec {
    Stub,
    Fixed {
        #[serde(default)]
        value: Option<ValueSpec>,
    },
    Super,
    Throw {
        exception: String,
        #[serde(default)]
        message: Option<String>,
    },
    Field {
        name: String,
        /// Type of a field to define when the hierarchy has none.
        #[serde(default)]
        define: Option<String>,
    },
    Helper {
        name: String,
        returns: String,
        value: ValueSpec,
    },
    Sequence {
        parts: Vec<ImplementationSpec>,
    },
}

/// A literal written in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Boolean(bool),
    Integer(i64),
    Text(String),
}

fn public() -> Vec<String> {
    vec!["public".to_string()]
}

fn void() -> String {
    "void".to_string()
}

fn object() -> String {
    OBJECT.to_string()
}

/// Reads and parses the plan at `path`.
pub fn load_plan(path: &Utf8Path) -> miette::Result<Plan> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read plan '{path}'"))?;

    Plan::from_toml_str(&content).wrap_err_with(|| format!("Failed to parse plan '{path}'"))
}

impl Plan {
    pub fn from_toml_str(source: &str) -> Result<Self, PlanError> {
        let build = BuildConfig::from_toml_str(source)?;
        let document: PlanDocument = toml::from_str(source).map_err(|err| PlanError::Parse {
            message: err.message().to_string(),
        })?;
        Ok(Self {
            build,
            types: document.types,
            subclass: document.subclass,
        })
    }

    /// The built-in types plus every `[[types]]` entry.
    pub fn pool(&self) -> Result<TypePool, PlanError> {
        let mut pool = TypePool::with_builtins();
        for spec in &self.types {
            pool.register(spec.describe()?);
        }
        debug!(types = pool.len(), "type pool loaded");
        Ok(pool)
    }

    /// A builder configured with every definition and rule of the plan.
    pub fn builder(&self) -> Result<SubclassBuilder, PlanError> {
        let spec = &self.subclass;
        let mut builder = SubclassBuilder::new(
            spec.name.as_str(),
            parse_type(&spec.superclass, &[])?,
            Arc::new(self.pool()?),
        )
        .with_config(self.build.clone())
        .modifiers(parse_modifiers(&spec.modifiers)?)
        .implement(parse_types(&spec.interfaces, &[])?);

        for field in &spec.fields {
            let token = field.token()?;
            let has_rule = field.value.is_some() || !field.annotations.is_empty();
            builder = builder.define_field(token.clone());
            if has_rule {
                let mut entry = FieldEntry::new(FieldMatcher::named(field.name.as_str()));
                for annotation in &field.annotations {
                    entry =
                        entry.with_annotation(AnnotationDescription::marker(annotation.as_str()));
                }
                if let Some(value) = &field.value {
                    entry = entry.with_default_value(value.annotation_value(&token.type_ref)?);
                }
                builder = builder.field_rule(entry);
            }
        }
        for method in &spec.methods {
            builder = method.define(builder)?;
        }
        for rule in &spec.intercept {
            builder = builder.intercept(rule.matcher(), rule.implementation.implementation()?);
        }
        for name in &spec.ignore {
            builder = builder.ignore_also(MethodMatcher::named(name.as_str()));
        }
        Ok(builder)
    }
}

impl TypeSpec {
    fn describe(&self) -> Result<TypeDescription, PlanError> {
        let variables: Vec<TypeVariableToken> = self
            .type_variables
            .iter()
            .map(|symbol| TypeVariableToken::new(symbol.as_str()))
            .collect();
        let modifiers = parse_modifiers(&self.modifiers)?;
        let mut ty = if self.interface {
            TypeDescription::interface(self.name.as_str(), modifiers)
        } else {
            let superclass = self.superclass.as_deref().unwrap_or(OBJECT);
            let superclass = parse_type(superclass, &variables)?;
            TypeDescription::class(self.name.as_str(), modifiers, superclass)
        };
        ty.interfaces = parse_types(&self.interfaces, &variables)?;
        for field in &self.fields {
            ty.fields.push(FieldDescription::new(
                self.name.as_str(),
                field.name.as_str(),
                parse_modifiers(&field.modifiers)?,
                parse_type(&field.type_name, &variables)?,
            ));
        }
        for constructor in &self.constructors {
            ty.methods.push(MethodDescription::constructor(
                self.name.as_str(),
                parse_modifiers(&constructor.modifiers)?,
                parse_types(&constructor.parameters, &variables)?,
            ));
        }
        for method in &self.methods {
            ty.methods.push(
                MethodDescription::new(
                    self.name.as_str(),
                    method.name.as_str(),
                    parse_modifiers(&method.modifiers)?,
                    parse_type(&method.returns, &variables)?,
                )
                .with_parameters(parse_types(&method.parameters, &variables)?)
                .with_exceptions(parse_types(&method.exceptions, &variables)?),
            );
        }
        ty.type_variables = variables;
        Ok(ty)
    }
}

impl FieldSpec {
    fn token(&self) -> Result<FieldToken, PlanError> {
        Ok(FieldToken::new(
            self.name.as_str(),
            parse_modifiers(&self.modifiers)?,
            parse_type(&self.type_name, &[])?,
        ))
    }
}

impl MethodSpec {
    fn token(&self) -> Result<MethodToken, PlanError> {
        Ok(MethodToken::new(
            self.name.as_str(),
            parse_modifiers(&self.modifiers)?,
            parse_type(&self.returns, &[])?,
            parse_types(&self.parameters, &[])?,
        )
        .with_exceptions(parse_types(&self.exceptions, &[])?))
    }

    fn define(&self, builder: SubclassBuilder) -> Result<SubclassBuilder, PlanError> {
        let token = self.token()?;
        match (&self.implementation, &self.default) {
            (Some(_), Some(_)) => Err(PlanError::ConflictingBody {
                method: self.name.clone(),
            }),
            (Some(implementation), None) => {
                let implementation = implementation.implementation()?;
                Ok(builder.define_method(token).intercept(implementation))
            }
            (None, Some(value)) => {
                let value = value.annotation_value(&token.return_type)?;
                Ok(builder.define_method(token).with_default_value(value)?)
            }
            (None, None) => Ok(builder.define_method(token).without_code()),
        }
    }
}

impl InterceptSpec {
    fn matcher(&self) -> MethodMatcher {
        let criteria: Vec<MethodMatcher> = [
            self.name.as_deref().map(MethodMatcher::named),
            self.name_prefix
                .as_deref()
                .map(|prefix| MethodMatcher::NameStartsWith(prefix.into())),
            self.declared_by.as_deref().map(MethodMatcher::declared_by),
            self.arguments.map(MethodMatcher::TakesArguments),
        ]
        .into_iter()
        .flatten()
        .collect();
        criteria
            .into_iter()
            .reduce(MethodMatcher::and)
            .unwrap_or(MethodMatcher::Any)
    }
}

impl ImplementationSpec {
    fn implementation(&self) -> Result<Implementation, PlanError> {
        Ok(match self {
            ImplementationSpec::Stub => Implementation::StubValue,
            ImplementationSpec::Fixed { value } => {
                let constant = value.as_ref().map_or(Constant::Null, ValueSpec::constant);
                Implementation::FixedValue(constant)
            }
            ImplementationSpec::Super => Implementation::SuperMethodCall,
            ImplementationSpec::Throw { exception, message } => Implementation::ExceptionThrowing {
                exception: exception.as_str().into(),
                message: message.as_deref().map(Into::into),
            },
            ImplementationSpec::Field { name, define } => Implementation::FieldAccessor {
                name: name.as_str().into(),
                define: define.as_deref().map(|ty| parse_type(ty, &[])).transpose()?,
            },
            ImplementationSpec::Helper {
                name,
                returns,
                value,
            } => Implementation::InvokeHelper {
                name: name.as_str().into(),
                return_type: parse_type(returns, &[])?,
                value: value.constant(),
            },
            ImplementationSpec::Sequence { parts } => Implementation::Compound(
                parts
                    .iter()
                    .map(ImplementationSpec::implementation)
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

impl ValueSpec {
    fn constant(&self) -> Constant {
        match self {
            ValueSpec::Boolean(value) => Constant::Boolean(*value),
            ValueSpec::Integer(value) => {
                i32::try_from(*value).map_or(Constant::Long(*value), Constant::Int)
            }
            ValueSpec::Text(text) => Constant::Text(text.as_str().into()),
        }
    }

    /// The annotation value this literal denotes when stored as a `target`.
    fn annotation_value(&self, target: &TypeRef) -> Result<AnnotationValue, PlanError> {
        let invalid = || PlanError::InvalidValue {
            value: self.to_string(),
            target: target.to_string(),
        };
        Ok(match (self, target) {
            (ValueSpec::Boolean(value), _) => AnnotationValue::Boolean(*value),
            (ValueSpec::Integer(value), TypeRef::Primitive(Primitive::Long)) => {
                AnnotationValue::Long(*value)
            }
            (ValueSpec::Integer(value), _) => {
                AnnotationValue::Int(i32::try_from(*value).map_err(|_| invalid())?)
            }
            (ValueSpec::Text(text), TypeRef::Primitive(Primitive::Char)) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(value), None) => AnnotationValue::Char(value),
                    _ => return Err(invalid()),
                }
            }
            (ValueSpec::Text(text), _) => AnnotationValue::String(text.as_str().into()),
        })
    }
}

impl std::fmt::Display for ValueSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSpec::Boolean(value) => write!(f, "{value}"),
            ValueSpec::Integer(value) => write!(f, "{value}"),
            ValueSpec::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// Parses Java modifier keywords.
pub fn parse_modifiers(keywords: &[String]) -> Result<Modifiers, PlanError> {
    keywords.iter().try_fold(Modifiers::empty(), |modifiers, keyword| {
        let flag = match keyword.as_str() {
            "public" => Modifiers::PUBLIC,
            "private" => Modifiers::PRIVATE,
            "protected" => Modifiers::PROTECTED,
            "static" => Modifiers::STATIC,
            "final" => Modifiers::FINAL,
            "synchronized" => Modifiers::SYNCHRONIZED,
            "native" => Modifiers::NATIVE,
            "abstract" => Modifiers::ABSTRACT,
            "strictfp" => Modifiers::STRICT,
            "synthetic" => Modifiers::SYNTHETIC,
            "bridge" => Modifiers::BRIDGE,
            "varargs" => Modifiers::VARARGS,
            "annotation" => Modifiers::ANNOTATION | Modifiers::INTERFACE | Modifiers::ABSTRACT,
            "enum" => Modifiers::ENUM,
            _ => {
                return Err(PlanError::UnknownModifier {
                    keyword: keyword.clone(),
                });
            }
        };
        Ok(modifiers | flag)
    })
}

fn parse_type(text: &str, variables: &[TypeVariableToken]) -> Result<TypeRef, PlanError> {
    TypeRef::parse(text, variables).ok_or_else(|| PlanError::InvalidType {
        text: text.to_string(),
    })
}

fn parse_types(
    texts: &[String],
    variables: &[TypeVariableToken],
) -> Result<Vec<TypeRef>, PlanError> {
    texts.iter().map(|text| parse_type(text, variables)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytesmith_core::config::ClassFileVersion;
    use bytesmith_core::scaffold::subclass::ConstructorStrategy;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    const BASE: &str = r#"
[[types]]
name = "a.Base"
constructors = [{ parameters = [] }, { parameters = ["int"], modifiers = ["protected"] }]

[[types.methods]]
name = "size"
returns = "int"

[[types.methods]]
name = "describe"
returns = "java.lang.String"
parameters = ["int"]
modifiers = ["protected"]
"#;

    fn write_plan(dir: &TempDir, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let plan = path.join("plan.toml");
        fs::write(&plan, content).unwrap();
        plan
    }

    fn plan(subclass: &str) -> Plan {
        Plan::from_toml_str(&format!("{BASE}\n{subclass}")).unwrap()
    }

    #[test]
    fn test_load_minimal_plan() {
        let temp = TempDir::new().unwrap();
        let path = write_plan(
            &temp,
            r#"
[subclass]
name = "a.Empty"
"#,
        );

        let plan = load_plan(&path).unwrap();
        assert_eq!(plan.build, BuildConfig::default());
        assert!(plan.types.is_empty());
        assert_eq!(plan.subclass.superclass, OBJECT);
        assert_eq!(plan.subclass.resolution, TypeResolutionStrategy::Passive);
    }

    #[test]
    fn test_load_plan_with_build_table() {
        let temp = TempDir::new().unwrap();
        let path = write_plan(
            &temp,
            r#"
[build]
class-file-version = 11
constructor-strategy = "default-constructor"

[subclass]
name = "a.Empty"
resolution = "active"
"#,
        );

        let plan = load_plan(&path).unwrap();
        assert_eq!(plan.build.class_file_version, ClassFileVersion::JAVA_V11);
        assert_eq!(
            plan.build.constructor_strategy,
            ConstructorStrategy::DefaultConstructor
        );
        assert_eq!(plan.subclass.resolution, TypeResolutionStrategy::Active);
    }

    #[test]
    fn test_load_missing_plan() {
        let temp = TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("missing.toml")).unwrap();
        let err = load_plan(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read plan"));
    }

    #[test]
    fn test_plan_without_subclass_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_plan(&temp, BASE);
        let err = load_plan(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse plan"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = Plan::from_toml_str(
            r#"
[subclass]
name = "a.Empty"
colour = "blue"
"#,
        );
        assert!(matches!(result, Err(PlanError::Parse { .. })));
    }

    #[test]
    fn test_invalid_build_table() {
        let result = Plan::from_toml_str(
            r#"
[build]
class-file-version = 99

[subclass]
name = "a.Empty"
"#,
        );
        assert!(matches!(result, Err(PlanError::Config(_))));
    }

    #[test]
    fn test_pool_contains_declared_types() {
        let plan = plan(
            r#"
[[types]]
name = "a.Holder"
type-variables = ["T"]
fields = [{ name = "value", type = "T", modifiers = ["protected"] }]
methods = [{ name = "get", returns = "T" }]

[subclass]
name = "a.Sub"
superclass = "a.Base"
"#,
        );
        let pool = plan.pool().unwrap();
        let base = pool.describe("a.Base").unwrap();
        assert_eq!(base.declared_methods().len(), 4);
        let holder = pool.describe("a.Holder").unwrap();
        assert_eq!(holder.type_variables.len(), 1);
        assert!(matches!(
            holder.declared_fields()[0].type_ref,
            TypeRef::Variable { .. }
        ));
        assert!(pool.describe(OBJECT).is_some());
    }

    #[test]
    fn test_invalid_type_name() {
        let plan = plan(
            r#"
[subclass]
name = "a.Sub"
superclass = "a.Base<"
"#,
        );
        let err = plan.builder().unwrap_err();
        assert!(matches!(err, PlanError::InvalidType { ref text } if text == "a.Base<"));
    }

    #[test]
    fn test_parse_modifiers() {
        let keywords = ["public".to_string(), "static".to_string(), "final".to_string()];
        assert_eq!(
            parse_modifiers(&keywords).unwrap(),
            Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL
        );
        assert_eq!(parse_modifiers(&[]).unwrap(), Modifiers::empty());
        let err = parse_modifiers(&["volatile".to_string()]).unwrap_err();
        assert!(matches!(err, PlanError::UnknownModifier { ref keyword } if keyword == "volatile"));
    }

    #[test]
    fn test_intercept_rule_builds_subclass() {
        let plan = plan(
            r#"
[subclass]
name = "a.Sub"
superclass = "a.Base"

[[subclass.intercept]]
name = "size"
implementation = { kind = "fixed", value = 42 }
"#,
        );
        let ty = plan.builder().unwrap().make(plan.subclass.resolution).unwrap();
        assert!(ty.class_file.method("size").is_some());
        assert!(ty.class_file.method("describe").is_none());
        assert_eq!(ty.class_file.methods_named("<init>").count(), 2);
        assert!(ty.listing().contains("public class a.Sub extends a.Base {"));
    }

    #[test]
    fn test_intercept_criteria_combine() {
        let rule = InterceptSpec {
            name: None,
            name_prefix: Some("get".to_string()),
            declared_by: Some("a.Base".to_string()),
            arguments: Some(0),
            implementation: ImplementationSpec::Stub,
        };
        assert_eq!(
            rule.matcher(),
            MethodMatcher::And(vec![
                MethodMatcher::NameStartsWith("get".into()),
                MethodMatcher::DeclaredBy("a.Base".into()),
                MethodMatcher::TakesArguments(0),
            ])
        );
        let any = InterceptSpec {
            name: None,
            name_prefix: None,
            declared_by: None,
            arguments: None,
            implementation: ImplementationSpec::Stub,
        };
        assert_eq!(any.matcher(), MethodMatcher::Any);
    }

    #[test]
    fn test_defined_members() {
        let plan = plan(
            r#"
[subclass]
name = "a.Sub"
superclass = "a.Base"
modifiers = ["public", "abstract"]

[[subclass.fields]]
name = "LIMIT"
type = "int"
modifiers = ["public", "static", "final"]
value = 10
annotations = ["a.Tag"]

[[subclass.methods]]
name = "limit"
returns = "int"
implementation = { kind = "helper", name = "computeLimit", returns = "int", value = 10 }

[[subclass.methods]]
name = "run"
"#,
        );
        let ty = plan.builder().unwrap().make(TypeResolutionStrategy::Passive).unwrap();
        let limit = ty.class_file.field("LIMIT").unwrap();
        assert_eq!(limit.constant, Some(AnnotationValue::Int(10)));
        assert_eq!(limit.annotations.len(), 1);
        assert!(ty.class_file.method("limit").unwrap().code.is_some());
        assert!(ty.class_file.method("run").unwrap().code.is_none());
    }

    #[test]
    fn test_conflicting_method_body() {
        let plan = plan(
            r#"
[subclass]
name = "a.Sub"
superclass = "a.Base"

[[subclass.methods]]
name = "value"
returns = "int"
implementation = { kind = "stub" }
default = 1
"#,
        );
        let err = plan.builder().unwrap_err();
        assert!(matches!(err, PlanError::ConflictingBody { ref method } if method == "value"));
    }

    #[test]
    fn test_implementation_specs() {
        let spec = ImplementationSpec::Sequence {
            parts: vec![
                ImplementationSpec::Super,
                ImplementationSpec::Fixed { value: None },
                ImplementationSpec::Throw {
                    exception: "java.lang.IllegalStateException".to_string(),
                    message: Some("closed".to_string()),
                },
            ],
        };
        assert_eq!(
            spec.implementation().unwrap(),
            Implementation::Compound(vec![
                Implementation::SuperMethodCall,
                Implementation::FixedValue(Constant::Null),
                Implementation::ExceptionThrowing {
                    exception: "java.lang.IllegalStateException".into(),
                    message: Some("closed".into()),
                },
            ])
        );
    }

    #[test]
    fn test_values_follow_their_target() {
        let int = TypeRef::Primitive(Primitive::Int);
        let long = TypeRef::Primitive(Primitive::Long);
        let character = TypeRef::Primitive(Primitive::Char);
        assert_eq!(
            ValueSpec::Integer(3).annotation_value(&long).unwrap(),
            AnnotationValue::Long(3)
        );
        assert_eq!(
            ValueSpec::Text("x".to_string()).annotation_value(&character).unwrap(),
            AnnotationValue::Char('x')
        );
        assert!(ValueSpec::Text("xy".to_string()).annotation_value(&character).is_err());
        assert!(ValueSpec::Integer(i64::MAX).annotation_value(&int).is_err());
        assert_eq!(ValueSpec::Integer(i64::MAX).constant(), Constant::Long(i64::MAX));
    }
}
