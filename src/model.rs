//! Declarative type model.
//!
//! A [`TypeModel`] is the structural description the generator consumes
//! through [`crate::reflection::ModelTypeProvider`]. Types are referred to by
//! [`TypeRef`], a small structured reference with a text form like
//! `Map<string, Vec<Order>>` or `i32?`.
use std::fmt;
use std::iter::Peekable;
use std::path::Path;
use std::str::CharIndices;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attributes::Attribute;
use crate::error::{Result, SchemaError};

// ————————————————————————————————————————————————————————————————————————————
// TYPE REFERENCES
// ————————————————————————————————————————————————————————————————————————————

const OPTIONAL_NAMES: &[&str] = &["Option", "Nullable"];
const ARRAY_NAMES: &[&str] = &["Vec", "List", "Array", "Set", "HashSet", "BTreeSet", "IndexSet"];
const MAP_NAMES: &[&str] = &["Map", "HashMap", "BTreeMap", "IndexMap", "Dictionary"];

/// Reference to a (possibly generic) type: a definition name plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    pub name: String,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), args: Vec::new() }
    }
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self { name: name.into(), args }
    }
    pub fn optional(inner: TypeRef) -> Self {
        Self::generic("Option", vec![inner])
    }
    pub fn array(item: TypeRef) -> Self {
        Self::generic("Vec", vec![item])
    }
    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        Self::generic("Map", vec![key, value])
    }

    pub fn is_generic(&self) -> bool { !self.args.is_empty() }
    pub fn is_optional(&self) -> bool {
        OPTIONAL_NAMES.contains(&self.name.as_str()) && self.args.len() == 1
    }
    pub fn is_array(&self) -> bool { ARRAY_NAMES.contains(&self.name.as_str()) }
    pub fn is_map(&self) -> bool { MAP_NAMES.contains(&self.name.as_str()) }

    /// Strip every optional-value wrapper; returns the inner type and whether
    /// anything was stripped.
    pub fn unwrap_optional(&self) -> (&TypeRef, bool) {
        let mut current = self;
        let mut wrapped = false;
        while current.is_optional() {
            current = &current.args[0];
            wrapped = true;
        }
        (current, wrapped)
    }

    /// Replace generic parameters by the given arguments (by name).
    pub fn substitute(&self, bindings: &IndexMap<String, TypeRef>) -> TypeRef {
        if self.args.is_empty() {
            if let Some(bound) = bindings.get(&self.name) {
                return bound.clone();
            }
        }
        TypeRef {
            name: self.name.clone(),
            args: self.args.iter().map(|a| a.substitute(bindings)).collect(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeRefParser { src: s, chars: s.char_indices().peekable() };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if let Some(&(_, c)) = parser.chars.peek() {
            return Err(parser.error(format!("unexpected '{c}'")));
        }
        Ok(ty)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = SchemaError;
    fn try_from(value: String) -> Result<Self> { value.parse() }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self { value.to_string() }
}

// type  := name ('<' type (',' type)* '>')? '?'*
struct TypeRefParser<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl TypeRefParser<'_> {
    fn parse_type(&mut self) -> Result<TypeRef> {
        self.skip_ws();
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' || c == ':' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error("expected a type name"));
        }

        let mut args = Vec::new();
        self.skip_ws();
        if self.eat('<') {
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                if self.eat(',') { continue; }
                if self.eat('>') { break; }
                return Err(self.error("expected ',' or '>'"));
            }
        }

        let mut ty = TypeRef { name, args };
        loop {
            self.skip_ws();
            if !self.eat('?') { break; }
            ty = TypeRef::optional(ty);
        }
        Ok(ty)
    }

    fn eat(&mut self, expected: char) -> bool {
        match self.chars.peek() {
            Some(&(_, c)) if c == expected => {
                self.chars.next();
                true
            }
            _ => false,
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&mut self, reason: impl Into<String>) -> SchemaError {
        let at = self.chars.peek().map(|(i, _)| *i).unwrap_or(self.src.len());
        SchemaError::InvalidTypeRef {
            input: self.src.to_string(),
            reason: format!("{} (at offset {at})", reason.into()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DEFINITIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDefKind {
    #[default]
    Object,
    Interface,
    Enum,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDef {
    /// Filled from the model key when omitted.
    pub name: String,
    pub kind: TypeDefKind,
    pub description: Option<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// Value types are never naturally nullable.
    pub value_type: bool,
    pub type_parameters: Vec<String>,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub attributes: Vec<Attribute>,
    pub members: Vec<MemberDef>,
    pub variants: Vec<EnumVariantDef>,
    /// Named lists of known types, referenced by `known_type { method }`.
    pub known_type_methods: IndexMap<String, Vec<TypeRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumVariantDef {
    pub name: String,
    /// Underlying numeric value; defaults to the declaration index.
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A set of named type definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeModel {
    #[serde(default)]
    pub types: IndexMap<String, TypeDef>,
}

impl TypeModel {
    pub fn new() -> Self { Self::default() }

    pub fn from_json_str(src: &str) -> Result<Self> {
        let model = crate::path_de::from_str_with_path::<TypeModel>(src)
            .map_err(|message| SchemaError::Load { path: "<inline>".into(), message })?;
        Ok(model.with_names())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let model = crate::path_de::from_slice_with_path::<TypeModel>(&bytes)
            .map_err(|message| SchemaError::Load { path: path.to_path_buf(), message })?;
        Ok(model.with_names())
    }

    /// Fill empty `name` fields from the map keys.
    pub fn with_names(mut self) -> Self {
        for (key, def) in self.types.iter_mut() {
            if def.name.is_empty() {
                def.name = key.clone();
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> { self.types.get(name) }

    pub fn insert(&mut self, def: TypeDef) -> Result<()> {
        if self.types.contains_key(&def.name) {
            return Err(SchemaError::DuplicateTypeDefinition { type_name: def.name });
        }
        self.types.insert(def.name.clone(), def);
        Ok(())
    }

    /// Merge another model in; a type defined in both is an error.
    pub fn extend(&mut self, other: TypeModel) -> Result<()> {
        for (_, def) in other.types {
            self.insert(def)?;
        }
        Ok(())
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_generics_and_optional_sugar() {
        let ty: TypeRef = "Map<string, Vec<Order?>>".parse().unwrap();
        assert!(ty.is_map());
        assert_eq!(ty.args.len(), 2);
        let item = &ty.args[1].args[0];
        assert!(item.is_optional());
        assert_eq!(item.args[0], TypeRef::named("Order"));
        assert_eq!(ty.to_string(), "Map<string, Vec<Option<Order>>>");
    }

    #[test]
    fn rejects_unbalanced_input() {
        let err = "Vec<Order".parse::<TypeRef>().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTypeRef { .. }));
        assert!("Vec<>".parse::<TypeRef>().is_err());
        assert!("Order Item".parse::<TypeRef>().is_err());
    }

    #[test]
    fn unwrap_optional_strips_every_layer() {
        let ty: TypeRef = "i32??".parse().unwrap();
        let (inner, wrapped) = ty.unwrap_optional();
        assert!(wrapped);
        assert_eq!(inner, &TypeRef::named("i32"));
    }

    #[test]
    fn substitute_binds_type_parameters() {
        let mut bindings = IndexMap::new();
        bindings.insert("T".to_string(), TypeRef::named("User"));
        let ty: TypeRef = "Vec<T>".parse().unwrap();
        assert_eq!(ty.substitute(&bindings).to_string(), "Vec<User>");
    }

    #[test]
    fn model_fills_names_and_rejects_duplicates() {
        let mut model = TypeModel::from_json_str(r#"{ "types": { "Pet": { "members": [
            { "name": "Name", "type": "string" }
        ] } } }"#).unwrap();
        assert_eq!(model.get("Pet").unwrap().name, "Pet");
        let again = TypeModel::from_json_str(r#"{ "types": { "Pet": {} } }"#).unwrap();
        let err = model.extend(again).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTypeDefinition { .. }));
    }

    #[test]
    fn load_error_carries_json_path() {
        let err = TypeModel::from_json_str(r#"{ "types": { "Pet": { "members": [
            { "name": "Name", "type": "Vec<" }
        ] } } }"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("types.Pet.members[0]"), "{msg}");
    }
}
