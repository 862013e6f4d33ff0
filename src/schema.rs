//! Schema nodes.
//!
//! Nodes live in an arena owned by [`crate::resolver::JsonSchemaResolver`]
//! and point at each other through [`SchemaId`], so reference cycles are
//! plain data.
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    pub fn index(self) -> usize { self.0 }
}

/// JSON `type` keyword as a bitset.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonObjectType(u8);

impl JsonObjectType {
    pub const NONE: Self = Self(0);
    pub const ARRAY: Self = Self(1);
    pub const BOOLEAN: Self = Self(1 << 1);
    pub const INTEGER: Self = Self(1 << 2);
    pub const NULL: Self = Self(1 << 3);
    pub const NUMBER: Self = Self(1 << 4);
    pub const OBJECT: Self = Self(1 << 5);
    pub const STRING: Self = Self(1 << 6);

    // serialization order
    const NAMES: [(Self, &'static str); 7] = [
        (Self::ARRAY, "array"),
        (Self::BOOLEAN, "boolean"),
        (Self::INTEGER, "integer"),
        (Self::NULL, "null"),
        (Self::NUMBER, "number"),
        (Self::OBJECT, "object"),
        (Self::STRING, "string"),
    ];

    pub fn is_none(self) -> bool { self.0 == 0 }
    pub fn contains(self, other: Self) -> bool { other.0 != 0 && self.0 & other.0 == other.0 }
    pub fn is_numeric(self) -> bool { self.contains(Self::NUMBER) || self.contains(Self::INTEGER) }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES.iter().filter(|(t, _)| self.contains(*t)).map(|(_, n)| *n).collect()
    }
}

impl BitOr for JsonObjectType {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl BitOrAssign for JsonObjectType {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl fmt::Debug for JsonObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

/// Where a node sits. Property nodes never host an object definition inline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaKind {
    #[default]
    Schema,
    Property,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discriminator {
    pub property_name: String,
    /// discriminator value → derived schema
    pub mapping: IndexMap<String, SchemaId>,
}

/// One JSON Schema (sub)document.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchema {
    pub kind: SchemaKind,
    pub type_: JsonObjectType,
    pub format: Option<String>,
    /// `$ref`: this node stands for the referenced one.
    pub reference: Option<SchemaId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub properties: IndexMap<String, SchemaId>,
    pub required: IndexSet<String>,
    pub all_of: Vec<SchemaId>,
    pub one_of: Vec<SchemaId>,
    pub items: Option<SchemaId>,
    pub additional_properties: Option<SchemaId>,
    pub allow_additional_properties: bool,
    pub dictionary_key: Option<SchemaId>,
    pub enumeration: Vec<Value>,
    pub enumeration_names: Vec<String>,
    pub is_flag_enum: bool,
    pub discriminator: Option<Discriminator>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub pattern: Option<String>,
    pub default: Option<Value>,
    pub read_only: bool,
    pub is_abstract: bool,
    /// Dialect-specific nullable flag (`nullable` / `x-nullable`).
    pub is_nullable_raw: Option<bool>,
    pub extension_data: IndexMap<String, Value>,
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self {
            kind: SchemaKind::Schema,
            type_: JsonObjectType::NONE,
            format: None,
            reference: None,
            title: None,
            description: None,
            properties: IndexMap::new(),
            required: IndexSet::new(),
            all_of: Vec::new(),
            one_of: Vec::new(),
            items: None,
            additional_properties: None,
            allow_additional_properties: true,
            dictionary_key: None,
            enumeration: Vec::new(),
            enumeration_names: Vec::new(),
            is_flag_enum: false,
            discriminator: None,
            minimum: None,
            maximum: None,
            multiple_of: None,
            min_length: None,
            max_length: None,
            min_items: None,
            max_items: None,
            pattern: None,
            default: None,
            read_only: false,
            is_abstract: false,
            is_nullable_raw: None,
            extension_data: IndexMap::new(),
        }
    }
}

impl JsonSchema {
    pub fn new(kind: SchemaKind) -> Self {
        Self { kind, ..Self::default() }
    }

    pub fn of_type(type_: JsonObjectType) -> Self {
        Self { type_, ..Self::default() }
    }

    pub fn reference_to(target: SchemaId) -> Self {
        Self { reference: Some(target), ..Self::default() }
    }

    pub fn has_reference(&self) -> bool { self.reference.is_some() }

    /// True for the unconstrained "anything goes" schema.
    pub fn is_any(&self) -> bool {
        *self == Self::new(self.kind)
    }

    /// Whether anything besides `$ref` (and the node kind) is set.
    pub fn has_sibling_keywords(&self) -> bool {
        let bare = Self { reference: None, ..self.clone() };
        !bare.is_any()
    }
}
