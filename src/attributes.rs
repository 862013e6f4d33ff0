//! Metadata attached to types, members and enum variants.
//!
//! Each recognized annotation kind is one variant; anything else
//! deserializes to [`Attribute::Unknown`] and is never interpreted.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::TypeRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribute {
    /// Member must be present (and non-null).
    Required {
        #[serde(default)]
        allow_empty_strings: bool,
    },
    /// Serialization-library property settings: rename and requiredness level.
    JsonProperty {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        required: RequiredLevel,
    },
    /// Contract-style member marker (opts a member in under a contract policy).
    DataMember {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        is_required: bool,
    },
    /// Type-level: only members marked `data_member`/`json_property` are serialized.
    DataContract,
    JsonIgnore,
    /// Member: never emitted. Type: never linked or flattened as a base type.
    JsonSchemaIgnore,
    Obsolete {
        #[serde(default)]
        message: Option<String>,
    },
    NotNull,
    CanBeNull,
    Display { name: String },
    Description { text: String },
    DefaultValue { value: Value },
    RegularExpression { pattern: String },
    Range {
        #[serde(default)]
        minimum: Option<f64>,
        #[serde(default)]
        maximum: Option<f64>,
    },
    MinLength { length: u64 },
    MaxLength { length: u64 },
    StringLength {
        maximum_length: u64,
        #[serde(default)]
        minimum_length: Option<u64>,
    },
    /// Combined length range for strings and collections.
    Length {
        #[serde(default)]
        minimum_length: Option<u64>,
        #[serde(default)]
        maximum_length: Option<u64>,
    },
    MultipleOf { value: f64 },
    DataType { data_type: DataType },
    ReadOnly,
    ExtensionData { key: String, value: Value },
    /// Enums are serialized by name instead of by underlying value.
    StringEnum,
    /// Enum type: values combine as bit flags.
    Flags,
    /// Enum variant: explicit serialized name.
    EnumMember { value: String },
    /// Polymorphic-converter marker declaring the discriminator property.
    Discriminator {
        #[serde(default)]
        property: Option<String>,
    },
    KnownType {
        #[serde(default, rename = "type")]
        ty: Option<TypeRef>,
        #[serde(default)]
        method: Option<String>,
    },
    /// Type-level: always flatten this type's inheritance hierarchy.
    Flatten,
    #[serde(other)]
    Unknown,
}

/// Requiredness carried by `json_property`.
///
/// Levels are read as null handling: only `always` and `disallow_null`
/// make a member required, and both make it non-null. `allow_null` keeps
/// the member optional and nullable, unlike serializers where it means
/// "present but possibly null".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredLevel {
    /// Natural nullability of the member type; not required.
    #[default]
    Default,
    /// Optional and nullable.
    AllowNull,
    /// Required and non-null.
    Always,
    /// Required and non-null.
    DisallowNull,
}

impl RequiredLevel {
    pub fn is_required(self) -> bool {
        matches!(self, Self::Always | Self::DisallowNull)
    }
    pub fn allows_null(self) -> bool {
        matches!(self, Self::Default | Self::AllowNull)
    }
}

/// Semantic data type hints, mapped to `format` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    DateTime,
    Date,
    Time,
    Duration,
    EmailAddress,
    PhoneNumber,
    Url,
    ImageUrl,
    Password,
    Currency,
    Text,
    MultilineText,
}

/// Lookups over an attribute list.
pub trait AttributeSet {
    fn has(&self, pred: impl Fn(&Attribute) -> bool) -> bool;

    fn is_not_null(&self) -> bool { self.has(|a| matches!(a, Attribute::NotNull)) }
    fn is_can_be_null(&self) -> bool { self.has(|a| matches!(a, Attribute::CanBeNull)) }
    fn is_string_enum(&self) -> bool { self.has(|a| matches!(a, Attribute::StringEnum)) }
    fn is_schema_ignored(&self) -> bool { self.has(|a| matches!(a, Attribute::JsonSchemaIgnore)) }
    fn is_flatten(&self) -> bool { self.has(|a| matches!(a, Attribute::Flatten)) }
    fn is_flags(&self) -> bool { self.has(|a| matches!(a, Attribute::Flags)) }
    fn is_contract_opt_in(&self) -> bool { self.has(|a| matches!(a, Attribute::DataContract)) }

    fn extension_data(&self) -> Vec<(&str, &Value)>;
    fn enum_member_name(&self) -> Option<&str>;
}

impl AttributeSet for [Attribute] {
    fn has(&self, pred: impl Fn(&Attribute) -> bool) -> bool {
        self.iter().any(pred)
    }

    fn extension_data(&self) -> Vec<(&str, &Value)> {
        self.iter()
            .filter_map(|a| match a {
                Attribute::ExtensionData { key, value } => Some((key.as_str(), value)),
                _ => None,
            })
            .collect()
    }

    fn enum_member_name(&self) -> Option<&str> {
        self.iter().find_map(|a| match a {
            Attribute::EnumMember { value } => Some(value.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kinds_are_kept_opaque() {
        let attrs: Vec<Attribute> = serde_json::from_str(r#"[
            { "kind": "required" },
            { "kind": "xml_element", "name": "x" },
            { "kind": "range", "minimum": 1 }
        ]"#).unwrap();
        assert_eq!(attrs[0], Attribute::Required { allow_empty_strings: false });
        assert_eq!(attrs[1], Attribute::Unknown);
        assert_eq!(attrs[2], Attribute::Range { minimum: Some(1.0), maximum: None });
    }

    #[test]
    fn required_levels() {
        assert!(RequiredLevel::Always.is_required());
        assert!(RequiredLevel::DisallowNull.is_required());
        assert!(!RequiredLevel::AllowNull.is_required());
        assert!(RequiredLevel::AllowNull.allows_null());
        assert!(!RequiredLevel::Always.allows_null());
    }

    #[test]
    fn known_type_reads_type_ref() {
        let attr: Attribute =
            serde_json::from_str(r#"{ "kind": "known_type", "type": "Vec<Cat>" }"#).unwrap();
        let Attribute::KnownType { ty: Some(ty), method: None } = attr else { panic!("{attr:?}") };
        assert!(ty.is_array());
    }
}
