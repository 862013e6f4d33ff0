//! Constraint hints and their mapping onto schema keywords.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::attributes::{Attribute, DataType, RequiredLevel};
use crate::reflection::TypeDescriptor;
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonObjectType, SchemaId};

/// Semantic data type → `format`. Immutable after first use.
pub static DATA_TYPE_FORMATS: Lazy<IndexMap<DataType, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        (DataType::DateTime, "date-time"),
        (DataType::Date, "date"),
        (DataType::Time, "time"),
        (DataType::Duration, "duration"),
        (DataType::EmailAddress, "email"),
        (DataType::PhoneNumber, "phone"),
        (DataType::Url, "uri"),
        (DataType::ImageUrl, "uri"),
        (DataType::Password, "password"),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredHint {
    pub allow_empty_strings: bool,
}

/// Recognized hints extracted from one member's metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintHints {
    pub required: Option<RequiredHint>,
    /// Contract-level "member is required".
    pub contract_required: bool,
    pub serialization_required: RequiredLevel,
    /// Explicit opt-in marker present (contract member or serialization property).
    pub opted_in: bool,
    pub ignored: bool,
    pub obsolete: bool,
    pub rename: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub default_value: Option<Value>,
    pub pattern: Option<String>,
    pub range: Option<(Option<f64>, Option<f64>)>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub string_length: Option<(Option<u64>, u64)>,
    pub length_range: Option<(Option<u64>, Option<u64>)>,
    pub data_type: Option<DataType>,
    pub read_only: bool,
}

impl ConstraintHints {
    pub fn is_required(&self) -> bool {
        self.required.is_some() || self.contract_required || self.serialization_required.is_required()
    }
}

pub trait AnnotationExtractor {
    fn extract(&self, attributes: &[Attribute]) -> ConstraintHints;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnnotationExtractor;

impl AnnotationExtractor for DefaultAnnotationExtractor {
    fn extract(&self, attributes: &[Attribute]) -> ConstraintHints {
        let mut hints = ConstraintHints::default();
        for attr in attributes {
            match attr {
                Attribute::Required { allow_empty_strings } => {
                    hints.required = Some(RequiredHint { allow_empty_strings: *allow_empty_strings });
                }
                Attribute::JsonProperty { name, required } => {
                    hints.opted_in = true;
                    hints.serialization_required = *required;
                    if name.is_some() {
                        hints.rename = name.clone();
                    }
                }
                Attribute::DataMember { name, is_required } => {
                    hints.opted_in = true;
                    hints.contract_required |= *is_required;
                    if hints.rename.is_none() {
                        hints.rename = name.clone();
                    }
                }
                Attribute::JsonIgnore | Attribute::JsonSchemaIgnore => hints.ignored = true,
                Attribute::Obsolete { .. } => hints.obsolete = true,
                Attribute::Display { name } => hints.display_name = Some(name.clone()),
                Attribute::Description { text } => hints.description = Some(text.clone()),
                Attribute::DefaultValue { value } => hints.default_value = Some(value.clone()),
                Attribute::RegularExpression { pattern } => hints.pattern = Some(pattern.clone()),
                Attribute::Range { minimum, maximum } => hints.range = Some((*minimum, *maximum)),
                Attribute::MultipleOf { value } => hints.multiple_of = Some(*value),
                Attribute::MinLength { length } => hints.min_length = Some(*length),
                Attribute::MaxLength { length } => hints.max_length = Some(*length),
                Attribute::StringLength { maximum_length, minimum_length } => {
                    hints.string_length = Some((*minimum_length, *maximum_length));
                }
                Attribute::Length { minimum_length, maximum_length } => {
                    hints.length_range = Some((*minimum_length, *maximum_length));
                }
                Attribute::DataType { data_type } => hints.data_type = Some(*data_type),
                Attribute::ReadOnly => hints.read_only = true,
                _ => {}
            }
        }
        hints
    }
}

/// Apply constraint hints to `schema` (the property's own node).
///
/// | hint | keyword |
/// |---|---|
/// | display name | `title` |
/// | default value | `default` (unless already set) |
/// | pattern | `pattern`, on the value schema for dictionaries |
/// | range (numeric) | `minimum` / `maximum`, finite bounds only |
/// | multiple of (numeric) | `multipleOf` |
/// | min/max length | `minLength`/`maxLength` (string), `minItems`/`maxItems` (array) |
/// | string length | `minLength`/`maxLength` (string) |
/// | length range | both bounds, string or array; applied last |
/// | data type | `format` via [`DATA_TYPE_FORMATS`] |
pub fn apply_annotations(
    resolver: &mut JsonSchemaResolver,
    schema: SchemaId,
    descriptor: &TypeDescriptor,
    hints: &ConstraintHints,
) {
    if let Some(pattern) = &hints.pattern {
        let target = if descriptor.is_dictionary() {
            resolver.node(schema).additional_properties.unwrap_or(schema)
        } else {
            schema
        };
        resolver.node_mut(target).pattern = Some(pattern.clone());
    }

    let object_type = descriptor.object_type;
    let is_string = object_type.contains(JsonObjectType::STRING);
    let is_array = object_type.contains(JsonObjectType::ARRAY);
    let node = resolver.node_mut(schema);

    if let Some(title) = &hints.display_name {
        node.title = Some(title.clone());
    }
    if node.default.is_none() {
        node.default = hints.default_value.clone();
    }

    if object_type.is_numeric() {
        if let Some((min, max)) = hints.range {
            node.minimum = min.filter(|v| v.is_finite()).or(node.minimum);
            node.maximum = max.filter(|v| v.is_finite()).or(node.maximum);
        }
        if let Some(m) = hints.multiple_of {
            node.multiple_of = Some(m);
        }
    }

    let mut set_lengths = |min: Option<u64>, max: Option<u64>, strings_only: bool| {
        if is_string {
            node.min_length = min.or(node.min_length);
            node.max_length = max.or(node.max_length);
        } else if is_array && !strings_only {
            node.min_items = min.or(node.min_items);
            node.max_items = max.or(node.max_items);
        }
    };
    if hints.min_length.is_some() || hints.max_length.is_some() {
        set_lengths(hints.min_length, hints.max_length, false);
    }
    if let Some((min, max)) = hints.string_length {
        set_lengths(min, Some(max), true);
    }
    if let Some((min, max)) = hints.length_range {
        set_lengths(min, max, false);
    }

    if let Some(format) = hints.data_type.and_then(|d| DATA_TYPE_FORMATS.get(&d)) {
        node.format = Some(format.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRef;
    use crate::reflection::TypeKind;
    use crate::schema::JsonSchema;

    fn descriptor(kind: TypeKind, object_type: JsonObjectType) -> TypeDescriptor {
        TypeDescriptor {
            ty: TypeRef::named("t"),
            kind,
            object_type,
            format: None,
            is_nullable: false,
            element: None,
            key: None,
        }
    }

    #[test]
    fn extraction_collects_requiredness_signals() {
        let hints = DefaultAnnotationExtractor.extract(&[
            Attribute::DataMember { name: Some("id".into()), is_required: true },
            Attribute::JsonProperty { name: None, required: RequiredLevel::AllowNull },
            Attribute::Unknown,
        ]);
        assert!(hints.contract_required);
        assert!(hints.opted_in);
        assert_eq!(hints.rename.as_deref(), Some("id"));
        assert!(hints.is_required());
        assert!(hints.required.is_none());
    }

    #[test]
    fn numeric_range_keeps_finite_bounds_only() {
        let mut r = JsonSchemaResolver::new();
        let s = r.alloc(JsonSchema::of_type(JsonObjectType::NUMBER));
        let hints = ConstraintHints {
            range: Some((Some(f64::NEG_INFINITY), Some(10.0))),
            multiple_of: Some(0.5),
            ..ConstraintHints::default()
        };
        apply_annotations(&mut r, s, &descriptor(TypeKind::Primitive, JsonObjectType::NUMBER), &hints);
        assert_eq!(r.node(s).minimum, None);
        assert_eq!(r.node(s).maximum, Some(10.0));
        assert_eq!(r.node(s).multiple_of, Some(0.5));
    }

    #[test]
    fn lengths_map_by_shape() {
        let hints = ConstraintHints { min_length: Some(1), max_length: Some(5), ..ConstraintHints::default() };
        let mut r = JsonSchemaResolver::new();
        let text = r.alloc(JsonSchema::default());
        let list = r.alloc(JsonSchema::default());
        apply_annotations(&mut r, text, &descriptor(TypeKind::Primitive, JsonObjectType::STRING), &hints);
        apply_annotations(&mut r, list, &descriptor(TypeKind::Array, JsonObjectType::ARRAY), &hints);
        assert_eq!((r.node(text).min_length, r.node(text).max_length), (Some(1), Some(5)));
        assert_eq!((r.node(list).min_items, r.node(list).max_items), (Some(1), Some(5)));
        assert_eq!(r.node(list).min_length, None);
    }

    #[test]
    fn combined_length_wins_and_string_length_skips_arrays() {
        let hints = ConstraintHints {
            max_length: Some(50),
            string_length: Some((None, 20)),
            length_range: Some((Some(2), Some(8))),
            ..ConstraintHints::default()
        };
        let mut r = JsonSchemaResolver::new();
        let text = r.alloc(JsonSchema::default());
        apply_annotations(&mut r, text, &descriptor(TypeKind::Primitive, JsonObjectType::STRING), &hints);
        assert_eq!((r.node(text).min_length, r.node(text).max_length), (Some(2), Some(8)));

        let only_string = ConstraintHints { string_length: Some((Some(1), 3)), ..ConstraintHints::default() };
        let list = r.alloc(JsonSchema::default());
        apply_annotations(&mut r, list, &descriptor(TypeKind::Array, JsonObjectType::ARRAY), &only_string);
        assert_eq!(r.node(list).max_items, None);
    }

    #[test]
    fn pattern_goes_to_dictionary_values_and_data_type_to_format() {
        let mut r = JsonSchemaResolver::new();
        let value = r.alloc(JsonSchema::of_type(JsonObjectType::STRING));
        let dict = r.alloc(JsonSchema { additional_properties: Some(value), ..JsonSchema::default() });
        let hints = ConstraintHints {
            pattern: Some("^[a-z]+$".into()),
            ..ConstraintHints::default()
        };
        apply_annotations(&mut r, dict, &descriptor(TypeKind::Dictionary, JsonObjectType::OBJECT), &hints);
        assert_eq!(r.node(value).pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(r.node(dict).pattern, None);

        let email = r.alloc(JsonSchema::of_type(JsonObjectType::STRING));
        let hints = ConstraintHints { data_type: Some(DataType::EmailAddress), ..ConstraintHints::default() };
        apply_annotations(&mut r, email, &descriptor(TypeKind::Primitive, JsonObjectType::STRING), &hints);
        assert_eq!(r.node(email).format.as_deref(), Some("email"));
    }
}
