//! Dictionary schemas.
use crate::error::{Result, SchemaError};
use crate::reflection::TypeDescriptor;
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonObjectType, JsonSchema, SchemaId, SchemaKind};

use super::JsonSchemaGenerator;

impl JsonSchemaGenerator {
    /// String-keyed map: an open object whose values follow one schema.
    pub fn build_dictionary(
        &self,
        descriptor: &TypeDescriptor,
        schema: SchemaId,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        let Some(value) = &descriptor.element else {
            return Err(SchemaError::UnresolvedElementType { type_name: descriptor.ty.to_string() });
        };
        let node = resolver.node_mut(schema);
        node.type_ = JsonObjectType::OBJECT;
        node.allow_additional_properties = true;

        let additional = if self.describe(value, &[])?.is_any() {
            resolver.alloc(JsonSchema::default())
        } else {
            self.generate_with_reference_and_nullability(
                value,
                &[],
                value.is_optional(),
                SchemaKind::Schema,
                resolver,
                |_, _, _| Ok(()),
            )?
        };
        resolver.node_mut(schema).additional_properties = Some(additional);

        if let Some(key) = &descriptor.key {
            if self.describe(key, &[])?.is_enum() {
                let key_schema = self.generate_with_reference_and_nullability(
                    key,
                    &[],
                    false,
                    SchemaKind::Schema,
                    resolver,
                    |_, _, _| Ok(()),
                )?;
                resolver.node_mut(schema).dictionary_key = Some(key_schema);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SchemaError;
    use crate::generator::tests::{emit, generator};
    use crate::model::TypeRef;
    use crate::settings::{GeneratorSettings, ReferenceNullability};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MODEL: &str = r#"{ "types": {
        "Bag": { "members": [
            { "name": "Extra", "type": "Map<string, any>" },
            { "name": "Items", "type": "Map<string, Item>" },
            { "name": "ByColor", "type": "Map<Color, i32>" }
        ] },
        "Item": { "members": [ { "name": "Sku", "type": "string" } ] },
        "Color": { "kind": "enum", "variants": [ { "name": "Red" }, { "name": "Green" } ] }
    } }"#;

    fn strict() -> GeneratorSettings {
        GeneratorSettings {
            default_reference_type_nullability: ReferenceNullability::NotNull,
            ..GeneratorSettings::default()
        }
    }

    #[test]
    fn opaque_values_are_unconstrained() {
        let doc = emit(MODEL, "Bag", strict());
        assert_eq!(doc["properties"]["Extra"], json!({ "type": "object", "additionalProperties": {} }));
    }

    #[test]
    fn referenceable_values_become_references() {
        let doc = emit(MODEL, "Bag", strict());
        assert_eq!(
            doc["properties"]["Items"],
            json!({ "type": "object", "additionalProperties": { "$ref": "#/definitions/Item" } })
        );
    }

    #[test]
    fn enum_keys_are_recorded() {
        let doc = emit(MODEL, "Bag", strict());
        let by_color = &doc["properties"]["ByColor"];
        assert_eq!(by_color["additionalProperties"], json!({ "type": "integer", "format": "int32" }));
        assert_eq!(by_color["x-dictionaryKey"], json!({ "$ref": "#/definitions/Color" }));
    }

    #[test]
    fn map_without_value_type_is_fatal() {
        let model = r#"{ "types": { "Broken": { "members": [ { "name": "Raw", "type": "Map" } ] } } }"#;
        let err = generator(model, strict()).generate(&TypeRef::named("Broken")).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedElementType { .. }), "{err}");
    }
}
