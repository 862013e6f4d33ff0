//! Array schemas.
use tracing::warn;

use crate::error::Result;
use crate::reflection::TypeDescriptor;
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonObjectType, JsonSchema, SchemaId, SchemaKind};

use super::JsonSchemaGenerator;

impl JsonSchemaGenerator {
    /// Items are nullable only when the element type is spelled optional.
    pub fn build_array(
        &self,
        descriptor: &TypeDescriptor,
        schema: SchemaId,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        resolver.node_mut(schema).type_ = JsonObjectType::ARRAY;
        let items = match &descriptor.element {
            Some(element) => self.generate_with_reference_and_nullability(
                element,
                &[],
                element.is_optional(),
                SchemaKind::Schema,
                resolver,
                |_, _, _| Ok(()),
            )?,
            None => {
                warn!(type_name = %descriptor.ty, "no element type, items accept anything");
                resolver.alloc(JsonSchema::default())
            }
        };
        resolver.node_mut(schema).items = Some(items);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::tests::emit;
    use crate::settings::GeneratorSettings;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MODEL: &str = r#"{ "types": {
        "Basket": { "members": [
            { "name": "Fruits", "type": "Vec<Fruit>", "attributes": [ { "kind": "not_null" } ] },
            { "name": "Counts", "type": "List<i32?>", "attributes": [ { "kind": "not_null" } ] },
            { "name": "Loose", "type": "Vec", "attributes": [ { "kind": "not_null" } ] }
        ] },
        "Fruit": { "members": [ { "name": "Kind", "type": "string" } ] }
    } }"#;

    #[test]
    fn items_reference_complex_elements() {
        let doc = emit(MODEL, "Basket", GeneratorSettings::default());
        assert_eq!(
            doc["properties"]["Fruits"],
            json!({ "type": "array", "items": { "$ref": "#/definitions/Fruit" } })
        );
        assert_eq!(
            doc["properties"]["Counts"],
            json!({ "type": "array", "items": { "type": ["integer", "null"], "format": "int32" } })
        );
    }

    #[test]
    fn missing_element_type_falls_back_to_any() {
        let doc = emit(MODEL, "Basket", GeneratorSettings::default());
        assert_eq!(doc["properties"]["Loose"], json!({ "type": "array", "items": {} }));
    }
}
