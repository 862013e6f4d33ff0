//! Enum schemas.
use serde_json::Value;
use tracing::debug;

use crate::attributes::AttributeSet;
use crate::error::Result;
use crate::reflection::{EnumVariant, TypeDescriptor};
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonObjectType, JsonSchema, SchemaId, SchemaKind};

use super::{JsonSchemaGenerator, apply_extension_data};

/// Name a variant serializes as in string mode.
pub fn serialized_name(variant: &EnumVariant) -> &str {
    variant.attributes.enum_member_name().unwrap_or(&variant.name)
}

impl JsonSchemaGenerator {
    pub fn build_enum(
        &self,
        descriptor: &TypeDescriptor,
        schema: SchemaId,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        let key = descriptor.schema_key();
        if let Some(existing) = resolver.get_schema(&descriptor.ty, key) {
            resolver.node_mut(schema).reference = Some(existing);
            return Ok(());
        }
        if resolver.node(schema).kind == SchemaKind::Property {
            let canonical = resolver.alloc(JsonSchema::new(SchemaKind::Schema));
            self.build_enum(descriptor, canonical, resolver)?;
            resolver.node_mut(schema).reference = Some(canonical);
            return Ok(());
        }

        let info = self.provider().type_info(&descriptor.ty)?;
        let as_integer = descriptor.object_type.contains(JsonObjectType::INTEGER);
        debug!(type_name = %descriptor.ty, ?key, "building enum schema");

        let node = resolver.node_mut(schema);
        node.type_ = descriptor.object_type;
        if node.description.is_none() {
            node.description = info.description.clone();
        }
        for variant in &info.variants {
            let value = if as_integer {
                Value::from(variant.value)
            } else {
                Value::from(serialized_name(variant))
            };
            node.enumeration.push(value);
            node.enumeration_names.push(variant.name.clone());
        }
        node.is_flag_enum = info.attributes.is_flags();

        if as_integer && self.settings.generate_enum_mapping_description {
            let mapping: Vec<String> = info.variants.iter().map(|v| format!("{} = {}", v.value, v.name)).collect();
            let mapping = mapping.join("\n");
            node.description = Some(match node.description.take() {
                Some(text) => format!("{text}\n\n{mapping}"),
                None => mapping,
            });
        }
        apply_extension_data(resolver, schema, &info.attributes);

        resolver.add_schema(&descriptor.ty, key, schema, &self.schema_name(&descriptor.ty));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::tests::emit;
    use crate::settings::{EnumHandling, GeneratorSettings};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MODEL: &str = r#"{ "types": {
        "Letter": { "kind": "enum", "variants": [
            { "name": "A" },
            { "name": "B", "attributes": [ { "kind": "enum_member", "value": "bee" } ] }
        ] },
        "Perms": { "kind": "enum", "attributes": [ { "kind": "flags" } ], "variants": [
            { "name": "Read", "value": 1 }, { "name": "Write", "value": 2 }
        ] },
        "Form": { "members": [
            { "name": "Code", "type": "Letter" },
            { "name": "Label", "type": "Letter", "attributes": [ { "kind": "string_enum" } ] },
            { "name": "Again", "type": "Letter" }
        ] }
    } }"#;

    #[test]
    fn integer_and_string_modes() {
        let doc = emit(MODEL, "Letter", GeneratorSettings::default());
        assert_eq!(doc["type"], json!("integer"));
        assert_eq!(doc["enum"], json!([0, 1]));
        assert_eq!(doc["x-enumNames"], json!(["A", "B"]));

        let s = GeneratorSettings { default_enum_handling: EnumHandling::String, ..GeneratorSettings::default() };
        let doc = emit(MODEL, "Letter", s);
        assert_eq!(doc["type"], json!("string"));
        assert_eq!(doc["enum"], json!(["A", "bee"]));
        assert_eq!(doc["x-enumNames"], json!(["A", "B"]));
    }

    #[test]
    fn integer_and_string_variants_get_separate_definitions() {
        let doc = emit(MODEL, "Form", GeneratorSettings::default());
        assert_eq!(doc["properties"]["Code"], json!({ "$ref": "#/definitions/Letter" }));
        assert_eq!(doc["properties"]["Label"], json!({ "$ref": "#/definitions/Letter2" }));
        assert_eq!(doc["properties"]["Again"], json!({ "$ref": "#/definitions/Letter" }));
        assert_eq!(doc["definitions"]["Letter2"]["enum"], json!(["A", "bee"]));
    }

    #[test]
    fn flags_and_mapping_description() {
        let s = GeneratorSettings { generate_enum_mapping_description: true, ..GeneratorSettings::default() };
        let doc = emit(MODEL, "Perms", s);
        assert_eq!(doc["x-enumFlags"], json!(true));
        assert_eq!(doc["description"], json!("1 = Read\n2 = Write"));
    }
}
