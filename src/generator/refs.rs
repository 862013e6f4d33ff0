//! Reference and nullability wrapping.
use tracing::trace;

use crate::attributes::Attribute;
use crate::error::Result;
use crate::model::TypeRef;
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonObjectType, JsonSchema, SchemaId, SchemaKind};

use super::JsonSchemaGenerator;

impl JsonSchemaGenerator {
    /// Generate a node of `kind` for `ty` that is either the inline schema or
    /// a node referencing the canonical one.
    ///
    /// `transform` receives `(node, actual)`: the returned node and the
    /// concrete schema it stands for (the same id when inline). It runs
    /// before nullability is expressed and before the reference shape is
    /// picked, so anything it sets counts as a sibling of `$ref`.
    pub fn generate_with_reference_and_nullability<F>(
        &self,
        ty: &TypeRef,
        attributes: &[Attribute],
        is_nullable: bool,
        kind: SchemaKind,
        resolver: &mut JsonSchemaResolver,
        transform: F,
    ) -> Result<SchemaId>
    where
        F: FnOnce(&mut JsonSchemaResolver, SchemaId, SchemaId) -> Result<()>,
    {
        let descriptor = self.describe(ty, attributes)?;
        let unrestricted = !self.settings.dialect.is_restricted();

        let canonical = if descriptor.requires_reference(self.mappers()) {
            self.generate_schema(ty, attributes, resolver)?
        } else {
            let schema = resolver.alloc(JsonSchema::new(kind));
            self.generate_into(ty, attributes, schema, resolver)?;
            if !resolver.node(schema).has_reference() {
                transform(resolver, schema, schema)?;
                if is_nullable && unrestricted {
                    add_null(resolver, schema);
                }
                return Ok(schema);
            }
            resolver.actual(schema)
        };

        let referencing = resolver.alloc(JsonSchema::new(kind));
        transform(resolver, referencing, canonical)?;
        if is_nullable && unrestricted {
            let null = resolver.alloc(JsonSchema::of_type(JsonObjectType::NULL));
            resolver.node_mut(referencing).one_of.push(null);
        }

        let node = resolver.node(referencing);
        let direct = (self.settings.allow_reference_with_properties || !node.has_sibling_keywords())
            && node.one_of.is_empty();
        if direct {
            resolver.node_mut(referencing).reference = Some(canonical);
        } else {
            let link = resolver.alloc(JsonSchema::reference_to(canonical));
            let node = resolver.node_mut(referencing);
            if unrestricted {
                node.one_of.push(link);
            } else {
                node.all_of.push(link);
            }
        }
        trace!(type_name = %descriptor.ty, direct, "referencing canonical schema");
        Ok(referencing)
    }
}

/// Nullability on an inline schema: OR in the null bit, or a union with
/// `null` when the node has no type to extend.
fn add_null(resolver: &mut JsonSchemaResolver, schema: SchemaId) {
    if resolver.node(schema).type_.is_none() {
        let any = resolver.alloc(JsonSchema::default());
        let null = resolver.alloc(JsonSchema::of_type(JsonObjectType::NULL));
        resolver.node_mut(schema).one_of.extend([any, null]);
    } else {
        resolver.node_mut(schema).type_ |= JsonObjectType::NULL;
    }
}

#[cfg(test)]
mod tests {
    use crate::generator::tests::emit;
    use crate::settings::{GeneratorSettings, ReferenceNullability, SchemaDialect};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const MODEL: &str = r#"{ "types": {
        "Order": { "members": [
            { "name": "Customer", "type": "Customer", "description": "who pays" },
            { "name": "Shipping", "type": "Customer", "attributes": [ { "kind": "not_null" } ] },
            { "name": "Note", "type": "any" }
        ] },
        "Customer": { "members": [ { "name": "Name", "type": "string" } ] }
    } }"#;

    fn settings(dialect: SchemaDialect) -> GeneratorSettings {
        GeneratorSettings { dialect, ..GeneratorSettings::default() }
    }

    #[test]
    fn bare_reference_when_no_siblings() {
        let doc = emit(MODEL, "Order", settings(SchemaDialect::JsonSchema));
        assert_eq!(doc["properties"]["Shipping"], json!({ "$ref": "#/definitions/Customer" }));
    }

    #[test]
    fn siblings_force_union_or_intersection() {
        let doc = emit(MODEL, "Order", settings(SchemaDialect::JsonSchema));
        assert_eq!(
            doc["properties"]["Customer"],
            json!({
                "description": "who pays",
                "oneOf": [ { "type": "null" }, { "$ref": "#/definitions/Customer" } ]
            })
        );

        let doc = emit(MODEL, "Order", settings(SchemaDialect::Swagger2));
        assert_eq!(
            doc["properties"]["Customer"],
            json!({
                "description": "who pays",
                "allOf": [ { "$ref": "#/definitions/Customer" } ],
                "x-nullable": true
            })
        );
    }

    #[test]
    fn reference_with_properties_policy_keeps_direct_ref() {
        let s = GeneratorSettings {
            dialect: SchemaDialect::Swagger2,
            allow_reference_with_properties: true,
            ..GeneratorSettings::default()
        };
        let doc = emit(MODEL, "Order", s);
        assert_eq!(
            doc["properties"]["Customer"],
            json!({ "$ref": "#/definitions/Customer", "description": "who pays", "x-nullable": true })
        );
    }

    #[test]
    fn nullable_untyped_inline_schema_becomes_union() {
        let s = GeneratorSettings {
            default_reference_type_nullability: ReferenceNullability::Null,
            ..GeneratorSettings::default()
        };
        let doc = emit(MODEL, "Order", s);
        assert_eq!(doc["properties"]["Note"], json!({ "oneOf": [ {}, { "type": "null" } ] }));
    }
}
