//! Recursive type → schema generation.
//!
//! [`JsonSchemaGenerator::generate`] is the top-level entry point: it owns a
//! fresh [`JsonSchemaResolver`] for the run, fills its root node and returns
//! the finished [`JsonSchemaDocument`]. Everything below the root goes
//! through [`JsonSchemaGenerator::generate_into`], which dispatches on the
//! type's classification to the builders in the submodules.
pub mod arr;
pub mod dict;
pub mod enums;
pub mod obj;
pub mod prop;
pub mod refs;

use tracing::debug;

use crate::annotations::{AnnotationExtractor, DefaultAnnotationExtractor};
use crate::attributes::{Attribute, AttributeSet};
use crate::emit::JsonSchemaDocument;
use crate::error::{Result, SchemaError};
use crate::mappers::{PrimitiveTypeMapper, TypeMapper, TypeMapperContext, find_mapper};
use crate::model::{TypeModel, TypeRef};
use crate::naming::{DefaultSchemaNameGenerator, SchemaNameGenerator};
use crate::processors::{SchemaProcessor, SchemaProcessorContext};
use crate::reflection::{ModelTypeProvider, TypeDescriptor, TypeKind, TypeProvider};
use crate::resolver::{JsonSchemaResolver, SchemaKey};
use crate::schema::{JsonObjectType, JsonSchema, SchemaId, SchemaKind};
use crate::settings::GeneratorSettings;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

pub struct JsonSchemaGenerator {
    settings: GeneratorSettings,
    provider: Box<dyn TypeProvider>,
    extractor: Box<dyn AnnotationExtractor>,
    mappers: Vec<Box<dyn TypeMapper>>,
    processors: Vec<Box<dyn SchemaProcessor>>,
    names: Box<dyn SchemaNameGenerator>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl JsonSchemaGenerator {
    /// Settings-level primitive mappings are registered as the first mappers.
    pub fn new(settings: GeneratorSettings, provider: impl TypeProvider + 'static) -> Self {
        let mappers = settings
            .primitive_mappings
            .iter()
            .filter_map(|(name, mapping)| match name.parse::<TypeRef>() {
                Ok(ty) => Some(Box::new(PrimitiveTypeMapper::from_mapping(ty, mapping)) as Box<dyn TypeMapper>),
                Err(error) => {
                    tracing::warn!(%name, %error, "ignoring primitive mapping with invalid type");
                    None
                }
            })
            .collect();
        Self {
            settings,
            provider: Box::new(provider),
            extractor: Box::new(DefaultAnnotationExtractor),
            mappers,
            processors: Vec::new(),
            names: Box::new(DefaultSchemaNameGenerator),
        }
    }

    pub fn from_model(model: TypeModel, settings: GeneratorSettings) -> Self {
        Self::new(settings, ModelTypeProvider::new(model))
    }

    pub fn with_type_mapper(mut self, mapper: impl TypeMapper + 'static) -> Self {
        self.mappers.push(Box::new(mapper));
        self
    }

    pub fn with_processor(mut self, processor: impl SchemaProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn with_name_generator(mut self, names: impl SchemaNameGenerator + 'static) -> Self {
        self.names = Box::new(names);
        self
    }

    pub fn with_annotation_extractor(mut self, extractor: impl AnnotationExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn settings(&self) -> &GeneratorSettings { &self.settings }

    pub fn schema_name(&self, ty: &TypeRef) -> String { self.names.generate(ty) }

    /// Generate the document for `ty` with a fresh resolver.
    pub fn generate(&self, ty: &TypeRef) -> Result<JsonSchemaDocument> {
        debug!(type_name = %ty, dialect = ?self.settings.dialect, "generating schema document");
        let mut resolver = JsonSchemaResolver::new();
        let root = resolver.root();
        self.generate_into(ty, &[], root, &mut resolver)?;

        let descriptor = self.describe(ty, &[])?;
        if matches!(descriptor.kind, TypeKind::Object | TypeKind::Enum) && resolver.node(root).title.is_none() {
            resolver.node_mut(root).title = Some(self.schema_name(&descriptor.ty));
        }
        Ok(JsonSchemaDocument::new(ty.clone(), resolver, self.settings.dialect))
    }

    /// Fill `schema` in place with the schema for `ty`.
    ///
    /// `attributes` is the metadata of the member or parent context `ty` was
    /// reached through; it drives nullability, enum representation and, for
    /// property nodes, extension data.
    pub fn generate_into(
        &self,
        ty: &TypeRef,
        attributes: &[Attribute],
        schema: SchemaId,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        if resolver.node(schema).kind == SchemaKind::Property {
            apply_extension_data(resolver, schema, attributes);
        }

        let descriptor = self.describe(ty, attributes)?;
        if let Some(mapper) = find_mapper(&self.mappers, &descriptor.ty) {
            debug!(type_name = %descriptor.ty, "delegating to type mapper");
            let mut ctx = TypeMapperContext {
                ty: &descriptor.ty,
                attributes,
                schema,
                resolver: &mut *resolver,
                generator: self,
            };
            mapper.generate(&mut ctx)?;
            return self.run_processors(&descriptor.ty, schema, resolver);
        }

        match descriptor.kind {
            TypeKind::Any => {}
            TypeKind::Dictionary => self.build_dictionary(&descriptor, schema, resolver)?,
            TypeKind::Object => self.generate_object(&descriptor, schema, resolver)?,
            TypeKind::Enum => self.build_enum(&descriptor, schema, resolver)?,
            TypeKind::Array => self.build_array(&descriptor, schema, resolver)?,
            TypeKind::Primitive => {
                let node = resolver.node_mut(schema);
                node.type_ = descriptor.object_type;
                node.format = descriptor.format.clone();
            }
        }
        self.run_processors(&descriptor.ty, schema, resolver)
    }

    /// Canonical node for `ty`: the cached one, or a newly generated one.
    pub fn generate_schema(
        &self,
        ty: &TypeRef,
        attributes: &[Attribute],
        resolver: &mut JsonSchemaResolver,
    ) -> Result<SchemaId> {
        let descriptor = self.describe(ty, attributes)?;
        if let Some(existing) = resolver.get_schema(&descriptor.ty, descriptor.schema_key()) {
            return Ok(existing);
        }
        let schema = resolver.alloc(JsonSchema::new(SchemaKind::Schema));
        self.generate_into(ty, attributes, schema, resolver)?;
        Ok(resolver.actual(schema))
    }

    /// Classify `ty` in the given context.
    ///
    /// Types the provider does not know are still accepted when a mapper
    /// claims them.
    pub fn describe(&self, ty: &TypeRef, attributes: &[Attribute]) -> Result<TypeDescriptor> {
        let (inner, wrapped) = ty.unwrap_optional();
        match self.provider.describe(ty, attributes, &self.settings) {
            Err(SchemaError::UnsupportedType { .. }) if find_mapper(&self.mappers, inner).is_some() => {
                let referenced = find_mapper(&self.mappers, inner).is_some_and(|m| m.use_reference());
                Ok(TypeDescriptor {
                    ty: inner.clone(),
                    kind: if referenced { TypeKind::Object } else { TypeKind::Primitive },
                    object_type: JsonObjectType::NONE,
                    format: None,
                    is_nullable: wrapped && !attributes.is_not_null(),
                    element: None,
                    key: None,
                })
            }
            other => other,
        }
    }

    pub(crate) fn provider(&self) -> &dyn TypeProvider { self.provider.as_ref() }
    pub(crate) fn extractor(&self) -> &dyn AnnotationExtractor { self.extractor.as_ref() }
    pub(crate) fn mappers(&self) -> &[Box<dyn TypeMapper>] { &self.mappers }

    fn generate_object(
        &self,
        descriptor: &TypeDescriptor,
        schema: SchemaId,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        if let Some(existing) = resolver.get_schema(&descriptor.ty, SchemaKey::Object) {
            debug!(type_name = %descriptor.ty, "object already resolved, referencing");
            resolver.node_mut(schema).reference = Some(existing);
        } else if resolver.node(schema).kind == SchemaKind::Schema {
            self.build_object(&descriptor.ty, schema, resolver)?;
        } else {
            let canonical = resolver.alloc(JsonSchema::new(SchemaKind::Schema));
            self.generate_into(&descriptor.ty, &[], canonical, resolver)?;
            let actual = resolver.actual(canonical);
            resolver.node_mut(schema).reference = Some(actual);
        }
        Ok(())
    }

    fn run_processors(&self, ty: &TypeRef, schema: SchemaId, resolver: &mut JsonSchemaResolver) -> Result<()> {
        for processor in &self.processors {
            let mut ctx = SchemaProcessorContext { ty, schema, resolver: &mut *resolver, generator: self };
            processor.process(&mut ctx)?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Copy `extension_data` attributes onto the node. Re-applying is a no-op.
pub(crate) fn apply_extension_data(resolver: &mut JsonSchemaResolver, schema: SchemaId, attributes: &[Attribute]) {
    let entries = attributes.extension_data();
    if entries.is_empty() {
        return;
    }
    let node = resolver.node_mut(schema);
    for (key, value) in entries {
        node.extension_data.insert(key.to_string(), value.clone());
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mappers::ObjectTypeMapper;
    use crate::settings::SchemaDialect;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    pub(crate) fn generator(model: &str, settings: GeneratorSettings) -> JsonSchemaGenerator {
        JsonSchemaGenerator::from_model(TypeModel::from_json_str(model).unwrap(), settings)
    }

    pub(crate) fn emit(model: &str, ty: &str, settings: GeneratorSettings) -> Value {
        generator(model, settings).generate(&ty.parse().unwrap()).unwrap().to_json()
    }

    const PETS: &str = r#"{ "types": {
        "Owner": { "members": [
            { "name": "Home", "type": "Address" },
            { "name": "Work", "type": "Address" },
            { "name": "Nick", "type": "string" }
        ] },
        "Address": { "members": [ { "name": "Street", "type": "string" } ] },
        "Node": { "members": [
            { "name": "Value", "type": "i32" },
            { "name": "Next", "type": "Node" }
        ] }
    } }"#;

    #[test]
    fn same_type_twice_gives_one_definition_and_two_refs() {
        let doc = emit(PETS, "Owner", GeneratorSettings::default());
        let definitions = doc["definitions"].as_object().unwrap();
        assert_eq!(definitions.keys().collect::<Vec<_>>(), vec!["Address"]);
        assert_eq!(doc.pointer("/properties/Home/oneOf/1/$ref"), Some(&json!("#/definitions/Address")));
        assert_eq!(doc.pointer("/properties/Work/oneOf/1/$ref"), Some(&json!("#/definitions/Address")));
    }

    #[test]
    fn self_reference_terminates_as_cycle() {
        let settings = GeneratorSettings {
            default_reference_type_nullability: crate::settings::ReferenceNullability::NotNull,
            ..GeneratorSettings::default()
        };
        let doc = emit(PETS, "Node", settings);
        assert_eq!(doc["properties"]["Next"], json!({ "$ref": "#" }));
        assert!(doc.get("definitions").is_none());
    }

    #[test]
    fn generation_is_deterministic() {
        let first = serde_json::to_string(&emit(PETS, "Owner", GeneratorSettings::default())).unwrap();
        let second = serde_json::to_string(&emit(PETS, "Owner", GeneratorSettings::default())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn root_carries_dialect_marker_and_title() {
        let doc = emit(PETS, "Address", GeneratorSettings::default());
        assert_eq!(doc["$schema"], json!("http://json-schema.org/draft-04/schema#"));
        assert_eq!(doc["title"], json!("Address"));
        assert_eq!(doc["additionalProperties"], json!(false));

        let swagger = GeneratorSettings { dialect: SchemaDialect::Swagger2, ..GeneratorSettings::default() };
        assert!(emit(PETS, "Address", swagger).get("$schema").is_none());
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let err = generator(PETS, GeneratorSettings::default())
            .generate(&TypeRef::named("Missing"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType { .. }), "{err}");
    }

    #[test]
    fn mappers_bypass_generation() {
        let model = r#"{ "types": { "Invoice": { "members": [
            { "name": "Total", "type": "Money" },
            { "name": "Ledger", "type": "Ledger" }
        ] } } }"#;
        let ledger = JsonSchema { description: Some("external".into()), ..JsonSchema::of_type(JsonObjectType::OBJECT) };
        let doc = generator(model, GeneratorSettings::default())
            .with_type_mapper(PrimitiveTypeMapper::new(TypeRef::named("Money"), |s| {
                s.type_ = JsonObjectType::STRING;
                s.format = Some("decimal".into());
            }))
            .with_type_mapper(ObjectTypeMapper::new(TypeRef::named("Ledger"), ledger))
            .generate(&TypeRef::named("Invoice"))
            .unwrap()
            .to_json();
        assert_eq!(doc["properties"]["Total"], json!({ "type": "string", "format": "decimal" }));
        assert_eq!(doc["definitions"]["Ledger"], json!({ "type": "object", "description": "external" }));
    }

    #[test]
    fn processors_see_every_finished_schema() {
        let doc = generator(PETS, GeneratorSettings::default())
            .with_processor(|ctx: &mut SchemaProcessorContext<'_>| -> Result<()> {
                if ctx.ty.name == "Address" {
                    let node = ctx.resolver.node_mut(ctx.schema);
                    node.extension_data.insert("x-processed".into(), json!(true));
                }
                Ok(())
            })
            .generate(&TypeRef::named("Owner"))
            .unwrap()
            .to_json();
        assert_eq!(doc["definitions"]["Address"]["x-processed"], json!(true));
    }
}
