//! User-registered type mappers: an escape hatch that replaces generation
//! for a matched type.
use crate::attributes::Attribute;
use crate::error::Result;
use crate::generator::JsonSchemaGenerator;
use crate::model::TypeRef;
use crate::resolver::{JsonSchemaResolver, SchemaKey};
use crate::schema::{JsonObjectType, JsonSchema, SchemaId};
use crate::settings::PrimitiveMapping;

pub struct TypeMapperContext<'a> {
    pub ty: &'a TypeRef,
    pub attributes: &'a [Attribute],
    pub schema: SchemaId,
    pub resolver: &'a mut JsonSchemaResolver,
    pub generator: &'a JsonSchemaGenerator,
}

pub trait TypeMapper {
    /// Exact type, or a bare definition name matching every instantiation.
    fn mapped_type(&self) -> &TypeRef;

    fn use_reference(&self) -> bool;

    fn generate(&self, ctx: &mut TypeMapperContext<'_>) -> Result<()>;
}

/// First mapper that matches `ty` wins.
pub fn find_mapper<'m>(mappers: &'m [Box<dyn TypeMapper>], ty: &TypeRef) -> Option<&'m dyn TypeMapper> {
    mappers
        .iter()
        .find(|m| {
            let mapped = m.mapped_type();
            mapped == ty || (!mapped.is_generic() && ty.is_generic() && mapped.name == ty.name)
        })
        .map(|m| m.as_ref())
}

/// Inline mapper: rewrites the target schema in place.
pub struct PrimitiveTypeMapper {
    ty: TypeRef,
    apply: Box<dyn Fn(&mut JsonSchema)>,
}

impl PrimitiveTypeMapper {
    pub fn new(ty: TypeRef, apply: impl Fn(&mut JsonSchema) + 'static) -> Self {
        Self { ty, apply: Box::new(apply) }
    }

    /// Mapper for a `primitive_mappings` settings entry.
    pub fn from_mapping(ty: TypeRef, mapping: &PrimitiveMapping) -> Self {
        let type_ = match mapping.type_.as_str() {
            "string" => JsonObjectType::STRING,
            "integer" => JsonObjectType::INTEGER,
            "number" => JsonObjectType::NUMBER,
            "boolean" => JsonObjectType::BOOLEAN,
            "array" => JsonObjectType::ARRAY,
            "object" => JsonObjectType::OBJECT,
            _ => JsonObjectType::NONE,
        };
        let format = mapping.format.clone();
        Self::new(ty, move |schema| {
            schema.type_ = type_;
            schema.format = format.clone();
        })
    }
}

impl TypeMapper for PrimitiveTypeMapper {
    fn mapped_type(&self) -> &TypeRef { &self.ty }
    fn use_reference(&self) -> bool { false }

    fn generate(&self, ctx: &mut TypeMapperContext<'_>) -> Result<()> {
        (self.apply)(ctx.resolver.node_mut(ctx.schema));
        Ok(())
    }
}

/// Referenced mapper: a fixed schema published once as a definition.
pub struct ObjectTypeMapper {
    ty: TypeRef,
    schema: JsonSchema,
}

impl ObjectTypeMapper {
    pub fn new(ty: TypeRef, schema: JsonSchema) -> Self { Self { ty, schema } }
}

impl TypeMapper for ObjectTypeMapper {
    fn mapped_type(&self) -> &TypeRef { &self.ty }
    fn use_reference(&self) -> bool { true }

    fn generate(&self, ctx: &mut TypeMapperContext<'_>) -> Result<()> {
        let canonical = match ctx.resolver.get_schema(ctx.ty, SchemaKey::Object) {
            Some(existing) => existing,
            None => {
                let id = ctx.resolver.alloc(self.schema.clone());
                let name = ctx.generator.schema_name(ctx.ty);
                ctx.resolver.add_schema(ctx.ty, SchemaKey::Object, id, &name);
                id
            }
        };
        ctx.resolver.node_mut(ctx.schema).reference = Some(canonical);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_and_open_generic_match() {
        let mappers: Vec<Box<dyn TypeMapper>> = vec![
            Box::new(PrimitiveTypeMapper::new(TypeRef::named("Money"), |_| {})),
            Box::new(ObjectTypeMapper::new(TypeRef::named("Page"), JsonSchema::default())),
        ];
        assert!(!find_mapper(&mappers, &TypeRef::named("Money")).unwrap().use_reference());
        let page: TypeRef = "Page<User>".parse().unwrap();
        assert!(find_mapper(&mappers, &page).unwrap().use_reference());
        let money_list: TypeRef = "Vec<Money>".parse().unwrap();
        assert!(find_mapper(&mappers, &money_list).is_none());
    }

    #[test]
    fn settings_mapping_sets_type_and_format() {
        let mapper = PrimitiveTypeMapper::from_mapping(
            TypeRef::named("Money"),
            &PrimitiveMapping { type_: "string".into(), format: Some("decimal".into()) },
        );
        let mut schema = JsonSchema::default();
        (mapper.apply)(&mut schema);
        assert_eq!(schema.type_, JsonObjectType::STRING);
        assert_eq!(schema.format.as_deref(), Some("decimal"));
    }
}
