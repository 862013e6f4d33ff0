//! Type classification and member enumeration.
//!
//! [`TypeProvider`] is the seam the generator reads types through;
//! [`ModelTypeProvider`] implements it over a declarative [`TypeModel`].
use indexmap::IndexMap;

use crate::attributes::{Attribute, AttributeSet};
use crate::error::{Result, SchemaError};
use crate::mappers::TypeMapper;
use crate::model::{TypeDef, TypeDefKind, TypeModel, TypeRef, Visibility};
use crate::resolver::SchemaKey;
use crate::schema::JsonObjectType;
use crate::settings::{EnumHandling, GeneratorSettings, ReferenceNullability};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Dictionary,
    Array,
    Enum,
    Primitive,
    /// The dynamic "any JSON" placeholder.
    Any,
}

/// Classification of one type in one context. Recomputed on every visit.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// The type with optional-value wrappers removed.
    pub ty: TypeRef,
    pub kind: TypeKind,
    pub object_type: JsonObjectType,
    pub format: Option<String>,
    pub is_nullable: bool,
    /// Array item type or dictionary value type.
    pub element: Option<TypeRef>,
    pub key: Option<TypeRef>,
}

impl TypeDescriptor {
    pub fn is_enum(&self) -> bool { self.kind == TypeKind::Enum }
    pub fn is_dictionary(&self) -> bool { self.kind == TypeKind::Dictionary }
    pub fn is_any(&self) -> bool { self.kind == TypeKind::Any }
    pub fn is_complex(&self) -> bool { self.kind == TypeKind::Object }

    pub fn schema_key(&self) -> SchemaKey {
        match self.kind {
            TypeKind::Enum if self.object_type.contains(JsonObjectType::INTEGER) => SchemaKey::IntegerEnum,
            TypeKind::Enum => SchemaKey::StringEnum,
            _ => SchemaKey::Object,
        }
    }

    /// Out-of-line (`$ref`) representation is needed for objects and enums,
    /// unless a registered mapper says otherwise.
    pub fn requires_reference(&self, mappers: &[Box<dyn TypeMapper>]) -> bool {
        if let Some(mapper) = crate::mappers::find_mapper(mappers, &self.ty) {
            return mapper.use_reference();
        }
        !self.is_dictionary() && (self.is_complex() || self.is_enum())
    }
}

#[derive(Debug, Clone)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
}

/// Declaration-level facts about a user type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub ty: TypeRef,
    pub name: String,
    pub description: Option<String>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub base: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub attributes: Vec<Attribute>,
    pub variants: Vec<EnumVariant>,
    pub known_type_methods: IndexMap<String, Vec<TypeRef>>,
}

/// One serializable member, in declaration order.
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub name: String,
    pub ty: TypeRef,
    pub declaring_type: TypeRef,
    pub visibility: Visibility,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
}

pub trait TypeProvider {
    fn describe(&self, ty: &TypeRef, context: &[Attribute], settings: &GeneratorSettings) -> Result<TypeDescriptor>;

    fn type_info(&self, ty: &TypeRef) -> Result<TypeInfo>;

    /// Members declared directly on `ty` (inherited ones are not included).
    fn members_of(&self, ty: &TypeRef) -> Result<Vec<MemberInfo>>;
}

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVES
// ————————————————————————————————————————————————————————————————————————————

struct Primitive {
    object_type: JsonObjectType,
    format: Option<&'static str>,
    value_type: bool,
}

const fn prim(object_type: JsonObjectType, format: Option<&'static str>, value_type: bool) -> Primitive {
    Primitive { object_type, format, value_type }
}

fn primitive(name: &str) -> Option<Primitive> {
    use JsonObjectType as J;
    let p = match name {
        "string" | "String" | "str" => prim(J::STRING, None, false),
        "char" => prim(J::STRING, None, true),
        "bool" | "boolean" => prim(J::BOOLEAN, None, true),
        "i8" | "i16" | "i32" | "u8" | "u16" => prim(J::INTEGER, Some("int32"), true),
        "i64" | "u32" | "u64" | "i128" | "u128" => prim(J::INTEGER, Some("int64"), true),
        "f32" => prim(J::NUMBER, Some("float"), true),
        "f64" => prim(J::NUMBER, Some("double"), true),
        "decimal" => prim(J::NUMBER, Some("decimal"), true),
        "datetime" | "DateTime" => prim(J::STRING, Some("date-time"), true),
        "date" => prim(J::STRING, Some("date"), true),
        "time" => prim(J::STRING, Some("time"), true),
        "duration" => prim(J::STRING, Some("duration"), true),
        "uuid" | "Uuid" => prim(J::STRING, Some("uuid"), true),
        "uri" | "Url" => prim(J::STRING, Some("uri"), false),
        "bytes" => prim(J::STRING, Some("byte"), false),
        _ => return None,
    };
    Some(p)
}

pub fn is_opaque_name(name: &str) -> bool {
    matches!(name, "any" | "json" | "Value")
}

// ————————————————————————————————————————————————————————————————————————————
// MODEL PROVIDER
// ————————————————————————————————————————————————————————————————————————————

/// [`TypeProvider`] backed by a [`TypeModel`].
#[derive(Debug, Clone, Default)]
pub struct ModelTypeProvider {
    model: TypeModel,
}

impl ModelTypeProvider {
    pub fn new(model: TypeModel) -> Self { Self { model } }

    pub fn model(&self) -> &TypeModel { &self.model }

    /// Definition plus generic bindings for an instantiated reference.
    fn lookup(&self, ty: &TypeRef) -> Result<(&TypeDef, IndexMap<String, TypeRef>)> {
        let def = self.model.get(&ty.name).ok_or_else(|| SchemaError::unsupported(ty))?;
        if def.type_parameters.len() != ty.args.len() {
            return Err(SchemaError::unsupported(ty));
        }
        let bindings = def.type_parameters.iter().cloned().zip(ty.args.iter().cloned()).collect();
        Ok((def, bindings))
    }

    fn natural_nullability(
        &self,
        value_type: bool,
        wrapped: bool,
        context: &[Attribute],
        settings: &GeneratorSettings,
    ) -> bool {
        if wrapped {
            return !context.is_not_null();
        }
        if value_type {
            return false;
        }
        if context.is_not_null() {
            false
        } else if context.is_can_be_null() {
            true
        } else {
            settings.default_reference_type_nullability == ReferenceNullability::Null
        }
    }
}

impl TypeProvider for ModelTypeProvider {
    fn describe(&self, ty: &TypeRef, context: &[Attribute], settings: &GeneratorSettings) -> Result<TypeDescriptor> {
        let (inner, wrapped) = ty.unwrap_optional();
        let mut descriptor = TypeDescriptor {
            ty: inner.clone(),
            kind: TypeKind::Primitive,
            object_type: JsonObjectType::NONE,
            format: None,
            is_nullable: false,
            element: None,
            key: None,
        };

        let value_type = if !inner.is_generic() && is_opaque_name(&inner.name) {
            descriptor.kind = TypeKind::Any;
            false
        } else if let Some(p) = primitive(&inner.name).filter(|_| !inner.is_generic()) {
            descriptor.object_type = p.object_type;
            descriptor.format = p.format.map(str::to_string);
            p.value_type
        } else if inner.is_array() {
            descriptor.kind = TypeKind::Array;
            descriptor.object_type = JsonObjectType::ARRAY;
            descriptor.element = inner.args.first().cloned();
            false
        } else if inner.is_map() {
            descriptor.kind = TypeKind::Dictionary;
            descriptor.object_type = JsonObjectType::OBJECT;
            match inner.args.as_slice() {
                [value] => descriptor.element = Some(value.clone()),
                [key, value] => {
                    descriptor.key = Some(key.clone());
                    descriptor.element = Some(value.clone());
                }
                _ => {}
            }
            false
        } else {
            let (def, _) = self.lookup(inner)?;
            if def.kind == TypeDefKind::Enum {
                descriptor.kind = TypeKind::Enum;
                let as_string = context.is_string_enum()
                    || def.attributes.is_string_enum()
                    || settings.default_enum_handling == EnumHandling::String;
                descriptor.object_type =
                    if as_string { JsonObjectType::STRING } else { JsonObjectType::INTEGER };
                true
            } else {
                descriptor.kind = TypeKind::Object;
                descriptor.object_type = JsonObjectType::OBJECT;
                def.value_type
            }
        };

        descriptor.is_nullable = self.natural_nullability(value_type, wrapped, context, settings);
        Ok(descriptor)
    }

    fn type_info(&self, ty: &TypeRef) -> Result<TypeInfo> {
        let (def, bindings) = self.lookup(ty)?;
        let subst = |t: &TypeRef| t.substitute(&bindings);
        Ok(TypeInfo {
            ty: ty.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            is_abstract: def.is_abstract,
            is_interface: def.kind == TypeDefKind::Interface,
            base: def.base.as_ref().map(subst),
            interfaces: def.interfaces.iter().map(subst).collect(),
            attributes: def.attributes.clone(),
            variants: def
                .variants
                .iter()
                .enumerate()
                .map(|(i, v)| EnumVariant {
                    name: v.name.clone(),
                    value: v.value.unwrap_or(i as i64),
                    description: v.description.clone(),
                    attributes: v.attributes.clone(),
                })
                .collect(),
            known_type_methods: def
                .known_type_methods
                .iter()
                .map(|(k, types)| (k.clone(), types.iter().map(subst).collect()))
                .collect(),
        })
    }

    fn members_of(&self, ty: &TypeRef) -> Result<Vec<MemberInfo>> {
        let (def, bindings) = self.lookup(ty)?;
        Ok(def
            .members
            .iter()
            .map(|m| MemberInfo {
                name: m.name.clone(),
                ty: m.ty.substitute(&bindings),
                declaring_type: ty.clone(),
                visibility: m.visibility,
                description: m.description.clone(),
                attributes: m.attributes.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ModelTypeProvider {
        ModelTypeProvider::new(TypeModel::from_json_str(r#"{ "types": {
            "Point": { "value_type": true, "members": [ { "name": "X", "type": "f64" } ] },
            "Pet": { "members": [ { "name": "Name", "type": "string" } ] },
            "Color": { "kind": "enum", "variants": [ { "name": "Red" }, { "name": "Blue", "value": 4 } ] },
            "Page": { "type_parameters": ["T"], "members": [ { "name": "Items", "type": "Vec<T>" } ] }
        } }"#).unwrap())
    }

    fn describe(p: &ModelTypeProvider, ty: &str, ctx: &[Attribute], s: &GeneratorSettings) -> TypeDescriptor {
        p.describe(&ty.parse().unwrap(), ctx, s).unwrap()
    }

    #[test]
    fn classifies_every_shape() {
        let p = provider();
        let s = GeneratorSettings::default();
        assert_eq!(describe(&p, "i64", &[], &s).format.as_deref(), Some("int64"));
        assert_eq!(describe(&p, "Vec<Pet>", &[], &s).kind, TypeKind::Array);
        let dict = describe(&p, "Map<string, Pet>", &[], &s);
        assert_eq!(dict.kind, TypeKind::Dictionary);
        assert_eq!(dict.element, Some(TypeRef::named("Pet")));
        assert_eq!(describe(&p, "Color", &[], &s).schema_key(), SchemaKey::IntegerEnum);
        assert_eq!(describe(&p, "Color", &[Attribute::StringEnum], &s).schema_key(), SchemaKey::StringEnum);
        assert_eq!(describe(&p, "json", &[], &s).kind, TypeKind::Any);
        assert!(p.describe(&TypeRef::named("Missing"), &[], &s).is_err());
    }

    #[test]
    fn nullability_follows_value_and_reference_rules() {
        let p = provider();
        let s = GeneratorSettings::default();
        assert!(!describe(&p, "i32", &[], &s).is_nullable);
        assert!(describe(&p, "i32?", &[], &s).is_nullable);
        assert!(!describe(&p, "Point", &[], &s).is_nullable);
        assert!(describe(&p, "Pet", &[], &s).is_nullable);
        assert!(!describe(&p, "Pet", &[Attribute::NotNull], &s).is_nullable);

        let strict = GeneratorSettings {
            default_reference_type_nullability: ReferenceNullability::NotNull,
            ..GeneratorSettings::default()
        };
        assert!(!describe(&p, "string", &[], &strict).is_nullable);
        assert!(describe(&p, "string", &[Attribute::CanBeNull], &strict).is_nullable);
    }

    #[test]
    fn generic_members_are_substituted() {
        let p = provider();
        let members = p.members_of(&"Page<Pet>".parse().unwrap()).unwrap();
        assert_eq!(members[0].ty.to_string(), "Vec<Pet>");
        assert!(p.members_of(&TypeRef::named("Page")).is_err());
        let info = p.type_info(&TypeRef::named("Color")).unwrap();
        assert_eq!(info.variants.iter().map(|v| v.value).collect::<Vec<_>>(), vec![0, 4]);
    }
}
