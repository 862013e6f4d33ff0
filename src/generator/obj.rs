//! Object schemas: properties, inheritance, discriminators and known types.
use std::collections::HashSet;

use tracing::debug;

use crate::attributes::{Attribute, AttributeSet};
use crate::error::{Result, SchemaError};
use crate::model::TypeRef;
use crate::reflection::TypeInfo;
use crate::resolver::{JsonSchemaResolver, SchemaKey};
use crate::schema::{Discriminator, JsonObjectType, JsonSchema, SchemaId, SchemaKind};

use super::prop::MemberOrigin;
use super::{JsonSchemaGenerator, apply_extension_data};

impl JsonSchemaGenerator {
    /// Build the object schema for `ty` inline into `schema`.
    pub fn build_object(&self, ty: &TypeRef, schema: SchemaId, resolver: &mut JsonSchemaResolver) -> Result<()> {
        let info = self.provider().type_info(ty)?;
        // registered before members so that cycles resolve to this node
        resolver.add_schema(ty, SchemaKey::Object, schema, &self.schema_name(ty));
        debug!(type_name = %ty, "building object schema");

        let node = resolver.node_mut(schema);
        node.type_ = JsonObjectType::OBJECT;
        node.allow_additional_properties = false;
        node.is_abstract = info.is_abstract;
        if node.description.is_none() {
            node.description = info.description.clone();
        }
        apply_extension_data(resolver, schema, &info.attributes);

        self.generate_properties(&info, MemberOrigin::Declared, schema, resolver)?;
        let flatten = self.settings.flatten_inheritance() || info.attributes.is_flatten();
        if flatten {
            self.flatten_bases(&info, schema, resolver)?;
        } else {
            self.add_discriminator(&info, schema, resolver)?;
            self.link_base(&info, schema, resolver)?;
        }
        if self.settings.generate_known_types {
            self.generate_known_types(&info, resolver)?;
        }
        Ok(())
    }

    fn generate_properties(
        &self,
        info: &TypeInfo,
        origin: MemberOrigin,
        schema: SchemaId,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        let opt_in_only = info.attributes.is_contract_opt_in();
        let mut level = HashSet::new();
        for member in self.provider().members_of(&info.ty)? {
            self.add_property(&member, opt_in_only, origin, schema, &mut level, resolver)?;
        }
        Ok(())
    }

    /// Inject the discriminator property declared by a polymorphic marker.
    fn add_discriminator(&self, info: &TypeInfo, schema: SchemaId, resolver: &mut JsonSchemaResolver) -> Result<()> {
        let markers: Vec<&Option<String>> = info
            .attributes
            .iter()
            .filter_map(|a| match a {
                Attribute::Discriminator { property } => Some(property),
                _ => None,
            })
            .collect();
        let Some(&first) = markers.first() else {
            return Ok(());
        };
        let property = first.clone().unwrap_or_else(|| self.settings.default_discriminator_name.clone());

        let node = resolver.node(schema);
        if markers.len() > 1 || node.discriminator.is_some() || node.properties.contains_key(&property) {
            return Err(SchemaError::DuplicateDiscriminator { type_name: info.ty.to_string(), property });
        }

        let discriminator_schema = resolver.alloc(JsonSchema {
            kind: SchemaKind::Property,
            ..JsonSchema::of_type(JsonObjectType::STRING)
        });
        let node = resolver.node_mut(schema);
        node.properties.insert(property.clone(), discriminator_schema);
        node.required.insert(property.clone());
        node.discriminator = Some(Discriminator { property_name: property, mapping: Default::default() });
        Ok(())
    }

    /// Linked inheritance: `allOf` the base schema and register in its
    /// discriminator mapping.
    fn link_base(&self, info: &TypeInfo, schema: SchemaId, resolver: &mut JsonSchemaResolver) -> Result<()> {
        let Some(base) = &info.base else {
            return Ok(());
        };
        if self.is_excluded_base(base)? {
            debug!(type_name = %info.ty, base = %base, "base type excluded");
            return Ok(());
        }
        let base_schema = self.generate_schema(base, &[], resolver)?;
        let link = resolver.alloc(JsonSchema::reference_to(base_schema));
        resolver.node_mut(schema).all_of.push(link);

        let derived_name = self.schema_name(&info.ty);
        if let Some(discriminator) = resolver.node_mut(base_schema).discriminator.as_mut() {
            discriminator.mapping.insert(derived_name, schema);
        }
        Ok(())
    }

    /// Flattened inheritance: merge base (and optionally interface) members.
    fn flatten_bases(&self, info: &TypeInfo, schema: SchemaId, resolver: &mut JsonSchemaResolver) -> Result<()> {
        let mut parents: Vec<&TypeRef> = info.base.iter().collect();
        if self.settings.flatten_interfaces {
            parents.extend(info.interfaces.iter().filter(|i| !i.is_array() && !i.is_map()));
        }
        for parent in parents {
            if self.is_excluded_base(parent)? {
                continue;
            }
            let parent_info = self.provider().type_info(parent)?;
            self.generate_properties(&parent_info, MemberOrigin::Inherited, schema, resolver)?;
            self.flatten_bases(&parent_info, schema, resolver)?;
        }
        Ok(())
    }

    fn is_excluded_base(&self, base: &TypeRef) -> Result<bool> {
        if self.settings.excluded_type_names.iter().any(|n| *n == base.name || *n == base.to_string()) {
            return Ok(true);
        }
        Ok(self.provider().type_info(base)?.attributes.is_schema_ignored())
    }

    /// Eagerly generate the declared polymorphic variants of a type.
    fn generate_known_types(&self, info: &TypeInfo, resolver: &mut JsonSchemaResolver) -> Result<()> {
        let malformed = || SchemaError::MalformedKnownTypeDeclaration { type_name: info.ty.to_string() };
        for attr in &info.attributes {
            let Attribute::KnownType { ty, method } = attr else {
                continue;
            };
            let types = match (ty, method) {
                (Some(ty), _) => vec![ty.clone()],
                (None, Some(method)) => info.known_type_methods.get(method).cloned().ok_or_else(malformed)?,
                (None, None) => return Err(malformed()),
            };
            for known in &types {
                let descriptor = self.describe(known, &[])?;
                if !resolver.has_schema(&descriptor.ty, descriptor.schema_key()) {
                    debug!(type_name = %info.ty, known_type = %known, "generating known type");
                    self.generate_schema(known, &[], resolver)?;
                }
            }
        }
        Ok(())
    }
}
