//! Property construction.
use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, trace};

use crate::annotations::{ConstraintHints, apply_annotations};
use crate::error::{Result, SchemaError};
use crate::model::Visibility;
use crate::reflection::{MemberInfo, TypeDescriptor};
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonObjectType, SchemaId, SchemaKind};
use crate::settings::{MemberInclusion, SchemaDialect};

use super::{JsonSchemaGenerator, apply_extension_data};

/// Where a member sits relative to the schema it is added to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberOrigin {
    /// Declared on the type the schema describes.
    Declared,
    /// Merged in from a base type or interface while flattening.
    Inherited,
}

impl JsonSchemaGenerator {
    /// Add `member` to `parent.properties`.
    ///
    /// `opt_in_only` is set when the declaring type is a strict contract.
    /// `level` holds the names already produced by the same declaring level;
    /// a repeat there is always a [`SchemaError::DuplicateProperty`], while a
    /// name defined by a more derived level wins over an inherited one.
    pub fn add_property(
        &self,
        member: &MemberInfo,
        opt_in_only: bool,
        origin: MemberOrigin,
        parent: SchemaId,
        level: &mut HashSet<String>,
        resolver: &mut JsonSchemaResolver,
    ) -> Result<()> {
        let hints = self.extractor().extract(&member.attributes);
        if self.is_property_ignored(member, &hints, opt_in_only) {
            trace!(member = %member.name, "skipping ignored member");
            return Ok(());
        }

        let name = match &hints.rename {
            Some(rename) => rename.clone(),
            None => self.settings.property_naming.apply(&member.name),
        };
        let duplicate = || SchemaError::DuplicateProperty {
            type_name: member.declaring_type.to_string(),
            property: name.clone(),
        };
        if !level.insert(name.clone()) {
            return Err(duplicate());
        }
        if resolver.node(parent).properties.contains_key(&name) {
            if origin == MemberOrigin::Inherited {
                debug!(property = %name, declaring_type = %member.declaring_type, "keeping derived definition");
                return Ok(());
            }
            return Err(duplicate());
        }

        let descriptor = self.describe(&member.ty, &member.attributes)?;
        let is_required = hints.is_required();
        let is_nullable = descriptor.is_nullable
            && hints.required.is_none()
            && !hints.contract_required
            && hints.serialization_required.allows_null();

        if is_required {
            resolver.node_mut(parent).required.insert(name.clone());
        }

        let dialect = self.settings.dialect;
        let default_value = hints.default_value.as_ref().map(|v| self.convert_default(&descriptor, v));
        let property = self.generate_with_reference_and_nullability(
            &member.ty,
            &member.attributes,
            is_nullable,
            SchemaKind::Property,
            resolver,
            |resolver, schema, _actual| {
                if dialect == SchemaDialect::Swagger2 && !is_nullable {
                    resolver.node_mut(parent).required.insert(name.clone());
                }
                let node = resolver.node_mut(schema);
                if let Some(required) = hints.required {
                    let is_string = descriptor.object_type.contains(JsonObjectType::STRING);
                    if !required.allow_empty_strings && is_string && !descriptor.is_enum() {
                        node.min_length = Some(1);
                    }
                }
                node.read_only |= hints.read_only;
                if node.description.is_none() {
                    node.description = hints.description.clone().or_else(|| member.description.clone());
                }
                if node.default.is_none() {
                    node.default = default_value;
                }
                apply_extension_data(resolver, schema, &member.attributes);
                apply_annotations(resolver, schema, &descriptor, &hints);
                if dialect.is_restricted() && is_nullable {
                    resolver.node_mut(schema).is_nullable_raw = Some(true);
                }
                Ok(())
            },
        )?;

        resolver.node_mut(parent).properties.insert(name, property);
        Ok(())
    }

    fn is_property_ignored(&self, member: &MemberInfo, hints: &ConstraintHints, opt_in_only: bool) -> bool {
        if hints.ignored {
            return true;
        }
        if hints.obsolete && self.settings.ignore_obsolete_properties {
            return true;
        }
        if opt_in_only && !hints.opted_in {
            return true;
        }
        self.settings.member_inclusion == MemberInclusion::PublicOnly
            && member.visibility != Visibility::Public
            && !hints.opted_in
    }

    /// Enum defaults follow the enum's serialized form: the variant name in
    /// string mode, the underlying value otherwise.
    fn convert_default(&self, descriptor: &TypeDescriptor, value: &Value) -> Value {
        if !descriptor.is_enum() {
            return value.clone();
        }
        let Ok(info) = self.provider().type_info(&descriptor.ty) else {
            return value.clone();
        };
        let variant = info.variants.iter().find(|v| match value {
            Value::String(s) => &v.name == s,
            Value::Number(n) => n.as_i64() == Some(v.value),
            _ => false,
        });
        match variant {
            Some(v) if descriptor.object_type.contains(JsonObjectType::STRING) => {
                Value::from(crate::generator::enums::serialized_name(v))
            }
            Some(v) => Value::from(v.value),
            None => value.clone(),
        }
    }
}
