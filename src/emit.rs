//! Serialization of a finished schema graph to JSON.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::TypeRef;
use crate::resolver::JsonSchemaResolver;
use crate::schema::{JsonSchema, SchemaId};
use crate::settings::SchemaDialect;

pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// The output of one generation run: the root schema and everything it
/// references.
#[derive(Debug)]
pub struct JsonSchemaDocument {
    ty: TypeRef,
    resolver: JsonSchemaResolver,
    dialect: SchemaDialect,
}

impl JsonSchemaDocument {
    pub fn new(ty: TypeRef, resolver: JsonSchemaResolver, dialect: SchemaDialect) -> Self {
        Self { ty, resolver, dialect }
    }

    pub fn root_type(&self) -> &TypeRef { &self.ty }
    pub fn root(&self) -> &JsonSchema { self.resolver.node(self.resolver.root()) }
    pub fn resolver(&self) -> &JsonSchemaResolver { &self.resolver }
    pub fn dialect(&self) -> SchemaDialect { self.dialect }

    pub fn to_json(&self) -> Value {
        Emitter::new(&self.resolver, self.dialect).document()
    }

    pub fn to_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMITTER
// ————————————————————————————————————————————————————————————————————————————

struct Emitter<'a> {
    resolver: &'a JsonSchemaResolver,
    dialect: SchemaDialect,
    /// Registered definitions first, then referenced-but-unnamed nodes as
    /// they are discovered.
    names: IndexMap<SchemaId, String>,
}

impl<'a> Emitter<'a> {
    fn new(resolver: &'a JsonSchemaResolver, dialect: SchemaDialect) -> Self {
        let names = resolver.definitions().map(|(id, name)| (id, name.to_string())).collect();
        Self { resolver, dialect, names }
    }

    fn document(&mut self) -> Value {
        let root = self.resolver.root();
        let mut out = Map::new();
        if self.dialect == SchemaDialect::JsonSchema {
            out.insert("$schema".into(), Value::from(DRAFT_04));
        }
        if let Value::Object(body) = self.node(root) {
            out.extend(body);
        }

        // emitting a definition can name further nodes, so walk by index
        let mut definitions = Map::new();
        let mut i = 0;
        while let Some((&id, name)) = self.names.get_index(i) {
            let name = name.clone();
            let body = self.node(id);
            definitions.insert(name, body);
            i += 1;
        }
        if !definitions.is_empty() {
            out.insert("definitions".into(), Value::Object(definitions));
        }
        Value::Object(out)
    }

    fn reference(&mut self, target: SchemaId) -> Value {
        let target = self.resolver.actual(target);
        if target == self.resolver.root() {
            return Value::from("#");
        }
        let name = match self.names.get(&target) {
            Some(name) => name.clone(),
            None => {
                let name = self.unique_name("Anonymous");
                self.names.insert(target, name.clone());
                name
            }
        };
        Value::from(format!("#/definitions/{name}"))
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |n: &str| self.names.values().any(|v| v == n);
        if !taken(base) {
            return base.to_string();
        }
        (2..).map(|i| format!("{base}{i}")).find(|c| !taken(c)).unwrap_or_else(|| base.to_string())
    }

    fn list(&mut self, ids: &[SchemaId]) -> Value {
        Value::Array(ids.iter().map(|id| self.node(*id)).collect())
    }

    fn node(&mut self, id: SchemaId) -> Value {
        let resolver = self.resolver;
        let s = resolver.node(id);
        let mut o = Map::new();

        if let Some(target) = s.reference {
            o.insert("$ref".into(), self.reference(target));
        }
        if let Some(title) = &s.title {
            o.insert("title".into(), Value::from(title.clone()));
        }
        if let Some(description) = &s.description {
            o.insert("description".into(), Value::from(description.clone()));
        }
        match s.type_.names().as_slice() {
            [] => {}
            [one] => {
                o.insert("type".into(), Value::from(*one));
            }
            many => {
                o.insert("type".into(), Value::from(many.to_vec()));
            }
        }
        if let Some(format) = &s.format {
            o.insert("format".into(), Value::from(format.clone()));
        }
        if s.is_abstract {
            o.insert("x-abstract".into(), Value::Bool(true));
        }
        if let Some(discriminator) = &s.discriminator {
            let value = if self.dialect == SchemaDialect::Swagger2 {
                Value::from(discriminator.property_name.clone())
            } else {
                let mut d = Map::new();
                d.insert("propertyName".into(), Value::from(discriminator.property_name.clone()));
                if !discriminator.mapping.is_empty() {
                    let mapping = discriminator
                        .mapping
                        .iter()
                        .map(|(key, target)| (key.clone(), self.reference(*target)))
                        .collect();
                    d.insert("mapping".into(), Value::Object(mapping));
                }
                Value::Object(d)
            };
            o.insert("discriminator".into(), value);
        }
        if !s.required.is_empty() {
            o.insert("required".into(), s.required.iter().cloned().map(Value::from).collect());
        }
        if !s.properties.is_empty() {
            let properties = s.properties.iter().map(|(name, id)| (name.clone(), self.node(*id))).collect();
            o.insert("properties".into(), Value::Object(properties));
        }
        if !s.all_of.is_empty() {
            o.insert("allOf".into(), self.list(&s.all_of));
        }
        if !s.one_of.is_empty() {
            o.insert("oneOf".into(), self.list(&s.one_of));
        }
        if let Some(items) = s.items {
            o.insert("items".into(), self.node(items));
        }
        match s.additional_properties {
            Some(additional) if s.allow_additional_properties => {
                o.insert("additionalProperties".into(), self.node(additional));
            }
            _ if !s.allow_additional_properties => {
                o.insert("additionalProperties".into(), Value::Bool(false));
            }
            _ => {}
        }
        if let Some(key) = s.dictionary_key {
            o.insert("x-dictionaryKey".into(), self.node(key));
        }
        if !s.enumeration.is_empty() {
            o.insert("enum".into(), Value::Array(s.enumeration.clone()));
            o.insert("x-enumNames".into(), s.enumeration_names.iter().cloned().map(Value::from).collect());
        }
        if s.is_flag_enum {
            o.insert("x-enumFlags".into(), Value::Bool(true));
        }

        let numbers = [("minimum", s.minimum), ("maximum", s.maximum), ("multipleOf", s.multiple_of)];
        for (key, value) in numbers {
            if let Some(value) = value {
                o.insert(key.into(), json_num_pref_i64(value));
            }
        }
        let counts = [
            ("minLength", s.min_length),
            ("maxLength", s.max_length),
            ("minItems", s.min_items),
            ("maxItems", s.max_items),
        ];
        for (key, value) in counts {
            if let Some(value) = value {
                o.insert(key.into(), Value::from(value));
            }
        }
        if let Some(pattern) = &s.pattern {
            o.insert("pattern".into(), Value::from(pattern.clone()));
        }
        if let Some(default) = &s.default {
            o.insert("default".into(), default.clone());
        }
        if s.read_only {
            o.insert("readOnly".into(), Value::Bool(true));
        }
        if let Some(nullable) = s.is_nullable_raw {
            let key = if self.dialect == SchemaDialect::Swagger2 { "x-nullable" } else { "nullable" };
            o.insert(key.into(), Value::Bool(nullable));
        }
        for (key, value) in &s.extension_data {
            o.insert(key.clone(), value.clone());
        }
        Value::Object(o)
    }
}

// prefer emitting integers when exact
fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Discriminator, JsonObjectType, SchemaKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unnamed_referenced_nodes_become_anonymous_definitions() {
        let mut r = JsonSchemaResolver::new();
        let loose = r.alloc(JsonSchema::of_type(JsonObjectType::STRING));
        let prop = r.alloc(JsonSchema { kind: SchemaKind::Property, ..JsonSchema::reference_to(loose) });
        r.node_mut(r.root()).properties.insert("a".into(), prop);
        let doc = JsonSchemaDocument::new(TypeRef::named("x"), r, SchemaDialect::OpenApi3).to_json();
        assert_eq!(
            doc,
            json!({
                "properties": { "a": { "$ref": "#/definitions/Anonymous" } },
                "definitions": { "Anonymous": { "type": "string" } }
            })
        );
    }

    #[test]
    fn numbers_and_dialect_specific_keywords() {
        let mut r = JsonSchemaResolver::new();
        let root = r.root();
        let node = r.node_mut(root);
        node.type_ = JsonObjectType::NUMBER;
        node.minimum = Some(0.0);
        node.maximum = Some(2.5);
        node.is_nullable_raw = Some(true);
        node.discriminator = Some(Discriminator { property_name: "kind".into(), mapping: IndexMap::new() });

        let doc = JsonSchemaDocument::new(TypeRef::named("x"), r, SchemaDialect::Swagger2).to_json();
        assert_eq!(doc["minimum"], json!(0));
        assert_eq!(doc["maximum"], json!(2.5));
        assert_eq!(doc["x-nullable"], json!(true));
        assert_eq!(doc["discriminator"], json!("kind"));
    }
}
