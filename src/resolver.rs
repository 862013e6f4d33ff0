//! Identity cache: one canonical schema per `(type, schema key)`.
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use crate::model::TypeRef;
use crate::schema::{JsonSchema, SchemaId};

/// Distinguishes variants of one type that must not share a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKey {
    Object,
    IntegerEnum,
    StringEnum,
}

/// Owns every schema node of one generation run.
#[derive(Debug)]
pub struct JsonSchemaResolver {
    nodes: Vec<JsonSchema>,
    mappings: HashMap<(TypeRef, SchemaKey), SchemaId>,
    /// Non-root schemas published under `definitions`, in registration order.
    definitions: IndexMap<SchemaId, String>,
    root: SchemaId,
}

impl JsonSchemaResolver {
    pub fn new() -> Self {
        Self {
            nodes: vec![JsonSchema::default()],
            mappings: HashMap::new(),
            definitions: IndexMap::new(),
            root: SchemaId(0),
        }
    }

    pub fn root(&self) -> SchemaId { self.root }

    pub fn alloc(&mut self, schema: JsonSchema) -> SchemaId {
        self.nodes.push(schema);
        SchemaId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: SchemaId) -> &JsonSchema { &self.nodes[id.0] }
    pub fn node_mut(&mut self, id: SchemaId) -> &mut JsonSchema { &mut self.nodes[id.0] }

    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Follow `$ref` indirections to the concrete node.
    pub fn actual(&self, id: SchemaId) -> SchemaId {
        let mut current = id;
        // a chain longer than the arena would be a cycle of pure references
        for _ in 0..self.nodes.len() {
            match self.nodes[current.0].reference {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    pub fn has_schema(&self, ty: &TypeRef, key: SchemaKey) -> bool {
        self.mappings.contains_key(&(ty.clone(), key))
    }

    pub fn get_schema(&self, ty: &TypeRef, key: SchemaKey) -> Option<SchemaId> {
        self.mappings.get(&(ty.clone(), key)).copied()
    }

    /// Register the canonical schema for `(ty, key)`. Non-root schemas are also
    /// published as a definition under a unique name derived from `name_hint`.
    pub fn add_schema(&mut self, ty: &TypeRef, key: SchemaKey, schema: SchemaId, name_hint: &str) {
        trace!(type_name = %ty, ?key, schema = schema.0, "registering schema");
        self.mappings.insert((ty.clone(), key), schema);
        if schema != self.root {
            self.append_schema(schema, name_hint);
        }
    }

    /// Publish a schema under `definitions`; returns the name it got.
    pub fn append_schema(&mut self, schema: SchemaId, name_hint: &str) -> String {
        if let Some(name) = self.definitions.get(&schema) {
            return name.clone();
        }
        let name = self.unique_name(name_hint);
        self.definitions.insert(schema, name.clone());
        name
    }

    pub fn definitions(&self) -> impl Iterator<Item = (SchemaId, &str)> {
        self.definitions.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn definition_name(&self, schema: SchemaId) -> Option<&str> {
        self.definitions.get(&schema).map(String::as_str)
    }

    pub fn unique_name(&self, hint: &str) -> String {
        let base = if hint.is_empty() { "Anonymous" } else { hint };
        let taken = |n: &str| self.definitions.values().any(|v| v == n);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|i| format!("{base}{i}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

impl Default for JsonSchemaResolver {
    fn default() -> Self { Self::new() }
}
