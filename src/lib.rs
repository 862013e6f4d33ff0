//! Type-to-JSON-Schema generation.
//!
//! A [`TypeModel`] (or any other [`TypeProvider`]) describes application
//! types; [`JsonSchemaGenerator`] turns one of them into a
//! [`JsonSchemaDocument`] with exactly one canonical schema per type, shared
//! through references, under the JSON Schema, Swagger 2 or OpenAPI 3 dialect.
pub mod annotations;
pub mod attributes;
pub mod cli;
pub mod emit;
pub mod error;
pub mod generator;
pub mod mappers;
pub mod model;
pub mod naming;
pub mod path_de;
pub mod processors;
pub mod reflection;
pub mod resolver;
pub mod schema;
pub mod settings;

pub use attributes::Attribute;
pub use emit::JsonSchemaDocument;
pub use error::{Result, SchemaError};
pub use generator::JsonSchemaGenerator;
pub use model::{TypeModel, TypeRef};
pub use reflection::{ModelTypeProvider, TypeProvider};
pub use resolver::JsonSchemaResolver;
pub use schema::{JsonObjectType, JsonSchema, SchemaId, SchemaKind};
pub use settings::{GeneratorSettings, SchemaDialect};
