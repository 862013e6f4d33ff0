//! Generator configuration.
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::naming::PropertyNaming;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SchemaDialect {
    /// Unrestricted: null type and `oneOf` unions.
    #[default]
    JsonSchema,
    /// Restricted: no null type, non-nullability only through `required`.
    Swagger2,
    /// Restricted unions/references, nullability as `nullable: true`.
    OpenApi3,
}

impl SchemaDialect {
    pub fn is_restricted(self) -> bool { self != Self::JsonSchema }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceMode {
    #[default]
    Linked,
    Flattened,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceNullability {
    #[default]
    Null,
    NotNull,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumHandling {
    #[default]
    Integer,
    String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberInclusion {
    #[default]
    PublicOnly,
    All,
}

/// `type`/`format` pair a primitive mapping resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveMapping {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub dialect: SchemaDialect,
    pub inheritance: InheritanceMode,
    pub flatten_interfaces: bool,
    pub generate_known_types: bool,
    pub allow_reference_with_properties: bool,
    pub default_reference_type_nullability: ReferenceNullability,
    pub default_enum_handling: EnumHandling,
    pub member_inclusion: MemberInclusion,
    pub ignore_obsolete_properties: bool,
    pub property_naming: PropertyNaming,
    pub excluded_type_names: Vec<String>,
    pub generate_enum_mapping_description: bool,
    pub default_discriminator_name: String,
    pub primitive_mappings: IndexMap<String, PrimitiveMapping>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            dialect: SchemaDialect::JsonSchema,
            inheritance: InheritanceMode::Linked,
            flatten_interfaces: false,
            generate_known_types: true,
            allow_reference_with_properties: false,
            default_reference_type_nullability: ReferenceNullability::Null,
            default_enum_handling: EnumHandling::Integer,
            member_inclusion: MemberInclusion::PublicOnly,
            ignore_obsolete_properties: false,
            property_naming: PropertyNaming::AsDeclared,
            excluded_type_names: Vec::new(),
            generate_enum_mapping_description: false,
            default_discriminator_name: "discriminator".to_string(),
            primitive_mappings: IndexMap::new(),
        }
    }
}

impl GeneratorSettings {
    pub fn from_json_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
            .map_err(|message| SchemaError::Load { path: "<inline>".into(), message })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        crate::path_de::from_slice_with_path(&bytes)
            .map_err(|message| SchemaError::Load { path: path.to_path_buf(), message })
    }

    pub fn flatten_inheritance(&self) -> bool {
        self.inheritance == InheritanceMode::Flattened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let s = GeneratorSettings::from_json_str(r#"{ "dialect": "swagger2", "inheritance": "flattened" }"#)
            .unwrap();
        assert_eq!(s.dialect, SchemaDialect::Swagger2);
        assert!(s.flatten_inheritance());
        assert!(s.generate_known_types);
        assert_eq!(s.default_discriminator_name, "discriminator");
    }

    #[test]
    fn load_reports_path_of_bad_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_enum_handling": "words" }}"#).unwrap();
        let err = GeneratorSettings::load(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("default_enum_handling"), "{msg}");
    }
}
