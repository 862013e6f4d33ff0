use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Everything that can abort a generation run.
///
/// Validation-shaped problems (duplicate names, malformed declarations) are
/// fatal for the whole run; best-effort gaps (no description, no element
/// type for a list) never show up here.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("the JSON property '{property}' is defined multiple times on type '{type_name}'")]
    DuplicateProperty { type_name: String, property: String },

    #[error("the discriminator property '{property}' is defined multiple times on type '{type_name}'")]
    DuplicateDiscriminator { type_name: String, property: String },

    #[error("could not determine the element or value type of '{type_name}'")]
    UnresolvedElementType { type_name: String },

    #[error("a known type declaration on '{type_name}' specifies neither a type nor a resolvable method")]
    MalformedKnownTypeDeclaration { type_name: String },

    #[error("unsupported type '{type_name}'")]
    UnsupportedType { type_name: String },

    #[error("invalid type reference '{input}': {reason}")]
    InvalidTypeRef { input: String, reason: String },

    #[error("type '{type_name}' is defined more than once")]
    DuplicateTypeDefinition { type_name: String },

    #[error("failed to load {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    pub fn unsupported(type_name: impl ToString) -> Self {
        Self::UnsupportedType { type_name: type_name.to_string() }
    }
}
