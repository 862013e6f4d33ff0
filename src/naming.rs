//! Naming policies: definition names for schemas and serialized property names.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::TypeRef;

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Produces the `definitions` key for a type's schema.
pub trait SchemaNameGenerator {
    fn generate(&self, ty: &TypeRef) -> String;
}

/// `Page<User>` → `PageOfUser`, `Map<string, Item>` → `DictionaryOfStringAndItem`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchemaNameGenerator;

impl SchemaNameGenerator for DefaultSchemaNameGenerator {
    fn generate(&self, ty: &TypeRef) -> String {
        let base = if ty.is_map() {
            "Dictionary".to_string()
        } else if ty.is_array() {
            "Collection".to_string()
        } else {
            // namespaces are dropped: `billing::Invoice` → `Invoice`
            let last = ty.name.rsplit(|c| c == ':' || c == '.').next().unwrap_or(&ty.name);
            upper_first(&NON_IDENT.replace_all(last, ""))
        };
        if ty.args.is_empty() {
            return base;
        }
        let args: Vec<String> = ty.args.iter().map(|a| self.generate(a)).collect();
        format!("{base}Of{}", args.join("And"))
    }
}

/// Name-transformation policy for serialized property names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyNaming {
    #[default]
    AsDeclared,
    CamelCase,
    PascalCase,
    SnakeCase,
    KebabCase,
}

impl PropertyNaming {
    pub fn apply(self, name: &str) -> String {
        if self == Self::AsDeclared {
            return name.to_string();
        }
        let words = split_words(name);
        match self {
            Self::AsDeclared => name.to_string(),
            Self::CamelCase => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.to_lowercase() } else { upper_first(&w.to_lowercase()) })
                .collect(),
            Self::PascalCase => words.iter().map(|w| upper_first(&w.to_lowercase())).collect(),
            Self::SnakeCase => join_lower(&words, "_"),
            Self::KebabCase => join_lower(&words, "-"),
        }
    }
}

fn join_lower(words: &[String], sep: &str) -> String {
    words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>().join(sep)
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split on separators and case boundaries; acronym runs stay together
/// (`HTTPServer` → `HTTP`, `Server`).
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
