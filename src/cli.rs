//! CLI: type model files → JSON Schema
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::generator::JsonSchemaGenerator;
use crate::model::{TypeDefKind, TypeModel, TypeRef};
use crate::settings::{GeneratorSettings, InheritanceMode, SchemaDialect};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate JSON Schema documents from declarative type models
#[derive(Parser, Debug)]
#[command(name = "typeschema")]
pub struct CommandLineInterface {
    /// log decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate the schema of one type
    Schema(SchemaOut),
    /// list the types defined by the inputs
    Types(InputSettings),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more type model files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root type, e.g. `Order` or `Page<User>`
    #[arg(long = "type", short = 't')]
    ty: TypeRef,

    /// generator settings .json file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// output dialect (overrides the settings file)
    #[arg(long, value_enum)]
    dialect: Option<SchemaDialect>,

    /// merge base type members instead of linking with allOf
    #[arg(long, default_value_t = false)]
    flatten: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_model(&self) -> anyhow::Result<TypeModel> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow::anyhow!("failed to resolve input file paths: {error}"))?;
        let mut model = TypeModel::new();
        for source_path in source_paths {
            tracing::debug!(path = %source_path.display(), "loading type model");
            let part = TypeModel::load(&source_path)?;
            model
                .extend(part)
                .with_context(|| format!("while merging {}", source_path.display()))?;
        }
        Ok(model)
    }
}

impl SchemaOut {
    fn settings(&self) -> anyhow::Result<GeneratorSettings> {
        let mut settings = match &self.settings {
            Some(path) => GeneratorSettings::load(path)?,
            None => GeneratorSettings::default(),
        };
        if let Some(dialect) = self.dialect {
            settings.dialect = dialect;
        }
        if self.flatten {
            settings.inheritance = InheritanceMode::Flattened;
        }
        Ok(settings)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let model = target.input_settings.load_model()?;
                let generator = JsonSchemaGenerator::from_model(model, target.settings()?);
                let document = generator
                    .generate(&target.ty)
                    .with_context(|| format!("failed to generate schema for '{}'", target.ty))?;
                let schema_src = document.to_string_pretty()?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &schema_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{schema_src}");
                }
            }
            Command::Types(input_settings) => {
                let model = input_settings.load_model()?;
                for (name, def) in &model.types {
                    let kind = match def.kind {
                        TypeDefKind::Object => "object",
                        TypeDefKind::Interface => "interface",
                        TypeDefKind::Enum => "enum",
                    };
                    let params = if def.type_parameters.is_empty() {
                        String::new()
                    } else {
                        format!("<{}>", def.type_parameters.join(", "))
                    };
                    println!("{}{params} {}", name.bold(), kind.dimmed());
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched = Vec::new();
            for entry in glob::glob(pattern)? {
                matched.push(entry?);
            }
            if matched.is_empty() {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
            // glob order is filesystem order; model merging must not depend on it
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
