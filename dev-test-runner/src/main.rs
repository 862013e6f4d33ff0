//! Runs every `fixtures/*.json` case: generate twice, check determinism,
//! compare with `expected` when present.
//!
//! usage: dev-test-runner [FILTER_REGEX] [FIXTURE_DIR]
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use typeschema::{GeneratorSettings, JsonSchemaGenerator, TypeModel, TypeRef};

#[derive(Debug, Deserialize)]
struct Fixture {
    model: TypeModel,
    #[serde(rename = "type")]
    ty: TypeRef,
    #[serde(default)]
    settings: GeneratorSettings,
    #[serde(default)]
    expected: Option<Value>,
}

enum Outcome {
    Pass,
    Fail(String),
}

fn run_fixture(path: &Path) -> Outcome {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) => return Outcome::Fail(format!("read failed: {error}")),
    };
    let de = &mut serde_json::Deserializer::from_slice(&bytes);
    let fixture: Fixture = match serde_path_to_error::deserialize(de) {
        Ok(fixture) => fixture,
        Err(error) => return Outcome::Fail(format!("at JSON path {} → {}", error.path(), error.inner())),
    };
    let generator = JsonSchemaGenerator::from_model(fixture.model.with_names(), fixture.settings);
    let generate = || generator.generate(&fixture.ty).map(|doc| doc.to_json());
    let (first, second) = match (generate(), generate()) {
        (Ok(first), Ok(second)) => (first, second),
        (Err(error), _) | (_, Err(error)) => return Outcome::Fail(format!("generation failed: {error}")),
    };
    if serde_json::to_string(&first).ok() != serde_json::to_string(&second).ok() {
        return Outcome::Fail("output differs between two runs".to_string());
    }
    match fixture.expected {
        Some(expected) if expected != first => {
            let actual = serde_json::to_string_pretty(&first).unwrap_or_default();
            Outcome::Fail(format!("unexpected output:\n{actual}"))
        }
        _ => Outcome::Pass,
    }
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let filter = match args.next().map(|raw| Regex::new(&raw)) {
        Some(Ok(re)) => Some(re),
        Some(Err(error)) => {
            eprintln!("{} invalid filter: {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
        None => None,
    };
    let dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures"));

    let pattern = format!("{}/*.json", dir.display());
    let mut paths: Vec<PathBuf> = match glob::glob(&pattern) {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };
    paths.sort();

    let mut failed = 0;
    let mut ran = 0;
    for path in &paths {
        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        if filter.as_ref().is_some_and(|re| !re.is_match(&name)) {
            continue;
        }
        ran += 1;
        match run_fixture(path) {
            Outcome::Pass => eprintln!("{} {name}", "ok".green()),
            Outcome::Fail(reason) => {
                failed += 1;
                eprintln!("{} {name}: {reason}", "FAIL".red().bold());
            }
        }
    }
    eprintln!("{ran} fixtures, {failed} failed");
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
