//! CLI command implementations.

mod check;
mod eval;
mod render;
mod schema;

pub(crate) use check::CheckArgs;
pub(crate) use eval::EvalArgs;
pub(crate) use render::RenderArgs;
pub(crate) use schema::SchemaArgs;

use std::path::Path;

use bf_config::Config;
use bf_engine::{BindingValue, Bindings, ParseOptions, Template};

use crate::error::CliError;

/// Parse a `KEY=VALUE` argument.
fn parse_key_val(arg: &str) -> Result<(String, String), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {arg:?}"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in {arg:?}"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Apply `--set` pairs on top of `bindings`. Values are kept as text.
fn apply_sets(bindings: &mut Bindings, sets: Vec<(String, String)>) {
    for (key, value) in sets {
        bindings.insert(key, BindingValue::Text(value));
    }
}

fn parse_options(config: &Config) -> ParseOptions {
    ParseOptions {
        gfm: config.engine.gfm,
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_template(path: &Path, source: &str, options: &ParseOptions) -> Result<Template, CliError> {
    Template::parse_with(source, options).map_err(|source| CliError::Syntax {
        path: path.to_path_buf(),
        source,
    })
}
