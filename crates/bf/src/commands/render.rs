//! `befund render` command implementation.

use std::path::{Path, PathBuf};

use bf_config::{CliSettings, Config, RenderFormat};
use bf_engine::{Bindings, HtmlBackend, TextBackend};
use clap::{Args, ValueEnum};

use crate::error::CliError;
use crate::output::{Output, write_stdout};

/// Output format flag.
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Html,
    Text,
}

impl From<FormatArg> for RenderFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Html => Self::Html,
            FormatArg::Text => Self::Text,
        }
    }
}

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Template file.
    template: PathBuf,

    /// JSON object with bindings, e.g. `{"Name": "Müller", "a": 3}`.
    #[arg(short, long)]
    bindings: Option<PathBuf>,

    /// Bind a key (repeatable, overrides --bindings).
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = super::parse_key_val)]
    sets: Vec<(String, String)>,

    /// Output format (overrides config).
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Parse without GitHub Flavored Markdown extensions.
    #[arg(long)]
    no_gfm: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let settings = CliSettings {
            format: self.format.map(Into::into),
            gfm: self.no_gfm.then_some(false),
            ..CliSettings::default()
        };
        let config = Config::load(config_path, Some(&settings))?;

        let mut bindings: Bindings = match &self.bindings {
            Some(path) => serde_json::from_str(&super::read_source(path)?)?,
            None => Bindings::new(),
        };
        super::apply_sets(&mut bindings, self.sets);

        let source = super::read_source(&self.template)?;
        let template = super::parse_template(&self.template, &source, &super::parse_options(&config))?;
        for warning in &template.schema().warnings {
            output.warning(&format!("Warning: {warning}"));
        }

        let rendered = match config.render.format {
            RenderFormat::Html => template.renderer::<HtmlBackend>().render(&bindings),
            RenderFormat::Text => template.renderer::<TextBackend>().render(&bindings),
        };
        tracing::info!(format = %config.render.format, bindings = bindings.len(), "Rendered template");

        write_stdout(&rendered)?;
        Ok(())
    }
}
