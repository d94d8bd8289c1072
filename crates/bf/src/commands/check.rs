//! `befund check` command implementation.

use std::path::{Path, PathBuf};

use bf_config::Config;
use bf_engine::{InputDescriptor, InputKind};
use clap::Args;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Template files.
    #[arg(required = true)]
    templates: Vec<PathBuf>,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// Syntax errors fail the command; skipped directives are reported as
    /// warnings only.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;
        let options = super::parse_options(&config);

        let mut failed = 0;
        for path in &self.templates {
            let result = super::read_source(path)
                .and_then(|source| super::parse_template(path, &source, &options));
            let template = match result {
                Ok(template) => template,
                Err(err) => {
                    output.error(&format!("{err}"));
                    failed += 1;
                    continue;
                }
            };

            let schema = template.schema();
            for warning in &schema.warnings {
                output.warning(&format!("{}: {warning}", path.display()));
            }
            output.success(&format!(
                "{}: {} inputs, {} warnings",
                path.display(),
                count(&schema.inputs),
                schema.warnings.len()
            ));
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} templates failed to parse",
                self.templates.len()
            )));
        }
        Ok(())
    }
}

/// Number of bindable inputs, not counting case labels.
fn count(inputs: &[InputDescriptor]) -> usize {
    inputs
        .iter()
        .map(|input| usize::from(input.kind != InputKind::Case) + count(&input.children))
        .sum()
}

#[cfg(test)]
mod tests {
    use bf_engine::Template;

    use super::*;

    #[test]
    fn test_count_skips_cases() {
        let source = "\
:::selector{primary=\"g\"}
:::case{primary=\"w\"}
:value{primary=\"ssw\"}
:::
:::

:score{formula=\"a+b\"}
";
        let template = Template::parse(source).unwrap();
        // g, ssw, score, a, b
        assert_eq!(count(template.inputs()), 5);
    }
}
