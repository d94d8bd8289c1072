//! `befund eval` command implementation.

use bf_engine::{Bindings, Evaluation, evaluate, extract_variables};
use clap::Args;

use crate::error::CliError;
use crate::output::{Output, write_stdout};

/// Arguments for the eval command.
#[derive(Args)]
pub(crate) struct EvalArgs {
    /// Formula, e.g. `a + b * 2`.
    formula: String,

    /// Bind a variable (repeatable).
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = super::parse_key_val)]
    sets: Vec<(String, String)>,
}

impl EvalArgs {
    /// Execute the eval command.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let mut bindings = Bindings::new();
        super::apply_sets(&mut bindings, self.sets);

        let variables = extract_variables(&self.formula);
        let unbound: Vec<&str> = variables
            .iter()
            .map(String::as_str)
            .filter(|var| !bindings.contains_key(*var))
            .collect();
        if !unbound.is_empty() {
            output.info(&format!("Unbound (counted as 0): {}", unbound.join(", ")));
        }

        let result = evaluate(&self.formula, &bindings);
        if matches!(result, Evaluation::Error) {
            output.warning("Formula could not be evaluated");
        }

        write_stdout(&format!(
            "variables: {}\nresult: {result}",
            variables.join(", ")
        ))?;
        Ok(())
    }
}
