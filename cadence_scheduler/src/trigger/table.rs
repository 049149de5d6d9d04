//! Resolution of the configured binding table into triggers.

use tracing::debug;

use crate::command::CommandCatalog;
use crate::config::BindingConfig;
use crate::error::BindingError;
use crate::trigger::{Signal, Trigger};

/// Named input signals the binding table may refer to.
#[derive(Debug, Clone, Default)]
pub struct InputMap {
    inputs: Vec<(String, Signal)>,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, replacing a previous signal of the same name.
    pub fn insert(&mut self, name: impl Into<String>, signal: Signal) -> &mut Self {
        let name = name.into();
        self.inputs.retain(|(n, _)| *n != name);
        self.inputs.push((name, signal));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|(n, _)| n.as_str())
    }
}

/// Build one trigger per referenced input, in order of first appearance.
///
/// Rows on the same input become bindings of the same trigger, in row
/// order, so same-tick requests keep table order.
pub fn resolve_bindings(
    rows: &[BindingConfig],
    inputs: &InputMap,
    catalog: &CommandCatalog,
) -> Result<Vec<Trigger>, BindingError> {
    let mut triggers: Vec<Trigger> = Vec::new();
    for row in rows {
        let signal = inputs
            .get(&row.input)
            .ok_or_else(|| BindingError::UnknownInput(row.input.clone()))?;
        let template = match (&row.command, row.on.needs_command()) {
            (Some(name), _) => Some(catalog.resolve(name)?),
            (None, true) => {
                return Err(BindingError::MissingCommand {
                    input: row.input.clone(),
                })
            }
            (None, false) => None,
        };

        let index = match triggers.iter().position(|t| t.name() == row.input) {
            Some(i) => i,
            None => {
                triggers.push(Trigger::new(row.input.clone(), signal.clone()));
                triggers.len() - 1
            }
        };
        triggers[index].bind_kind(row.on, template);
        debug!(input = %row.input, on = ?row.on, command = ?row.command, "Binding resolved");
    }
    Ok(triggers)
}
