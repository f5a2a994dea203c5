use std::collections::HashSet;

use shared::error::{PipelineError, Result};

/// Name of the implicit first state every pipeline starts with.
pub const COLLECTOR: &str = "collector";

/// Ordered states of a pipeline, `collector` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    states: Vec<String>,
}

impl StateMachine {
    pub fn new<I, S>(configured: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut states = vec![COLLECTOR.to_string()];
        let mut seen = HashSet::new();
        for state in configured {
            let state = state.into();
            if state.is_empty() {
                return Err(PipelineError::InvalidConfig(
                    "state names must not be empty".into(),
                ));
            }
            if state.contains(':') {
                return Err(PipelineError::InvalidConfig(format!(
                    "state name '{state}' must not contain ':'"
                )));
            }
            if state == COLLECTOR {
                return Err(PipelineError::InvalidConfig(format!(
                    "'{COLLECTOR}' is implicit and cannot be configured"
                )));
            }
            if !seen.insert(state.clone()) {
                return Err(PipelineError::InvalidConfig(format!(
                    "state '{state}' is listed more than once"
                )));
            }
            states.push(state);
        }
        Ok(Self { states })
    }

    pub fn collector_name(&self) -> &'static str {
        COLLECTOR
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// The states after `collector`, in configured order.
    pub fn configured(&self) -> &[String] {
        &self.states[1..]
    }

    pub fn contains(&self, state: &str) -> bool {
        self.position(state).is_some()
    }

    pub fn validate<'a>(&self, state: &'a str) -> Result<&'a str> {
        if self.contains(state) {
            Ok(state)
        } else {
            Err(PipelineError::InvalidState(state.to_string()))
        }
    }

    /// `None` when `current` is the last state.
    pub fn next_state(&self, current: &str) -> Result<Option<&str>> {
        let position = self
            .position(current)
            .ok_or_else(|| PipelineError::InvalidState(current.to_string()))?;
        Ok(self.states.get(position + 1).map(String::as_str))
    }

    fn position(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }
}

#[cfg(test)]
#[path = "tests/state_machine_tests.rs"]
mod tests;
