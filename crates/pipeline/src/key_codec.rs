use shared::{
    domain::ParsedKey,
    error::{PipelineError, Result},
};

use crate::state_machine::StateMachine;

const KEY_NAMESPACE: &str = "rpipe";
const STATE_SEGMENT: &str = ":state:";

/// Builds and parses the storage keys of one pipeline.
///
/// Keys have the form `rpipe:group:<group>:id:<id>:state:<state>:<suffix>`.
/// Parsing is anchored on this pipeline's group and suffix, and the state is
/// the text after the last `:state:`, so ids may contain `:`.
#[derive(Debug, Clone)]
pub struct KeyCodec {
    machine: StateMachine,
    head: String,
    tail: String,
}

impl KeyCodec {
    pub fn new(group_name: &str, suffix: &str, machine: StateMachine) -> Self {
        Self {
            machine,
            head: format!("{KEY_NAMESPACE}:group:{group_name}:id:"),
            tail: format!(":{suffix}"),
        }
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn build_key(&self, id: &str, state: &str) -> Result<String> {
        let state = self.machine.validate(state)?;
        Ok(format!("{}{id}{STATE_SEGMENT}{state}{}", self.head, self.tail))
    }

    pub fn parse_key(&self, key: &str) -> Result<ParsedKey> {
        let invalid = || PipelineError::InvalidKeyFormat(key.to_string());
        let rest = key
            .strip_prefix(self.head.as_str())
            .and_then(|rest| rest.strip_suffix(self.tail.as_str()))
            .ok_or_else(invalid)?;
        let (id, state) = rest.rsplit_once(STATE_SEGMENT).ok_or_else(invalid)?;
        let state = self.machine.validate(state)?;
        Ok(ParsedKey::new(id, state))
    }
}

#[cfg(test)]
#[path = "tests/key_codec_tests.rs"]
mod tests;
