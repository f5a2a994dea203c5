use futures::{stream, StreamExt};
use shared::{
    domain::{MoveReport, ParsedKey},
    error::{PipelineError, Result},
    protocol::{Action, Message},
};
use storage::SetStore;
use tracing::{debug, info};

use crate::{
    codec::{ActionCodec, JsonCodec},
    key_codec::KeyCodec,
    options::PipelineOptions,
    state_machine::{StateMachine, COLLECTOR},
};

/// A named, ordered pipeline of states over a [`SetStore`].
///
/// Every operation validates its state names before the first store call,
/// so bad input never leaves a partial effect behind. The pipeline holds no
/// mutable state and can be shared across tasks behind an `Arc`.
pub struct Pipeline<S, C = JsonCodec> {
    group_name: String,
    suffix: String,
    keys: KeyCodec,
    store: S,
    codec: C,
    max_in_flight: usize,
}

impl<S: SetStore> Pipeline<S> {
    pub fn new(group_name: impl Into<String>, store: S, options: PipelineOptions) -> Result<Self> {
        Self::with_codec(group_name, store, options, JsonCodec)
    }
}

impl<S: SetStore, C: ActionCodec> Pipeline<S, C> {
    pub fn with_codec(
        group_name: impl Into<String>,
        store: S,
        options: PipelineOptions,
        codec: C,
    ) -> Result<Self> {
        let group_name = group_name.into();
        if group_name.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "group name must not be empty".into(),
            ));
        }

        let machine = StateMachine::new(options.states.iter().cloned())?;
        let suffix = options.resolved_suffix().to_string();
        let keys = KeyCodec::new(&group_name, &suffix, machine);

        Ok(Self {
            group_name,
            suffix,
            keys,
            store,
            codec,
            max_in_flight: options.resolved_max_in_flight(),
        })
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collector_name(&self) -> &'static str {
        COLLECTOR
    }

    pub fn states(&self) -> &[String] {
        self.keys.machine().states()
    }

    pub fn next_state_name(&self, state: &str) -> Result<Option<&str>> {
        self.keys.machine().next_state(state)
    }

    pub fn key(&self, id: &str, state: &str) -> Result<String> {
        self.keys.build_key(id, state)
    }

    pub fn parse_key(&self, key: &str) -> Result<ParsedKey> {
        self.keys.parse_key(key)
    }

    /// Adds each message's encoded action to the collector set of its receiver.
    ///
    /// All messages are validated and encoded before anything is written.
    /// Returns the number of messages written.
    pub async fn register_messages(&self, messages: &[Message]) -> Result<usize> {
        let mut writes = Vec::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            let id = validate_message(index, message)?;
            let key = self.keys.build_key(id, COLLECTOR)?;
            writes.push((key, message));
        }

        let mut entries = Vec::with_capacity(writes.len());
        for (key, message) in writes {
            let member = self
                .codec
                .encode(&message.action)
                .map_err(PipelineError::Serialization)?;
            entries.push((key, member));
        }

        let total = entries.len();
        let mut pending = stream::iter(entries.iter())
            .map(|(key, member)| self.store.add_member(key, member))
            .buffer_unordered(self.max_in_flight);

        let mut registered = 0;
        while let Some(result) = pending.next().await {
            if let Err(source) = result {
                return Err(PipelineError::PartialRegistration {
                    registered,
                    total,
                    source,
                });
            }
            registered += 1;
        }

        info!(group = %self.group_name, registered, "messages registered");
        Ok(registered)
    }

    pub async fn add(&self, id: &str, state: &str, value: &str) -> Result<()> {
        let key = self.keys.build_key(id, state)?;
        self.store
            .add_member(&key, value)
            .await
            .map_err(PipelineError::Store)
    }

    pub async fn members(&self, id: &str, state: &str) -> Result<Vec<String>> {
        let key = self.keys.build_key(id, state)?;
        self.store.members(&key).await.map_err(PipelineError::Store)
    }

    pub async fn collected(&self, id: &str) -> Result<Vec<String>> {
        self.members(id, COLLECTOR).await
    }

    /// Members of a state decoded back into actions.
    pub async fn actions(&self, id: &str, state: &str) -> Result<Vec<Action>> {
        self.members(id, state)
            .await?
            .iter()
            .map(|raw| self.codec.decode(raw).map_err(PipelineError::Serialization))
            .collect()
    }

    pub async fn collected_actions(&self, id: &str) -> Result<Vec<Action>> {
        self.actions(id, COLLECTOR).await
    }

    pub async fn clear(&self, id: &str, state: &str) -> Result<()> {
        let key = self.keys.build_key(id, state)?;
        self.store.delete_key(&key).await.map_err(PipelineError::Store)?;
        debug!(group = %self.group_name, id, state, "state cleared");
        Ok(())
    }

    /// Moves every member of `from` to `to` for one id.
    pub async fn move_id(&self, id: &str, from: &str, to: &str) -> Result<MoveReport> {
        let from_key = self.keys.build_key(id, from)?;
        let to_key = self.keys.build_key(id, to)?;
        let report = self.move_keys(&from_key, &to_key).await?;
        debug!(
            group = %self.group_name,
            id,
            from,
            to,
            moved = report.moved,
            "id moved"
        );
        Ok(report)
    }

    /// Moves every member between two raw keys without validating them.
    pub async fn move_keys(&self, from_key: &str, to_key: &str) -> Result<MoveReport> {
        let members = self
            .store
            .members(from_key)
            .await
            .map_err(PipelineError::Store)?;

        let mut report = MoveReport {
            attempted: members.len(),
            moved: 0,
        };
        let moves: Vec<_> = members
            .iter()
            .map(|member| self.store.move_member(from_key, to_key, member))
            .collect();
        let mut pending = stream::iter(moves).buffer_unordered(self.max_in_flight);

        while let Some(result) = pending.next().await {
            match result {
                Ok(true) => report.moved += 1,
                Ok(false) => {}
                Err(source) => {
                    return Err(PipelineError::PartialMove {
                        from: from_key.to_string(),
                        to: to_key.to_string(),
                        moved: report.moved,
                        attempted: report.attempted,
                        source,
                    })
                }
            }
        }
        Ok(report)
    }

    /// Advances an id to the state after `current`.
    ///
    /// Returns `None` without touching the store when `current` is the last
    /// state.
    pub async fn next(&self, id: &str, current: &str) -> Result<Option<MoveReport>> {
        let Some(next) = self.keys.machine().next_state(current)? else {
            debug!(group = %self.group_name, id, state = current, "terminal state, nothing to advance");
            return Ok(None);
        };
        let report = self.move_id(id, current, next).await?;
        info!(
            group = %self.group_name,
            id,
            from = current,
            to = next,
            moved = report.moved,
            "id advanced"
        );
        Ok(Some(report))
    }

    /// Unions the `sources` sets of an id into `dest`. Sources are kept.
    pub async fn merge(&self, id: &str, dest: &str, sources: &[&str]) -> Result<()> {
        let dest_key = self.keys.build_key(id, dest)?;
        let source_keys = sources
            .iter()
            .map(|state| self.keys.build_key(id, state))
            .collect::<Result<Vec<_>>>()?;
        if source_keys.is_empty() {
            return Ok(());
        }

        self.store
            .union_into(&dest_key, &source_keys)
            .await
            .map_err(PipelineError::Store)?;
        debug!(group = %self.group_name, id, dest, sources = ?sources, "states merged");
        Ok(())
    }
}

fn validate_message(index: usize, message: &Message) -> Result<&str> {
    if message.action.kind.is_empty() {
        return Err(PipelineError::invalid_message(index, "action type is empty"));
    }
    message
        .receiver_id()
        .ok_or_else(|| PipelineError::invalid_message(index, "receiver id is missing"))
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
