use anyhow::Result;
use shared::protocol::Action;

/// Turns actions into set members and back.
///
/// Encoding must be deterministic: equal actions must produce equal strings,
/// otherwise set deduplication and member moves stop lining up.
pub trait ActionCodec: Send + Sync {
    fn encode(&self, action: &Action) -> Result<String>;
    fn decode(&self, raw: &str) -> Result<Action>;
}

/// Compact JSON, e.g. `{"type":"testAction","payload":{"count":1}}`.
///
/// Object keys inside payloads come out sorted, so encoding is stable.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ActionCodec for JsonCodec {
    fn encode(&self, action: &Action) -> Result<String> {
        Ok(serde_json::to_string(action)?)
    }

    fn decode(&self, raw: &str) -> Result<Action> {
        Ok(serde_json::from_str(raw)?)
    }
}
