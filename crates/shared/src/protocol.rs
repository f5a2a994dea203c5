use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(
        default,
        deserialize_with = "string_or_integer",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Receiver {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub receiver: Receiver,
    pub action: Action,
}

impl Message {
    pub fn new(receiver: Receiver, action: Action) -> Self {
        Self { receiver, action }
    }

    /// The receiver id when it is present and non-empty.
    pub fn receiver_id(&self) -> Option<&str> {
        self.receiver.id.as_deref().filter(|id| !id.is_empty())
    }
}

fn string_or_integer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(v)) => Some(v),
        Some(RawId::Signed(v)) => Some(v.to_string()),
        Some(RawId::Unsigned(v)) => Some(v.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_without_payload_serializes_type_only() {
        let raw = serde_json::to_string(&Action::new("testAction")).expect("json");
        assert_eq!(raw, r#"{"type":"testAction"}"#);
    }

    #[test]
    fn message_accepts_numeric_receiver_id() {
        let message: Message = serde_json::from_value(json!({
            "receiver": { "id": 2, "name": "test" },
            "action": { "type": "test", "payload": { "data": "test" } }
        }))
        .expect("message");
        assert_eq!(message.receiver_id(), Some("2"));
        assert_eq!(message.action.payload, Some(json!({ "data": "test" })));
    }

    #[test]
    fn missing_receiver_id_and_action_type_still_parse() {
        let message: Message = serde_json::from_value(json!({
            "receiver": { "name": "nobody" },
            "action": {}
        }))
        .expect("message");
        assert_eq!(message.receiver_id(), None);
        assert!(message.action.kind.is_empty());
    }

    #[test]
    fn empty_receiver_id_counts_as_missing() {
        let message = Message::new(Receiver::new("", "x"), Action::new("a"));
        assert_eq!(message.receiver_id(), None);
    }
}
