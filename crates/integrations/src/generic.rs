//! The default integration conversation: a plain JSON object.

use serde_json::Value;

use dialogwire_core::JsonObject;

/// Mapping-like conversation used for every platform without a dedicated
/// integration. Whatever the request carried is sent back untouched unless
/// the handler changes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericIntegrationConversation {
    data: JsonObject,
}

impl GenericIntegrationConversation {
    pub fn from_payload(payload: JsonObject) -> Self {
        Self { data: payload }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn as_object(&self) -> &JsonObject {
        &self.data
    }

    pub fn render(&self) -> JsonObject {
        self.data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untouched_payload_round_trips() {
        let payload = json!({"foo": 1, "nested": {"a": [1, 2]}});
        let conv = GenericIntegrationConversation::from_payload(
            payload.as_object().unwrap().clone(),
        );
        assert_eq!(conv.get("foo"), Some(&json!(1)));
        assert_eq!(Value::Object(conv.render()), payload);
    }

    #[test]
    fn mapping_operations() {
        let mut conv = GenericIntegrationConversation::default();
        assert!(conv.is_empty());
        conv.insert("text", "hi");
        conv.insert("count", 2);
        assert_eq!(conv.len(), 2);
        assert!(conv.contains_key("text"));
        assert_eq!(conv.remove("count"), Some(json!(2)));
        assert_eq!(conv.iter().count(), 1);
    }
}
