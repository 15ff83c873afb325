use serde::{Serialize, Serializer};
use serde_json::Value;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Entity payload as handed back by a store.
///
/// Ledger clients are inconsistent about the shape: raw bytes, a string, or
/// an already-decoded JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}

impl Payload {
    /// Best-effort JSON view of the payload.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Payload::Bytes(bytes) => serde_json::from_slice(bytes),
            Payload::Text(text) => serde_json::from_str(text),
            Payload::Json(value) => Ok(value.clone()),
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_json() {
            Ok(value) => value.serialize(serializer),
            Err(_) => match self {
                Payload::Bytes(bytes) => match std::str::from_utf8(bytes) {
                    Ok(text) => serializer.serialize_str(text),
                    Err(_) => serializer.serialize_str(&format!("0x{}", hex::encode(bytes))),
                },
                Payload::Text(text) => serializer.serialize_str(text),
                Payload::Json(value) => value.serialize(serializer),
            },
        }
    }
}

/// A stored entity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub key: String,
    pub owner: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub attributes: Vec<Attribute>,
    pub created_at: i64,
    pub expires_at: i64,
    pub tx_hash: String,
}

impl Entity {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }

    pub fn matches(&self, predicates: &[Attribute]) -> bool {
        predicates
            .iter()
            .all(|p| self.attribute(&p.key) == Some(p.value.as_str()))
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Write request for [`EntityStore::create_entity`](super::EntityStore::create_entity)
/// and [`EntityStore::update_entity`](super::EntityStore::update_entity).
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub owner: String,
    pub content_type: String,
    pub payload: Vec<u8>,
    pub attributes: Vec<Attribute>,
    pub expires_in: u64,
}

impl NewEntity {
    pub fn json(owner: &str, payload: &Value, expires_in: u64) -> Result<Self, serde_json::Error> {
        Ok(Self {
            owner: owner.to_string(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            payload: serde_json::to_vec(payload)?,
            attributes: Vec::new(),
            expires_in,
        })
    }

    pub fn attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReceipt {
    pub entity_key: String,
    pub tx_hash: String,
}

/// Equality query over entity attributes.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub predicates: Vec<Attribute>,
    pub with_attributes: bool,
    pub with_payload: bool,
    /// Return matches newest first instead of in creation order.
    pub newest_first: bool,
    pub limit: usize,
}

impl Default for EntityQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            with_attributes: false,
            with_payload: false,
            newest_first: false,
            limit: 100,
        }
    }
}

impl EntityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, key: &str, value: impl Into<String>) -> Self {
        self.predicates.push(Attribute::new(key, value));
        self
    }

    pub fn with_attributes(mut self, yes: bool) -> Self {
        self.with_attributes = yes;
        self
    }

    pub fn with_payload(mut self, yes: bool) -> Self {
        self.with_payload = yes;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Strips the parts of a matched entity the query did not ask for.
    pub(crate) fn project(&self, mut entity: Entity) -> Entity {
        if !self.with_attributes {
            entity.attributes.clear();
        }
        if !self.with_payload {
            entity.payload = None;
        }
        entity
    }
}
