//! Partial update: field name to raw JSON value, keeping only keys present in the body.

use crate::model::schema::ResourceSchema;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    /// Keep the body keys that name a stored attribute. The key attribute is dropped;
    /// an explicit `null` is kept as "set to null", an absent key stays untouched.
    pub fn from_body(schema: &ResourceSchema, body: Map<String, Value>) -> Self {
        let fields = body
            .into_iter()
            .filter(|(name, _)| {
                let known = schema.attribute(name).is_some();
                if !known {
                    tracing::debug!(field = %name, collection = schema.collection, "dropping unknown patch field");
                }
                known && !schema.is_key(name)
            })
            .collect();
        Patch { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Applied fields plus the key, as returned to the client.
    pub fn to_response(&self, key: &str, id: &str) -> Value {
        let mut out = self.fields.clone();
        out.insert(key.to_string(), Value::String(id.to_string()));
        Value::Object(out)
    }
}
