//! Conversion of stored documents into wire JSON.
//!
//! `_id` is renamed to `id` and rendered as a plain string. Every other
//! ObjectId, at any depth, becomes its hex string; BSON dates become RFC 3339
//! strings; everything else goes through relaxed extended JSON.

use mongodb::bson::{Bson, Document};
use serde_json::{Map, Value};

pub fn serialize_doc(mut doc: Document) -> Map<String, Value> {
    let id = doc.remove("_id");

    let mut out: Map<String, Value> = doc
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();

    if let Some(id) = id {
        out.insert("id".to_string(), Value::String(id_to_string(id)));
    }

    out
}

pub fn serialize_docs(docs: Vec<Document>) -> Vec<Map<String, Value>> {
    docs.into_iter().map(serialize_doc).collect()
}

fn id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.into_relaxed_extjson().to_string(),
    }
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => dt
            .try_to_rfc3339_string()
            .map(Value::String)
            .unwrap_or_else(|_| Value::from(dt.timestamp_millis())),
        Bson::Document(doc) => Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}
