//! Plain data projected out of snapshots

use crate::error::Result;
use crate::firestore::{DocumentSnapshot, QuerySnapshot};
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// Document fields plus the document id
///
/// The id is read-only: it has no setter, and it takes precedence over a
/// stored field named `id` when the record is serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    fields: Map<String, Value>,
}

impl Record {
    /// Create a record from an id and its fields
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Record with an id and no fields
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(id, Map::new())
    }

    /// Materialize a snapshot; `None` when the document does not exist
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Option<Self> {
        snapshot
            .data
            .as_ref()
            .map(|fields| Self::new(snapshot.id(), fields.clone()))
    }

    /// Document id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw document fields
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Single top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// JSON object with the fields and the id
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(object)
    }

    /// Deserialize the record (fields plus `id`) into a typed value
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = usize::from(!self.fields.contains_key("id"));
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (key, value) in self.fields.iter().filter(|(key, _)| key.as_str() != "id") {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("id", &self.id)?;
        map.end()
    }
}

/// Value exposed by a binding
///
/// Serializes untagged: `Empty` and `Document(None)` become `null`, a
/// document becomes an object and a collection an array.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(untagged)]
pub enum BoundData {
    /// No data and no default
    #[default]
    Empty,
    /// Single document; `None` when it does not exist
    Document(Option<Record>),
    /// Documents of a query, in delivery order
    Collection(Vec<Record>),
}

impl BoundData {
    /// Project a document snapshot
    pub fn from_document(snapshot: &DocumentSnapshot) -> Self {
        Self::Document(Record::from_snapshot(snapshot))
    }

    /// Project a query snapshot, skipping documents without data
    pub fn from_query(snapshot: &QuerySnapshot) -> Self {
        Self::Collection(
            snapshot
                .documents()
                .iter()
                .filter_map(Record::from_snapshot)
                .collect(),
        )
    }

    /// Collection value from records
    pub fn collection(records: impl IntoIterator<Item = Record>) -> Self {
        Self::Collection(records.into_iter().collect())
    }

    /// Existing document value
    pub fn document(record: Record) -> Self {
        Self::Document(Some(record))
    }

    /// Records of a collection value
    pub fn as_collection(&self) -> Option<&[Record]> {
        match self {
            Self::Collection(records) => Some(records),
            _ => None,
        }
    }

    /// Record of an existing document value
    pub fn as_document(&self) -> Option<&Record> {
        match self {
            Self::Document(record) => record.as_ref(),
            _ => None,
        }
    }

    /// Whether this is `Empty` or a missing document
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Empty | Self::Document(None))
    }

    /// JSON representation
    pub fn to_value(&self) -> Value {
        match self {
            Self::Empty | Self::Document(None) => Value::Null,
            Self::Document(Some(record)) => record.to_value(),
            Self::Collection(records) => Value::Array(records.iter().map(Record::to_value).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firestore::{CollectionReference, DocumentReference};
    use serde_json::json;

    fn snapshot(path: &str, data: Option<Value>) -> DocumentSnapshot {
        DocumentSnapshot::new(
            DocumentReference::new(path).unwrap(),
            data.and_then(|d| d.as_object().cloned()),
        )
    }

    #[test]
    fn test_record_attaches_id() {
        let record = Record::from_snapshot(&snapshot("users/alice", Some(json!({"name": "Alice"})))).unwrap();
        assert_eq!(record.id(), "alice");
        assert_eq!(record.to_value(), json!({"name": "Alice", "id": "alice"}));
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"name": "Alice", "id": "alice"}));
    }

    #[test]
    fn test_id_field_cannot_be_overridden_by_data() {
        let record = Record::from_snapshot(&snapshot("users/alice", Some(json!({"id": "spoofed"})))).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": "alice"}));
        assert_eq!(record.to_value(), json!({"id": "alice"}));
    }

    #[test]
    fn test_missing_document_projects_to_none() {
        let data = BoundData::from_document(&snapshot("users/ghost", None));
        assert_eq!(data, BoundData::Document(None));
        assert!(data.is_null());
        assert_eq!(serde_json::to_value(&data).unwrap(), Value::Null);
    }

    #[test]
    fn test_query_projection_keeps_order_and_skips_missing() {
        let query = CollectionReference::new("users").unwrap().query();
        let snapshot = QuerySnapshot::new(
            query,
            vec![
                snapshot("users/b", Some(json!({"n": 2}))),
                snapshot("users/gone", None),
                snapshot("users/a", Some(json!({"n": 1}))),
            ],
        );
        let data = BoundData::from_query(&snapshot);
        let ids: Vec<&str> = data.as_collection().unwrap().iter().map(Record::id).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(data.to_value(), json!([{"n": 2, "id": "b"}, {"n": 1, "id": "a"}]));
    }

    #[test]
    fn test_typed_deserialize() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct User {
            id: String,
            name: String,
        }

        let record = Record::new("alice", json!({"name": "Alice"}).as_object().cloned().unwrap());
        let user: User = record.deserialize().unwrap();
        assert_eq!(user, User { id: "alice".into(), name: "Alice".into() });
    }

    #[test]
    fn test_default_serializes_as_null() {
        assert_eq!(serde_json::to_value(BoundData::default()).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(BoundData::collection([Record::with_id("default")])).unwrap(),
            json!([{"id": "default"}])
        );
    }
}
