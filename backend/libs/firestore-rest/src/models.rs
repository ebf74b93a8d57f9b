use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document fields keyed by field name.
pub type Fields = BTreeMap<String, Value>;

/// Firestore typed value
///
/// Serialized the way the REST API and Firestore event payloads encode it,
/// e.g. `{"stringValue": "hello"}` or `{"nullValue": null}`. Covers every
/// value type a document field can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integers travel as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    /// Base64-encoded bytes.
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(LatLng),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

impl Value {
    pub fn null() -> Self {
        Value::NullValue(())
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::StringValue(s.into())
    }

    /// `Some(s)` becomes a string value, `None` becomes null.
    pub fn optional_string(s: Option<&str>) -> Self {
        s.map(Value::string).unwrap_or_else(Value::null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::NullValue(()))
    }
}

/// A Firestore document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name: `projects/{p}/databases/{d}/documents/{path}`
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    pub fn id(&self) -> Option<&str> {
        document_id(&self.name)
    }
}

/// Last path segment of a document resource name.
pub fn document_id(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,
    pub set_to_server_value: String,
}

impl FieldTransform {
    /// Set `field_path` to the commit time on the server.
    pub fn request_time(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            set_to_server_value: "REQUEST_TIME".to_string(),
        }
    }
}

/// A single write inside a commit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    pub update: Document,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub update_transforms: Vec<FieldTransform>,
}

impl Write {
    /// Upsert that only touches `fields` and the server timestamp fields,
    /// leaving every other field of an existing document untouched.
    pub fn merge(name: impl Into<String>, fields: Fields, server_timestamps: &[&str]) -> Self {
        let field_paths = fields.keys().cloned().collect();
        Self {
            update: Document {
                name: name.into(),
                fields,
                create_time: None,
                update_time: None,
            },
            update_mask: Some(DocumentMask { field_paths }),
            update_transforms: server_timestamps
                .iter()
                .map(|f| FieldTransform::request_time(*f))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommitRequest<'a> {
    pub writes: &'a [Write],
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    #[serde(default)]
    pub update_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub write_results: Vec<WriteResult>,
    #[serde(default)]
    pub commit_time: Option<String>,
}

/// One element of the streamed `runQuery` response array
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub read_time: Option<String>,
}

/// Ids of every document carried by a `runQuery` response.
pub fn ids_from_run_query(responses: &[RunQueryResponse]) -> Vec<String> {
    responses
        .iter()
        .filter_map(|r| r.document.as_ref())
        .filter_map(|doc| doc.id())
        .map(str::to_string)
        .collect()
}
