use crate::models::Picture;
use mongodb::bson::{Bson, Document};
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;

pub const INVALID_JSON: &str = "Invalid JSON";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful create: the storage identifier, not the business id.
#[derive(Debug, Serialize)]
pub struct InsertResponse {
    #[serde(rename = "insert id")]
    pub insert_id: String,
}

impl From<Bson> for InsertResponse {
    fn from(inserted_id: Bson) -> Self {
        let insert_id = match inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s,
            other => other.to_string(),
        };
        Self { insert_id }
    }
}

/// Convert a stored document to plain JSON (relaxed Extended JSON), so
/// ObjectIds and other BSON-only types serialize as ordinary JSON values.
pub fn normalize(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

/// Parse a create/update request body.
///
/// An empty, unparseable or falsy body (`null`, `{}`, `[]`, `false`, `0`,
/// `""`) is rejected as invalid JSON; a non-object or an object missing one of
/// the six fields is rejected with the reason.
pub fn parse_picture_body(body: &[u8]) -> Result<Picture, AppError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| AppError::bad_request(INVALID_JSON))?;

    if is_falsy(&value) {
        return Err(AppError::bad_request(INVALID_JSON));
    }
    if !value.is_object() {
        return Err(AppError::bad_request(
            "Invalid picture: expected a JSON object",
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::bad_request(format!("Invalid picture: {}", e)))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
