use mongodb::bson::{doc, Document};
use serde::Deserialize;

/// Fields compared by the update no-op check. `id` is the lookup key and is
/// not compared.
pub const CONTENT_FIELDS: [&str; 5] = [
    "pic_url",
    "event_country",
    "event_state",
    "event_city",
    "event_date",
];

/// A picture as accepted from clients. Stored documents are rebuilt from
/// exactly these six fields; anything else in a request body is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Picture {
    pub id: i64,
    pub pic_url: String,
    pub event_country: String,
    pub event_state: String,
    pub event_city: String,
    pub event_date: String,
}

impl Picture {
    pub fn to_document(&self) -> Document {
        doc! {
            "id": self.id,
            "pic_url": self.pic_url.as_str(),
            "event_country": self.event_country.as_str(),
            "event_state": self.event_state.as_str(),
            "event_city": self.event_city.as_str(),
            "event_date": self.event_date.as_str(),
        }
    }

    /// True when every content field equals the stored document's. A stored
    /// field that is missing or not a string never matches.
    pub fn content_matches(&self, stored: &Document) -> bool {
        CONTENT_FIELDS
            .iter()
            .zip(self.content_values())
            .all(|(field, value)| stored.get_str(field).map_or(false, |s| s == value))
    }

    fn content_values(&self) -> [&str; 5] {
        [
            self.pic_url.as_str(),
            self.event_country.as_str(),
            self.event_state.as_str(),
            self.event_city.as_str(),
            self.event_date.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn sample() -> Picture {
        Picture {
            id: 7,
            pic_url: "http://example.com/7.png".to_string(),
            event_country: "United States".to_string(),
            event_state: "Ohio".to_string(),
            event_city: "Columbus".to_string(),
            event_date: "1/1/2023".to_string(),
        }
    }

    #[test]
    fn document_has_exactly_six_fields() {
        let document = sample().to_document();
        assert_eq!(document.len(), 6);
        assert_eq!(document.get_i64("id").unwrap(), 7);
        assert_eq!(document.get_str("event_city").unwrap(), "Columbus");
    }

    #[test]
    fn content_matches_ignores_id_and_storage_id() {
        let mut stored = sample().to_document();
        stored.insert("_id", ObjectId::new());
        stored.insert("id", 99_i64);
        assert!(sample().content_matches(&stored));
    }

    #[test]
    fn content_differs_on_single_field() {
        let stored = sample().to_document();
        let mut changed = sample();
        changed.event_date = "2/2/2023".to_string();
        assert!(!changed.content_matches(&stored));
    }

    #[test]
    fn non_string_stored_field_never_matches() {
        let mut stored = sample().to_document();
        stored.insert("event_date", 20230101_i32);
        assert!(!sample().content_matches(&stored));
    }
}
