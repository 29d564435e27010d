use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const ROOM_PREFIX: &str = "room::";
pub const GAME_PREFIX: &str = "game::";
pub const WIN_PREFIX: &str = "win::";
pub const HISTORY_PREFIX: &str = "history::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Any stored entity wrapped with the CouchDB bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> CouchDocument<T> {
    pub fn new(id: String, rev: Option<String>, body: T) -> Self {
        Self { id, rev, body }
    }
}

pub fn room_doc_id(room_id: Uuid) -> String {
    format!("{ROOM_PREFIX}{room_id}")
}

pub fn game_doc_id(room_id: Uuid) -> String {
    format!("{GAME_PREFIX}{room_id}")
}

pub fn win_prefix(room_id: Uuid) -> String {
    format!("{WIN_PREFIX}{room_id}::")
}

pub fn win_doc_id(room_id: Uuid, player_id: Uuid) -> String {
    format!("{}{player_id}", win_prefix(room_id))
}

pub fn history_prefix(room_id: Uuid) -> String {
    format!("{HISTORY_PREFIX}{room_id}::")
}

/// History ids sort by finish time so a prefix scan returns the oldest game first.
pub fn history_doc_id(room_id: Uuid, finished_at: SystemTime, id: Uuid) -> String {
    let millis = finished_at
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("{}{millis:020}::{id}", history_prefix(room_id))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn history_ids_sort_chronologically() {
        let room_id = Uuid::new_v4();
        let early = UNIX_EPOCH + Duration::from_secs(9);
        let late = UNIX_EPOCH + Duration::from_secs(10);

        let first = history_doc_id(room_id, early, Uuid::new_v4());
        let second = history_doc_id(room_id, late, Uuid::new_v4());
        assert!(first < second);
        assert!(first.starts_with(&history_prefix(room_id)));
    }

    #[test]
    fn document_flattens_the_body() {
        #[derive(Serialize, Deserialize)]
        struct Body {
            wins: u32,
        }

        let doc = CouchDocument::new("win::x".into(), None, Body { wins: 2 });
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, serde_json::json!({"_id": "win::x", "wins": 2}));

        let parsed: CouchDocument<Body> =
            serde_json::from_value(serde_json::json!({"_id": "a", "_rev": "1-x", "wins": 3}))
                .unwrap();
        assert_eq!(parsed.rev.as_deref(), Some("1-x"));
        assert_eq!(parsed.body.wins, 3);
    }
}
