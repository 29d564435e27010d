use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored entity plus the string keys MongoDB filters on.
///
/// Keys are strings so lookups never depend on how the driver encodes UUIDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDocument<T> {
    #[serde(rename = "_id")]
    pub id: String,
    pub room: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T> MongoDocument<T> {
    pub fn new(id: String, room_id: Uuid, body: T) -> Self {
        Self {
            id,
            room: room_id.to_string(),
            body,
        }
    }
}

/// Win counter; updated in place with `$inc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoWinDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub room: String,
    pub player: String,
    pub wins: u32,
}

pub fn by_id(id: &str) -> Document {
    doc! {"_id": id}
}

pub fn by_room(room_id: Uuid) -> Document {
    doc! {"room": room_id.to_string()}
}

pub fn win_id(room_id: Uuid, player_id: Uuid) -> String {
    format!("{room_id}::{player_id}")
}
