use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoDocument, MongoWinDocument, by_id, by_room, win_id},
};
use crate::dao::{
    game_store::GameStore,
    models::{GameStateEntity, HistoryEntity, RoomEntity, WinEntity},
    storage::StorageResult,
};

const ROOM_COLLECTION_NAME: &str = "rooms";
const GAME_COLLECTION_NAME: &str = "games";
const WIN_COLLECTION_NAME: &str = "wins";
const HISTORY_COLLECTION_NAME: &str = "history";

#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept alive alongside the database handle it created.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        info!("MongoDB connection re-established");
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        for collection in [WIN_COLLECTION_NAME, HISTORY_COLLECTION_NAME] {
            let index = mongodb::IndexModel::builder()
                .keys(doc! {"room": 1})
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_room_idx")))
                        .build(),
                )
                .build();

            database
                .collection::<mongodb::bson::Document>(collection)
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index: "room",
                    source,
                })?;
        }
        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection<T>(&self, name: &str) -> Collection<MongoDocument<T>>
    where
        T: Send + Sync,
    {
        self.database().await.collection::<MongoDocument<T>>(name)
    }

    async fn win_collection(&self) -> Collection<MongoWinDocument> {
        self.database()
            .await
            .collection::<MongoWinDocument>(WIN_COLLECTION_NAME)
    }

    async fn load_room(&self, id: Uuid) -> MongoResult<Option<RoomEntity>> {
        let document = self
            .collection::<RoomEntity>(ROOM_COLLECTION_NAME)
            .await
            .find_one(by_id(&id.to_string()))
            .await
            .map_err(|source| MongoDaoError::LoadRoom { id, source })?;
        Ok(document.map(|doc| doc.body))
    }

    async fn save_room(&self, room: RoomEntity) -> MongoResult<()> {
        let id = room.id;
        let key = id.to_string();
        let document = MongoDocument::new(key.clone(), id, room);
        self.collection::<RoomEntity>(ROOM_COLLECTION_NAME)
            .await
            .replace_one(by_id(&key), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveRoom { id, source })?;
        Ok(())
    }

    async fn load_game_state(&self, room_id: Uuid) -> MongoResult<Option<GameStateEntity>> {
        let document = self
            .collection::<GameStateEntity>(GAME_COLLECTION_NAME)
            .await
            .find_one(by_id(&room_id.to_string()))
            .await
            .map_err(|source| MongoDaoError::LoadGame { room_id, source })?;
        Ok(document.map(|doc| doc.body))
    }

    async fn save_game_state(
        &self,
        state: GameStateEntity,
        expected_version: Option<u64>,
    ) -> MongoResult<()> {
        let room_id = state.room_id;
        let key = room_id.to_string();
        let conflict = || MongoDaoError::Conflict {
            key: format!("{GAME_COLLECTION_NAME}/{room_id}"),
        };
        let collection = self.collection::<GameStateEntity>(GAME_COLLECTION_NAME).await;
        let document = MongoDocument::new(key.clone(), room_id, state);

        match expected_version {
            None => match collection.insert_one(&document).await {
                Ok(_) => Ok(()),
                Err(err) if is_duplicate_key(&err) => Err(conflict()),
                Err(source) => Err(MongoDaoError::SaveGame { room_id, source }),
            },
            Some(expected) => {
                let version = i64::try_from(expected)
                    .map_err(|_| MongoDaoError::VersionOverflow { version: expected })?;
                let mut filter = by_id(&key);
                filter.insert("version", Bson::Int64(version));

                let result = collection
                    .replace_one(filter, &document)
                    .await
                    .map_err(|source| MongoDaoError::SaveGame { room_id, source })?;
                if result.matched_count == 0 {
                    return Err(conflict());
                }
                Ok(())
            }
        }
    }

    async fn record_win(&self, room_id: Uuid, player_id: Uuid) -> MongoResult<()> {
        let update = doc! {
            "$inc": {"wins": 1},
            "$setOnInsert": {
                "room": room_id.to_string(),
                "player": player_id.to_string(),
            },
        };

        self.win_collection()
            .await
            .update_one(by_id(&win_id(room_id, player_id)), update)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::RecordWin { room_id, source })?;
        Ok(())
    }

    async fn record_history(&self, entry: HistoryEntity) -> MongoResult<()> {
        let room_id = entry.room_id;
        let document = MongoDocument::new(entry.id.to_string(), room_id, entry);
        self.collection::<HistoryEntity>(HISTORY_COLLECTION_NAME)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::RecordHistory { room_id, source })?;
        Ok(())
    }

    async fn list_wins(&self, room_id: Uuid) -> MongoResult<Vec<WinEntity>> {
        let documents: Vec<MongoWinDocument> = self
            .win_collection()
            .await
            .find(by_room(room_id))
            .await
            .map_err(|source| MongoDaoError::ListWins { room_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListWins { room_id, source })?;

        documents
            .into_iter()
            .map(|doc| {
                let player_id =
                    Uuid::parse_str(&doc.player).map_err(|source| MongoDaoError::InvalidKey {
                        key: doc.id.clone(),
                        source,
                    })?;
                Ok(WinEntity {
                    room_id,
                    player_id,
                    wins: doc.wins,
                })
            })
            .collect()
    }

    async fn list_history(&self, room_id: Uuid) -> MongoResult<Vec<HistoryEntity>> {
        let documents: Vec<MongoDocument<HistoryEntity>> = self
            .collection::<HistoryEntity>(HISTORY_COLLECTION_NAME)
            .await
            .find(by_room(room_id))
            .await
            .map_err(|source| MongoDaoError::ListHistory { room_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListHistory { room_id, source })?;

        let mut history: Vec<HistoryEntity> = documents.into_iter().map(|doc| doc.body).collect();
        history.sort_by_key(|entry| entry.finished_at);
        Ok(history)
    }
}

impl GameStore for MongoGameStore {
    fn load_room(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_room(room_id).await.map_err(Into::into) })
    }

    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_room(room).await.map_err(Into::into) })
    }

    fn load_game_state(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_game_state(room_id).await.map_err(Into::into) })
    }

    fn save_game_state(
        &self,
        state: GameStateEntity,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_game_state(state, expected_version)
                .await
                .map_err(Into::into)
        })
    }

    fn record_win(&self, room_id: Uuid, player_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_win(room_id, player_id)
                .await
                .map_err(Into::into)
        })
    }

    fn record_history(&self, entry: HistoryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.record_history(entry).await.map_err(Into::into) })
    }

    fn list_wins(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<WinEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_wins(room_id).await.map_err(Into::into) })
    }

    fn list_history(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_history(room_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
