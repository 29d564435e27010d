use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::debug;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GameStateEntity, HistoryEntity, RoomEntity, WinEntity},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchDocument, END_SUFFIX, game_doc_id, history_doc_id, history_prefix,
        room_doc_id, win_doc_id, win_prefix,
    },
};

/// Attempts made to bump a win counter before giving up.
const WIN_UPDATE_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<CouchDocument<T>>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchDocument<T>>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// PUT a document. A stale or missing `_rev` comes back as [`CouchDaoError::Conflict`].
    async fn put_document<T>(&self, document: &CouchDocument<T>) -> CouchResult<()>
    where
        T: Serialize,
    {
        let doc_id = document.id.as_str();
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: doc_id.to_string(),
            }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Upsert that reuses whatever revision is current.
    async fn overwrite_document<T>(&self, doc_id: String, body: T) -> CouchResult<()>
    where
        T: Serialize,
    {
        let rev = self
            .get_document::<serde_json::Value>(&doc_id)
            .await?
            .and_then(|existing| existing.rev);
        self.put_document(&CouchDocument::new(doc_id, rev, body))
            .await
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{prefix}\"")),
            ("endkey", format!("\"{prefix}{END_SUFFIX}\"")),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value::<CouchDocument<T>>(doc)
                    .map(|parsed| parsed.body)
                    .map_err(|source| CouchDaoError::DeserializeValue {
                        path: ALL_DOCS.to_string(),
                        source,
                    })
            })
            .collect()
    }

    async fn save_game_state(
        &self,
        state: GameStateEntity,
        expected_version: Option<u64>,
    ) -> CouchResult<()> {
        let doc_id = game_doc_id(state.room_id);
        let existing = self.get_document::<GameStateEntity>(&doc_id).await?;

        let rev = match (existing, expected_version) {
            (None, None) => None,
            (Some(current), Some(expected)) if current.body.version == expected => current.rev,
            _ => return Err(CouchDaoError::Conflict { path: doc_id }),
        };

        // A writer slipping in between the read and this PUT changes `_rev`,
        // which CouchDB reports as 409.
        self.put_document(&CouchDocument::new(doc_id, rev, state))
            .await
    }

    async fn record_win(&self, room_id: Uuid, player_id: Uuid) -> CouchResult<()> {
        let doc_id = win_doc_id(room_id, player_id);

        for attempt in 1..=WIN_UPDATE_ATTEMPTS {
            let (rev, mut counter) = match self.get_document::<WinEntity>(&doc_id).await? {
                Some(existing) => (existing.rev, existing.body),
                None => (
                    None,
                    WinEntity {
                        room_id,
                        player_id,
                        wins: 0,
                    },
                ),
            };
            counter.wins += 1;

            match self
                .put_document(&CouchDocument::new(doc_id.clone(), rev, counter))
                .await
            {
                Ok(()) => return Ok(()),
                Err(CouchDaoError::Conflict { .. }) => {
                    debug!(doc_id = %doc_id, attempt, "win counter changed concurrently; retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(CouchDaoError::Contended {
            path: doc_id,
            attempts: WIN_UPDATE_ATTEMPTS,
        })
    }
}

impl GameStore for CouchGameStore {
    fn load_room(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store
                .get_document::<RoomEntity>(&room_doc_id(room_id))
                .await?;
            Ok(doc.map(|doc| doc.body))
        })
    }

    fn save_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .overwrite_document(room_doc_id(room.id), room)
                .await
                .map_err(Into::into)
        })
    }

    fn load_game_state(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store
                .get_document::<GameStateEntity>(&game_doc_id(room_id))
                .await?;
            Ok(doc.map(|doc| doc.body))
        })
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
        Box::pin(async move {
            let doc_id = history_doc_id(entry.room_id, entry.finished_at, entry.id);
            store
                .put_document(&CouchDocument::new(doc_id, None, entry))
                .await
                .map_err(Into::into)
        })
    }

    fn list_wins(&self, room_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<WinEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_documents::<WinEntity>(&win_prefix(room_id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_history(
        &self,
        room_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<HistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_documents::<HistoryEntity>(&history_prefix(room_id))
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
