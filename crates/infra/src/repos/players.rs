use futures_util::TryStreamExt;

use crate::models::Player;
use crate::store::{
    Document, DocumentKey, DocumentStore, Handle, IndexStatus, PredicateQuery, StoreError,
    StoreResult, PLAYER_PREFIX,
};

/// Collection holding player documents.
pub const PLAYERS_COLLECTION: &str = "players";

#[derive(Clone)]
pub struct PlayerRepo {
    store: DocumentStore,
}

impl PlayerRepo {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    async fn handle(&self) -> StoreResult<Handle> {
        self.store.open(PLAYERS_COLLECTION).await
    }

    /// Open the players collection and make sure it can serve ad-hoc queries.
    pub async fn prepare(&self) -> StoreResult<IndexStatus> {
        let handle = self.handle().await?;
        self.store.ensure_index(&handle).await
    }

    /// Insert or replace a player under `u:<id>`.
    pub async fn add(&self, player: &Player) -> StoreResult<()> {
        let handle = self.handle().await?;
        self.store
            .put_json(&handle, &DocumentKey::player(&player.id), player)
            .await?;
        tracing::debug!(player_id = %player.id, "Stored player");
        Ok(())
    }

    /// The stored document for `id`, as written. Documents from other writers
    /// are returned unchanged; shaping them is left to the reader.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        let handle = self.handle().await?;
        match self.store.get(&handle, &DocumentKey::player(id)).await {
            Ok(doc) => Ok(Some(doc)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every player document in the collection, ordered by key.
    pub async fn list(&self) -> StoreResult<Vec<Document>> {
        let handle = self.handle().await?;
        let query = PredicateQuery::with_key_prefix(DocumentKey::kind_prefix(PLAYER_PREFIX));

        self.store.query(&handle, query)?.try_collect().await
    }

    pub async fn remove(&self, id: &str) -> StoreResult<bool> {
        let handle = self.handle().await?;
        self.store.remove(&handle, &DocumentKey::player(id)).await
    }
}
