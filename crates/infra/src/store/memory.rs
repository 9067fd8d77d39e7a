use futures_util::stream::{self, StreamExt};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::error::{StoreError, StoreResult};
use super::query::PredicateQuery;
use super::{Document, DocumentStream, IndexStatus};

#[derive(Default)]
struct Collection {
    documents: BTreeMap<String, Document>,
    indexed: bool,
}

/// Collections kept in process memory. Used for local runs and tests.
#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_collection(&self, name: &str) -> StoreResult<()> {
        self.collections
            .write()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    pub fn ensure_index(&self, name: &str) -> StoreResult<IndexStatus> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::collection(name, "collection is not open"))?;
        if collection.indexed {
            return Ok(IndexStatus::AlreadyPresent);
        }
        collection.indexed = true;
        Ok(IndexStatus::Created)
    }

    pub fn upsert(&self, name: &str, key: &str, doc: Document) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::write(format!("collection `{name}` is not open")))?;
        collection.documents.insert(key.to_string(), doc);
        Ok(())
    }

    pub fn get(&self, name: &str, key: &str) -> StoreResult<Document> {
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::read(format!("collection `{name}` is not open")))?;
        collection
            .documents
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    pub fn remove(&self, name: &str, key: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::write(format!("collection `{name}` is not open")))?;
        Ok(collection.documents.remove(key).is_some())
    }

    /// Matches are collected under the read lock, then handed out one by one.
    pub fn query(&self, name: &str, query: &PredicateQuery) -> StoreResult<DocumentStream> {
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::query(format!("collection `{name}` is not open")))?;

        let limit = query
            .limit
            .map(|l| l as usize)
            .unwrap_or(usize::MAX);
        let matches: Vec<Document> = collection
            .documents
            .iter()
            .filter(|(key, doc)| query.matches(key, doc))
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect();

        Ok(stream::iter(matches.into_iter().map(Ok)).boxed())
    }
}
