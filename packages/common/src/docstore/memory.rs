use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, broadcast};

use super::document::{Document, Fields};
use super::error::DocStoreError;
use super::path::{CollectionPath, DocPath};
use super::query::Query;
use super::traits::{BatchWrite, ChangeEvent, ChangeKind, DocumentStore};

const CHANGE_CAPACITY: usize = 256;

#[derive(Default)]
struct State {
    collections: HashMap<CollectionPath, BTreeMap<String, Document>>,
    last_tick: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing timestamps so creation order is never ambiguous.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(next);
        next
    }

    fn lookup(&self, path: &DocPath) -> Option<&Document> {
        self.collections
            .get(path.collection())
            .and_then(|docs| docs.get(path.id()))
    }

    fn set(&mut self, path: &DocPath, fields: Fields) -> ChangeKind {
        let now = self.tick();
        let docs = self
            .collections
            .entry(path.collection().clone())
            .or_default();
        match docs.get_mut(path.id()) {
            Some(existing) => {
                existing.fields = fields;
                existing.update_time = now;
                ChangeKind::Modified
            }
            None => {
                docs.insert(
                    path.id().to_string(),
                    Document {
                        id: path.id().to_string(),
                        fields,
                        create_time: now,
                        update_time: now,
                    },
                );
                ChangeKind::Added
            }
        }
    }

    fn delete(&mut self, path: &DocPath) -> bool {
        self.collections
            .get_mut(path.collection())
            .and_then(|docs| docs.remove(path.id()))
            .is_some()
    }
}

/// Process-local document store for development and tests.
pub struct MemoryDocumentStore {
    state: Mutex<State>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: Mutex::new(State::default()),
            changes,
        }
    }

    fn notify(&self, path: DocPath, kind: ChangeKind) {
        // No subscribers is fine.
        let _ = self.changes.send(ChangeEvent { path, kind });
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, DocStoreError> {
        let state = self.state.lock().await;
        Ok(state.lookup(path).cloned())
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<Document, DocStoreError> {
        let path = collection.doc(&uuid::Uuid::new_v4().simple().to_string())?;
        let doc = {
            let mut state = self.state.lock().await;
            state.set(&path, fields);
            state
                .lookup(&path)
                .cloned()
                .ok_or_else(|| DocStoreError::Unavailable(format!("{path} vanished")))?
        };
        self.notify(path, ChangeKind::Added);
        Ok(doc)
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError> {
        let kind = self.state.lock().await.set(path, fields);
        self.notify(path.clone(), kind);
        Ok(())
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError> {
        {
            let mut state = self.state.lock().await;
            let now = state.tick();
            let doc = state
                .collections
                .get_mut(path.collection())
                .and_then(|docs| docs.get_mut(path.id()))
                .ok_or_else(|| DocStoreError::NotFound(path.to_string()))?;
            doc.fields.extend(fields);
            doc.update_time = now;
        }
        self.notify(path.clone(), ChangeKind::Modified);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), DocStoreError> {
        let removed = self.state.lock().await.delete(path);
        if removed {
            self.notify(path.clone(), ChangeKind::Removed);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, DocStoreError> {
        let state = self.state.lock().await;
        let docs = state
            .collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(query.apply(docs))
    }

    async fn commit(&self, writes: Vec<BatchWrite>) -> Result<(), DocStoreError> {
        let mut applied = Vec::with_capacity(writes.len());
        {
            // A single lock scope makes the batch atomic for readers.
            let mut state = self.state.lock().await;
            for write in writes {
                match write {
                    BatchWrite::Set { path, fields } => {
                        let kind = state.set(&path, fields);
                        applied.push((path, kind));
                    }
                    BatchWrite::Delete { path } => {
                        if state.delete(&path) {
                            applied.push((path, ChangeKind::Removed));
                        }
                    }
                }
            }
        }
        for (path, kind) in applied {
            self.notify(path, kind);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
