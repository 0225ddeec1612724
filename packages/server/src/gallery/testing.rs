//! Test doubles that wrap the in-memory stores with call recording and
//! failure injection.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use common::docstore::memory::MemoryDocumentStore;
use common::docstore::{
    BatchWrite, ChangeEvent, CollectionPath, DocPath, DocStoreError, Document, DocumentStore,
    Fields, Query,
};
use common::storage::memory::MemoryObjectStore;
use common::storage::{ObjectStore, PutOptions, StorageError};
use tokio::sync::broadcast;

#[derive(Default)]
pub struct FlakyDocumentStore {
    inner: MemoryDocumentStore,
    calls: Mutex<Vec<String>>,
    adds: AtomicUsize,
    failing_adds: Mutex<HashSet<usize>>,
    failing_deletes: Mutex<Option<String>>,
    failing_queries: AtomicBool,
}

impl FlakyDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store; writes through it are neither recorded nor failed.
    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    /// Fail the `n`-th `add` from now on (1-based).
    pub fn fail_nth_add(&self, n: usize) {
        let offset = self.adds.load(Ordering::SeqCst);
        self.failing_adds.lock().unwrap().insert(offset + n);
    }

    /// Fail every delete whose path contains `fragment`.
    pub fn fail_deletes_containing(&self, fragment: &str) {
        *self.failing_deletes.lock().unwrap() = Some(fragment.to_string());
    }

    pub fn fail_queries(&self, fail: bool) {
        self.failing_queries.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn injected(what: &str) -> DocStoreError {
    DocStoreError::Unavailable(format!("injected failure: {what}"))
}

#[async_trait]
impl DocumentStore for FlakyDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, DocStoreError> {
        self.record(format!("get {path}"));
        self.inner.get(path).await
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<Document, DocStoreError> {
        self.record(format!("add {collection}"));
        let n = self.adds.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing_adds.lock().unwrap().contains(&n) {
            return Err(injected("add"));
        }
        self.inner.add(collection, fields).await
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError> {
        self.record(format!("set {path}"));
        self.inner.set(path, fields).await
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError> {
        self.record(format!("update {path}"));
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), DocStoreError> {
        self.record(format!("delete {path}"));
        let failing = self.failing_deletes.lock().unwrap().clone();
        if failing.is_some_and(|fragment| path.to_string().contains(&fragment)) {
            return Err(injected("delete"));
        }
        self.inner.delete(path).await
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, DocStoreError> {
        self.record(format!("query {collection}"));
        if self.failing_queries.load(Ordering::SeqCst) {
            return Err(injected("query"));
        }
        self.inner.query(collection, query).await
    }

    async fn commit(&self, writes: Vec<BatchWrite>) -> Result<(), DocStoreError> {
        self.record(format!("commit {}", writes.len()));
        self.inner.commit(writes).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.subscribe()
    }
}

/// Object store that records every batch delete and can be told to fail them.
#[derive(Default)]
pub struct RecordingObjectStore {
    inner: MemoryObjectStore,
    deletes: Mutex<Vec<Vec<String>>>,
    failing: AtomicBool,
}

impl RecordingObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Every `delete_many` call, in order, including failed ones.
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put(
        &self,
        object_name: &str,
        data: &[u8],
        options: &PutOptions,
    ) -> Result<String, StorageError> {
        self.inner.put(object_name, data, options).await
    }

    async fn delete_many(&self, urls: &[String]) -> Result<(), StorageError> {
        self.deletes.lock().unwrap().push(urls.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected failure".into()));
        }
        Ok(())
    }

    async fn exists(&self, url: &str) -> Result<bool, StorageError> {
        self.inner.exists(url).await
    }

    /// Serves `blob://<name>` URLs.
    fn object_name<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        url.strip_prefix("blob://")
            .filter(|name| !name.is_empty())
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))
    }
}
