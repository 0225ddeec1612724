use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use common::docstore::{
    BatchWrite, ChangeEvent, ChangeKind, CollectionPath, DocPath, DocStoreError, Document,
    DocumentStore, Fields, Query,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::error;
use uuid::Uuid;

use crate::entity::document;

const CHANGE_CAPACITY: usize = 256;

fn db_err(err: DbErr) -> DocStoreError {
    error!(error = %err, "Document database error");
    DocStoreError::Unavailable(err.to_string())
}

fn key(path: &DocPath) -> (String, String) {
    (path.collection().as_str().to_owned(), path.id().to_owned())
}

fn to_document(model: document::Model) -> Result<Document, DocStoreError> {
    let Value::Object(fields) = model.fields else {
        return Err(DocStoreError::Serialization(format!(
            "document '{}' does not hold an object",
            model.doc_id
        )));
    };
    Ok(Document {
        id: model.doc_id,
        fields,
        create_time: model.create_time,
        update_time: model.update_time,
    })
}

async fn write_set<C: ConnectionTrait>(
    conn: &C,
    path: &DocPath,
    fields: Fields,
    now: DateTime<Utc>,
) -> Result<ChangeKind, DbErr> {
    match document::Entity::find_by_id(key(path)).one(conn).await? {
        Some(existing) => {
            let mut active: document::ActiveModel = existing.into();
            active.fields = Set(Value::Object(fields));
            active.update_time = Set(now);
            active.update(conn).await?;
            Ok(ChangeKind::Modified)
        }
        None => {
            let (collection_path, doc_id) = key(path);
            document::ActiveModel {
                collection_path: Set(collection_path),
                doc_id: Set(doc_id),
                fields: Set(Value::Object(fields)),
                create_time: Set(now),
                update_time: Set(now),
            }
            .insert(conn)
            .await?;
            Ok(ChangeKind::Added)
        }
    }
}

/// Document store persisted in one SQL table through sea-orm.
///
/// Queries load the collection and filter in process. Change notifications
/// only cover writes made through this instance.
pub struct SeaOrmDocumentStore {
    db: DatabaseConnection,
    changes: broadcast::Sender<ChangeEvent>,
    last_tick: Mutex<Option<DateTime<Utc>>>,
}

impl SeaOrmDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            db,
            changes,
            last_tick: Mutex::new(None),
        }
    }

    /// Strictly increasing, microsecond-precision timestamps.
    fn tick(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let mut last = match self.last_tick.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }

    fn notify(&self, path: DocPath, kind: ChangeKind) {
        let _ = self.changes.send(ChangeEvent { path, kind });
    }
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, DocStoreError> {
        document::Entity::find_by_id(key(path))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(to_document)
            .transpose()
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<Document, DocStoreError> {
        let path = collection.doc(&Uuid::new_v4().simple().to_string())?;
        let now = self.tick();
        let model = document::ActiveModel {
            collection_path: Set(collection.as_str().to_owned()),
            doc_id: Set(path.id().to_owned()),
            fields: Set(Value::Object(fields)),
            create_time: Set(now),
            update_time: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_err)?;
        self.notify(path, ChangeKind::Added);
        to_document(model)
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError> {
        let now = self.tick();
        let txn = self.db.begin().await.map_err(db_err)?;
        let kind = write_set(&txn, path, fields, now).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        self.notify(path.clone(), kind);
        Ok(())
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError> {
        let now = self.tick();
        let txn = self.db.begin().await.map_err(db_err)?;
        let existing = document::Entity::find_by_id(key(path))
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DocStoreError::NotFound(path.to_string()))?;

        let mut merged = match existing.fields.clone() {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        merged.extend(fields);

        let mut active: document::ActiveModel = existing.into();
        active.fields = Set(Value::Object(merged));
        active.update_time = Set(now);
        active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        self.notify(path.clone(), ChangeKind::Modified);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), DocStoreError> {
        let result = document::Entity::delete_by_id(key(path))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected > 0 {
            self.notify(path.clone(), ChangeKind::Removed);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, DocStoreError> {
        let models = document::Entity::find()
            .filter(document::Column::CollectionPath.eq(collection.as_str()))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let docs = models
            .into_iter()
            .map(to_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(query.apply(docs))
    }

    async fn commit(&self, writes: Vec<BatchWrite>) -> Result<(), DocStoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let mut applied = Vec::with_capacity(writes.len());
        for write in writes {
            match write {
                BatchWrite::Set { path, fields } => {
                    let kind = write_set(&txn, &path, fields, self.tick())
                        .await
                        .map_err(db_err)?;
                    applied.push((path, kind));
                }
                BatchWrite::Delete { path } => {
                    let result = document::Entity::delete_by_id(key(&path))
                        .exec(&txn)
                        .await
                        .map_err(db_err)?;
                    if result.rows_affected > 0 {
                        applied.push((path, ChangeKind::Removed));
                    }
                }
            }
        }
        txn.commit().await.map_err(db_err)?;

        for (path, kind) in applied {
            self.notify(path, kind);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
