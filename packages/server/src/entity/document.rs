use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One document of the hierarchical store, addressed by the path of its
/// collection and its id within that collection.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    /// Slash-separated collection path, e.g. `collections/{id}/photos`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection_path: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub doc_id: String,

    pub fields: serde_json::Value,

    #[sea_orm(indexed)]
    pub create_time: DateTimeUtc,

    pub update_time: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
