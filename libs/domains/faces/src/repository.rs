use async_trait::async_trait;

use crate::error::FaceResult;
use crate::filter::FacePredicate;
use crate::models::{CollectionConfig, FaceRecord, ScoredFace};

/// Points a delete call applies to
#[derive(Debug, Clone, PartialEq)]
pub enum PointSelector {
    Ids(Vec<String>),
    Matching(FacePredicate),
}

/// Capabilities the face store needs from a vector index service.
///
/// Implementations own their client handle; every call names the collection
/// it targets so one index can serve several collections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaceIndex: Send + Sync {
    /// Configuration of an existing collection, `None` when it does not exist
    async fn collection_info(&self, collection: &str) -> FaceResult<Option<CollectionConfig>>;

    /// Create a collection with a fixed dimension and metric
    async fn create_collection(&self, collection: &str, config: CollectionConfig)
    -> FaceResult<()>;

    /// Insert or overwrite records by id
    async fn upsert(&self, collection: &str, records: Vec<FaceRecord>) -> FaceResult<()>;

    /// Delete by id list or by predicate
    async fn delete(&self, collection: &str, selector: PointSelector) -> FaceResult<()>;

    /// Records matching a predicate. `None` limit means every match.
    async fn scroll(
        &self,
        collection: &str,
        predicate: &FacePredicate,
        limit: Option<u32>,
    ) -> FaceResult<Vec<FaceRecord>>;

    /// Records by id; unknown ids are skipped
    async fn retrieve(&self, collection: &str, ids: Vec<String>) -> FaceResult<Vec<FaceRecord>>;

    /// Top `limit` records by descending score
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> FaceResult<Vec<ScoredFace>>;
}
