//! In-process index with exact brute-force scoring.
//!
//! Used for local development and tests. Scores follow the "higher is better"
//! contract of [`FaceIndex::search`]: cosine and dot report similarity,
//! euclidean and manhattan report the negated distance.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{FaceError, FaceResult};
use crate::filter::FacePredicate;
use crate::models::{CollectionConfig, DistanceMetric, FaceRecord, ScoredFace};
use crate::repository::{FaceIndex, PointSelector};

#[derive(Debug)]
struct MemoryCollection {
    config: CollectionConfig,
    records: BTreeMap<String, FaceRecord>,
}

impl MemoryCollection {
    fn check_dimension(&self, id: &str, vector: &[f32]) -> FaceResult<()> {
        if vector.len() as u64 != self.config.dimension {
            return Err(FaceError::DimensionMismatch {
                id: id.to_string(),
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryFaceIndex {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl InMemoryFaceIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(collection: &str) -> FaceError {
    FaceError::Internal(format!("Collection {} not found", collection))
}

pub(crate) fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let pairs = a.iter().zip(b.iter());
    match metric {
        DistanceMetric::Cosine => {
            let dot: f32 = pairs.map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
        DistanceMetric::DotProduct => pairs.map(|(x, y)| x * y).sum(),
        DistanceMetric::Euclidean => -pairs.map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt(),
        DistanceMetric::Manhattan => -pairs.map(|(x, y)| (x - y).abs()).sum::<f32>(),
    }
}

#[async_trait]
impl FaceIndex for InMemoryFaceIndex {
    async fn collection_info(&self, collection: &str) -> FaceResult<Option<CollectionConfig>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.config))
    }

    async fn create_collection(
        &self,
        collection: &str,
        config: CollectionConfig,
    ) -> FaceResult<()> {
        let mut collections = self.collections.write().await;

        if collections.contains_key(collection) {
            return Err(FaceError::Internal(format!(
                "Collection {} already exists",
                collection
            )));
        }

        collections.insert(
            collection.to_string(),
            MemoryCollection {
                config,
                records: BTreeMap::new(),
            },
        );

        tracing::debug!(collection, dimension = config.dimension, "Created in-memory collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<FaceRecord>) -> FaceResult<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;

        // Reject the whole batch before touching any record
        for record in &records {
            target.check_dimension(&record.id, &record.vector)?;
        }

        for record in records {
            target.records.insert(record.id.clone(), record);
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, selector: PointSelector) -> FaceResult<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection))?;

        match selector {
            PointSelector::Ids(ids) => {
                for id in ids {
                    target.records.remove(&id);
                }
            }
            PointSelector::Matching(predicate) => {
                target.records.retain(|_, record| !predicate.matches(record));
            }
        }

        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        predicate: &FacePredicate,
        limit: Option<u32>,
    ) -> FaceResult<Vec<FaceRecord>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;

        let matching = target
            .records
            .values()
            .filter(|record| predicate.matches(record))
            .cloned();

        Ok(match limit {
            Some(limit) => matching.take(limit as usize).collect(),
            None => matching.collect(),
        })
    }

    async fn retrieve(&self, collection: &str, ids: Vec<String>) -> FaceResult<Vec<FaceRecord>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;

        Ok(ids
            .iter()
            .filter_map(|id| target.records.get(id).cloned())
            .collect())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> FaceResult<Vec<ScoredFace>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| not_found(collection))?;
        target.check_dimension("query", &vector)?;

        let mut scored: Vec<ScoredFace> = target
            .records
            .values()
            .map(|record| ScoredFace {
                id: record.id.clone(),
                score: score(target.config.distance, &vector, &record.vector),
                person_id: Some(record.person_id.clone()),
                group_id: Some(record.group_id.clone()),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit as usize);

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = "faces";

    async fn index_with(metric: DistanceMetric) -> InMemoryFaceIndex {
        let index = InMemoryFaceIndex::new();
        index
            .create_collection(COLLECTION, CollectionConfig::new(2).with_distance(metric))
            .await
            .unwrap();
        index
    }

    #[test]
    fn test_cosine_score_of_identical_vectors_is_one() {
        let s = score(DistanceMetric::Cosine, &[0.3, 0.4], &[0.3, 0.4]);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_score_handles_zero_vector() {
        assert_eq!(score(DistanceMetric::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_distance_metrics_are_negated() {
        assert_eq!(score(DistanceMetric::Euclidean, &[0.0, 0.0], &[3.0, 4.0]), -5.0);
        assert_eq!(score(DistanceMetric::Manhattan, &[0.0, 0.0], &[3.0, 4.0]), -7.0);
        assert_eq!(score(DistanceMetric::DotProduct, &[1.0, 2.0], &[3.0, 4.0]), 11.0);
    }

    #[tokio::test]
    async fn test_create_collection_twice_fails() {
        let index = index_with(DistanceMetric::Cosine).await;
        let result = index
            .create_collection(COLLECTION, CollectionConfig::new(2))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upsert_rejects_whole_batch_on_dimension_mismatch() {
        let index = index_with(DistanceMetric::Cosine).await;

        let result = index
            .upsert(
                COLLECTION,
                vec![
                    FaceRecord::new("a", vec![1.0, 0.0], "alice", "acme"),
                    FaceRecord::new("b", vec![1.0], "alice", "acme"),
                ],
            )
            .await;

        assert!(matches!(result, Err(FaceError::DimensionMismatch { .. })));
        let all = index
            .scroll(COLLECTION, &FacePredicate::match_all(), None)
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_search_orders_by_descending_score() {
        let index = index_with(DistanceMetric::Euclidean).await;
        index
            .upsert(
                COLLECTION,
                vec![
                    FaceRecord::new("far", vec![10.0, 10.0], "bob", "acme"),
                    FaceRecord::new("near", vec![1.0, 1.0], "alice", "acme"),
                ],
            )
            .await
            .unwrap();

        let results = index.search(COLLECTION, vec![0.0, 0.0], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "near");
        assert_eq!(results[1].id, "far");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_delete_by_predicate() {
        let index = index_with(DistanceMetric::Cosine).await;
        index
            .upsert(
                COLLECTION,
                vec![
                    FaceRecord::new("a", vec![1.0, 0.0], "alice", "acme"),
                    FaceRecord::new("b", vec![0.0, 1.0], "bob", "acme"),
                ],
            )
            .await
            .unwrap();

        index
            .delete(
                COLLECTION,
                PointSelector::Matching(FacePredicate::build(Some("alice"), None)),
            )
            .await
            .unwrap();

        let remaining = index
            .retrieve(COLLECTION, vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
    }

    #[tokio::test]
    async fn test_operations_on_missing_collection_fail() {
        let index = InMemoryFaceIndex::new();
        assert!(index.collection_info("missing").await.unwrap().is_none());
        assert!(index.retrieve("missing", vec![]).await.is_err());
    }
}
