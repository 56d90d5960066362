use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter,
    GetPointsBuilder, PointId, PointStruct, PointsIdsList, RetrievedPoint, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{FaceError, FaceResult};
use crate::filter::FacePredicate;
use crate::models::{
    CollectionConfig, DistanceMetric, FACE_ID_KEY, FaceRecord, GROUP_ID_KEY, PERSON_ID_KEY,
    ScoredFace,
};
use crate::repository::{FaceIndex, PointSelector};

/// Namespace for point ids derived from non-UUID face ids
const FACE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_93a2_4d5e_4b8a_9c07_2e51_d3a8_f0b4);

const SCROLL_PAGE_SIZE: u32 = 256;

/// Qdrant-backed implementation of [`FaceIndex`]
pub struct QdrantFaceIndex {
    client: Qdrant,
    /// Distance metric per collection, filled on first use
    metrics: RwLock<HashMap<String, DistanceMetric>>,
}

impl QdrantFaceIndex {
    /// Build the client and verify the server answers.
    pub async fn connect(config: &QdrantConfig) -> FaceResult<Self> {
        let url = config.endpoint.url();
        let mut builder = Qdrant::from_url(&url);

        if let Some(api_key) = config.endpoint.api_key() {
            builder = builder.api_key(api_key.to_string());
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| FaceError::Qdrant(format!("Failed to build client: {}", e)))?;

        let health = client.health_check().await?;
        info!(url = %url, version = %health.version, "Connected to Qdrant");

        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self {
            client,
            metrics: RwLock::new(HashMap::new()),
        }
    }

    /// Qdrant reports euclidean and manhattan results as distances, lower
    /// being closer. Negate them so higher is always better.
    pub(crate) fn similarity(metric: DistanceMetric, raw: f32) -> f32 {
        match metric {
            DistanceMetric::Euclidean | DistanceMetric::Manhattan => -raw,
            DistanceMetric::Cosine | DistanceMetric::DotProduct => raw,
        }
    }

    async fn metric_of(&self, collection: &str) -> FaceResult<DistanceMetric> {
        let cached = self.metrics.read().await.get(collection).copied();
        if let Some(metric) = cached {
            return Ok(metric);
        }

        let config = self.collection_info(collection).await?.ok_or_else(|| {
            FaceError::Internal(format!("Collection {} not found", collection))
        })?;
        Ok(config.distance)
    }

    async fn remember_metric(&self, collection: &str, metric: DistanceMetric) {
        self.metrics
            .write()
            .await
            .insert(collection.to_string(), metric);
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
            DistanceMetric::Manhattan => Distance::Manhattan,
        }
    }

    fn from_qdrant_distance(distance: Distance) -> FaceResult<DistanceMetric> {
        match distance {
            Distance::Cosine => Ok(DistanceMetric::Cosine),
            Distance::Euclid => Ok(DistanceMetric::Euclidean),
            Distance::Dot => Ok(DistanceMetric::DotProduct),
            Distance::Manhattan => Ok(DistanceMetric::Manhattan),
            other => Err(FaceError::Internal(format!(
                "Unsupported collection distance: {:?}",
                other
            ))),
        }
    }

    /// Qdrant only accepts UUID or integer ids, so other face ids map to a
    /// name-based UUID. The original id travels in the payload.
    pub(crate) fn face_point_id(face_id: &str) -> PointId {
        let uuid = Uuid::parse_str(face_id)
            .unwrap_or_else(|_| Uuid::new_v5(&FACE_ID_NAMESPACE, face_id.as_bytes()));
        PointId::from(uuid.to_string())
    }

    fn point_id_to_string(point_id: Option<&PointId>) -> FaceResult<String> {
        match point_id.and_then(|p| p.point_id_options.as_ref()) {
            Some(qdrant::point_id::PointIdOptions::Uuid(uuid)) => Ok(uuid.clone()),
            Some(qdrant::point_id::PointIdOptions::Num(num)) => Ok(num.to_string()),
            None => Err(FaceError::Internal("Missing point ID".to_string())),
        }
    }

    pub(crate) fn to_filter(predicate: &FacePredicate) -> Option<Filter> {
        if predicate.is_match_all() {
            return None;
        }

        Some(Filter::must(predicate.conditions().iter().map(|c| {
            Condition::matches(c.field.key(), c.value.clone())
        })))
    }

    fn payload_for(record: &FaceRecord) -> HashMap<String, QdrantValue> {
        HashMap::from([
            (FACE_ID_KEY.to_string(), QdrantValue::from(record.id.clone())),
            (
                PERSON_ID_KEY.to_string(),
                QdrantValue::from(record.person_id.clone()),
            ),
            (
                GROUP_ID_KEY.to_string(),
                QdrantValue::from(record.group_id.clone()),
            ),
        ])
    }

    fn payload_string(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
        match payload.get(key).and_then(|v| v.kind.as_ref()) {
            Some(qdrant::value::Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn face_id_of(
        point_id: Option<&PointId>,
        payload: &HashMap<String, QdrantValue>,
    ) -> FaceResult<String> {
        match Self::payload_string(payload, FACE_ID_KEY) {
            Some(id) => Ok(id),
            None => Self::point_id_to_string(point_id),
        }
    }

    pub(crate) fn record_from_point(point: RetrievedPoint) -> FaceResult<FaceRecord> {
        let id = Self::face_id_of(point.id.as_ref(), &point.payload)?;

        Ok(FaceRecord {
            id,
            vector: Self::extract_vector_from_output(&point.vectors).unwrap_or_default(),
            person_id: Self::payload_string(&point.payload, PERSON_ID_KEY).unwrap_or_default(),
            group_id: Self::payload_string(&point.payload, GROUP_ID_KEY).unwrap_or_default(),
        })
    }

    /// Extract vector values from VectorsOutput
    #[allow(deprecated)]
    fn extract_vector_from_output(vectors: &Option<qdrant::VectorsOutput>) -> Option<Vec<f32>> {
        match vectors {
            Some(qdrant::VectorsOutput {
                vectors_options: Some(qdrant::vectors_output::VectorsOptions::Vector(v)),
            }) => Some(v.data.clone()),
            _ => None,
        }
    }

    fn extract_config(config: Option<&qdrant::CollectionConfig>) -> FaceResult<CollectionConfig> {
        let params = config
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|vc| vc.config.as_ref());

        match params {
            Some(qdrant::vectors_config::Config::Params(p)) => Ok(CollectionConfig {
                dimension: p.size,
                distance: Self::from_qdrant_distance(p.distance())?,
            }),
            Some(qdrant::vectors_config::Config::ParamsMap(_)) => Err(FaceError::Internal(
                "Collections with named vectors are not supported".to_string(),
            )),
            None => Err(FaceError::Internal(
                "Collection info is missing vector params".to_string(),
            )),
        }
    }
}

#[async_trait]
impl FaceIndex for QdrantFaceIndex {
    async fn collection_info(&self, collection: &str) -> FaceResult<Option<CollectionConfig>> {
        if !self.client.collection_exists(collection).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(collection).await?;
        let result = info
            .result
            .ok_or_else(|| FaceError::Internal("Collection info missing result".to_string()))?;

        let config = Self::extract_config(result.config.as_ref())?;
        self.remember_metric(collection, config.distance).await;

        Ok(Some(config))
    }

    async fn create_collection(
        &self,
        collection: &str,
        config: CollectionConfig,
    ) -> FaceResult<()> {
        let builder = CreateCollectionBuilder::new(collection).vectors_config(
            VectorParamsBuilder::new(config.dimension, Self::to_qdrant_distance(config.distance)),
        );

        self.client.create_collection(builder).await?;
        self.remember_metric(collection, config.distance).await;
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<FaceRecord>) -> FaceResult<()> {
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let payload = Self::payload_for(&record);
                PointStruct::new(Self::face_point_id(&record.id), record.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, selector: PointSelector) -> FaceResult<()> {
        let builder = match selector {
            PointSelector::Ids(ids) => {
                let ids = ids.iter().map(|id| Self::face_point_id(id)).collect();
                DeletePointsBuilder::new(collection).points(PointsIdsList { ids })
            }
            PointSelector::Matching(predicate) => {
                let filter = Self::to_filter(&predicate).ok_or_else(|| {
                    FaceError::Validation("Refusing to delete with an empty filter".to_string())
                })?;
                DeletePointsBuilder::new(collection).points(filter)
            }
        };

        self.client.delete_points(builder.wait(true)).await?;
        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        predicate: &FacePredicate,
        limit: Option<u32>,
    ) -> FaceResult<Vec<FaceRecord>> {
        let filter = Self::to_filter(predicate);
        let mut records = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let page_size = match limit {
                Some(limit) => (limit - records.len() as u32).min(SCROLL_PAGE_SIZE),
                None => SCROLL_PAGE_SIZE,
            };
            if page_size == 0 {
                break;
            }

            let mut builder = ScrollPointsBuilder::new(collection)
                .limit(page_size)
                .with_payload(true)
                .with_vectors(true);
            if let Some(filter) = &filter {
                builder = builder.filter(filter.clone());
            }
            if let Some(offset) = offset.take() {
                builder = builder.offset(offset);
            }

            let response = self.client.scroll(builder).await?;
            for point in response.result {
                records.push(Self::record_from_point(point)?);
            }

            match response.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(collection, count = records.len(), "Scrolled faces");
        Ok(records)
    }

    async fn retrieve(&self, collection: &str, ids: Vec<String>) -> FaceResult<Vec<FaceRecord>> {
        let point_ids: Vec<PointId> = ids.iter().map(|id| Self::face_point_id(id)).collect();

        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(collection, point_ids)
                    .with_payload(true)
                    .with_vectors(true),
            )
            .await?;

        response
            .result
            .into_iter()
            .map(Self::record_from_point)
            .collect()
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> FaceResult<Vec<ScoredFace>> {
        let metric = self.metric_of(collection).await?;
        let response = self
            .client
            .search_points(SearchPointsBuilder::new(collection, vector, limit).with_payload(true))
            .await?;

        response
            .result
            .into_iter()
            .map(|point| {
                Ok(ScoredFace {
                    id: Self::face_id_of(point.id.as_ref(), &point.payload)?,
                    score: Self::similarity(metric, point.score),
                    person_id: Self::payload_string(&point.payload, PERSON_ID_KEY),
                    group_id: Self::payload_string(&point.payload, GROUP_ID_KEY),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_point_id_is_deterministic() {
        let digest = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

        assert_eq!(
            QdrantFaceIndex::face_point_id(digest),
            QdrantFaceIndex::face_point_id(digest)
        );
        assert_ne!(
            QdrantFaceIndex::face_point_id(digest),
            QdrantFaceIndex::face_point_id("another-face")
        );
    }

    #[test]
    fn test_face_point_id_keeps_uuid_ids() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let point_id = QdrantFaceIndex::face_point_id(id);

        assert_eq!(
            point_id.point_id_options,
            Some(qdrant::point_id::PointIdOptions::Uuid(id.to_string()))
        );
    }

    #[test]
    fn test_match_all_predicate_has_no_filter() {
        assert!(QdrantFaceIndex::to_filter(&FacePredicate::match_all()).is_none());
    }

    #[test]
    fn test_predicate_becomes_must_filter() {
        let filter =
            QdrantFaceIndex::to_filter(&FacePredicate::build(Some("alice"), Some("acme"))).unwrap();

        assert_eq!(filter.must.len(), 2);
        assert!(filter.should.is_empty());
        assert!(filter.must_not.is_empty());
    }

    #[test]
    fn test_record_round_trips_through_payload() {
        let record = FaceRecord::new("digest-1", vec![], "alice", "acme");
        let point = RetrievedPoint {
            id: Some(QdrantFaceIndex::face_point_id(&record.id)),
            payload: QdrantFaceIndex::payload_for(&record),
            ..Default::default()
        };

        let restored = QdrantFaceIndex::record_from_point(point).unwrap();

        assert_eq!(restored, record);
    }

    #[test]
    fn test_record_without_face_id_payload_uses_point_id() {
        let point = RetrievedPoint {
            id: Some(PointId::from(42u64)),
            ..Default::default()
        };

        let restored = QdrantFaceIndex::record_from_point(point).unwrap();

        assert_eq!(restored.id, "42");
        assert_eq!(restored.person_id, "");
    }

    #[test]
    fn test_distance_scores_are_negated() {
        assert_eq!(QdrantFaceIndex::similarity(DistanceMetric::Euclidean, 0.25), -0.25);
        assert_eq!(QdrantFaceIndex::similarity(DistanceMetric::Manhattan, 99.0), -99.0);
        assert_eq!(QdrantFaceIndex::similarity(DistanceMetric::Cosine, 0.98), 0.98);
        assert_eq!(QdrantFaceIndex::similarity(DistanceMetric::DotProduct, 3.5), 3.5);
    }

    #[test]
    fn test_distance_scores_agree_with_in_memory_index() {
        let stored = [1.0, 0.0];
        let near = [1.5, 0.0];
        let far = [100.0, 0.0];

        // Both points lie on one axis, so euclidean and manhattan distances coincide
        let (raw_near, raw_far) = (0.5, 99.0);

        for metric in [DistanceMetric::Euclidean, DistanceMetric::Manhattan] {

            assert_eq!(
                QdrantFaceIndex::similarity(metric, raw_near),
                crate::memory::score(metric, &near, &stored)
            );
            assert_eq!(
                QdrantFaceIndex::similarity(metric, raw_far),
                crate::memory::score(metric, &far, &stored)
            );
            assert!(
                QdrantFaceIndex::similarity(metric, raw_near)
                    > QdrantFaceIndex::similarity(metric, raw_far)
            );
        }
    }

    #[test]
    fn test_distance_conversion_round_trips() {
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::Euclidean,
            DistanceMetric::DotProduct,
            DistanceMetric::Manhattan,
        ] {
            let converted = QdrantFaceIndex::from_qdrant_distance(
                QdrantFaceIndex::to_qdrant_distance(metric),
            )
            .unwrap();
            assert_eq!(converted, metric);
        }
        assert!(QdrantFaceIndex::from_qdrant_distance(Distance::UnknownDistance).is_err());
    }
}
