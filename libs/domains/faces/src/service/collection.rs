use tracing::{info, instrument, warn};

use super::FaceService;
use crate::error::FaceResult;
use crate::models::CollectionConfig;
use crate::repository::FaceIndex;

/// Create `name` unless it exists. Returns the configuration the collection has.
pub(super) async fn ensure<I: FaceIndex>(
    index: &I,
    name: &str,
    requested: CollectionConfig,
) -> FaceResult<CollectionConfig> {
    if let Some(existing) = index.collection_info(name).await? {
        if existing != requested {
            warn!(
                collection = name,
                existing_dimension = existing.dimension,
                existing_distance = %existing.distance,
                requested_dimension = requested.dimension,
                requested_distance = %requested.distance,
                "Collection exists with a different configuration; keeping it"
            );
        }
        return Ok(existing);
    }

    index.create_collection(name, requested).await?;
    info!(
        collection = name,
        dimension = requested.dimension,
        distance = %requested.distance,
        "Created face collection"
    );

    Ok(requested)
}

impl<I: FaceIndex> FaceService<I> {
    /// Idempotently make sure a collection exists
    #[instrument(skip(self))]
    pub async fn ensure_collection(
        &self,
        name: &str,
        config: CollectionConfig,
    ) -> FaceResult<CollectionConfig> {
        ensure(&self.index, name, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DistanceMetric;
    use crate::repository::MockFaceIndex;
    use crate::settings::StoreSettings;

    #[tokio::test]
    async fn test_open_creates_missing_collection() {
        let mut index = MockFaceIndex::new();
        index
            .expect_collection_info()
            .withf(|name| name == "faces")
            .times(1)
            .returning(|_| Ok(None));
        index
            .expect_create_collection()
            .withf(|name, config| name == "faces" && *config == CollectionConfig::new(512))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = FaceService::open(index, StoreSettings::new("faces")).await.unwrap();

        assert_eq!(service.config(), CollectionConfig::new(512));
    }

    #[tokio::test]
    async fn test_open_keeps_existing_configuration() {
        let existing = CollectionConfig::new(128).with_distance(DistanceMetric::DotProduct);
        let mut index = MockFaceIndex::new();
        index
            .expect_collection_info()
            .returning(move |_| Ok(Some(existing)));
        index.expect_create_collection().never();

        let service = FaceService::open(index, StoreSettings::new("faces")).await.unwrap();

        assert_eq!(service.config(), existing);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_settings_before_any_call() {
        let mut index = MockFaceIndex::new();
        index.expect_collection_info().never();

        let settings = StoreSettings::new("faces").with_config(CollectionConfig::new(0));
        let result = FaceService::open(index, settings).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_creation_failure_propagates() {
        let mut index = MockFaceIndex::new();
        index.expect_collection_info().returning(|_| Ok(None));
        index
            .expect_create_collection()
            .returning(|_, _| Err(crate::error::FaceError::Qdrant("unavailable".to_string())));

        let result = FaceService::open(index, StoreSettings::new("faces")).await;

        assert!(matches!(result, Err(crate::error::FaceError::Qdrant(_))));
    }
}
