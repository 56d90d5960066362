use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

use crate::error::{FaceError, FaceResult};
use crate::models::{CollectionConfig, DistanceMetric};

/// Safety cap for unfiltered listings
pub const DEFAULT_LIST_LIMIT: u32 = 1000;
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 256;

/// Settings of the face store: which collection it owns and how it is used
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub collection: String,
    pub config: CollectionConfig,
    pub list_limit: u32,
    pub upsert_batch_size: usize,
}

impl StoreSettings {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            config: CollectionConfig::default(),
            list_limit: DEFAULT_LIST_LIMIT,
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        }
    }

    pub fn with_config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit;
        self
    }

    pub fn with_upsert_batch_size(mut self, size: usize) -> Self {
        self.upsert_batch_size = size;
        self
    }

    pub fn validate(&self) -> FaceResult<()> {
        if self.collection.trim().is_empty() {
            return Err(FaceError::Validation(
                "Collection name must not be empty".to_string(),
            ));
        }
        if self.config.dimension == 0 {
            return Err(FaceError::Validation(
                "Collection dimension must be positive".to_string(),
            ));
        }
        if self.list_limit == 0 {
            return Err(FaceError::Validation(
                "List limit must be positive".to_string(),
            ));
        }
        if self.upsert_batch_size == 0 {
            return Err(FaceError::Validation(
                "Upsert batch size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromEnv for StoreSettings {
    /// Reads FACES_COLLECTION (faces), FACES_DIMENSION (512),
    /// FACES_DISTANCE (cosine), FACES_LIST_LIMIT (1000) and
    /// FACES_UPSERT_BATCH_SIZE (256).
    fn from_env() -> Result<Self, ConfigError> {
        let collection = env_or_default("FACES_COLLECTION", "faces");
        let dimension = env_parse("FACES_DIMENSION", 512)?;
        let distance = env_parse("FACES_DISTANCE", DistanceMetric::Cosine)?;
        let list_limit = env_parse("FACES_LIST_LIMIT", DEFAULT_LIST_LIMIT)?;
        let upsert_batch_size = env_parse("FACES_UPSERT_BATCH_SIZE", DEFAULT_UPSERT_BATCH_SIZE)?;

        Ok(Self {
            collection,
            config: CollectionConfig::new(dimension).with_distance(distance),
            list_limit,
            upsert_batch_size,
        })
    }
}
