//! Face store operations on top of a [`FaceIndex`].
//!
//! One `FaceService` owns one collection. It is created with [`FaceService::open`],
//! which ensures the collection exists before any other call is made.

mod collection;
mod deletion;
mod matching;
mod query;
mod store;

use crate::error::{FaceError, FaceResult};
use crate::models::CollectionConfig;
use crate::repository::FaceIndex;
use crate::settings::StoreSettings;

pub struct FaceService<I: FaceIndex> {
    index: I,
    collection: String,
    config: CollectionConfig,
    list_limit: u32,
    upsert_batch_size: usize,
}

impl<I: FaceIndex> FaceService<I> {
    /// Validate the settings, ensure the collection and return a ready service.
    ///
    /// When the collection already exists its stored configuration is used,
    /// even if it differs from `settings.config`.
    pub async fn open(index: I, settings: StoreSettings) -> FaceResult<Self> {
        settings.validate()?;

        let config = collection::ensure(&index, &settings.collection, settings.config).await?;

        Ok(Self {
            index,
            collection: settings.collection,
            config,
            list_limit: settings.list_limit,
            upsert_batch_size: settings.upsert_batch_size,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Configuration of the owned collection as stored by the index
    pub fn config(&self) -> CollectionConfig {
        self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

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

#[cfg(test)]
impl<I: FaceIndex> FaceService<I> {
    /// Build a service without touching the index
    pub(crate) fn assume_existing(index: I, settings: StoreSettings) -> Self {
        Self {
            index,
            collection: settings.collection,
            config: settings.config,
            list_limit: settings.list_limit,
            upsert_batch_size: settings.upsert_batch_size,
        }
    }
}
