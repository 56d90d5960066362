use tracing::{debug, instrument};

use super::FaceService;
use crate::error::FaceResult;
use crate::filter::FacePredicate;
use crate::models::FaceRecord;
use crate::repository::FaceIndex;

impl<I: FaceIndex> FaceService<I> {
    /// List faces by person and/or group.
    ///
    /// A filtered listing returns every match. Without any filter the
    /// listing is capped at the configured list limit.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn list_faces(
        &self,
        person_id: Option<&str>,
        group_id: Option<&str>,
    ) -> FaceResult<Vec<FaceRecord>> {
        let predicate = FacePredicate::build(person_id, group_id);
        let limit = predicate.is_match_all().then_some(self.list_limit);

        let faces = self.index.scroll(&self.collection, &predicate, limit).await?;
        debug!(count = faces.len(), "Listed faces");

        Ok(faces)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get_face_by_id(&self, face_id: &str) -> FaceResult<Option<FaceRecord>> {
        let mut found = self
            .index
            .retrieve(&self.collection, vec![face_id.to_string()])
            .await?;

        Ok(found.pop())
    }

    /// Whether at least one record matches
    pub(crate) async fn any_face(&self, predicate: &FacePredicate) -> FaceResult<bool> {
        let found = self.index.scroll(&self.collection, predicate, Some(1)).await?;
        Ok(!found.is_empty())
    }
}
