use tracing::{info, instrument};

use super::FaceService;
use crate::error::FaceResult;
use crate::filter::FacePredicate;
use crate::models::{DeleteOutcome, DeleteRequest};
use crate::repository::{FaceIndex, PointSelector};

impl<I: FaceIndex> FaceService<I> {
    /// Delete by face id, or else by person and/or group.
    ///
    /// A face id always takes precedence over the other criteria. Nothing is
    /// deleted unless a pre-check finds at least one record; an empty
    /// selection is reported as [`DeleteOutcome::Failed`], not as an error.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete_faces(&self, request: DeleteRequest) -> FaceResult<DeleteOutcome> {
        let request = request.normalized();

        if let Some(face_id) = request.face_id {
            if self.get_face_by_id(&face_id).await?.is_none() {
                return Ok(DeleteOutcome::failed(DeleteOutcome::NO_FACE_ID));
            }

            self.index
                .delete(&self.collection, PointSelector::Ids(vec![face_id.clone()]))
                .await?;
            info!(face_id = %face_id, "Deleted face");

            return Ok(DeleteOutcome::Success);
        }

        let not_found = match (&request.person_id, &request.group_id) {
            (None, None) => return Ok(DeleteOutcome::failed(DeleteOutcome::NO_CRITERIA)),
            (Some(_), _) => DeleteOutcome::NO_PERSON_ID,
            (None, Some(_)) => DeleteOutcome::NO_GROUP_ID,
        };

        let predicate =
            FacePredicate::build(request.person_id.as_deref(), request.group_id.as_deref());
        if !self.any_face(&predicate).await? {
            return Ok(DeleteOutcome::failed(not_found));
        }

        self.index
            .delete(&self.collection, PointSelector::Matching(predicate))
            .await?;
        info!(
            person_id = request.person_id.as_deref(),
            group_id = request.group_id.as_deref(),
            "Deleted faces"
        );

        Ok(DeleteOutcome::Success)
    }
}
