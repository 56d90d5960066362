use tracing::{debug, instrument};

use super::FaceService;
use crate::error::{FaceError, FaceResult};
use crate::models::FaceMatch;
use crate::repository::FaceIndex;

impl<I: FaceIndex> FaceService<I> {
    /// Verify a probe against the whole collection.
    ///
    /// Only the single best candidate is considered. It is accepted when its
    /// score is strictly greater than `threshold`.
    pub async fn check_face(&self, probe: Vec<f32>, threshold: f32) -> FaceResult<Vec<FaceMatch>> {
        self.match_faces(probe, threshold, 1).await
    }

    /// Accepted candidates among the best `limit`, highest score first
    #[instrument(skip(self, probe), fields(collection = %self.collection))]
    pub async fn match_faces(
        &self,
        probe: Vec<f32>,
        threshold: f32,
        limit: u64,
    ) -> FaceResult<Vec<FaceMatch>> {
        if limit == 0 {
            return Err(FaceError::Validation("limit must be positive".to_string()));
        }
        self.check_dimension("probe", &probe)?;

        let candidates = self.index.search(&self.collection, probe, limit).await?;
        let considered = candidates.len();

        let matches: Vec<FaceMatch> = candidates
            .into_iter()
            .filter(|candidate| candidate.score > threshold)
            .map(FaceMatch::from)
            .collect();

        debug!(considered, accepted = matches.len(), "Matched probe");
        Ok(matches)
    }
}
