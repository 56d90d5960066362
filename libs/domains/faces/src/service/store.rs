use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use super::FaceService;
use crate::error::{FaceError, FaceResult};
use crate::models::{FaceEmbedding, FaceRecord, FailedInsert, InsertReport};
use crate::repository::FaceIndex;

impl<I: FaceIndex> FaceService<I> {
    /// Upsert a batch of faces of one person in one group.
    ///
    /// Every vector is checked against the collection dimension before the
    /// first write. When an id repeats within the batch only its last
    /// occurrence is stored and reported.
    ///
    /// Records are sent in chunks of the configured batch size; a failure on
    /// the first chunk is returned as an error, a later failure stops sending
    /// and is reported per id in [`InsertReport::failed`].
    #[instrument(
        skip(self, faces),
        fields(collection = %self.collection, count = faces.len())
    )]
    pub async fn insert_faces(
        &self,
        faces: Vec<FaceEmbedding>,
        person_id: &str,
        group_id: &str,
    ) -> FaceResult<InsertReport> {
        if person_id.trim().is_empty() {
            return Err(FaceError::Validation("person_id must not be empty".to_string()));
        }
        if group_id.trim().is_empty() {
            return Err(FaceError::Validation("group_id must not be empty".to_string()));
        }
        for face in &faces {
            if face.id.trim().is_empty() {
                return Err(FaceError::Validation("face id must not be empty".to_string()));
            }
            self.check_dimension(&face.id, &face.vector)?;
        }

        let records = last_occurrences(faces, person_id, group_id);

        let mut report = InsertReport::default();
        let mut chunks = records.chunks(self.upsert_batch_size);

        while let Some(chunk) = chunks.next() {
            let ids: Vec<String> = chunk.iter().map(|r| r.id.clone()).collect();

            match self.index.upsert(&self.collection, chunk.to_vec()).await {
                Ok(()) => report.inserted.extend(ids),
                Err(err) if report.inserted.is_empty() => return Err(err),
                Err(err) => {
                    let reason = err.to_string();
                    let unsent = chunks.by_ref().flatten().map(|r| r.id.clone());

                    report.failed.extend(ids.into_iter().chain(unsent).map(|id| FailedInsert {
                        id,
                        reason: reason.clone(),
                    }));

                    warn!(
                        inserted = report.inserted.len(),
                        failed = report.failed.len(),
                        error = %reason,
                        "Face batch partially applied"
                    );
                    break;
                }
            }
        }

        debug!(inserted = report.inserted.len(), "Inserted faces");
        Ok(report)
    }
}

/// Records for `faces`, keeping the last occurrence of each id in batch order
fn last_occurrences(faces: Vec<FaceEmbedding>, person_id: &str, group_id: &str) -> Vec<FaceRecord> {
    let mut seen = HashSet::new();
    let mut records: Vec<FaceRecord> = faces
        .into_iter()
        .rev()
        .filter(|face| seen.insert(face.id.clone()))
        .map(|face| FaceRecord::new(face.id, face.vector, person_id, group_id))
        .collect();
    records.reverse();
    records
}
