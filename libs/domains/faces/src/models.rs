use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::FaceError;

pub const PERSON_ID_KEY: &str = "person_id";
pub const GROUP_ID_KEY: &str = "group_id";
pub const FACE_ID_KEY: &str = "face_id";

/// Distance metric a collection is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum DistanceMetric {
    #[default]
    #[serde(rename = "cosine")]
    Cosine,
    #[serde(rename = "euclidean")]
    Euclidean,
    #[serde(rename = "dot")]
    DotProduct,
    #[serde(rename = "manhattan")]
    Manhattan,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot",
            DistanceMetric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = FaceError;

    /// Unknown names are rejected rather than defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "euclid" => Ok(DistanceMetric::Euclidean),
            "dot" | "dot-product" | "dot_product" | "dotproduct" => Ok(DistanceMetric::DotProduct),
            "manhattan" => Ok(DistanceMetric::Manhattan),
            other => Err(FaceError::Validation(format!(
                "Unknown distance metric '{}', expected one of: cosine, euclidean, dot, manhattan",
                other
            ))),
        }
    }
}

/// Immutable configuration of a face collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionConfig {
    pub dimension: u64,
    pub distance: DistanceMetric,
}

impl CollectionConfig {
    pub fn new(dimension: u64) -> Self {
        Self {
            dimension,
            distance: DistanceMetric::default(),
        }
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self::new(512)
    }
}

/// A stored face embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FaceRecord {
    /// Content hash of the embedding, supplied by the pipeline
    pub id: String,
    pub vector: Vec<f32>,
    pub person_id: String,
    pub group_id: String,
}

impl FaceRecord {
    pub fn new(
        id: impl Into<String>,
        vector: Vec<f32>,
        person_id: impl Into<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            vector,
            person_id: person_id.into(),
            group_id: group_id.into(),
        }
    }
}

/// One (id, vector) pair of an insert batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FaceEmbedding {
    pub id: String,
    pub vector: Vec<f32>,
}

impl FaceEmbedding {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }
}

/// A face accepted by the matching engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FaceMatch {
    pub id: String,
    pub score: f32,
    pub person_id: Option<String>,
    pub group_id: Option<String>,
}

/// A scored candidate returned by the index
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFace {
    pub id: String,
    pub score: f32,
    pub person_id: Option<String>,
    pub group_id: Option<String>,
}

impl From<ScoredFace> for FaceMatch {
    fn from(scored: ScoredFace) -> Self {
        Self {
            id: scored.id,
            score: scored.score,
            person_id: scored.person_id,
            group_id: scored.group_id,
        }
    }
}

/// Selection criteria for a delete call. `face_id` takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteRequest {
    pub face_id: Option<String>,
    pub person_id: Option<String>,
    pub group_id: Option<String>,
}

impl DeleteRequest {
    pub fn by_face(face_id: impl Into<String>) -> Self {
        Self {
            face_id: Some(face_id.into()),
            ..Default::default()
        }
    }

    pub fn by_person(person_id: impl Into<String>) -> Self {
        Self {
            person_id: Some(person_id.into()),
            ..Default::default()
        }
    }

    pub fn by_group(group_id: impl Into<String>) -> Self {
        Self {
            group_id: Some(group_id.into()),
            ..Default::default()
        }
    }

    pub fn with_person(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = Some(person_id.into());
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Blank criteria are treated as absent
    pub fn normalized(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            face_id: present(self.face_id),
            person_id: present(self.person_id),
            group_id: present(self.group_id),
        }
    }
}

/// Result of a delete call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeleteOutcome {
    Success,
    Failed { message: String },
}

impl DeleteOutcome {
    pub const NO_FACE_ID: &'static str = "No face id found";
    pub const NO_PERSON_ID: &'static str = "No person id found";
    pub const NO_GROUP_ID: &'static str = "No group id found";
    pub const NO_CRITERIA: &'static str = "No face id or person id found";

    pub fn failed(message: &str) -> Self {
        DeleteOutcome::Failed {
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeleteOutcome::Success)
    }
}

/// An id of an insert batch that was not acknowledged by the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FailedInsert {
    pub id: String,
    pub reason: String,
}

/// Per-record acknowledgement of an insert batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InsertReport {
    pub inserted: Vec<String>,
    pub failed: Vec<FailedInsert>,
}

impl InsertReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
