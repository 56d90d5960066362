//! REST handlers for the face store

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

use crate::error::{ErrorResponse, FaceError, FaceResult};
use crate::models::{
    CollectionConfig, DeleteOutcome, DeleteRequest, DistanceMetric, FaceEmbedding, FaceMatch,
    FaceRecord, FailedInsert, InsertReport,
};
use crate::repository::FaceIndex;
use crate::service::FaceService;

pub const TAG: &str = "faces";

// ===== Request DTOs =====

/// Faces of one person in one group
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct InsertFacesRequest {
    #[validate(length(min = 1))]
    pub person_id: String,
    #[validate(length(min = 1))]
    pub group_id: String,
    pub faces: Vec<FaceEmbedding>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFacesQuery {
    pub person_id: Option<String>,
    pub group_id: Option<String>,
}

/// Probe vector to verify against the collection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct CheckFaceRequest {
    pub vector: Vec<f32>,
    pub threshold: f32,
    /// Number of candidates considered
    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub limit: u64,
}

fn default_limit() -> u64 {
    1
}

/// OpenAPI documentation for the faces API
#[derive(OpenApi)]
#[openapi(
    paths(
        insert_faces,
        list_faces,
        get_face,
        delete_faces,
        check_face,
        get_collection,
    ),
    components(
        schemas(
            InsertFacesRequest, CheckFaceRequest,
            FaceEmbedding, FaceRecord, FaceMatch,
            InsertReport, FailedInsert, DeleteOutcome,
            CollectionConfig, DistanceMetric, ErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Face embedding storage and matching")
    )
)]
pub struct FacesApiDoc;

/// Create the faces router
pub fn router<I: FaceIndex + 'static>(service: FaceService<I>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/faces",
            get(list_faces).post(insert_faces).delete(delete_faces),
        )
        .route("/faces/check", post(check_face))
        .route("/faces/{face_id}", get(get_face))
        .route("/collection", get(get_collection))
        .with_state(shared_service)
}

/// Insert or overwrite a batch of faces
#[utoipa::path(
    post,
    path = "/faces",
    tag = TAG,
    request_body = InsertFacesRequest,
    responses(
        (status = 201, description = "All faces stored", body = InsertReport),
        (status = 207, description = "Batch partially applied", body = InsertReport),
        (status = 400, description = "Invalid input or dimension mismatch", body = ErrorResponse),
        (status = 500, description = "Vector index failure", body = ErrorResponse)
    )
)]
async fn insert_faces<I: FaceIndex>(
    State(service): State<Arc<FaceService<I>>>,
    Json(input): Json<InsertFacesRequest>,
) -> FaceResult<impl IntoResponse> {
    input.validate()?;

    let report = service
        .insert_faces(input.faces, &input.person_id, &input.group_id)
        .await?;

    let status = if report.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((status, Json(report)))
}

/// List faces by person and/or group
#[utoipa::path(
    get,
    path = "/faces",
    tag = TAG,
    params(ListFacesQuery),
    responses(
        (status = 200, description = "Matching faces", body = Vec<FaceRecord>),
        (status = 500, description = "Vector index failure", body = ErrorResponse)
    )
)]
async fn list_faces<I: FaceIndex>(
    State(service): State<Arc<FaceService<I>>>,
    Query(query): Query<ListFacesQuery>,
) -> FaceResult<Json<Vec<FaceRecord>>> {
    let faces = service
        .list_faces(
            non_blank(query.person_id.as_deref()),
            non_blank(query.group_id.as_deref()),
        )
        .await?;

    Ok(Json(faces))
}

/// Get a face by id
#[utoipa::path(
    get,
    path = "/faces/{face_id}",
    tag = TAG,
    params(
        ("face_id" = String, Path, description = "Face id")
    ),
    responses(
        (status = 200, description = "Face found", body = FaceRecord),
        (status = 404, description = "Face not found", body = ErrorResponse),
        (status = 500, description = "Vector index failure", body = ErrorResponse)
    )
)]
async fn get_face<I: FaceIndex>(
    State(service): State<Arc<FaceService<I>>>,
    Path(face_id): Path<String>,
) -> FaceResult<Json<FaceRecord>> {
    service
        .get_face_by_id(&face_id)
        .await?
        .map(Json)
        .ok_or_else(|| FaceError::NotFound(format!("Face {}", face_id)))
}

/// Delete by face id, person and/or group
#[utoipa::path(
    delete,
    path = "/faces",
    tag = TAG,
    params(DeleteRequest),
    responses(
        (status = 200, description = "Faces deleted", body = DeleteOutcome),
        (status = 404, description = "Nothing matched the criteria", body = DeleteOutcome),
        (status = 500, description = "Vector index failure", body = ErrorResponse)
    )
)]
async fn delete_faces<I: FaceIndex>(
    State(service): State<Arc<FaceService<I>>>,
    Query(request): Query<DeleteRequest>,
) -> FaceResult<impl IntoResponse> {
    let outcome = service.delete_faces(request).await?;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    Ok((status, Json(outcome)))
}

/// Verify a probe vector against stored faces
#[utoipa::path(
    post,
    path = "/faces/check",
    tag = TAG,
    request_body = CheckFaceRequest,
    responses(
        (status = 200, description = "Accepted matches, possibly empty", body = Vec<FaceMatch>),
        (status = 400, description = "Invalid probe", body = ErrorResponse),
        (status = 500, description = "Vector index failure", body = ErrorResponse)
    )
)]
async fn check_face<I: FaceIndex>(
    State(service): State<Arc<FaceService<I>>>,
    Json(input): Json<CheckFaceRequest>,
) -> FaceResult<Json<Vec<FaceMatch>>> {
    input.validate()?;

    let matches = service
        .match_faces(input.vector, input.threshold, input.limit)
        .await?;

    Ok(Json(matches))
}

/// Configuration of the face collection
#[utoipa::path(
    get,
    path = "/collection",
    tag = TAG,
    responses(
        (status = 200, description = "Collection configuration", body = CollectionConfig)
    )
)]
async fn get_collection<I: FaceIndex>(
    State(service): State<Arc<FaceService<I>>>,
) -> Json<CollectionConfig> {
    Json(service.config())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
