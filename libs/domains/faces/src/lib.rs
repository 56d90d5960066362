//! Faces Domain
//!
//! Persists face embeddings keyed by person and group, and verifies new faces
//! against the stored ones with a score threshold.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Handlers     │  ← REST endpoints + OpenAPI
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   FaceService   │  ← Collection lifecycle, insert, query, delete, match
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │    FaceIndex    │  ← Vector index capabilities (trait)
//! └────────┬────────┘
//!          │
//!   ┌──────┴───────────────┐
//! ┌─▼───────────────┐ ┌────▼──────────────┐
//! │ QdrantFaceIndex │ │ InMemoryFaceIndex │
//! └─────────────────┘ └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_faces::{
//!     FaceEmbedding, FaceService, QdrantConfig, QdrantFaceIndex, StoreSettings, handlers,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = QdrantFaceIndex::connect(&QdrantConfig::from_env()?).await?;
//! let service = FaceService::open(index, StoreSettings::from_env()?).await?;
//!
//! let faces = vec![FaceEmbedding::new("3f2a9c", vec![0.1; 512])];
//! let report = service.insert_faces(faces, "alice", "acme").await?;
//! assert!(report.is_complete());
//!
//! let matches = service.check_face(vec![0.1; 512], 0.9).await?;
//! println!("{:?}", matches);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod filter;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod service;
pub mod settings;

pub use error::{ErrorResponse, FaceError, FaceResult};
pub use filter::{FaceField, FacePredicate, FieldMatch};
pub use handlers::FacesApiDoc;
pub use memory::InMemoryFaceIndex;
pub use models::{
    CollectionConfig, DeleteOutcome, DeleteRequest, DistanceMetric, FaceEmbedding, FaceMatch,
    FaceRecord, FailedInsert, InsertReport, ScoredFace,
};
pub use qdrant::{QdrantConfig, QdrantEndpoint, QdrantFaceIndex};
pub use repository::{FaceIndex, PointSelector};
pub use service::FaceService;
pub use settings::StoreSettings;
