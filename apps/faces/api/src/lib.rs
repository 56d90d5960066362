//! Faces REST API
//!
//! HTTP service for storing face embeddings and verifying new faces.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   ↓ (JSON over HTTP)
//! domain_faces::handlers (routes under /api)
//!   ↓
//! FaceService (collection lifecycle, insert, query, delete, match)
//!   ↓
//! QdrantFaceIndex
//!   ↓ (gRPC)
//! Qdrant
//! ```
//!
//! ## Modules
//!
//! - `server`: Server initialization, router composition and lifecycle

pub mod server;

pub use server::run;
