mod client;
mod config;

pub use client::QdrantFaceIndex;
pub use config::{QdrantConfig, QdrantEndpoint};
