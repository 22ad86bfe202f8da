//! # Embeddings
//!
//! A content-addressed cache in front of an embedding provider. Given a
//! `(model, text)` pair it returns the stored vector when one exists and
//! otherwise asks the upstream provider, persisting the result for reuse.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embedding Cache                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingRequest ──► EmbeddingResolver ──► EmbeddingResponse   │
//! │                        │        │       │                       │
//! │                        ▼        ▼       ▼                       │
//! │             ModelRegistry  VectorStore  EmbeddingProvider       │
//! │                        │        │                               │
//! │                        └── Database (SQLite) ──┘                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cache keys are `(ContentHash, ModelId)`. Vectors are stored as
//! little-endian `f32` blobs (see [`codec`]) and are never overwritten.

pub mod cache;
pub mod codec;
pub mod error;
pub mod hash;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod storage;

pub use cache::{SqliteVectorStore, StoreOutcome, VectorStore};
pub use error::{EmbeddingError, ErrorKind, Result};
pub use hash::ContentHash;
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use registry::{ModelId, ModelRegistry};
pub use resolver::{
    EmbeddingRequest, EmbeddingResolver, EmbeddingResponse, Resolution, ResolverConfig,
};
pub use storage::Database;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
