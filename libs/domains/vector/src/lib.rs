//! Vector Domain Library
//!
//! Typed client for a hosted vector database's HTTP API. The service does the storage
//! and search; this crate shapes requests and interprets responses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  VectorClient   │  ← namespace + metadata type fixed at construction
//! └────────┬────────┘
//!          │  sanitize::sanitize_fields   (null stripping)
//!          │  hybrid::hybrid_score_norm   (dense/sparse weighting)
//! ┌────────▼────────┐
//! │   HttpClient    │  ← base URL + Api-Key header, error translation
//! └────────┬────────┘
//!          │
//!     data plane (index host)     control plane (controller.{environment})
//! ```
//!
//! # Features
//!
//! - **Null stripping**: `metadata`, `filter` and `setMetadata` never carry nulls on the wire
//! - **Batched upserts**: sequential chunks, default 50 vectors per request
//! - **Hybrid queries**: convex weighting of dense and sparse vectors via `hybrid_alpha`
//! - **Response narrowing**: match fields mirror the `include_*` flags of the query
//! - **Typed errors**: structured service errors become [`ApiError`], everything else stays a
//!   transport error
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_vector::{ClientConfig, FetchParams, QueryParams, UpsertParams, Vector, VectorClient};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Movie {
//!     title: String,
//!     year: u32,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // API key and base URL fall back to PINECONE_API_KEY / PINECONE_BASE_URL
//! let client: VectorClient<Movie> =
//!     VectorClient::new(ClientConfig::new().with_namespace("movies"))?;
//!
//! let movie = Movie { title: "Heat".into(), year: 1995 };
//! client
//!     .upsert(UpsertParams::new(vec![Vector::new("heat", vec![0.1, 0.2]).with_metadata(movie)]))
//!     .await?;
//!
//! let fetched = client.fetch(FetchParams::new(["heat"])).await?;
//! println!("{:?}", fetched.vectors["heat"].metadata);
//!
//! let results = client
//!     .query(QueryParams::by_vector(vec![0.1, 0.2], 5).include_metadata(true).with_min_score(0.8))
//!     .await?;
//! for m in results.matches {
//!     println!("{} {}", m.id, m.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod hybrid;
pub mod models;
pub mod sanitize;

// Re-export commonly used types
pub use client::VectorClient;
pub use config::{API_KEY_ENV, BASE_URL_ENV, ClientConfig, ResolvedConfig};
pub use error::{ApiError, ErrorCode, ErrorDetail, VectorError, VectorResult};
pub use http::HttpClient;
pub use hybrid::hybrid_score_norm;
pub use models::{
    CreateIndexParams, DeleteIndexParams, DeleteParams, DescribeIndexStatsParams, FetchParams,
    FetchResponse, Filter, FilterOperator, IndexStats, Metadata, MetadataConfig, Metric,
    NamespaceSummary, QueryParams, QueryResponse, ScoredVector, SparseValues, UpdateParams,
    UpsertParams, Vector,
};
pub use sanitize::{remove_null_values, remove_null_values_opt};
