//! The reference flow: upsert → fetch → update → fetch → query → delete

use domain_vector::{
    DeleteParams, DescribeIndexStatsParams, FetchParams, Metadata, QueryParams, UpdateParams,
    UpsertParams, Vector, VectorClient,
};
use eyre::{Result, WrapErr, eyre};
use serde_json::{Value, json};
use tracing::{info, instrument};

/// Dimension used when the index reports none (e.g. nothing stored yet).
pub const FALLBACK_DIMENSION: usize = 8;

const SAMPLE_IDS: [&str; 2] = ["1", "2"];

/// What the flow observed, for logging by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowReport {
    pub dimension: usize,
    pub upserted: u64,
    /// Metadata of vector `1` after the partial update.
    pub merged_metadata: Metadata,
    pub top_match: Option<String>,
}

fn object(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

/// Two vectors whose metadata carries tag arrays and a boolean.
pub fn sample_vectors(dimension: usize) -> Vec<Vector> {
    let ramp = |offset: f32| -> Vec<f32> {
        (0..dimension)
            .map(|i| ((i as f32 + offset) / dimension as f32).min(1.0))
            .collect()
    };

    let mut descending = ramp(1.0);
    descending.reverse();

    vec![
        Vector::new(SAMPLE_IDS[0], ramp(0.0)).with_metadata(object(json!({
            "tags": ["rust", "search"],
            "count": 10,
            "approved": true,
        }))),
        Vector::new(SAMPLE_IDS[1], descending).with_metadata(object(json!({
            "tags": ["http"],
            "count": 3,
            "approved": false,
        }))),
    ]
}

/// Exercise the client end to end and check each step's result.
///
/// The samples are deleted again before returning successfully.
#[instrument(skip_all, fields(namespace = client.namespace()))]
pub async fn reference_flow(client: &VectorClient) -> Result<FlowReport> {
    let stats = client
        .describe_index_stats(DescribeIndexStatsParams::default())
        .await
        .wrap_err("Failed to describe index")?;
    let dimension = match stats.dimension {
        0 => FALLBACK_DIMENSION,
        d => d as usize,
    };
    info!(dimension, total = stats.total_vector_count, "Index described");

    let vectors = sample_vectors(dimension);
    let upserted = client
        .upsert(UpsertParams::new(vectors.clone()))
        .await
        .wrap_err("Failed to upsert sample vectors")?;
    info!(upserted, "Sample vectors upserted");

    let fetched = client
        .fetch(FetchParams::new(SAMPLE_IDS))
        .await
        .wrap_err("Failed to fetch sample vectors")?;
    for vector in &vectors {
        if fetched.vectors.get(&vector.id) != Some(vector) {
            return Err(eyre!("Fetched vector {} differs from what was upserted", vector.id));
        }
    }

    // a null entry leaves the stored key untouched
    client
        .update(
            UpdateParams::new(SAMPLE_IDS[0])
                .with_set_metadata(object(json!({ "count": 11, "tags": null }))),
        )
        .await
        .wrap_err("Failed to update sample metadata")?;

    let merged_metadata = client
        .fetch(FetchParams::new([SAMPLE_IDS[0]]))
        .await
        .wrap_err("Failed to fetch updated vector")?
        .vectors
        .remove(SAMPLE_IDS[0])
        .and_then(|v| v.metadata)
        .ok_or_else(|| eyre!("Updated vector {} has no metadata", SAMPLE_IDS[0]))?;
    info!(metadata = %serde_json::Value::Object(merged_metadata.clone()), "Metadata merged");

    let results = client
        .query(QueryParams::by_vector(vectors[0].values.clone(), 2).include_metadata(true))
        .await
        .wrap_err("Failed to query index")?;
    let top_match = results.matches.first().map(|m| m.id.clone());
    info!(matches = results.matches.len(), ?top_match, "Query answered");

    client
        .delete(DeleteParams::by_ids(SAMPLE_IDS))
        .await
        .wrap_err("Failed to delete sample vectors")?;

    Ok(FlowReport {
        dimension,
        upserted,
        merged_metadata,
        top_match,
    })
}
