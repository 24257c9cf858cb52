//! Walkthrough setup and lifecycle
//!
//! This module handles all setup:
//! - Error report installation
//! - Tracing initialization
//! - Client configuration from the environment
//! - Running the reference flow

use core_config::Environment;
use domain_vector::{ClientConfig, VectorClient};
use eyre::{Result, WrapErr};
use tracing::info;

use crate::flow::reference_flow;

/// Namespace the walkthrough writes to.
pub const NAMESPACE_ENV: &str = "VECTOR_NAMESPACE";
pub const DEFAULT_NAMESPACE: &str = "zerg-walkthrough";

/// Run the walkthrough
///
/// 1. Installs color-eyre and env-aware logging (JSON for prod, pretty for dev)
/// 2. Builds a client from `PINECONE_API_KEY` / `PINECONE_BASE_URL`
/// 3. Runs [`reference_flow`] and logs its report
///
/// # Errors
///
/// Returns an error if:
/// - The API key or base URL is missing
/// - Any call to the index fails
/// - The index does not behave as the flow expects
pub async fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let namespace = core_config::env_or_default(NAMESPACE_ENV, DEFAULT_NAMESPACE);
    let client: VectorClient = VectorClient::new(ClientConfig::new().with_namespace(&namespace))
        .wrap_err("Failed to configure vector client")?;
    info!(base_url = client.http().base_url(), %namespace, "Vector client configured");

    let report = reference_flow(&client).await?;
    info!(
        upserted = report.upserted,
        dimension = report.dimension,
        top_match = report.top_match.as_deref().unwrap_or("<none>"),
        metadata = %serde_json::Value::Object(report.merged_metadata),
        "Reference flow completed"
    );

    Ok(())
}
