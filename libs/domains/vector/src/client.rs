use std::marker::PhantomData;

use core_config::{EnvSource, ProcessEnv};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::{ClientConfig, ResolvedConfig};
use crate::error::{VectorError, VectorResult};
use crate::http::HttpClient;
use crate::hybrid::hybrid_score_norm;
use crate::models::{
    CreateIndexParams, DEFAULT_BATCH_SIZE, DeleteIndexParams, DeleteParams,
    DescribeIndexStatsParams, FetchParams, FetchResponse, Filter, IndexStats, Metadata,
    QueryParams, QueryResponse, SparseValues, UpdateParams, UpsertParams,
};
use crate::sanitize::sanitize_fields;

/// Client for one index and one namespace.
///
/// `M` is the metadata type of the vectors stored under that namespace. Both are fixed
/// when the client is built; use another client for another namespace.
pub struct VectorClient<M = Metadata> {
    http: HttpClient,
    namespace: Option<String>,
    controller_url: String,
    _metadata: PhantomData<fn() -> M>,
}

impl<M> Clone for VectorClient<M> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            namespace: self.namespace.clone(),
            controller_url: self.controller_url.clone(),
            _metadata: PhantomData,
        }
    }
}

impl<M> std::fmt::Debug for VectorClient<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorClient")
            .field("http", &self.http)
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct DescribeIndexStatsRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Filter>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter>,
    include_values: bool,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sparse_vector: Option<SparseValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a, P> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a [f32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sparse_values: Option<&'a SparseValues>,
    #[serde(skip_serializing_if = "Option::is_none")]
    set_metadata: Option<&'a P>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: Option<u64>,
}

/// Serialize a request body and strip nulls from its metadata/filter fields.
fn sanitized<T: Serialize>(body: &T) -> VectorResult<Value> {
    let mut value = serde_json::to_value(body)?;
    if let Value::Object(map) = &mut value {
        sanitize_fields(map);
    }
    Ok(value)
}

impl<M> VectorClient<M>
where
    M: Serialize + DeserializeOwned,
{
    /// Build a client, falling back to `PINECONE_API_KEY` / `PINECONE_BASE_URL`.
    pub fn new(config: ClientConfig) -> VectorResult<Self> {
        Self::with_env(config, &ProcessEnv)
    }

    /// Build a client resolving missing settings from `env` instead of the process.
    pub fn with_env(config: ClientConfig, env: &dyn EnvSource) -> VectorResult<Self> {
        Ok(Self::from_resolved(config.resolve(env)?))
    }

    pub fn from_env() -> VectorResult<Self> {
        Self::new(ClientConfig::default())
    }

    pub fn from_resolved(config: ResolvedConfig) -> Self {
        Self {
            http: HttpClient::with_client(config.http_client, config.api_key, config.base_url),
            namespace: config.namespace,
            controller_url: config.controller_url,
            _metadata: PhantomData,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Delete vectors by id, by filter, or all vectors in the namespace.
    #[instrument(skip_all, fields(namespace = self.namespace()))]
    pub async fn delete(&self, params: DeleteParams) -> VectorResult<()> {
        let body = sanitized(&DeleteRequest {
            ids: params.ids.as_deref(),
            delete_all: params.delete_all,
            filter: params.filter.as_ref(),
            namespace: self.namespace(),
        })?;
        self.http.post("vectors/delete", &body).await
    }

    /// Index-wide statistics, optionally restricted to vectors matching a filter.
    #[instrument(skip_all)]
    pub async fn describe_index_stats(
        &self,
        params: DescribeIndexStatsParams,
    ) -> VectorResult<IndexStats> {
        let body = sanitized(&DescribeIndexStatsRequest {
            filter: params.filter.as_ref(),
        })?;
        self.http.post_json("describe_index_stats", &body).await
    }

    #[instrument(skip_all, fields(namespace = self.namespace(), count = params.ids.len()))]
    pub async fn fetch(&self, params: FetchParams) -> VectorResult<FetchResponse<M>> {
        let mut query: Vec<(&str, &str)> =
            params.ids.iter().map(|id| ("ids", id.as_str())).collect();
        if let Some(namespace) = self.namespace() {
            query.push(("namespace", namespace));
        }
        self.http.get_json("vectors/fetch", &query).await
    }

    /// Similarity search.
    ///
    /// With `hybrid_alpha` set, the dense and sparse vectors are reweighted before sending.
    /// With `min_score` set, matches scoring below it are dropped after the response
    /// arrives, so fewer than `top_k` matches may come back.
    #[instrument(skip_all, fields(namespace = self.namespace(), top_k = params.top_k))]
    pub async fn query(&self, params: QueryParams) -> VectorResult<QueryResponse<M>> {
        let QueryParams {
            vector,
            id,
            top_k,
            filter,
            include_values,
            include_metadata,
            sparse_vector,
            min_score,
            hybrid_alpha,
        } = params;

        match (&vector, &id) {
            (Some(_), Some(_)) => {
                return Err(VectorError::validation(
                    "query accepts either a vector or an id, not both",
                ));
            }
            (None, None) => {
                return Err(VectorError::validation("query requires a vector or an id"));
            }
            _ => {}
        }

        let (vector, sparse_vector) = match hybrid_alpha {
            Some(alpha) => {
                let (Some(dense), Some(sparse)) = (&vector, &sparse_vector) else {
                    return Err(VectorError::validation(
                        "hybrid query requires both a dense vector and a sparse vector",
                    ));
                };
                let (dense, sparse) = hybrid_score_norm(dense, sparse, alpha)?;
                (Some(dense), Some(sparse))
            }
            None => (vector, sparse_vector),
        };

        let body = sanitized(&QueryRequest {
            namespace: self.namespace(),
            top_k,
            filter,
            include_values,
            include_metadata,
            vector,
            sparse_vector,
            id,
        })?;

        let mut response: QueryResponse<M> = self.http.post_json("query", &body).await?;

        response.matches = response
            .matches
            .into_iter()
            .map(|m| m.narrow(include_values, include_metadata))
            .collect();
        if let Some(min_score) = min_score {
            let received = response.matches.len();
            response.retain_min_score(min_score);
            debug!(
                received,
                kept = response.matches.len(),
                min_score,
                "Applied min score"
            );
        }

        Ok(response)
    }

    /// Partial update of one vector. Metadata keys given as null are left untouched.
    #[instrument(skip_all, fields(namespace = self.namespace(), id = %params.id))]
    pub async fn update<P: Serialize>(&self, params: UpdateParams<P>) -> VectorResult<()> {
        let body = sanitized(&UpdateRequest {
            id: &params.id,
            values: params.values.as_deref(),
            sparse_values: params.sparse_values.as_ref(),
            set_metadata: params.set_metadata.as_ref(),
            namespace: self.namespace(),
        })?;
        self.http.post("vectors/update", &body).await
    }

    /// Insert or overwrite vectors, in sequential batches of `batch_size`.
    ///
    /// Batches are sent one after another in input order. The first failing batch
    /// stops the upsert; batches already sent stay written. Returns the number of
    /// vectors written.
    #[instrument(skip_all, fields(namespace = self.namespace(), count = params.vectors.len()))]
    pub async fn upsert(&self, params: UpsertParams<M>) -> VectorResult<u64> {
        let batch_size = params.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(VectorError::validation("batch size must be at least 1"));
        }

        let batches = params.vectors.len().div_ceil(batch_size);
        let mut upserted = 0u64;

        for (index, chunk) in params.vectors.chunks(batch_size).enumerate() {
            let vectors = chunk
                .iter()
                .map(sanitized)
                .collect::<VectorResult<Vec<_>>>()?;

            debug!(batch = index + 1, batches, size = chunk.len(), "Upserting batch");
            let response: UpsertResponse = self
                .http
                .post_json_or_default(
                    "vectors/upsert",
                    &UpsertRequest {
                        vectors,
                        namespace: self.namespace(),
                    },
                )
                .await?;

            upserted += response.upserted_count.unwrap_or(chunk.len() as u64);
        }

        Ok(upserted)
    }

    /// Create an index through the control plane of `params.environment`.
    #[instrument(skip_all, fields(environment = %params.environment, name = %params.name))]
    pub async fn create_index(&self, params: CreateIndexParams) -> VectorResult<()> {
        let control = self.control_plane(&params.environment)?;
        control.post("databases", &params).await
    }

    /// Delete an index through the control plane of `params.environment`.
    #[instrument(skip_all, fields(environment = %params.environment, name = %params.name))]
    pub async fn delete_index(&self, params: DeleteIndexParams) -> VectorResult<()> {
        let control = self.control_plane(&params.environment)?;
        control
            .delete(&format!("databases/{}", urlencoding::encode(&params.name)))
            .await
    }

    fn control_plane(&self, environment: &str) -> VectorResult<HttpClient> {
        if environment.is_empty() {
            return Err(VectorError::validation(
                "index management requires an environment",
            ));
        }
        let base_url = self.controller_url.replace("{environment}", environment);
        Ok(self.http.with_base_url(base_url))
    }
}
