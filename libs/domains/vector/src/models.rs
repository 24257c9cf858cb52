use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{VectorError, VectorResult};

/// Untyped metadata: a JSON object.
pub type Metadata = Map<String, Value>;

pub const DEFAULT_TOP_K: u32 = 10;
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// A stored vector with optional metadata of type `M`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "M: Deserialize<'de>"))]
pub struct Vector<M = Metadata> {
    pub id: String,
    #[serde(default)]
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse_values: Option<SparseValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<M>,
}

impl<M> Vector<M> {
    pub fn new(id: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            values,
            sparse_values: None,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_sparse_values(mut self, sparse_values: SparseValues) -> Self {
        self.sparse_values = Some(sparse_values);
        self
    }
}

/// Sparse vector: parallel `indices`/`values`, same length, unique indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseValues {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseValues {
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> VectorResult<Self> {
        let sparse = Self { indices, values };
        sparse.validate()?;
        Ok(sparse)
    }

    pub fn validate(&self) -> VectorResult<()> {
        if self.indices.len() != self.values.len() {
            return Err(VectorError::validation(format!(
                "sparse vector has {} indices but {} values",
                self.indices.len(),
                self.values.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.indices.len());
        if let Some(dup) = self.indices.iter().find(|i| !seen.insert(**i)) {
            return Err(VectorError::validation(format!(
                "sparse vector index {} appears more than once",
                dup
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Comparison operators understood by the metadata filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "$eq",
            FilterOperator::Ne => "$ne",
            FilterOperator::Gt => "$gt",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lt => "$lt",
            FilterOperator::Lte => "$lte",
            FilterOperator::In => "$in",
            FilterOperator::Nin => "$nin",
        }
    }
}

/// Metadata filter, serialized as a plain JSON object.
///
/// ```
/// use domain_vector::Filter;
///
/// let filter = Filter::new().eq("genre", "drama").gte("year", 2020);
/// assert_eq!(
///     serde_json::to_value(&filter).unwrap(),
///     serde_json::json!({ "genre": { "$eq": "drama" }, "year": { "$gte": 2020 } })
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field <op> value`. Conditions on the same field are merged.
    pub fn condition(
        mut self,
        field: impl Into<String>,
        op: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        let entry = self
            .0
            .entry(field.into())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(ops) = entry {
            ops.insert(op.as_str().to_string(), value.into());
        }
        self
    }

    /// Shorthand equality: `{ field: value }`.
    pub fn field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, FilterOperator::Eq, value)
    }

    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, FilterOperator::Ne, value)
    }

    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, FilterOperator::Gt, value)
    }

    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, FilterOperator::Gte, value)
    }

    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, FilterOperator::Lt, value)
    }

    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.condition(field, FilterOperator::Lte, value)
    }

    pub fn is_in<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.condition(field, FilterOperator::In, list)
    }

    pub fn not_in<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let list: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.condition(field, FilterOperator::Nin, list)
    }

    /// `{ "$and": [...] }`
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::combine("$and", filters)
    }

    /// `{ "$or": [...] }`
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self::combine("$or", filters)
    }

    fn combine(key: &str, filters: impl IntoIterator<Item = Filter>) -> Self {
        let list: Vec<Value> = filters.into_iter().map(|f| Value::Object(f.0)).collect();
        let mut map = Map::new();
        map.insert(key.to_string(), Value::Array(list));
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Similarity query.
///
/// Exactly one of `vector` and `id` must be set. `min_score` and `hybrid_alpha` are
/// applied by the client and never reach the service. Which optional fields each
/// match carries follows `include_values`/`include_metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub vector: Option<Vec<f32>>,
    pub id: Option<String>,
    pub top_k: u32,
    pub filter: Option<Filter>,
    pub include_values: bool,
    pub include_metadata: bool,
    pub sparse_vector: Option<SparseValues>,
    pub min_score: Option<f32>,
    pub hybrid_alpha: Option<f32>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            vector: None,
            id: None,
            top_k: DEFAULT_TOP_K,
            filter: None,
            include_values: false,
            include_metadata: false,
            sparse_vector: None,
            min_score: None,
            hybrid_alpha: None,
        }
    }
}

impl QueryParams {
    pub fn by_vector(vector: Vec<f32>, top_k: u32) -> Self {
        Self {
            vector: Some(vector),
            top_k,
            ..Self::default()
        }
    }

    pub fn by_id(id: impl Into<String>, top_k: u32) -> Self {
        Self {
            id: Some(id.into()),
            top_k,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn include_values(mut self, include: bool) -> Self {
        self.include_values = include;
        self
    }

    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn with_sparse_vector(mut self, sparse: SparseValues) -> Self {
        self.sparse_vector = Some(sparse);
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Blend dense and sparse similarity; requires both vectors.
    pub fn with_hybrid_alpha(mut self, alpha: f32) -> Self {
        self.hybrid_alpha = Some(alpha);
        self
    }
}

/// One query match. `values`, `sparse_values` and `metadata` are present only when the
/// corresponding include flag was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "M: Deserialize<'de>"))]
pub struct ScoredVector<M = Metadata> {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse_values: Option<SparseValues>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<M>,
}

impl<M> ScoredVector<M> {
    /// Drop the fields the request did not ask for.
    pub(crate) fn narrow(mut self, include_values: bool, include_metadata: bool) -> Self {
        if !include_values {
            self.values = None;
            self.sparse_values = None;
        }
        if !include_metadata {
            self.metadata = None;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse<M = Metadata> {
    #[serde(default)]
    pub namespace: String,
    #[serde(default = "Vec::new")]
    pub matches: Vec<ScoredVector<M>>,
}

impl<M> QueryResponse<M> {
    /// Keep matches scoring at least `min_score`, in their original order.
    pub(crate) fn retain_min_score(&mut self, min_score: f32) {
        self.matches.retain(|m| m.score >= min_score);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse<M = Metadata> {
    #[serde(default)]
    pub namespace: String,
    #[serde(default = "HashMap::new")]
    pub vectors: HashMap<String, Vector<M>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSummary {
    #[serde(default)]
    pub vector_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub namespaces: HashMap<String, NamespaceSummary>,
    #[serde(default)]
    pub dimension: u32,
    #[serde(default)]
    pub index_fullness: f32,
    #[serde(default)]
    pub total_vector_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribeIndexStatsParams {
    pub filter: Option<Filter>,
}

impl DescribeIndexStatsParams {
    pub fn with_filter(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteParams {
    pub ids: Option<Vec<String>>,
    pub delete_all: Option<bool>,
    pub filter: Option<Filter>,
}

impl DeleteParams {
    pub fn by_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            delete_all: Some(true),
            ..Self::default()
        }
    }

    pub fn by_filter(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchParams {
    pub ids: Vec<String>,
}

impl FetchParams {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Partial update of one vector.
///
/// `set_metadata` may be any serializable partial shape; keys that serialize to
/// `null` (e.g. `None` fields) are dropped, leaving the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateParams<P = Metadata> {
    pub id: String,
    pub values: Option<Vec<f32>>,
    pub sparse_values: Option<SparseValues>,
    pub set_metadata: Option<P>,
}

impl<P> UpdateParams<P> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: None,
            sparse_values: None,
            set_metadata: None,
        }
    }

    pub fn with_values(mut self, values: Vec<f32>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_sparse_values(mut self, sparse: SparseValues) -> Self {
        self.sparse_values = Some(sparse);
        self
    }

    pub fn with_set_metadata(mut self, set_metadata: P) -> Self {
        self.set_metadata = Some(set_metadata);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertParams<M = Metadata> {
    pub vectors: Vec<Vector<M>>,
    /// Vectors per request; defaults to [`DEFAULT_BATCH_SIZE`].
    pub batch_size: Option<usize>,
}

impl<M> UpsertParams<M> {
    pub fn new(vectors: Vec<Vector<M>>) -> Self {
        Self {
            vectors,
            batch_size: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

/// Distance metric of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub indexed: Vec<String>,
}

/// Index creation request, sent to the control plane of `environment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateIndexParams {
    #[serde(skip)]
    pub environment: String,
    pub name: String,
    pub dimension: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_config: Option<MetadataConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_collection: Option<String>,
}

impl CreateIndexParams {
    pub fn new(environment: impl Into<String>, name: impl Into<String>, dimension: u32) -> Self {
        Self {
            environment: environment.into(),
            name: name.into(),
            dimension,
            metric: None,
            pods: None,
            replicas: None,
            pod_type: None,
            metadata_config: None,
            source_collection: None,
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn with_pods(mut self, pods: u32, pod_type: impl Into<String>) -> Self {
        self.pods = Some(pods);
        self.pod_type = Some(pod_type.into());
        self
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    pub fn with_indexed_metadata<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_config = Some(MetadataConfig {
            indexed: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn from_collection(mut self, collection: impl Into<String>) -> Self {
        self.source_collection = Some(collection.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteIndexParams {
    pub environment: String,
    pub name: String,
}

impl DeleteIndexParams {
    pub fn new(environment: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            name: name.into(),
        }
    }
}
