//! In-process fake of the vector database HTTP API
//!
//! Provides a `TestVectorService` that serves the data-plane endpoints from memory on
//! top of a `wiremock` server. It keeps vectors per namespace, merges partial metadata
//! updates, scores queries by dot product, and rejects null metadata values and
//! mismatched dimensions the same way the real service does. Filters are accepted but
//! not evaluated.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value, json};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Header the fake requires on every request.
pub const API_KEY_HEADER: &str = "Api-Key";

type Namespaces = HashMap<String, BTreeMap<String, Value>>;

#[derive(Clone, Default)]
struct Store(Arc<Mutex<Namespaces>>);

impl Store {
    fn lock(&self) -> MutexGuard<'_, Namespaces> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fake vector service with in-memory state
///
/// # Example
///
/// ```no_run
/// use test_utils::TestVectorService;
///
/// # async fn example() {
/// let service = TestVectorService::new().await;
/// let base_url = service.uri();
///
/// // point a client at `base_url`, run the code under test, then inspect
/// assert_eq!(service.vector_count(""), 0);
/// let upserts = service.requests_to("/vectors/upsert").await;
/// assert!(upserts.is_empty());
/// # }
/// ```
pub struct TestVectorService {
    server: MockServer,
    store: Store,
}

impl TestVectorService {
    /// Start a fresh service with no vectors.
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let store = Store::default();

        mount(&server, "POST", "/vectors/upsert", Upsert(store.clone())).await;
        mount(&server, "GET", "/vectors/fetch", Fetch(store.clone())).await;
        mount(&server, "POST", "/vectors/update", Update(store.clone())).await;
        mount(&server, "POST", "/vectors/delete", Delete(store.clone())).await;
        mount(&server, "POST", "/query", Query(store.clone())).await;
        mount(&server, "POST", "/describe_index_stats", Stats(store.clone())).await;

        tracing::info!(uri = %server.uri(), "Test vector service ready");

        Self { server, store }
    }

    /// Base URL to configure clients with.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The underlying mock server, for mounting extra expectations.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    pub fn vector_count(&self, namespace: &str) -> usize {
        self.store.lock().get(namespace).map_or(0, BTreeMap::len)
    }

    /// Stored JSON for one vector, exactly as the service would return it.
    pub fn stored(&self, namespace: &str, id: &str) -> Option<Value> {
        self.store
            .lock()
            .get(namespace)
            .and_then(|space| space.get(id))
            .cloned()
    }

    /// JSON bodies of all requests received on `route`, oldest first.
    ///
    /// Requests without a JSON body (e.g. GET) appear as `Value::Null`.
    pub async fn requests_to(&self, route: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == route)
            .map(|r| serde_json::from_slice(&r.body).unwrap_or(Value::Null))
            .collect()
    }
}

async fn mount<R: Respond + 'static>(server: &MockServer, verb: &str, route: &str, responder: R) {
    Mock::given(method(verb))
        .and(path(route))
        .and(header_exists(API_KEY_HEADER))
        .respond_with(responder)
        .mount(server)
        .await;
}

fn error_response(status: u16, code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "code": code,
        "message": message,
        "details": [],
    }))
}

fn json_body(request: &Request) -> Result<Value, ResponseTemplate> {
    serde_json::from_slice(&request.body)
        .map_err(|e| error_response(400, 3, &format!("invalid JSON body: {}", e)))
}

fn namespace_of(body: &Value) -> String {
    body.get("namespace")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Dotted path of the first null-valued key inside an object, if any.
fn find_null(value: &Value, prefix: &str) -> Option<String> {
    let Value::Object(map) = value else {
        return None;
    };
    map.iter().find_map(|(key, v)| {
        let field = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match v {
            Value::Null => Some(field),
            Value::Object(_) => find_null(v, &field),
            _ => None,
        }
    })
}

fn dense(value: Option<&Value>) -> Vec<f64> {
    value
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

fn sparse(value: Option<&Value>) -> HashMap<u64, f64> {
    let Some(value) = value else {
        return HashMap::new();
    };
    let indices = value.get("indices").and_then(Value::as_array);
    let values = value.get("values").and_then(Value::as_array);
    match (indices, values) {
        (Some(indices), Some(values)) => indices
            .iter()
            .zip(values)
            .filter_map(|(i, v)| Some((i.as_u64()?, v.as_f64()?)))
            .collect(),
        _ => HashMap::new(),
    }
}

struct Upsert(Store);

impl Respond for Upsert {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = match json_body(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let Some(vectors) = body.get("vectors").and_then(Value::as_array) else {
            return error_response(400, 3, "vectors is required");
        };

        // validate the whole batch before writing any of it
        for vector in vectors {
            let Some(id) = vector.get("id").and_then(Value::as_str) else {
                return error_response(400, 3, "every vector needs a string id");
            };
            if let Some(field) = vector.get("metadata").and_then(|m| find_null(m, "")) {
                return error_response(
                    400,
                    3,
                    &format!("Metadata value for field '{}' of vector '{}' is null", field, id),
                );
            }
        }

        let mut store = self.0.lock();
        let dimension = store
            .values()
            .flat_map(BTreeMap::values)
            .next()
            .or_else(|| vectors.first())
            .map_or(0, |v| dense(v.get("values")).len());
        if let Some(v) = vectors
            .iter()
            .find(|v| dense(v.get("values")).len() != dimension)
        {
            return error_response(
                400,
                3,
                &format!(
                    "Vector dimension {} does not match the dimension of the index {}",
                    dense(v.get("values")).len(),
                    dimension
                ),
            );
        }

        let space = store.entry(namespace_of(&body)).or_default();
        for vector in vectors {
            if let Some(id) = vector.get("id").and_then(Value::as_str) {
                space.insert(id.to_string(), vector.clone());
            }
        }

        ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": vectors.len() }))
    }
}

struct Fetch(Store);

impl Respond for Fetch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut ids = Vec::new();
        let mut namespace = String::new();
        for (key, value) in request.url.query_pairs() {
            match key.as_ref() {
                "ids" => ids.push(value.into_owned()),
                "namespace" => namespace = value.into_owned(),
                _ => {}
            }
        }

        let store = self.0.lock();
        let vectors: Map<String, Value> = ids
            .into_iter()
            .filter_map(|id| {
                let vector = store.get(&namespace)?.get(&id)?.clone();
                Some((id, vector))
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "namespace": namespace,
            "vectors": vectors,
        }))
    }
}

struct Update(Store);

impl Respond for Update {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = match json_body(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let Some(id) = body.get("id").and_then(Value::as_str) else {
            return error_response(400, 3, "id is required");
        };
        if let Some(field) = body.get("setMetadata").and_then(|m| find_null(m, "")) {
            return error_response(
                400,
                3,
                &format!("Metadata value for field '{}' is null", field),
            );
        }

        let mut store = self.0.lock();
        let Some(stored) = store
            .get_mut(&namespace_of(&body))
            .and_then(|space| space.get_mut(id))
            .and_then(Value::as_object_mut)
        else {
            return error_response(404, 5, &format!("Vector '{}' not found", id));
        };

        if let Some(values) = body.get("values") {
            stored.insert("values".to_string(), values.clone());
        }
        if let Some(sparse) = body.get("sparseValues") {
            stored.insert("sparseValues".to_string(), sparse.clone());
        }
        if let Some(Value::Object(patch)) = body.get("setMetadata") {
            let metadata = stored
                .entry("metadata")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(existing) = metadata {
                for (key, value) in patch {
                    existing.insert(key.clone(), value.clone());
                }
            }
        }

        ResponseTemplate::new(200).set_body_json(json!({}))
    }
}

struct Delete(Store);

impl Respond for Delete {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = match json_body(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let namespace = namespace_of(&body);
        let mut store = self.0.lock();

        if body.get("deleteAll").and_then(Value::as_bool) == Some(true) {
            store.remove(&namespace);
        } else if let Some(ids) = body.get("ids").and_then(Value::as_array) {
            if let Some(space) = store.get_mut(&namespace) {
                for id in ids.iter().filter_map(Value::as_str) {
                    space.remove(id);
                }
            }
        } else if body.get("filter").is_some() {
            return error_response(501, 12, "delete by filter is not supported by the test service");
        }

        ResponseTemplate::new(200).set_body_json(json!({}))
    }
}

struct Query(Store);

impl Respond for Query {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = match json_body(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let namespace = namespace_of(&body);
        let top_k = body.get("topK").and_then(Value::as_u64).unwrap_or(10) as usize;
        let include_values = body.get("includeValues").and_then(Value::as_bool) == Some(true);
        let include_metadata =
            body.get("includeMetadata").and_then(Value::as_bool) == Some(true);

        let store = self.0.lock();
        let empty = BTreeMap::new();
        let space = store.get(&namespace).unwrap_or(&empty);

        let (probe, probe_sparse) = if let Some(vector) = body.get("vector") {
            (dense(Some(vector)), sparse(body.get("sparseVector")))
        } else if let Some(id) = body.get("id").and_then(Value::as_str) {
            match space.get(id) {
                Some(seed) => (dense(seed.get("values")), sparse(seed.get("sparseValues"))),
                None => {
                    return ResponseTemplate::new(200)
                        .set_body_json(json!({ "namespace": namespace, "matches": [] }));
                }
            }
        } else {
            return error_response(400, 3, "either vector or id is required");
        };

        let mut scored: Vec<(f64, &Value)> = space
            .values()
            .map(|stored| {
                let dense_score: f64 = probe
                    .iter()
                    .zip(dense(stored.get("values")))
                    .map(|(a, b)| a * b)
                    .sum();
                let stored_sparse = sparse(stored.get("sparseValues"));
                let sparse_score: f64 = probe_sparse
                    .iter()
                    .filter_map(|(i, a)| stored_sparse.get(i).map(|b| a * b))
                    .sum();
                (dense_score + sparse_score, stored)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        // the real service always sends `values`, empty unless requested
        let matches: Vec<Value> = scored
            .into_iter()
            .map(|(score, stored)| {
                let mut m = Map::new();
                m.insert("id".to_string(), stored["id"].clone());
                m.insert("score".to_string(), json!(score));
                if include_values {
                    m.insert("values".to_string(), stored["values"].clone());
                    if let Some(sparse) = stored.get("sparseValues") {
                        m.insert("sparseValues".to_string(), sparse.clone());
                    }
                } else {
                    m.insert("values".to_string(), json!([]));
                }
                if include_metadata {
                    if let Some(metadata) = stored.get("metadata") {
                        m.insert("metadata".to_string(), metadata.clone());
                    }
                }
                Value::Object(m)
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({
            "namespace": namespace,
            "matches": matches,
        }))
    }
}

struct Stats(Store);

impl Respond for Stats {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let store = self.0.lock();

        let namespaces: Map<String, Value> = store
            .iter()
            .filter(|(_, space)| !space.is_empty())
            .map(|(name, space)| (name.clone(), json!({ "vectorCount": space.len() })))
            .collect();
        let total: usize = store.values().map(BTreeMap::len).sum();
        let dimension = store
            .values()
            .flat_map(BTreeMap::values)
            .next()
            .map_or(0, |v| dense(v.get("values")).len());

        ResponseTemplate::new(200).set_body_json(json!({
            "namespaces": namespaces,
            "dimension": dimension,
            "indexFullness": 0.0,
            "totalVectorCount": total,
        }))
    }
}
