//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for the vector domain:
//! - `TestVectorService`: in-memory fake of the vector database HTTP API on a local port
//! - `TestDataBuilder`: Deterministic test data generation
//! - `assertions`: Custom assertion helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestVectorService};
//!
//! #[tokio::test]
//! async fn my_vector_test() {
//!     let service = TestVectorService::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_vector_test");
//!
//!     let id = builder.vector_id("main");
//!     let values = builder.values(0, 8);
//!     // build a client against `service.uri()` and exercise it
//! }
//! ```

mod vector_service;

pub use vector_service::{API_KEY_HEADER, TestVectorService};

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_upsert_batches");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a vector id unique to this builder
    pub fn vector_id(&self, suffix: &str) -> String {
        format!("vec-{}-{}", self.seed, suffix)
    }

    /// Generate a unique name for testing
    ///
    /// # Arguments
    ///
    /// * `prefix` - The type of resource (e.g., "index", "namespace")
    /// * `suffix` - A unique identifier within the test (e.g., "main", "backup")
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("index", "main");
    /// // Returns: "test-index-12345-main"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Dense values in `[-1, 1)` for the `index`-th vector of a test.
    pub fn values(&self, index: u64, dimension: usize) -> Vec<f32> {
        let mut state = self.seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (0..dimension)
            .map(|_| {
                let bits = splitmix64(&mut state) >> 40;
                (bits as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
            })
            .collect()
    }

    /// Sparse indices and values with `nnz` distinct, ascending indices.
    pub fn sparse(&self, index: u64, nnz: usize) -> (Vec<u32>, Vec<f32>) {
        let mut state = self.seed.rotate_left(17) ^ index;
        let mut next = 0u32;
        let indices = (0..nnz)
            .map(|_| {
                next += 1 + (splitmix64(&mut state) % 16) as u32;
                next
            })
            .collect();
        let values = self
            .values(index.wrapping_add(1), nnz)
            .into_iter()
            .map(f32::abs)
            .collect();
        (indices, values)
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Test assertion helpers
pub mod assertions {
    use serde_json::Value;

    /// Assert that two floats are within `1e-5` of each other
    pub fn assert_close(actual: f32, expected: f32, context: &str) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "{}: expected {}, got {}",
            context,
            expected,
            actual
        );
    }

    /// Assert that no object inside `value` carries a null field
    ///
    /// Arrays are not inspected, matching how request bodies are cleaned.
    pub fn assert_no_null_fields(value: &Value, context: &str) {
        if let Value::Object(map) = value {
            for (key, v) in map {
                assert!(!v.is_null(), "{}: field '{}' is null in {}", context, key, value);
                assert_no_null_fields(v, context);
            }
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.vector_id("a"), builder2.vector_id("a"));
        assert_eq!(builder1.values(3, 16), builder2.values(3, 16));
        assert_eq!(
            builder1.name("index", "test"),
            builder2.name("index", "test")
        );
    }

    #[test]
    fn test_data_builder_from_name() {
        let builder1 = TestDataBuilder::from_test_name("my_test");
        let builder2 = TestDataBuilder::from_test_name("my_test");

        assert_eq!(builder1.vector_id("x"), builder2.vector_id("x"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.vector_id("x"), builder2.vector_id("x"));
        assert_ne!(builder1.values(0, 8), builder2.values(0, 8));
    }

    #[test]
    fn test_values_in_range() {
        let values = TestDataBuilder::new(7).values(1, 256);
        assert_eq!(values.len(), 256);
        assert!(values.iter().all(|v| (-1.0..1.0).contains(v)));
    }

    #[test]
    fn test_sparse_indices_are_distinct() {
        let (indices, values) = TestDataBuilder::new(7).sparse(0, 20);
        assert_eq!(indices.len(), 20);
        assert_eq!(values.len(), 20);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert!(values.iter().all(|v| *v >= 0.0));
    }

    #[test]
    #[should_panic(expected = "field 'b' is null")]
    fn test_assert_no_null_fields_detects_nested_null() {
        assertions::assert_no_null_fields(&json!({ "a": { "b": null } }), "body");
    }

    #[test]
    fn test_assert_no_null_fields_ignores_arrays() {
        assertions::assert_no_null_fields(&json!({ "a": [null, 1] }), "body");
    }
}
