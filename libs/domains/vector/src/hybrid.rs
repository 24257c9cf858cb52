use crate::error::{VectorError, VectorResult};
use crate::models::SparseValues;

/// Weight a dense/sparse pair for a single hybrid query.
///
/// Dense values are scaled by `alpha` and sparse values by `1 - alpha`, so a dot-product
/// index scores the convex combination of the two similarities. `alpha` must lie in `[0, 1]`.
pub fn hybrid_score_norm(
    dense: &[f32],
    sparse: &SparseValues,
    alpha: f32,
) -> VectorResult<(Vec<f32>, SparseValues)> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(VectorError::Validation(format!(
            "hybrid alpha must be between 0 and 1, got {}",
            alpha
        )));
    }
    sparse.validate()?;

    let dense = dense.iter().map(|v| v * alpha).collect();
    let sparse = SparseValues {
        indices: sparse.indices.clone(),
        values: sparse.values.iter().map(|v| v * (1.0 - alpha)).collect(),
    };

    Ok((dense, sparse))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(indices: Vec<u32>, values: Vec<f32>) -> SparseValues {
        SparseValues { indices, values }
    }

    #[test]
    fn test_even_split() {
        let input = sparse(vec![0, 1], vec![10.0, 20.0]);

        let (dense, out) = hybrid_score_norm(&[2.0, 4.0], &input, 0.5).unwrap();

        assert_eq!(dense, vec![1.0, 2.0]);
        assert_eq!(out, sparse(vec![0, 1], vec![5.0, 10.0]));
        // inputs untouched
        assert_eq!(input, sparse(vec![0, 1], vec![10.0, 20.0]));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let input = sparse(vec![7], vec![3.0]);

        let (dense, out) = hybrid_score_norm(&[2.0], &input, 1.0).unwrap();
        assert_eq!(dense, vec![2.0]);
        assert_eq!(out.values, vec![0.0]);
        assert_eq!(out.indices, vec![7]);

        let (dense, out) = hybrid_score_norm(&[2.0], &input, 0.0).unwrap();
        assert_eq!(dense, vec![0.0]);
        assert_eq!(out.values, vec![3.0]);
    }

    #[test]
    fn test_out_of_range_alpha_is_rejected() {
        let input = sparse(vec![0], vec![1.0]);
        for alpha in [1.3, -0.1, f32::NAN] {
            let err = hybrid_score_norm(&[1.0], &input, alpha).unwrap_err();
            assert!(matches!(err, VectorError::Validation(_)), "alpha {}", alpha);
        }
    }

    #[test]
    fn test_mismatched_sparse_is_rejected() {
        let input = sparse(vec![0, 1], vec![1.0]);
        assert!(hybrid_score_norm(&[1.0], &input, 0.5).is_err());
    }
}
