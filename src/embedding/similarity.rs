//! Cosine similarity over unit-normalized vectors.

use crate::constants::NORM_EPSILON;

/// Returns `v / (‖v‖ + ε)`.
#[inline]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt() + NORM_EPSILON;
    v.iter().map(|x| x / norm).collect()
}

/// Cosine similarity of two vectors, in `[-1, 1]`.
///
/// Vectors of different length score `0.0`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) =
        a.iter()
            .zip(b.iter())
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
                (dot + av * bv, na + av * av, nb + bv * bv)
            });

    let denom = (norm_a_sq.sqrt() + NORM_EPSILON) * (norm_b_sq.sqrt() + NORM_EPSILON);
    (dot / denom).clamp(-1.0, 1.0)
}

/// Scores every row of `matrix` against `query`.
///
/// Output has one score per row, in row order.
pub fn similarity<V: AsRef<[f32]>>(query: &[f32], matrix: &[V]) -> Vec<f32> {
    let q = normalize(query);
    matrix
        .iter()
        .map(|row| {
            let row = row.as_ref();
            if row.len() != q.len() {
                return 0.0;
            }
            let r = normalize(row);
            q.iter()
                .zip(r.iter())
                .map(|(a, b)| a * b)
                .sum::<f32>()
                .clamp(-1.0, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = [1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_zero_vector_does_not_produce_nan() {
        let scores = similarity(&[0.0, 0.0, 0.0], &[vec![1.0, 0.0, 0.0]]);
        assert_eq!(scores.len(), 1);
        assert!(scores[0].is_finite());
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn test_similarity_matrix_order() {
        let query = [1.0, 0.0];
        let matrix = vec![vec![0.0, 1.0], vec![2.0, 0.0], vec![-3.0, 0.0]];
        let scores = similarity(&query, &matrix);
        assert_eq!(scores.len(), 3);
        assert!(scores[0].abs() < 1e-6);
        assert!((scores[1] - 1.0).abs() < 1e-5);
        assert!((scores[2] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
