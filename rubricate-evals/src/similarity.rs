//! Embedding similarity.

use crate::error::{EvalResult, GradingError};

/// Cosine similarity between two embeddings, clamped to `[-1, 1]`.
///
/// Zero vectors have similarity 0. Embeddings of different lengths are an
/// error.
///
/// # Examples
///
/// ```
/// use rubricate_evals::cosine_similarity;
///
/// let a = [1.0, 0.0, 0.0];
/// assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-9);
/// assert_eq!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).unwrap(), 0.0);
/// ```
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> EvalResult<f64> {
    if a.len() != b.len() {
        return Err(GradingError::EmbeddingDimensionMismatch {
            expected: a.len(),
            output: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0], 1.0)]
    #[case(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], 0.0)]
    #[case(&[1.0, 0.0], &[-1.0, 0.0], -1.0)]
    #[case(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0], 1.0)]
    #[case(&[0.0, 0.0], &[1.0, 1.0], 0.0)]
    fn test_cosine(#[case] a: &[f64], #[case] b: &[f64], #[case] expected: f64) {
        assert!((cosine_similarity(a, b).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_clamped() {
        let v = [0.1, 0.2, 0.3];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!(sim <= 1.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            GradingError::EmbeddingDimensionMismatch { expected: 2, output: 3 }
        ));
    }
}
