//! Cosine similarity and top-K ranking.

use skill_types::Prediction;

use crate::error::IndexError;
use crate::index::SkillIndex;

/// Cosine similarity between two vectors.
///
/// Returns `Ok(None)` when either vector has zero norm, since the angle is
/// undefined there. Mismatched lengths are a contract violation and return
/// `DimensionMismatch`. The result is clamped to [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<Option<f32>, IndexError> {
    if a.len() != b.len() {
        return Err(IndexError::DimensionMismatch {
            expected: b.len(),
            actual: a.len(),
        });
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(None);
    }

    let score = (dot / denom).clamp(-1.0, 1.0);
    if score.is_nan() {
        return Ok(None);
    }
    Ok(Some(score as f32))
}

/// Rank every index row against `query`, best first.
///
/// Output length is `min(k, scorable rows)`; rows with a zero-norm vector are
/// excluded. Ties keep index order. A query whose length differs from the
/// index dimension fails with `DimensionMismatch`.
pub fn rank(query: &[f32], index: &SkillIndex, k: usize) -> Result<Vec<Prediction>, IndexError> {
    let Some(dimension) = index.dimension() else {
        return Ok(Vec::new());
    };
    if query.len() != dimension {
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        });
    }

    let mut scored = Vec::with_capacity(index.len());
    for (label, vector) in index.rows() {
        if let Some(score) = cosine_similarity(query, vector)? {
            scored.push((label, score));
        }
    }

    // sort_by is stable, so equal scores stay in index order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(label, score)| Prediction::scored(label.clone(), score))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use skill_types::SkillLabel;

    fn index(rows: &[(&str, Vec<f32>)]) -> SkillIndex {
        SkillIndex::new(
            rows.iter().map(|(l, _)| SkillLabel::new(l)).collect(),
            rows.iter().map(|(_, v)| v.clone()).collect(),
        )
        .unwrap()
    }

    fn skills(predictions: &[Prediction]) -> Vec<&str> {
        predictions.iter().map(|p| p.skill.as_str()).collect()
    }

    #[test]
    fn test_cosine_identical() {
        let s = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap().unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        let s = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().unwrap();
        assert!(s.abs() < 1e-6);
        let s = cosine_similarity(&[1.0, 0.0], &[-2.0, 0.0]).unwrap().unwrap();
        assert!((s + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let s = cosine_similarity(&[3.0, 4.0], &[0.3, 0.4]).unwrap().unwrap();
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_is_undefined() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap(), None);
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        assert!(matches!(
            cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]),
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_cosine_bounded_for_random_vectors() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let a: Vec<f32> = (0..16).map(|_| rng.random_range(-10.0..10.0)).collect();
            let b: Vec<f32> = (0..16).map(|_| rng.random_range(-10.0..10.0)).collect();
            if let Some(s) = cosine_similarity(&a, &b).unwrap() {
                assert!((-1.0..=1.0).contains(&s), "score {} out of range", s);
            }
        }
    }

    #[test]
    fn test_rank_best_match_first() {
        let idx = index(&[("go", vec![0.0, 1.0]), ("sql", vec![1.0, 0.1])]);
        let out = rank(&[1.0, 0.0], &idx, 5).unwrap();
        assert_eq!(skills(&out), vec!["sql", "go"]);
        assert!(out[0].score.unwrap() >= out[1].score.unwrap());
    }

    #[test]
    fn test_rank_truncates_to_k() {
        let idx = index(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.9, 0.1]),
            ("c", vec![0.0, 1.0]),
        ]);
        assert_eq!(rank(&[1.0, 0.0], &idx, 2).unwrap().len(), 2);
        assert_eq!(rank(&[1.0, 0.0], &idx, 10).unwrap().len(), 3);
        assert!(rank(&[1.0, 0.0], &idx, 0).unwrap().is_empty());
    }

    #[test]
    fn test_rank_ties_keep_index_order() {
        let idx = index(&[
            ("first", vec![1.0, 0.0]),
            ("second", vec![2.0, 0.0]),
            ("third", vec![0.5, 0.0]),
        ]);
        let out = rank(&[1.0, 0.0], &idx, 3).unwrap();
        assert_eq!(skills(&out), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_excludes_zero_rows() {
        let idx = index(&[("empty", vec![0.0, 0.0]), ("go", vec![0.0, 1.0])]);
        let out = rank(&[0.0, 1.0], &idx, 5).unwrap();
        assert_eq!(skills(&out), vec!["go"]);
        assert!(out.iter().all(|p| !p.score.unwrap().is_nan()));
    }

    #[test]
    fn test_rank_query_dimension_mismatch_fails() {
        let idx = index(&[("go", vec![0.0, 1.0])]);
        assert!(matches!(
            rank(&[1.0, 0.0, 0.0], &idx, 5),
            Err(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rank_empty_index() {
        let idx = SkillIndex::default();
        assert!(rank(&[1.0], &idx, 5).unwrap().is_empty());
    }

    #[test]
    fn test_rank_sorted_for_random_index() {
        let mut rng = rand::rng();
        let rows: Vec<(String, Vec<f32>)> = (0..50)
            .map(|i| {
                let v = (0..8).map(|_| rng.random_range(-1.0..1.0)).collect();
                (format!("skill-{}", i), v)
            })
            .collect();
        let idx = SkillIndex::new(
            rows.iter().map(|(l, _)| SkillLabel::new(l)).collect(),
            rows.into_iter().map(|(_, v)| v).collect(),
        )
        .unwrap();
        let query: Vec<f32> = (0..8).map(|_| rng.random_range(-1.0..1.0)).collect();

        let out = rank(&query, &idx, 7).unwrap();
        assert_eq!(out.len(), 7);
        for pair in out.windows(2) {
            assert!(pair[0].score.unwrap() >= pair[1].score.unwrap());
        }
    }
}
