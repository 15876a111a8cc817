//! Dense vector arithmetic shared by vectorization and ranking.

/// Dot product of two equally sized vectors.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean length.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length. Returns `false` (leaving `v` untouched) for a zero vector.
pub fn normalize_in_place(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Cosine similarity. Defined as 0.0 when either side is a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let magnitude_a = l2_norm(a);
    let magnitude_b = l2_norm(b);

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot(a, b) / (magnitude_a * magnitude_b)
}
