//! Cosine similarity.

/// Cosine similarity of `a` and `b`, in `[-1, 1]`.
///
/// Returns `0.0` when either side is empty, the lengths differ, or either
/// magnitude is zero. Absent embeddings are a normal state and must score as
/// "no signal", never as an error.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (&av, &bv)| {
            (dot + av * bv, na + av * av, nb + bv * bv)
        });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        // Rounding can push |x| slightly past 1.
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Like [`cosine_similarity`] but accepts absent embeddings on either side.
#[inline]
pub fn optional_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f32 {
    match (a, b) {
        (Some(a), Some(b)) => cosine_similarity(a, b),
        _ => 0.0,
    }
}
