use indexmap::IndexMap;

/// Sparse feature vector keyed by feature name
pub type SparseVec = IndexMap<String, f64>;

/// Dot product of two sparse vectors
/// iterate the smaller side and probe the larger one
pub fn dot(a: &SparseVec, b: &SparseVec) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(key, va)| large.get(key).map(|vb| va * vb))
        .sum()
}

#[inline]
pub fn norm(a: &SparseVec) -> f64 {
    a.values().map(|v| v * v).sum::<f64>().sqrt()
}

/// Cosine similarity
/// cosθ = A・B / (|A||B|)
pub fn cosine_similarity(a: &SparseVec, b: &SparseVec) -> f64 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    // Zero division safety with f64::EPSILON
    dot(a, b) / (norm_a * norm_b + f64::EPSILON)
}

/// Element-wise mean of several sparse vectors
/// Missing features count as zero.
pub fn centroid<'a, I>(vectors: I) -> SparseVec
where
    I: IntoIterator<Item = &'a SparseVec>,
{
    let mut sum = SparseVec::new();
    let mut count = 0usize;
    for vector in vectors {
        count += 1;
        for (key, value) in vector {
            *sum.entry(key.clone()).or_insert(0.0) += value;
        }
    }
    if count > 0 {
        let inv = 1.0 / count as f64;
        sum.values_mut().for_each(|v| *v *= inv);
    }
    sum
}
