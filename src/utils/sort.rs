/// Sort by descending score, keeping the input order among equal scores.
///
/// `slice::sort_by` is a stable merge sort, so ties stay in emission order.
/// NaN compares greater than everything under `total_cmp`; callers drop NaN
/// first when that matters.
#[inline]
pub fn stable_sort_by_score_desc<T, F>(items: &mut [T], score: F)
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| score(b).total_cmp(&score(a)));
}

/// Sort descending (stable) and keep the first `n` entries
pub fn top_n_by_score<T, F>(mut items: Vec<T>, n: Option<usize>, score: F) -> Vec<T>
where
    F: Fn(&T) -> f64,
{
    items.retain(|item| !score(item).is_nan());
    stable_sort_by_score_desc(&mut items, &score);
    if let Some(n) = n {
        items.truncate(n);
    }
    items
}
