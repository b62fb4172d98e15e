//! Ordering helpers shared by the statistics, the chains and the ranking.
//!
//! All of them are pure: they take items in some order and hand back a new
//! ordering, never touching the data they rank.

use std::cmp::Ordering;

/// Orders `items` by descending `score`. The sort is stable, so items with
/// equal scores keep the order they came in.
pub fn rank_descending<T, S, F>(items: impl IntoIterator<Item = T>, score: F) -> Vec<T>
where
    S: PartialOrd,
    F: Fn(&T) -> S,
{
    let mut ranked: Vec<T> = items.into_iter().collect();
    ranked.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
    ranked
}

/// The leading run of `ranked` sharing the first item's score.
pub fn leading_run<T, S, F>(ranked: &[T], score: F) -> &[T]
where
    S: PartialEq,
    F: Fn(&T) -> S,
{
    let Some(first) = ranked.first() else {
        return ranked;
    };
    let top = score(first);
    let len = ranked.iter().take_while(|&item| score(item) == top).count();
    &ranked[..len]
}

/// The first `n` items of `ranked`, extended past the `n`th slot for as long
/// as the following items tie with the last one taken.
pub fn take_with_ties<T, S, F>(ranked: &[T], n: usize, score: F) -> &[T]
where
    S: PartialEq,
    F: Fn(&T) -> S,
{
    if ranked.len() <= n {
        return ranked;
    }
    if n == 0 {
        return &ranked[..0];
    }
    let last = score(&ranked[n - 1]);
    let extra = ranked[n..].iter().take_while(|&item| score(item) == last).count();
    &ranked[..n + extra]
}
