//! Model-backed analysis stages: category discovery, classification,
//! translation and content analysis, plus result assembly.

pub mod assemble;
pub mod categories;
pub mod classify;
pub mod clustering;
pub mod content;
pub mod translate;

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Default number of model calls allowed in flight within one batch call.
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Run `f` over `items` with at most `limit` futures in flight.
///
/// Completion order is arbitrary; outputs are placed back by input index so
/// the returned vector lines up with `items`.
pub async fn bounded_map<I, T, F, Fut>(items: Vec<I>, limit: usize, f: F) -> Vec<T>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T>,
{
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(items.len()).collect();
    let mut completed = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let fut = f(item);
            async move { (idx, fut.await) }
        })
        .buffer_unordered(limit.max(1));
    while let Some((idx, value)) = completed.next().await {
        slots[idx] = Some(value);
    }
    slots.into_iter().flatten().collect()
}
