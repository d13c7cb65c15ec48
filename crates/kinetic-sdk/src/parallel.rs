//! Bounded-concurrency map for batch scripts.
//!
//! Ordinary SDK calls never run concurrently on their own; batch jobs that
//! want to (e.g. updating hundreds of submissions) can fan out here.

use std::future::Future;

use futures::StreamExt;

/// Run `f` over `items` with at most `concurrency` futures in flight.
///
/// Results come back in input order. A `concurrency` of 0 is treated as 1.
pub async fn map<I, F, Fut>(items: I, concurrency: usize, f: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    futures::stream::iter(items)
        .map(f)
        .buffered(concurrency.max(1))
        .collect()
        .await
}
