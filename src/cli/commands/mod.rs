pub mod check_config;
pub mod migrate;
pub mod serve;

use std::future::Future;

/// Await `work`, then `cleanup`, whatever `work` returned.
pub(crate) async fn finally<T, W, C>(work: W, cleanup: C) -> T
where
    W: Future<Output = T>,
    C: Future<Output = ()>,
{
    let outcome = work.await;
    cleanup.await;
    outcome
}
