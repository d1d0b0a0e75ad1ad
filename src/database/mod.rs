pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;

use std::future::Future;
use std::time::Duration;

pub use manager::{Collection, DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::{OpportunityStore, PgOpportunityRepository, PgUserRepository, UserStore};

/// Run a store operation under a deadline. On expiry the operation is dropped,
/// which cancels any in-flight query.
pub async fn bounded<T, F>(limit: Duration, operation: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(DatabaseError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_passes_results_through() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, DatabaseError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn bounded_times_out_slow_operations() {
        let err = bounded(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, DatabaseError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DatabaseError::Timeout(d) if d == Duration::from_millis(10)));
    }
}
