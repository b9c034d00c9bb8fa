// Panic isolation for per-target evaluation
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Poll a future with panic isolation
///
/// A panic while polling is caught and returned as `PanicGuardResult::Panicked`,
/// so one misbehaving target cannot take down the whole cycle. The future runs
/// on the caller's task (no spawn), keeping the cycle single-threaded.
///
/// # Example
/// ```text
/// match execute_guarded_async(async { evaluate(target).await }).await {
///     PanicGuardResult::Success(state) => keep(state),
///     PanicGuardResult::Panicked(msg) => warn!("{}", msg),
/// }
/// ```
pub async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(value) => PanicGuardResult::Success(value),
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(panic_msg = %panic_msg, "Monitoring task panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_value_through() {
        let result = execute_guarded_async(async { 42 }).await;
        assert!(matches!(result, PanicGuardResult::Success(42)));
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let result = execute_guarded_async(async {
            tokio::task::yield_now().await;
            panic!("probe exploded");
        })
        .await;

        match result {
            PanicGuardResult::Panicked(msg) => assert_eq!(msg, "probe exploded"),
            PanicGuardResult::Success(()) => panic!("expected panic to be caught"),
        }
    }
}
