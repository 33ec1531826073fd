//! Bounded, logged access to storage.

use std::fmt::Display;
use std::time::Duration;

use tollgate_core::error::{TollgateError, TollgateResult};
use tracing::{error, warn};

/// Wraps every storage call an engine service makes: enforces the
/// configured deadline and keeps raw storage errors away from callers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StorageGuard {
    timeout: Duration,
}

impl StorageGuard {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one storage call. Storage failures are logged with `operation`
    /// and `subject` (the identifiers involved) and returned as
    /// [`TollgateError::Internal`]; domain errors pass through unchanged.
    pub(crate) async fn run<T>(
        &self,
        operation: &'static str,
        subject: impl Display,
        call: impl Future<Output = TollgateResult<T>>,
    ) -> TollgateResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(|e| surface(operation, &subject, e)),
            Err(_) => {
                warn!(
                    operation,
                    subject = %subject,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Storage call exceeded deadline"
                );
                Err(TollgateError::Timeout {
                    operation: operation.into(),
                })
            }
        }
    }
}

fn surface(operation: &'static str, subject: &dyn Display, err: TollgateError) -> TollgateError {
    match err {
        TollgateError::Database(message) | TollgateError::Internal(message) => {
            error!(operation, subject = %subject, error = %message, "Storage failure");
            TollgateError::Internal(format!("{operation} failed"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_text_is_not_leaked() {
        let guard = StorageGuard::new(Duration::from_secs(1));
        let err = guard
            .run("list_roles", "org=o1", async {
                Err::<(), _>(TollgateError::Database("index idx_x corrupted".into()))
            })
            .await
            .unwrap_err();

        match err {
            TollgateError::Internal(message) => {
                assert_eq!(message, "list_roles failed");
            }
            other => panic!("expected Internal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn domain_errors_pass_through() {
        let guard = StorageGuard::new(Duration::from_secs(1));
        let err = guard
            .run("get_role", "r1", async {
                Err::<(), _>(TollgateError::not_found("role", "r1"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TollgateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn deadline_becomes_timeout() {
        let guard = StorageGuard::new(Duration::from_millis(10));
        let err = guard
            .run("activate_org", "o1", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TollgateError::Timeout { ref operation } if operation == "activate_org"));
    }
}
