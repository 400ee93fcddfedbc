use super::pool::{CredentialLease, CredentialPool};
use crate::error::SearchError;
use crate::provider::{ProviderError, ProviderErrorKind};
use std::future::Future;
use std::sync::Arc;

/// Runs quota-bound calls against whichever key is usable and rotates
/// through the pool when a key reports quota exhaustion.
///
/// Retry policy:
/// - quota exceeded: mark the key, retry with the next one, at most once per key
/// - invalid region: drop the region and retry once on the same key
/// - anything else: returned immediately
#[derive(Clone)]
pub struct FailoverController {
    pool: Arc<CredentialPool>,
}

impl FailoverController {
    pub fn new(pool: Arc<CredentialPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub async fn execute_with_failover<T, F, Fut>(&self, mut operation: F) -> Result<T, SearchError>
    where
        F: FnMut(CredentialLease) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.execute_with_region(None, |lease, _region| operation(lease))
            .await
            .map(|(value, _)| value)
    }

    /// Like [`execute_with_failover`](Self::execute_with_failover) for calls
    /// that carry an optional region. Returns the region the call finally
    /// succeeded with, which is `None` after a region fallback.
    pub async fn execute_with_region<T, F, Fut>(
        &self,
        region: Option<String>,
        mut operation: F,
    ) -> Result<(T, Option<String>), SearchError>
    where
        F: FnMut(CredentialLease, Option<String>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_keys = self.pool.len();
        let mut region = region;
        let mut region_fallback_used = false;

        let mut lease = self.pool.current_usable();
        self.pool.record_use(&lease);
        let mut keys_tried = 1;

        loop {
            let err = match operation(lease.clone(), region.clone()).await {
                Ok(value) => return Ok((value, region)),
                Err(err) => err,
            };

            match err.kind {
                ProviderErrorKind::QuotaExceeded => {
                    tracing::warn!("🚫 {} quota exceeded: {}", lease.name(), err.message);
                    match self.pool.mark_exhausted(&lease) {
                        Some(next) if keys_tried < max_keys => {
                            tracing::info!("🔄 Retrying with {}", next.name());
                            self.pool.record_use(&next);
                            lease = next;
                            keys_tried += 1;
                        }
                        _ => return Err(self.exhausted_error()),
                    }
                }
                ProviderErrorKind::InvalidRegion if region.is_some() && !region_fallback_used => {
                    tracing::warn!(
                        "🚨 regionCode {} rejected ({}), retrying as a worldwide search",
                        region.as_deref().unwrap_or_default(),
                        err.message
                    );
                    region = None;
                    region_fallback_used = true;
                    self.pool.record_use(&lease);
                }
                ProviderErrorKind::InvalidCredential => {
                    tracing::error!("{} rejected by YouTube: {}", lease.name(), err.message);
                    return Err(SearchError::InvalidCredential(err.message));
                }
                _ => {
                    tracing::error!("Unrecoverable YouTube API error: {}", err);
                    return Err(SearchError::Provider(err));
                }
            }
        }
    }

    fn exhausted_error(&self) -> SearchError {
        let stats = self.pool.stats();
        tracing::error!(
            "❌ All API keys exhausted ({}/{})",
            stats.exhausted,
            stats.total
        );
        SearchError::PoolExhausted {
            total: stats.total,
            available: stats.available,
            exhausted: stats.exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn controller(keys: &[&str]) -> FailoverController {
        let pool = CredentialPool::new(keys.iter().map(|k| k.to_string())).unwrap();
        FailoverController::new(Arc::new(pool))
    }

    fn quota() -> ProviderError {
        ProviderError::new(ProviderErrorKind::QuotaExceeded, "quotaExceeded")
    }

    #[tokio::test]
    async fn test_success_uses_first_key_once() {
        let failover = controller(&["key-a", "key-b"]);
        let result = failover
            .execute_with_failover(|lease| async move { Ok::<_, ProviderError>(lease.secret().to_string()) })
            .await
            .unwrap();

        assert_eq!(result, "key-a");
        let snapshot = failover.pool().snapshot();
        assert_eq!(snapshot[0].usage_count, 1);
        assert_eq!(snapshot[1].usage_count, 0);
    }

    #[tokio::test]
    async fn test_quota_error_rotates_to_next_key() {
        let failover = controller(&["key-a", "key-b", "key-c"]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let result = failover
            .execute_with_failover(|lease| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(lease.secret().to_string());
                    if lease.secret() == "key-c" {
                        Ok(42)
                    } else {
                        Err(quota())
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 42);
        assert_eq!(*seen.lock().unwrap(), vec!["key-a", "key-b", "key-c"]);
        assert_eq!(failover.pool().stats().exhausted, 2);
        assert_eq!(failover.pool().current_usable().secret(), "key-c");
    }

    #[tokio::test]
    async fn test_all_keys_exhausted_is_bounded() {
        let failover = controller(&["key-a", "key-b", "key-c"]);
        let calls = Arc::new(Mutex::new(0usize));

        let result = failover
            .execute_with_failover(|_lease| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Err::<(), _>(quota())
                }
            })
            .await;

        match result {
            Err(SearchError::PoolExhausted {
                total,
                available,
                exhausted,
            }) => {
                assert_eq!((total, available, exhausted), (3, 0, 3));
            }
            other => panic!("expected PoolExhausted, got {:?}", other),
        }
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_degraded_pool_fails_after_single_attempt() {
        let failover = controller(&["key-a"]);
        let lease = failover.pool().current_usable();
        failover.pool().mark_exhausted(&lease);

        let calls = Arc::new(Mutex::new(0usize));
        let result = failover
            .execute_with_failover(|_lease| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Err::<(), _>(quota())
                }
            })
            .await;

        assert!(matches!(result, Err(SearchError::PoolExhausted { .. })));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_region_retries_once_without_rotation() {
        let failover = controller(&["key-a", "key-b"]);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let (value, region) = failover
            .execute_with_region(Some("KR".to_string()), |lease, region| {
                let seen = seen.clone();
                async move {
                    seen.lock()
                        .unwrap()
                        .push((lease.secret().to_string(), region.clone()));
                    match region {
                        Some(_) => Err(ProviderError::new(
                            ProviderErrorKind::InvalidRegion,
                            "invalidRegionCode",
                        )),
                        None => Ok("worldwide"),
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "worldwide");
        assert_eq!(region, None);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("key-a".to_string(), Some("KR".to_string())),
                ("key-a".to_string(), None)
            ]
        );
        assert_eq!(failover.pool().stats().exhausted, 0);
    }

    #[tokio::test]
    async fn test_invalid_region_without_region_propagates() {
        let failover = controller(&["key-a"]);
        let result = failover
            .execute_with_region(None, |_lease, _region| async {
                Err::<(), _>(ProviderError::new(
                    ProviderErrorKind::InvalidRegion,
                    "invalidRegionCode",
                ))
            })
            .await;

        assert!(matches!(result, Err(SearchError::Provider(_))));
    }

    #[tokio::test]
    async fn test_region_fallback_is_one_shot() {
        let failover = controller(&["key-a"]);
        let calls = Arc::new(Mutex::new(0usize));
        let result = failover
            .execute_with_region(Some("DE".to_string()), |_lease, _region| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Err::<(), _>(ProviderError::new(
                        ProviderErrorKind::InvalidRegion,
                        "invalidRegionCode",
                    ))
                }
            })
            .await;

        assert!(matches!(result, Err(SearchError::Provider(_))));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_propagate_immediately() {
        let failover = controller(&["key-a", "key-b"]);
        let calls = Arc::new(Mutex::new(0usize));

        let result = failover
            .execute_with_failover(|_lease| {
                let calls = calls.clone();
                async move {
                    *calls.lock().unwrap() += 1;
                    Err::<(), _>(ProviderError::new(ProviderErrorKind::Other, "backendError"))
                }
            })
            .await;

        assert!(matches!(result, Err(SearchError::Provider(_))));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(failover.pool().stats().exhausted, 0);
    }

    #[tokio::test]
    async fn test_invalid_credential_is_surfaced() {
        let failover = controller(&["key-a", "key-b"]);
        let result = failover
            .execute_with_failover(|_lease| async {
                Err::<(), _>(ProviderError::new(
                    ProviderErrorKind::InvalidCredential,
                    "API key not valid",
                ))
            })
            .await;

        assert!(matches!(result, Err(SearchError::InvalidCredential(_))));
    }

    #[tokio::test]
    async fn test_concurrent_quota_hits_share_the_next_key() {
        let failover = controller(&["key-a", "key-b", "key-c"]);
        // Both calls fail on key-a only after each has leased it.
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let call = |failover: FailoverController| {
            let barrier = barrier.clone();
            async move {
                failover
                    .execute_with_failover(|lease| {
                        let barrier = barrier.clone();
                        async move {
                            if lease.secret() == "key-a" {
                                barrier.wait().await;
                                return Err(quota());
                            }
                            Ok(lease.secret().to_string())
                        }
                    })
                    .await
            }
        };

        let (first, second) = tokio::join!(call(failover.clone()), call(failover.clone()));
        assert_eq!(first.unwrap(), "key-b");
        assert_eq!(second.unwrap(), "key-b");

        let snapshot = failover.pool().snapshot();
        assert!(snapshot[0].exhausted);
        assert!(!snapshot[1].exhausted);
        assert!(!snapshot[2].exhausted);
        assert_eq!(snapshot[0].usage_count, 2);
        assert_eq!(snapshot[1].usage_count, 2);
        assert_eq!(snapshot[2].usage_count, 0);
        assert_eq!(failover.pool().stats().available, 2);
    }
}
