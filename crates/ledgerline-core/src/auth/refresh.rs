//! Single-flight token renewal.
//!
//! Any number of tasks can call [`RefreshCoordinator::renew`] while a
//! renewal is already running; they all await the same in-flight
//! operation and observe the same settlement. This keeps the server-side
//! refresh rotation to a single request - concurrent rotations would
//! invalidate each other's refresh tokens.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::TokenPair;

use super::{claims, AuthError, TokenStore};

/// HTTP timeout for the renewal call.
const RENEW_TIMEOUT_SECS: u64 = 30;

type SharedRenewal = Shared<BoxFuture<'static, Result<String, AuthError>>>;

#[derive(Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

/// Serializes concurrent renewal attempts into one network operation.
///
/// Clone is cheap - all clones share the same in-flight slot and store.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    http: reqwest::Client,
    renew_url: String,
    store: Arc<TokenStore>,
    in_flight: Mutex<Option<SharedRenewal>>,
}

impl RefreshCoordinator {
    /// Create a coordinator renewing against `<base_url>/auth/refresh`.
    pub fn new(base_url: &str, store: Arc<TokenStore>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(RENEW_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::RenewalFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, base_url, store))
    }

    /// Create a coordinator reusing an existing client's connection pool.
    pub fn with_client(http: reqwest::Client, base_url: &str, store: Arc<TokenStore>) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                http,
                renew_url: format!("{}/auth/refresh", base_url.trim_end_matches('/')),
                store,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Renew the access token, joining an in-flight renewal if one exists.
    ///
    /// Fails without a network call when no refresh token is stored or the
    /// stored one is expired; both cases clear the session. Any settlement
    /// clears the in-flight slot so a later call starts fresh.
    pub async fn renew(&self) -> Result<String, AuthError> {
        let renewal = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .expect("renewal slot lock poisoned");

            if let Some(existing) = slot.as_ref() {
                debug!("Renewal already in flight, awaiting its result");
                existing.clone()
            } else {
                let refresh_token = match self.inner.store.refresh_token() {
                    Some(token) => token,
                    None => {
                        self.clear_session();
                        return Err(AuthError::NoRefreshToken);
                    }
                };
                if claims::is_expired(&refresh_token, 0) {
                    warn!("Refresh token expired, session must be re-established");
                    self.clear_session();
                    return Err(AuthError::RefreshExpired);
                }

                debug!("Starting token renewal");
                let inner = Arc::clone(&self.inner);
                let operation = async move { inner.perform_renewal(refresh_token).await }
                    .boxed()
                    .shared();
                *slot = Some(operation.clone());
                operation
            }
        };

        let result = renewal.clone().await;

        // Drop the slot only if it still holds this operation; a newer
        // renewal may already have been started by the time we settle.
        let mut slot = self
            .inner
            .in_flight
            .lock()
            .expect("renewal slot lock poisoned");
        if slot.as_ref().is_some_and(|op| op.ptr_eq(&renewal)) {
            *slot = None;
        }
        drop(slot);

        result
    }

    fn clear_session(&self) {
        if let Err(err) = self.inner.store.clear() {
            warn!(error = %err, "Failed to clear session store");
        }
    }
}

impl CoordinatorInner {
    async fn perform_renewal(self: Arc<Self>, refresh_token: String) -> Result<String, AuthError> {
        let result = self.request_new_pair(refresh_token).await;

        match &result {
            Ok(_) => info!("Access token renewed"),
            Err(err) => {
                warn!(error = %err, "Token renewal failed, clearing session");
                if let Err(err) = self.store.clear() {
                    warn!(error = %err, "Failed to clear session store");
                }
            }
        }

        result
    }

    async fn request_new_pair(&self, refresh_token: String) -> Result<String, AuthError> {
        let response = self
            .http
            .post(&self.renew_url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| AuthError::RenewalFailed(format!("renewal request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::RenewalFailed(format!(
                "renewal rejected with status {status}"
            )));
        }

        let pair: TokenPair = response
            .json()
            .await
            .map_err(|e| AuthError::RenewalFailed(format!("malformed renewal response: {e}")))?;

        self.store.set_tokens(&pair.access_token, &pair.refresh_token)?;
        Ok(pair.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::encode_test_token;
    use futures::future::join_all;
    use mockito::Server;
    use tempfile::TempDir;

    fn store_with_session(dir: &TempDir, refresh_offset_secs: i64) -> Arc<TokenStore> {
        let store = Arc::new(TokenStore::open(dir.path()));
        store
            .set_tokens(
                &encode_test_token(-60, "access"),
                &encode_test_token(refresh_offset_secs, "refresh"),
            )
            .expect("seed session");
        store
    }

    #[tokio::test]
    async fn concurrent_renewals_share_one_network_call() {
        let mut server = Server::new_async().await;
        let body = serde_json::json!({
            "access_token": "renewed-access",
            "refresh_token": encode_test_token(3600, "refresh"),
        });
        let mock = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().expect("tempdir");
        let store = store_with_session(&dir, 3600);
        let coordinator =
            RefreshCoordinator::new(&server.url(), Arc::clone(&store)).expect("coordinator");

        let results = join_all((0..5).map(|_| coordinator.renew())).await;
        for result in results {
            assert_eq!(result.expect("renewal"), "renewed-access");
        }

        mock.assert_async().await;
        assert_eq!(store.access_token().as_deref(), Some("renewed-access"));
    }

    #[tokio::test]
    async fn renewal_after_settlement_starts_a_fresh_operation() {
        let mut server = Server::new_async().await;
        let body = serde_json::json!({
            "access_token": "renewed-access",
            "refresh_token": encode_test_token(3600, "refresh"),
        });
        let mock = server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body(body.to_string())
            .expect(2)
            .create_async()
            .await;

        let dir = TempDir::new().expect("tempdir");
        let store = store_with_session(&dir, 3600);
        let coordinator = RefreshCoordinator::new(&server.url(), store).expect("coordinator");

        coordinator.renew().await.expect("first renewal");
        coordinator.renew().await.expect("second renewal");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(TokenStore::open(dir.path()));
        let coordinator =
            RefreshCoordinator::new(&server.url(), Arc::clone(&store)).expect("coordinator");

        let err = coordinator.renew().await.unwrap_err();
        assert_eq!(err, AuthError::NoRefreshToken);
        assert!(!store.has_session());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn expired_refresh_token_clears_session_without_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().expect("tempdir");
        let store = store_with_session(&dir, -60);
        let coordinator =
            RefreshCoordinator::new(&server.url(), Arc::clone(&store)).expect("coordinator");

        let err = coordinator.renew().await.unwrap_err();
        assert_eq!(err, AuthError::RefreshExpired);
        assert!(!store.has_session());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_renewal_fails_all_waiters_and_clears_session() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/refresh")
            .with_status(401)
            .with_body("{\"detail\":\"invalid refresh token\"}")
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().expect("tempdir");
        let store = store_with_session(&dir, 3600);
        let coordinator =
            RefreshCoordinator::new(&server.url(), Arc::clone(&store)).expect("coordinator");

        let results = join_all((0..3).map(|_| coordinator.renew())).await;
        for result in results {
            assert!(matches!(result, Err(AuthError::RenewalFailed(_))));
        }

        mock.assert_async().await;
        assert!(!store.has_session());
    }

    #[tokio::test]
    async fn malformed_renewal_response_is_a_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/refresh")
            .with_status(200)
            .with_body("{\"access_token\":\"only-half\"}")
            .create_async()
            .await;

        let dir = TempDir::new().expect("tempdir");
        let store = store_with_session(&dir, 3600);
        let coordinator =
            RefreshCoordinator::new(&server.url(), Arc::clone(&store)).expect("coordinator");

        let err = coordinator.renew().await.unwrap_err();
        assert!(matches!(err, AuthError::RenewalFailed(_)));
        assert!(!store.has_session());
    }
}
