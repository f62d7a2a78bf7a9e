//! Authenticated client for the budget-tracker REST API.
//!
//! Every protected request goes through the same interception path: a
//! valid access token is attached before send, a 401 response triggers
//! exactly one renewal-and-resend, and unrecoverable credential failures
//! terminate the session instead of leaking half-authenticated state to
//! the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{
    claims, AuthError, RefreshCoordinator, SessionTerminator, TokenStore, UnauthenticatedHook,
};
use crate::models::{LoginResponse, NewTransaction, Transaction, TransactionsResponse, User};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTransactionResponse {
    #[allow(dead_code)]
    message: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[allow(dead_code)]
    message: String,
}

/// API client for the budget-tracker server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<TokenStore>,
    refresh: RefreshCoordinator,
    terminator: SessionTerminator,
}

impl ApiClient {
    /// Create a client for `base_url`, sharing the given token store.
    ///
    /// `on_unauthenticated` fires whenever the session becomes
    /// unrecoverable; the application decides how to route to login.
    pub fn new(
        base_url: &str,
        store: Arc<TokenStore>,
        on_unauthenticated: UnauthenticatedHook,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let refresh = RefreshCoordinator::with_client(http.clone(), &base_url, Arc::clone(&store));
        let terminator = SessionTerminator::new(Arc::clone(&store), on_unauthenticated);

        Ok(Self {
            http,
            base_url,
            store,
            refresh,
            terminator,
        })
    }

    /// The cached identity of the logged-in account, if any.
    pub fn current_user(&self) -> Option<User> {
        self.store.user()
    }

    /// Whether a session exists that could authorize requests.
    pub fn is_authenticated(&self) -> bool {
        self.store.has_session()
    }

    // ===== Credential attachment =====

    /// Return a usable access token, renewing through the coordinator when
    /// the stored one is absent or expired.
    pub async fn valid_access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.store.access_token() {
            if !claims::is_expired(&token, 0) {
                return Ok(token);
            }
            debug!("Access token expired, renewing");
        } else {
            debug!("No access token stored, attempting renewal");
        }
        self.refresh.renew().await
    }

    /// Core request path for the protected API surface.
    ///
    /// Attaches a valid token before send. A 401 response renews and
    /// resends exactly once; a second 401 is surfaced as-is. 429 responses
    /// back off exponentially up to a fixed cap.
    async fn execute<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut token = match self.valid_access_token().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "No usable credentials, terminating session");
                self.terminator.terminate();
                return Err(ApiError::SessionExpired.into());
            }
        };

        let mut auth_retried = false;
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self.http.request(method.clone(), &url).bearer_auth(&token);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !auth_retried {
                auth_retried = true;
                debug!(url = %url, "Request rejected as unauthorized, renewing token");
                match self.refresh.renew().await {
                    Ok(new_token) => {
                        token = new_token;
                        continue;
                    }
                    Err(err) => {
                        warn!(error = %err, "Renewal after rejection failed, terminating session");
                        self.terminator.terminate();
                        // Surface the original rejection, not the renewal error
                        return Err(ApiError::Unauthorized.into());
                    }
                }
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited.into());
                }
                warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &body_text).into());
            }

            return response
                .json()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", url));
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute::<T, ()>(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute::<T, ()>(Method::DELETE, path, None).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    // ===== Authentication =====

    /// Log in and establish a session.
    ///
    /// Goes straight to the auth endpoint without a bearer header; on
    /// success the returned token pair and identity are stored.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .context("Failed to send login request")?;

        let response = Self::check_response(response).await?;
        let login: LoginResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        self.store
            .set_tokens(&login.access_token, &login.refresh_token)?;
        self.store.set_user(login.user.clone())?;
        debug!(email = %login.user.email, "Login succeeded");
        Ok(login.user)
    }

    /// Create a new account. Does not log in; call `login` afterwards.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let url = format!("{}/auth/register", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&RegisterRequest {
                email,
                password,
                first_name,
                last_name,
            })
            .send()
            .await
            .context("Failed to send register request")?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse register response")
    }

    /// Drop the session and signal the application to re-authenticate.
    pub fn logout(&self) {
        self.terminator.terminate();
    }

    // ===== Transactions =====

    /// Fetch all transactions for the logged-in account.
    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
        let response: TransactionsResponse = self.get("/transactions/").await?;
        Ok(response.transactions)
    }

    /// Create a transaction, returning its server-assigned id.
    pub async fn create_transaction(&self, transaction: &NewTransaction) -> Result<String> {
        let response: CreateTransactionResponse =
            self.post("/transactions/", transaction).await?;
        Ok(response.id)
    }

    /// Replace a transaction's fields.
    pub async fn update_transaction(&self, id: &str, transaction: &NewTransaction) -> Result<()> {
        let _: MessageResponse = self
            .put(&format!("/transactions/{}", id), transaction)
            .await?;
        Ok(())
    }

    /// Delete a transaction.
    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        let _: MessageResponse = self.delete(&format!("/transactions/{}", id)).await?;
        Ok(())
    }
}
