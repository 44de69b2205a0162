//! Authenticated API client.

use crate::error::{SyncError, SyncResult};
use crate::http::{HttpClient, HttpMethod, HttpRequest};
use crate::session::SessionStore;
use daybook_sync_protocol::{RefreshRequest, SessionTokens};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Generic authenticated request wrapper.
///
/// Attaches the current bearer token to every request. On a 401 response
/// it refreshes the token pair exactly once and re-issues the original
/// request once with the new token; any further 401 surfaces to the
/// caller. There is no time-based retry here; that belongs to the sync
/// engine's timer loops.
pub struct ApiClient<C> {
    base_url: String,
    client: C,
    session: SessionStore,
}

impl<C: HttpClient> ApiClient<C> {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>, client: C, session: SessionStore) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client,
            session,
        }
    }

    /// Returns the session store this client refreshes into.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issues a GET request and decodes the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SyncResult<T> {
        self.request(HttpMethod::Get, path, None).await
    }

    /// Issues a POST request with an optional JSON body and decodes the
    /// JSON response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> SyncResult<T> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| SyncError::Codec(e.to_string()))?;
        self.request(HttpMethod::Post, path, body).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> SyncResult<T> {
        let url = self.url_for(path);
        let build = |bearer: Option<String>| HttpRequest {
            method,
            url: url.clone(),
            bearer,
            body: body.clone(),
        };

        let mut response = self.client.execute(build(self.session.access_token())).await?;

        if response.status == 401 && self.refresh_tokens().await {
            if let Some(token) = self.session.access_token() {
                debug!(%url, "retrying request with refreshed token");
                response = self.client.execute(build(Some(token))).await?;
            }
        }

        if !response.is_success() {
            return Err(SyncError::Http {
                status: response.status,
                message: response.body,
            });
        }

        if response.is_json() {
            serde_json::from_str(&response.body).map_err(|e| SyncError::Codec(e.to_string()))
        } else {
            // Endpoints without a JSON body decode into types that accept
            // null, such as `()` or an Option.
            serde_json::from_str("null").map_err(|e| SyncError::Codec(e.to_string()))
        }
    }

    /// Exchanges the stored refresh token for a new pair.
    ///
    /// Returns true when the session store now holds fresh tokens. Any
    /// failure (no refresh token, transport error, non-2xx, incomplete
    /// response) returns false without touching the stored pair.
    pub async fn refresh_tokens(&self) -> bool {
        let Some(refresh_token) = self.session.refresh_token() else {
            return false;
        };
        let Ok(body) = serde_json::to_string(&RefreshRequest { refresh_token }) else {
            return false;
        };

        let request = HttpRequest::post(self.url_for("/auth/refresh"), Some(body));
        match self.client.execute(request).await {
            Ok(response) if response.is_success() => {
                match serde_json::from_str::<SessionTokens>(&response.body) {
                    Ok(tokens) if tokens.is_complete() => {
                        self.session.set_tokens(tokens);
                        true
                    }
                    _ => {
                        warn!("token refresh returned an incomplete pair");
                        false
                    }
                }
            }
            Ok(response) => {
                warn!(status = response.status, "token refresh rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                false
            }
        }
    }
}
