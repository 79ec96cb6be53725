//! HTTP client for a Google Identity Toolkit compatible API.
//!
//! This module provides the `IdentityClient` struct, the production
//! `IdentityEndpoint` used to create accounts and sign in with a password.

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, AuthGrant, IdentityEndpoint};

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the identity API
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Account creation endpoint, relative to the base URL
const SIGN_UP_PATH: &str = "accounts:signUp";

/// Password login endpoint, relative to the base URL
const SIGN_IN_PATH: &str = "accounts:signInWithPassword";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

/// Success body shared by signUp and signInWithPassword.
/// `registered` is only sent by signInWithPassword.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    #[allow(dead_code)]
    kind: Option<String>,
    id_token: String,
    email: String,
    #[allow(dead_code)]
    refresh_token: Option<String>,
    expires_in: String,
    local_id: String,
    #[allow(dead_code)]
    registered: Option<bool>,
}

impl AuthResponse {
    fn into_grant(self) -> Result<AuthGrant, ApiError> {
        let expires_in_secs = self
            .expires_in
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs >= 0 && Duration::try_seconds(*secs).is_some())
            .ok_or_else(|| {
                ApiError::InvalidResponse(format!("expiresIn out of range: {}", self.expires_in))
            })?;

        Ok(AuthGrant {
            email: self.email,
            user_id: self.local_id,
            token: self.id_token,
            expires_in_secs,
        })
    }
}

/// Identity API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a client for the public identity API
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a client against a different API root (emulators, tests)
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}?key={}", self.base_url, path, self.api_key)
    }

    async fn post_credentials(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, ApiError> {
        let url = self.endpoint_url(path);
        debug!(endpoint = path, "Sending identity request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let auth: AuthResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse auth response: {}", e))
        })?;

        auth.into_grant()
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl IdentityEndpoint for IdentityClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError> {
        self.post_credentials(SIGN_UP_PATH, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, ApiError> {
        self.post_credentials(SIGN_IN_PATH, email, password).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        let client = IdentityClient::with_base_url("http://localhost:9099/v1/", "abc").unwrap();
        assert_eq!(
            client.endpoint_url(SIGN_IN_PATH),
            "http://localhost:9099/v1/accounts:signInWithPassword?key=abc"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(PasswordRequest {
            email: "a@b.c",
            password: "pw",
            return_secure_token: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"email": "a@b.c", "password": "pw", "returnSecureToken": true})
        );
    }

    #[test]
    fn test_auth_response_into_grant() {
        let json = r#"{
            "kind": "identitytoolkit#VerifyPasswordResponse",
            "localId": "uid-1",
            "email": "a@b.c",
            "idToken": "tok",
            "registered": true,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        }"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let grant = response.into_grant().unwrap();
        assert_eq!(
            grant,
            AuthGrant {
                email: "a@b.c".to_string(),
                user_id: "uid-1".to_string(),
                token: "tok".to_string(),
                expires_in_secs: 3600,
            }
        );
    }

    #[test]
    fn test_auth_response_bad_expiry() {
        for expires_in in ["soon", "-1", "9223372036854775807", "99999999999999999999"] {
            let json = format!(
                r#"{{"localId":"u","email":"e","idToken":"t","expiresIn":"{}"}}"#,
                expires_in
            );
            let response: AuthResponse = serde_json::from_str(&json).unwrap();
            assert!(
                matches!(response.into_grant(), Err(ApiError::InvalidResponse(_))),
                "expiresIn {} should be rejected",
                expires_in
            );
        }
    }
}
