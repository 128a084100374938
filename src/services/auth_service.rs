//! Client side of the external authorization service.
//!
//! The ledger performs no authorization itself. Before a request reaches a
//! handler, the auth middleware asks an [`Authorizer`] whether the bearer
//! token may perform the named operation with the given route parameters.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Capability answering "may this token perform this operation?".
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn is_authorized(&self, token: &str, operation: &str, params: &[(String, String)])
    -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthClientError {
    #[error("invalid authorization service URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Body returned by `GET /auth/verify`.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(rename = "isAuthorized", default)]
    is_authorized: bool,
}

/// Authorizer that calls the remote authorization service.
///
/// # Request
///
/// `GET {base}/auth/verify?token=<token>&routeName=<operation>&<param>=<value>...`
///
/// # Failure policy
///
/// Any transport error, non-success status or undecodable body denies access.
#[derive(Debug, Clone)]
pub struct RemoteAuthorizer {
    client: reqwest::Client,
    verify_url: Url,
}

impl RemoteAuthorizer {
    pub fn new(base_url: &str) -> Result<Self, AuthClientError> {
        let verify_url = Url::parse(base_url)?.join("/auth/verify")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self { client, verify_url })
    }

    fn verify_url(&self, token: &str, operation: &str, params: &[(String, String)]) -> Url {
        let mut url = self.verify_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", token);
            query.append_pair("routeName", operation);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        url
    }
}

#[async_trait]
impl Authorizer for RemoteAuthorizer {
    async fn is_authorized(
        &self,
        token: &str,
        operation: &str,
        params: &[(String, String)],
    ) -> bool {
        let url = self.verify_url(token, operation, params);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Authorization request failed: {}", e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                operation,
                "Authorization service refused the request"
            );
            return false;
        }

        match response.json::<VerifyResponse>().await {
            Ok(body) => body.is_authorized,
            Err(e) => {
                tracing::error!("Error while decoding response from auth server: {}", e);
                false
            }
        }
    }
}

/// Authorizer backed by a fixed table of grants, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    grants: HashMap<String, HashSet<String>>,
    any_operation: HashSet<String>,
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `token` to perform `operation`.
    pub fn grant(mut self, token: &str, operation: &str) -> Self {
        self.grants
            .entry(token.to_string())
            .or_default()
            .insert(operation.to_string());
        self
    }

    /// Allow `token` to perform every operation.
    pub fn grant_all(mut self, token: &str) -> Self {
        self.any_operation.insert(token.to_string());
        self
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn is_authorized(
        &self,
        token: &str,
        operation: &str,
        _params: &[(String, String)],
    ) -> bool {
        self.any_operation.contains(token)
            || self
                .grants
                .get(token)
                .is_some_and(|operations| operations.contains(operation))
    }
}
