//! GitHub REST implementation of the directory capability.
//!
//! Team rosters are read per role through the team members endpoint, org
//! admins through the org members endpoint with `role=admin`. Role changes go
//! through the team memberships endpoint, which adds or updates in one call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Response};
use rostersync_core::{GroupRef, Identity, Role};
use rostersync_reconciler::{DirectoryClient, DirectoryError, DirectoryResult};
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest page size GitHub accepts.
pub const MAX_PER_PAGE: usize = 100;

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("rostersync/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`GitHubDirectory`].
#[derive(Clone)]
pub struct GitHubConfig {
    /// API base URL, e.g. `https://api.github.com` or a GHES `/api/v3` root.
    pub api_url: Url,
    /// Bearer token. Requests are unauthenticated without one.
    pub token: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Page size for list endpoints.
    pub per_page: usize,
}

impl GitHubConfig {
    /// Create a config with default timeouts and page size.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            token: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            per_page: MAX_PER_PAGE,
        }
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Set the page size, clamped to what GitHub accepts.
    #[must_use]
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("per_page", &self.per_page)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

/// Directory client backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubDirectory {
    http: reqwest::Client,
    config: Arc<GitHubConfig>,
}

impl GitHubDirectory {
    /// Create a client with a pooled connection to the API host.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GitHubConfig) -> DirectoryResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                DirectoryError::request_failed(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> DirectoryResult<Url> {
        let mut url = self.config.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                DirectoryError::request_failed(format!(
                    "API URL cannot carry a path: {}",
                    self.config.api_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Follow pages until one comes back short.
    async fn list_logins(&self, url: &Url, role: &str) -> DirectoryResult<Vec<Identity>> {
        let per_page = self.config.per_page.max(1);
        let mut logins = Vec::new();
        let mut page: usize = 1;

        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("role", role)
                .append_pair("per_page", &per_page.to_string())
                .append_pair("page", &page.to_string());

            debug!(url = %page_url, "listing accounts");
            let response = self.send(self.http.get(page_url)).await?;
            let accounts: Vec<Account> = response
                .json()
                .await
                .map_err(|e| DirectoryError::invalid_response(e.to_string()))?;

            let fetched = accounts.len();
            logins.extend(accounts.into_iter().map(|account| Identity::new(account.login)));
            if fetched < per_page {
                return Ok(logins);
            }
            page = page
                .checked_add(1)
                .ok_or_else(|| DirectoryError::invalid_response("page counter overflow"))?;
        }
    }

    async fn send(&self, request: RequestBuilder) -> DirectoryResult<Response> {
        let request = match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::request_failed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DirectoryError::status(status.as_u16(), body))
    }

    fn membership_url(&self, group: &GroupRef, identity: &Identity) -> DirectoryResult<Url> {
        self.endpoint(&[
            "orgs",
            group.org.as_str(),
            "teams",
            group.name.as_str(),
            "memberships",
            identity.as_str(),
        ])
    }
}

#[async_trait]
impl DirectoryClient for GitHubDirectory {
    async fn list_members(&self, group: &GroupRef, role: Role) -> DirectoryResult<Vec<Identity>> {
        let url = self.endpoint(&[
            "orgs",
            group.org.as_str(),
            "teams",
            group.name.as_str(),
            "members",
        ])?;
        self.list_logins(&url, role.as_str()).await
    }

    async fn list_org_admins(&self, org: &str) -> DirectoryResult<Vec<Identity>> {
        let url = self.endpoint(&["orgs", org, "members"])?;
        self.list_logins(&url, "admin").await
    }

    async fn upsert_membership(
        &self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> DirectoryResult<()> {
        let url = self.membership_url(group, identity)?;
        self.send(
            self.http
                .put(url)
                .json(&serde_json::json!({ "role": role.as_str() })),
        )
        .await?;
        Ok(())
    }

    async fn remove_membership(
        &self,
        group: &GroupRef,
        identity: &Identity,
    ) -> DirectoryResult<()> {
        let url = self.membership_url(group, identity)?;
        self.send(self.http.delete(url)).await?;
        Ok(())
    }
}
