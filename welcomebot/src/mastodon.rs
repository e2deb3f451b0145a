use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::error::ClientError;
use crate::models::{PageQuery, Status, StatusId};
use crate::timeline::Timeline;

/// Scopes requested at login. Reading the tag timeline and boosting.
const SCOPES: &str = "read write:statuses";

#[derive(Clone)]
pub struct MastodonCredentials {
    pub api_base_url: Url,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for MastodonCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonCredentials")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Logged-in session against one Mastodon instance.
///
/// Built once per process and shared by reference; every request reuses the
/// same connection pool and bearer token.
#[derive(Clone)]
pub struct MastodonClient {
    base_url: Url,
    client: Client,
    access_token: String,
}

impl fmt::Debug for MastodonClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MastodonClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl MastodonClient {
    /// Exchange username and password for a token via the OAuth password
    /// grant. Without a `timeout` requests may block indefinitely.
    pub async fn login(
        credentials: &MastodonCredentials,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        tracing::info!(
            api_base_url = %credentials.api_base_url,
            client_id = %credentials.client_id,
            username = %credentials.username,
            "logging in"
        );
        let url = endpoint(&credentials.api_base_url, &["oauth", "token"])?;
        let response = client
            .post(url)
            .form(&[
                ("grant_type", "password"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("scope", SCOPES),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthError>(&body) {
                Ok(oauth) => ClientError::Auth(oauth.error_description.unwrap_or(oauth.error)),
                Err(_) => ClientError::Api {
                    status: status.as_u16(),
                    body,
                },
            });
        }
        let token: TokenResponse = decode(response).await?;
        if token.access_token.is_empty() {
            return Err(ClientError::Auth("server returned an empty access token".into()));
        }
        tracing::info!("logged in");
        tracing::debug!(token_len = token.access_token.len(), "received access token");

        Ok(Self::with_token(
            credentials.api_base_url.clone(),
            client,
            token.access_token,
        ))
    }

    /// Session around a token obtained elsewhere.
    pub fn with_token(base_url: Url, client: Client, access_token: String) -> Self {
        Self {
            base_url,
            client,
            access_token,
        }
    }
}

#[async_trait]
impl Timeline for MastodonClient {
    async fn hashtag_page(&self, query: &PageQuery) -> Result<Vec<Status>, ClientError> {
        let tag = query.hashtag.trim_start_matches('#');
        let url = endpoint(&self.base_url, &["api", "v1", "timelines", "tag", tag])?;

        let mut params = vec![("limit", query.limit.to_string())];
        if query.local_only {
            params.push(("local", "true".to_string()));
        }
        if let Some(since_id) = &query.since_id {
            params.push(("since_id", since_id.to_string()));
        }
        if let Some(max_id) = &query.max_id {
            params.push(("max_id", max_id.to_string()));
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&params)
            .send()
            .await?;
        let page: Vec<Status> = decode(check_status(response).await?).await?;
        if page.len() > query.limit as usize {
            return Err(ClientError::Decode(format!(
                "asked for at most {} statuses, got {}",
                query.limit,
                page.len()
            )));
        }
        Ok(page)
    }

    async fn reblog(&self, id: &StatusId) -> Result<(), ClientError> {
        let url = endpoint(
            &self.base_url,
            &["api", "v1", "statuses", id.as_str(), "reblog"],
        )?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// Append percent-encoded path segments to the instance base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::Decode(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
}
