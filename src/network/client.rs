//! Authenticated REST client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::auth::Credentials;
use super::dto::{ExternalPagesDto, LocalPagesDto};
use super::request::{Method, Request};
use crate::config::ReaderConfig;
use crate::content::{ChapterContent, ChapterSource};
use crate::model::ChapterKey;
use crate::reader::{ProgressRecord, ProgressSink};
use crate::utils::{NetworkError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("manga-reader/", env!("CARGO_PKG_VERSION"));

/// REST client attaching bearer tokens, with one retry after a refresh
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    credentials: Option<Arc<dyn Credentials>>,
}

impl ApiClient {
    /// Create a client for the given API base
    pub fn new(base: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base,
            credentials: None,
        })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        Self::new(config.api_base_url.clone())
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Execute a request, refreshing credentials once on 401
    pub async fn execute(&self, request: &Request) -> Result<reqwest::Response> {
        let token = match &self.credentials {
            Some(credentials) => credentials.access_token().await,
            None => None,
        };
        let response = self.send(request, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response);
        }

        let Some(credentials) = &self.credentials else {
            return Err(NetworkError::Unauthorized.into());
        };
        log::debug!("Refreshing credentials after 401 on {}", request.path());
        match credentials.refresh().await? {
            Some(token) => check_status(self.send(request, Some(&token)).await?),
            None => Err(NetworkError::Unauthorized.into()),
        }
    }

    /// GET and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, request: &Request) -> Result<T> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST a JSON body, discarding the response
    pub async fn post_json(&self, segments: &[&str], body: &impl Serialize) -> Result<()> {
        let request = Request::post(segments.iter().copied()).json(body)?;
        self.execute(&request).await?;
        Ok(())
    }

    async fn send(&self, request: &Request, token: Option<&str>) -> Result<reqwest::Response> {
        let url = request.url(&self.base)?;
        log::debug!("{:?} {}", request.method(), url);
        let mut builder = match request.method() {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    match status_error(response.status()) {
        Some(e) => Err(e.into()),
        None => Ok(response),
    }
}

fn status_error(status: StatusCode) -> Option<NetworkError> {
    if status.is_success() {
        None
    } else if status == StatusCode::UNAUTHORIZED {
        Some(NetworkError::Unauthorized)
    } else {
        Some(NetworkError::Http {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("unknown status").to_string(),
        })
    }
}

#[async_trait]
impl ChapterSource for ApiClient {
    async fn fetch_chapter(&self, key: &ChapterKey) -> Result<ChapterContent> {
        match key {
            ChapterKey::Local(id) => {
                let id_segment = id.to_string();
                let request = Request::get(["chapters", id_segment.as_str(), "pages"]);
                let dto: LocalPagesDto = self.get_json(&request).await?;
                Ok(ChapterContent::Local(dto.into_chapter(*id)))
            }
            ChapterKey::External(id) => {
                let request = Request::get(["external", "chapters", id.as_str(), "pages"]);
                let dto: ExternalPagesDto = self.get_json(&request).await?;
                Ok(ChapterContent::External(dto.into_chapter(id)?))
            }
        }
    }
}

#[async_trait]
impl ProgressSink for ApiClient {
    async fn record_progress(&self, record: &ProgressRecord) -> Result<()> {
        self.post_json(&["progress"], record).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}
