//! API request descriptions

use serde::Serialize;
use url::Url;

use crate::utils::{ReaderError, Result};

/// HTTP methods used by the reader API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    segments: Vec<String>,
    body: Option<serde_json::Value>,
}

impl Request {
    /// Create a new request from raw path segments
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::Get, segments)
    }

    /// Create a POST request
    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::Post, segments)
    }

    /// Attach a JSON body
    pub fn json(mut self, body: &impl Serialize) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Display form used in logs
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Resolve against the API base; segments are percent-encoded
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ReaderError::Config(format!("API base URL {} cannot hold a path", base)))?
            .pop_if_empty()
            .extend(&self.segments);
        Ok(url)
    }
}
