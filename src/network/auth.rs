//! Bearer credentials

use async_trait::async_trait;

use crate::utils::Result;

/// Supplies bearer tokens and renews them after a rejection
#[async_trait]
pub trait Credentials: Send + Sync {
    /// Token to attach, if the user is signed in
    async fn access_token(&self) -> Option<String>;

    /// Renew after a 401; `None` when the session cannot be renewed
    async fn refresh(&self) -> Result<Option<String>>;
}

/// A fixed token that cannot be refreshed
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl Credentials for StaticToken {
    async fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }

    async fn refresh(&self) -> Result<Option<String>> {
        Ok(None)
    }
}
