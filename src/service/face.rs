use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Face-similarity oracle: does the captured image show the profile's face?
#[async_trait]
pub trait FaceMatcher: Send + Sync {
    async fn matches(&self, profile_image: &str, captured_image: &str) -> Result<bool, AppError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchRequest<'a> {
    profile_image_url: &'a str,
    captured_image_url: &'a str,
}

#[derive(Deserialize)]
struct MatchResponse {
    #[serde(rename = "match")]
    matched: bool,
}

/// Delegates the comparison to an HTTP service.
pub struct RemoteFaceMatcher {
    client: reqwest::Client,
    url: String,
}

impl RemoteFaceMatcher {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FaceMatcher for RemoteFaceMatcher {
    async fn matches(&self, profile_image: &str, captured_image: &str) -> Result<bool, AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(&MatchRequest {
                profile_image_url: profile_image,
                captured_image_url: captured_image,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("face match request failed: {e}")))?;

        let body: MatchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("face match returned bad body: {e}")))?;

        Ok(body.matched)
    }
}

/// Used when no oracle is configured.
pub struct DisabledFaceMatcher;

#[async_trait]
impl FaceMatcher for DisabledFaceMatcher {
    async fn matches(&self, _profile_image: &str, _captured_image: &str) -> Result<bool, AppError> {
        Err(AppError::Upstream(
            "Face verification is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
pub struct FixedFaceMatcher(pub bool);

#[cfg(test)]
#[async_trait]
impl FaceMatcher for FixedFaceMatcher {
    async fn matches(&self, _profile_image: &str, _captured_image: &str) -> Result<bool, AppError> {
        Ok(self.0)
    }
}
