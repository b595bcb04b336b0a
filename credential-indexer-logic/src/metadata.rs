use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, serde_as};
use thiserror::Error;

use crate::{content::IpfsGateway, settings::MetadataClientSettings};

/// Only `title` and `description` are required. Optional fields with an
/// unexpected shape are dropped instead of rejecting the document.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMetadata {
    pub title: String,
    pub description: String,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Unix time in milliseconds.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<u64>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<MetadataLink>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("metadata gateway responded with {0}")]
    Status(StatusCode),
}

/// Fetches credential metadata documents through the content gateway.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: reqwest::Client,
    gateway: IpfsGateway,
}

impl MetadataClient {
    pub fn new(
        gateway: IpfsGateway,
        settings: &MetadataClientSettings,
    ) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client, gateway })
    }

    /// `Ok(None)` when the document does not exist or is not credential metadata.
    /// Transport failures and other error statuses are returned as errors.
    pub async fn fetch(&self, locator: &str) -> Result<Option<CredentialMetadata>, MetadataError> {
        let url = self.gateway.to_gateway_url(locator);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MetadataError::Status(status));
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<CredentialMetadata>(&body) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(err) => {
                tracing::debug!(url, err = %err, "content is not credential metadata");
                Ok(None)
            }
        }
    }
}
