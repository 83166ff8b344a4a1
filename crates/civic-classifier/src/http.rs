//! HTTP client for the external classification service.
//!
//! | Method | Endpoint        | Body / Query                 | Response                  |
//! |--------|-----------------|------------------------------|---------------------------|
//! | POST   | `text_url`      | `{"text": "..."}`            | `{"text_category": "..."}`|
//! | GET    | `cluster_url`   | `?latitude=..&longitude=..`  | `{"nearest_district": n}` |

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use civic_core::{GeoPoint, IssueCategory};

use crate::config::ClassifierConfig;
use crate::error::ClassifierError;
use crate::IssueClassifier;

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TextResponse {
    #[serde(default)]
    text_category: Option<String>,
}

#[derive(Deserialize)]
struct ClusterResponse {
    nearest_district: i32,
}

/// [`IssueClassifier`] backed by the remote service.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http: reqwest::Client,
    text_url: Url,
    cluster_url: Url,
}

impl HttpClassifier {
    /// Build a client from configuration.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            text_url: config.text_url,
            cluster_url: config.cluster_url,
        })
    }
}

async fn check_status(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ClassifierError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
    Err(ClassifierError::Api {
        endpoint: endpoint.into(),
        status,
        body,
    })
}

#[async_trait]
impl IssueClassifier for HttpClassifier {
    async fn classify_text(&self, text: &str) -> Result<IssueCategory, ClassifierError> {
        let endpoint = "POST text_category";
        let resp = self
            .http
            .post(self.text_url.clone())
            .json(&TextRequest { text })
            .send()
            .await
            .map_err(|e| ClassifierError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        let resp = check_status(endpoint, resp).await?;

        let body: TextResponse =
            resp.json()
                .await
                .map_err(|e| ClassifierError::Deserialization {
                    endpoint: endpoint.into(),
                    source: e,
                })?;
        Ok(body
            .text_category
            .as_deref()
            .map(IssueCategory::from_label)
            .unwrap_or(IssueCategory::Other))
    }

    async fn cluster_for(&self, point: GeoPoint) -> Result<i32, ClassifierError> {
        let endpoint = "GET nearest_district";
        let resp = self
            .http
            .get(self.cluster_url.clone())
            .query(&[("latitude", point.lat), ("longitude", point.lng)])
            .send()
            .await
            .map_err(|e| ClassifierError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        let resp = check_status(endpoint, resp).await?;

        let body: ClusterResponse =
            resp.json()
                .await
                .map_err(|e| ClassifierError::Deserialization {
                    endpoint: endpoint.into(),
                    source: e,
                })?;
        Ok(body.nearest_district)
    }
}
