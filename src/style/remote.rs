//! Style engine backed by an HTTP endpoint.
//!
//! Request: `POST {endpoint}` with JSON
//! `{"imageData": "data:image/png;base64,...", "styleId": "...", "intensity": 0.8}`.
//! Response: `{"styledImage": "data:image/...;base64,..."}`.

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::StyleFilterEngine;
use crate::error::{MemeforgeError, Result};
use crate::resolve::{decode_data_url, encode_png_data_url};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StyleRequest<'a> {
    image_data: String,
    style_id: &'a str,
    intensity: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleResponse {
    styled_image: String,
}

/// Remote stylization service client.
#[derive(Debug, Clone)]
pub struct RemoteStyleEngine {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteStyleEngine {
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StyleFilterEngine for RemoteStyleEngine {
    fn name(&self) -> &str {
        "remote"
    }

    async fn apply(&self, image: &DynamicImage, style_id: &str, intensity: f32) -> Result<DynamicImage> {
        let body = StyleRequest {
            image_data: encode_png_data_url(image)?,
            style_id,
            intensity: intensity.clamp(0.0, 1.0),
        };

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MemeforgeError::Style(format!("Failed to reach {}: {}", self.endpoint, e)))?;
        if !response.status().is_success() {
            return Err(MemeforgeError::Style(format!(
                "{} answered HTTP {}",
                self.endpoint,
                response.status()
            )));
        }

        let payload: StyleResponse = response
            .json()
            .await
            .map_err(|e| MemeforgeError::Style(format!("Invalid style response: {}", e)))?;

        decode_data_url(&payload.styled_image)
            .map_err(|e| MemeforgeError::Style(format!("Invalid styled image: {}", e)))
    }
}
