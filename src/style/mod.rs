//! # Artistic Styles
//!
//! A style turns an image into a new image with the same content and size.
//! The renderer only sees the [`StyleFilterEngine`] capability; which engine
//! answers is chosen by [`StyleBackend`] in the config.
//!
//! - [`local`]: in-process looks
//! - [`remote`]: HTTP stylization service

pub mod local;
pub mod remote;

pub use local::{LOOKS, LocalStyleEngine, Look};
pub use remote::RemoteStyleEngine;

use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MemeforgeError, Result};

/// Capability: apply a named style to an image.
#[async_trait]
pub trait StyleFilterEngine: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Restyle `image`. `intensity` is in [0, 1].
    async fn apply(&self, image: &DynamicImage, style_id: &str, intensity: f32) -> Result<DynamicImage>;
}

/// Which engine answers style requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleBackend {
    #[default]
    Local,
    Remote {
        endpoint: String,
        #[serde(default)]
        api_key: Option<String>,
    },
}

impl StyleBackend {
    /// Build the configured engine.
    pub fn engine(&self, http_client: reqwest::Client) -> Arc<dyn StyleFilterEngine> {
        match self {
            StyleBackend::Local => Arc::new(LocalStyleEngine),
            StyleBackend::Remote { endpoint, api_key } => {
                Arc::new(RemoteStyleEngine::new(http_client, endpoint.clone(), api_key.clone()))
            }
        }
    }
}

/// How a style request ended.
#[derive(Debug)]
pub enum StyleOutcome {
    /// The engine answered in time.
    Styled(DynamicImage),
    /// The engine failed or timed out; the original image is returned.
    Fallback { image: DynamicImage, error: MemeforgeError },
}

impl StyleOutcome {
    pub fn into_image(self) -> DynamicImage {
        match self {
            StyleOutcome::Styled(image) => image,
            StyleOutcome::Fallback { image, .. } => image,
        }
    }

    pub fn is_styled(&self) -> bool {
        matches!(self, StyleOutcome::Styled(_))
    }
}

/// Run `engine` with a deadline. Failure and timeout fall back to `image`.
pub async fn apply_style_with_timeout(
    engine: &dyn StyleFilterEngine,
    image: &DynamicImage,
    style_id: &str,
    intensity: f32,
    timeout: Duration,
) -> StyleOutcome {
    let result = tokio::time::timeout(timeout, engine.apply(image, style_id, intensity)).await;
    let error = match result {
        Ok(Ok(styled)) => {
            tracing::debug!(engine = engine.name(), style = style_id, "style applied");
            return StyleOutcome::Styled(styled);
        }
        Ok(Err(e)) => e,
        Err(_) => MemeforgeError::StyleTimeout(timeout),
    };

    tracing::warn!(engine = engine.name(), style = style_id, error = %error, "style failed, keeping original image");
    StyleOutcome::Fallback {
        image: image.clone(),
        error,
    }
}
