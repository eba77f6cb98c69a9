//! Image resolution: turns an image reference into a decoded image.
//!
//! A reference is one of:
//! - a `data:` URL with a base64 payload
//! - an `http://` or `https://` URL
//! - a local file path (HEIC/HEIF decoded when the `heif` feature is on)

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::error::{MemeforgeError, Result};
use crate::render::context::RenderContext;

/// Async image supply. The only suspension point of a render pass.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, reference: &str) -> Result<Arc<DynamicImage>>;
}

/// Loader for data URLs, http(s) and local files, with an in-memory cache.
#[derive(Debug, Clone)]
pub struct DefaultImageLoader {
    ctx: RenderContext,
}

impl DefaultImageLoader {
    pub fn new(ctx: RenderContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }
}

#[async_trait]
impl ImageLoader for DefaultImageLoader {
    async fn load(&self, reference: &str) -> Result<Arc<DynamicImage>> {
        fetch_image_with_ctx(reference, &self.ctx).await
    }
}

/// Resolve a reference using the context's HTTP client and cache.
pub async fn fetch_image_with_ctx(reference: &str, ctx: &RenderContext) -> Result<Arc<DynamicImage>> {
    if let Some(image) = ctx.cached(reference).await {
        tracing::debug!(reference = short(reference), "image cache hit");
        return Ok(image);
    }

    let image = if reference.starts_with("data:") {
        decode_data_url(reference)?
    } else if reference.starts_with("http://") || reference.starts_with("https://") {
        download(reference, &ctx.http_client).await?
    } else {
        let path = Path::new(reference);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MemeforgeError::ImageLoad(format!("Failed to read {}: {}", path.display(), e)))?;
        decode_bytes(&bytes, Some(path))?
    };

    let image = Arc::new(image);
    ctx.store(reference, Arc::clone(&image)).await;
    tracing::debug!(
        reference = short(reference),
        width = image.width(),
        height = image.height(),
        "image loaded"
    );
    Ok(image)
}

async fn download(url: &str, client: &reqwest::Client) -> Result<DynamicImage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| MemeforgeError::ImageLoad(format!("Failed to download {}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(MemeforgeError::ImageLoad(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| MemeforgeError::ImageLoad(format!("Failed to read image data: {}", e)))?;
    decode_bytes(&bytes, None)
}

/// Decode a `data:[<mime>][;base64],<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<DynamicImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| MemeforgeError::ImageLoad("Not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| MemeforgeError::ImageLoad("Data URL has no payload".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(MemeforgeError::ImageLoad(
            "Only base64 data URLs are supported".to_string(),
        ));
    }
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| MemeforgeError::ImageLoad(format!("Invalid base64 payload: {}", e)))?;
    decode_bytes(&bytes, None)
}

/// Encode an image as a PNG data URL.
pub fn encode_png_data_url(image: &DynamicImage) -> Result<String> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| MemeforgeError::Encode(format!("Failed to encode PNG: {}", e)))?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&bytes)))
}

/// Decode raw bytes, routing HEIC/HEIF containers to libheif.
fn decode_bytes(bytes: &[u8], path: Option<&Path>) -> Result<DynamicImage> {
    let heic_name = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("heic") || e.eq_ignore_ascii_case("heif"));

    if is_heic(bytes) || heic_name {
        return decode_heic(bytes);
    }

    image::load_from_memory(bytes).map_err(|e| MemeforgeError::ImageLoad(format!("Failed to decode image: {}", e)))
}

/// Detect an ISO-BMFF container with a HEIF-family brand.
pub fn is_heic(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    // Box size (4 bytes) followed by "ftyp"
    if &data[4..8] != b"ftyp" {
        return false;
    }

    let brand = &data[8..12];
    matches!(
        brand,
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"hevm" | b"hevs" | b"mif1" | b"msf1"
    )
}

#[cfg(feature = "heif")]
fn decode_heic(data: &[u8]) -> Result<DynamicImage> {
    use image::RgbImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data)
        .map_err(|e| MemeforgeError::ImageLoad(format!("Failed to read HEIC: {}", e)))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| MemeforgeError::ImageLoad(format!("Failed to get primary image: {}", e)))?;
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| MemeforgeError::ImageLoad(format!("Failed to decode HEIC image: {}", e)))?;

    let planes = image.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| MemeforgeError::ImageLoad("No interleaved RGB data in HEIC".to_string()))?;

    let (width, height) = (image.width(), image.height());
    let stride = interleaved.stride;
    let data = interleaved.data;

    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let offset = y as usize * stride + x as usize * 3;
        match data.get(offset..offset + 3) {
            Some(px) => image::Rgb([px[0], px[1], px[2]]),
            None => image::Rgb([0, 0, 0]),
        }
    });

    Ok(DynamicImage::ImageRgb8(rgb))
}

#[cfg(not(feature = "heif"))]
fn decode_heic(_data: &[u8]) -> Result<DynamicImage> {
    Err(MemeforgeError::ImageLoad(
        "HEIC images need the `heif` feature".to_string(),
    ))
}

/// Shorten data URLs for log output.
fn short(reference: &str) -> &str {
    if reference.starts_with("data:") {
        "data:…"
    } else {
        reference
    }
}
