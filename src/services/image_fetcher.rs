//! Turns remote preview URLs into inline `data:` URLs.
//!
//! Inlining keeps the tile independent of the remote host once captured. A
//! failed download is not fatal: the scheduler keeps the remote URL.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::types::errors::FetchError;

/// Downloaded image bytes with their declared media type.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            BASE64.encode(&self.bytes)
        )
    }
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// Media type to inline a response as. A declared non-image type is refused;
/// a missing header is assumed to be JPEG.
pub fn image_content_type(header: Option<&str>) -> Result<String, FetchError> {
    let Some(raw) = header else {
        return Ok("image/jpeg".to_string());
    };
    let media = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if media.starts_with("image/") {
        Ok(media)
    } else {
        Err(FetchError::NotAnImage(raw.to_string()))
    }
}

/// `reqwest`-backed fetcher with a body size cap.
#[cfg(feature = "network")]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

#[cfg(feature = "network")]
impl HttpImageFetcher {
    pub fn new(max_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!("tabmosaic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self::with_client(client, max_bytes))
    }

    pub fn with_client(client: reqwest::Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }
}

#[cfg(feature = "network")]
#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                return Err(FetchError::TooLarge(len as usize));
            }
        }

        let content_type = image_content_type(
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        )?;

        // Content-Length may be absent or wrong; stop reading at the cap.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge(bytes.len() + chunk.len()));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchedImage {
            content_type,
            bytes,
        })
    }
}
