use async_trait::async_trait;
use image::RgbaImage;
use once_cell::sync::Lazy;
use reqwest::Client;

use crate::{core::constants::HTTP_TIMEOUT_SECS, MapError, Result};

/// Shared async HTTP client with a custom User-Agent so that public tile
/// servers (e.g. OpenStreetMap) don't reject the request. Building the client
/// once avoids the cost of TLS and connection pool setup for every tile.
/// Requests time out so a stuck server cannot hold a fetch worker forever.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("tilemap/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
});

/// Turns a URL into a drawable bitmap.
///
/// Implementations run inside spawned fetch tasks, so they must be `Send` and
/// `Sync`. The bitmap type has to match the one of the draw surface.
#[async_trait]
pub trait ImageLoader: Send + Sync + 'static {
    type Bitmap: Send + Sync + 'static;

    async fn load(&self, url: &str) -> Result<Self::Bitmap>;
}

/// Downloads images over HTTP(S) and decodes them into RGBA buffers
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new() -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
        }
    }

    /// Use a caller configured client (proxies, timeouts, headers)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MapError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    type Bitmap = RgbaImage;

    async fn load(&self, url: &str) -> Result<RgbaImage> {
        let bytes = self.fetch_bytes(url).await?;
        log::trace!("downloaded {} ({} bytes)", url, bytes.len());
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }
}
