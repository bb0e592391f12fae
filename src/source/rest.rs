//! REST client for a gallery server.
//!
//! Endpoints:
//! - `GET /images?page=P&limit=L` -> `{ images, hasMore }`
//! - `DELETE /images/{id}` -> `{ success }`
//! - `GET /images/download/{id}` -> file bytes
//! - `GET {imageUrl}` -> file bytes (relative URLs resolve against the base)

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{GalleryError, Result};
use crate::state::data::{ItemId, Page};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of `DELETE /images/{id}`.
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    success: bool,
}

/// Client for one gallery server.
#[derive(Debug, Clone)]
pub struct RestSource {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestSource {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| GalleryError::Config(format!("invalid base_url {base_url:?}: {e}")))?;

        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GalleryError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base/<segments...>`, with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GalleryError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve an `imageUrl`, which may be relative to the server.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.base_url
            .join(url.trim_start_matches('/'))
            .map_err(|e| GalleryError::Network(format!("invalid image URL {url:?}: {e}")))
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(
            USER_AGENT,
            format!("image-gallery/{}", env!("CARGO_PKG_VERSION")),
        );
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.request(builder).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GalleryError::NotFound(response.url().to_string()));
        }
        if !status.is_success() {
            return Err(GalleryError::Network(format!(
                "{} answered {}",
                response.url(),
                status
            )));
        }
        Ok(response)
    }

    pub async fn list_images(&self, page: u32, limit: u32) -> Result<Page> {
        let mut url = self.endpoint(&["images"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        debug!(%url, "Fetching page");

        let response = self.send(self.client.get(url)).await?;
        Ok(response.json::<Page>().await?)
    }

    pub async fn delete_image(&self, id: &ItemId) -> Result<()> {
        let url = self.endpoint(&["images", id.as_str()])?;
        debug!(%url, "Deleting image");

        let body: DeleteResponse = self.send(self.client.delete(url)).await?.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(GalleryError::Network(format!("server refused to delete {id}")))
        }
    }

    pub async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(url)?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn download(&self, id: &ItemId) -> Result<Vec<u8>> {
        let url = self.endpoint(&["images", "download", id.as_str()])?;
        debug!(%url, "Downloading image");

        let response = self.send(self.client.get(url)).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
