use std::collections::HashMap;
use futures::future::join_all;
use log::{info, warn};
use reqwest::Client;
use crate::backend::schemas::ImageDescriptor;
use crate::error::{Error, Result};
use crate::job::ResultImage;

/// Downloads the result images of a completed job.
#[derive(Debug, Clone, Default)]
pub struct ArtifactFetcher {
    client: Client,
}

impl ArtifactFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download every descriptor concurrently. Images that fail are logged
    /// and left out; the rest keep descriptor order.
    pub async fn fetch_all(
        &self,
        descriptors: &[ImageDescriptor],
        seeds: &HashMap<String, String>,
    ) -> Vec<ResultImage> {
        let downloads = descriptors.iter().map(|descriptor| async move {
            match self.download(&descriptor.url).await {
                Ok(bytes) => Some(ResultImage {
                    image_id: descriptor.id.clone(),
                    seed: seeds.get(&descriptor.id).cloned().unwrap_or_default(),
                    url: descriptor.url.clone(),
                    bytes,
                    local_path: None,
                }),
                Err(e) => {
                    warn!("Skipping image {}: {}", descriptor.id, e);
                    None
                }
            }
        });

        let images: Vec<ResultImage> = join_all(downloads).await.into_iter().flatten().collect();
        info!("Fetched {} of {} images", images.len(), descriptors.len());

        images
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(Error::BadStatus {
                method: "GET",
                url: url.to_string(),
                status: response.status(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
