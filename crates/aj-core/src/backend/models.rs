use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method};
use crate::backend::{send_authorized, ApiConfig};
use crate::backend::schemas::ModelResponse;
use crate::error::{Error, Result};
use crate::model_types::{ModelDefinition, ModelType};

/// Outcome of looking a model up in the remote catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResolution {
    Found(ModelDefinition),
    /// The model exists but is not of the requested type
    TypeMismatch {
        model_id: String,
        expected: ModelType,
        reported: String,
    },
}

impl ModelResolution {
    /// Collapse a mismatch into "no usable model".
    pub fn into_definition(self) -> Option<ModelDefinition> {
        match self {
            Self::Found(def) => Some(def),
            Self::TypeMismatch { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<ModelDefinition> {
        match self {
            Self::Found(def) => Ok(def),
            Self::TypeMismatch { model_id, expected, reported } => {
                Err(Error::TypeMismatch { model_id, expected, reported })
            }
        }
    }
}

#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn resolve(&self, model_id: &str, expected: ModelType) -> Result<ModelResolution>;

    /// Same as `resolve`, with a type mismatch reported as `None`.
    async fn resolve_definition(&self, model_id: &str, expected: ModelType) -> Result<Option<ModelDefinition>> {
        Ok(self.resolve(model_id, expected).await?.into_definition())
    }
}

pub struct ModelCatalogClient {
    config: ApiConfig,
    client: Client,
}

impl ModelCatalogClient {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: ApiConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl ModelCatalog for ModelCatalogClient {
    async fn resolve(&self, model_id: &str, expected: ModelType) -> Result<ModelResolution> {
        let path = format!("/v1/models/{}", model_id);
        debug!("Fetching model from {}", self.config.endpoint(&path));

        let response = send_authorized(&self.client, &self.config, Method::GET, &path, |req| req).await?;
        let resp: ModelResponse = response.json().await?;
        let details = resp.model;

        if ModelType::from_wire_name(&details.model_type) != Some(expected) {
            info!(
                "Model {} is a {}, not a {}; ignoring",
                details.id, details.model_type, expected
            );
            return Ok(ModelResolution::TypeMismatch {
                model_id: details.id,
                expected,
                reported: details.model_type,
            });
        }

        let name = details.display_name().to_string();
        Ok(ModelResolution::Found(ModelDefinition::new(details.id, name, expected)))
    }
}
