use std::path::{Path, PathBuf};
use log::{info, warn};
use crate::backend::ModelCatalog;
use crate::error::{Error, Result};
use crate::model_types::{ModelDefinition, ModelType};
use crate::reference::parse_model_reference;

pub const MODELS_FILE: &str = "models.json";

/// Locally known remote models, persisted as an ordered JSON list.
///
/// Writes go through `&mut self`; callers serialize concurrent adds.
#[derive(Debug)]
pub struct ModelRegistry {
    path: PathBuf,
    models: Vec<ModelDefinition>,
}

impl ModelRegistry {
    /// Load the registry stored at `path`. A missing file is an empty registry.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let models = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No model registry at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, models })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> &[ModelDefinition] {
        &self.models
    }

    /// Definitions of one type, sorted by display name.
    pub fn models(&self, model_type: ModelType, include_hidden: bool) -> Vec<&ModelDefinition> {
        let mut models: Vec<_> = self
            .models
            .iter()
            .filter(|m| m.model_type == model_type && (include_hidden || !m.hidden))
            .collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    pub fn find(&self, model_id: &str, model_type: ModelType) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.is(model_id, model_type))
    }

    /// Append a definition and persist. Existing entries with the same
    /// identity are not checked for.
    pub async fn add(&mut self, model: ModelDefinition) -> Result<()> {
        info!("Registering {} {} ({})", model.model_type, model.model_id, model.name);
        self.models.push(model);
        self.save().await
    }

    /// Flag every entry with this identity as hidden or visible. Returns
    /// whether any entry matched.
    pub async fn set_hidden(&mut self, model_id: &str, model_type: ModelType, hidden: bool) -> Result<bool> {
        let mut matched = false;
        for model in self.models.iter_mut().filter(|m| m.is(model_id, model_type)) {
            model.hidden = hidden;
            matched = true;
        }

        if matched {
            self.save().await?;
        }
        Ok(matched)
    }

    /// Parse user input, resolve it against the catalog and register the
    /// result. Unparseable input and type mismatches yield `Ok(None)`;
    /// request failures are returned.
    pub async fn register_from_input(
        &mut self,
        input: &str,
        model_type: ModelType,
        catalog: &dyn ModelCatalog,
    ) -> Result<Option<ModelDefinition>> {
        let model_id = match parse_model_reference(input) {
            Ok(id) => id,
            Err(Error::InvalidReference(input)) => {
                warn!("Ignoring model input {:?}: not an id or catalog URL", input);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(model) = catalog.resolve_definition(&model_id, model_type).await? else {
            return Ok(None);
        };

        self.add(model.clone()).await?;
        Ok(Some(model))
    }

    async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(&self.models)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use crate::backend::ModelResolution;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("aj-registry-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    /// Catalog that answers from a fixed list and remembers what it was asked.
    struct FixedCatalog {
        known: Vec<(String, String, &'static str)>,
        lookups: Mutex<Vec<String>>,
    }

    impl FixedCatalog {
        fn new(known: &[(&str, &str, &'static str)]) -> Self {
            Self {
                known: known.iter().map(|(id, name, t)| (id.to_string(), name.to_string(), *t)).collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelCatalog for FixedCatalog {
        async fn resolve(&self, model_id: &str, expected: ModelType) -> Result<ModelResolution> {
            self.lookups.lock().unwrap().push(model_id.to_string());

            let (id, name, reported) = self
                .known
                .iter()
                .find(|(id, _, _)| id == model_id)
                .cloned()
                .expect("unknown model in test");

            if reported != expected.wire_name() {
                return Ok(ModelResolution::TypeMismatch {
                    model_id: id,
                    expected,
                    reported: reported.to_string(),
                });
            }
            Ok(ModelResolution::Found(ModelDefinition::new(id, name, expected)))
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let registry = ModelRegistry::load(scratch_file(MODELS_FILE)).await.unwrap();
        assert!(registry.all().is_empty());
    }

    #[tokio::test]
    async fn test_add_persists_in_order() {
        let path = scratch_file(MODELS_FILE);
        let mut registry = ModelRegistry::load(&path).await.unwrap();

        registry.add(ModelDefinition::new("2", "Zeta", ModelType::Checkpoint)).await.unwrap();
        registry.add(ModelDefinition::new("1", "Alpha", ModelType::Checkpoint)).await.unwrap();
        registry.add(ModelDefinition::new("2", "Zeta", ModelType::Checkpoint)).await.unwrap();

        let reloaded = ModelRegistry::load(&path).await.unwrap();
        let ids: Vec<_> = reloaded.all().iter().map(|m| m.model_id.as_str()).collect();
        assert_eq!(ids, ["2", "1", "2"]);

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["modelType"], "CHECKPOINT");
    }

    #[tokio::test]
    async fn test_listing_filters_and_sorts() {
        let mut registry = ModelRegistry::load(scratch_file(MODELS_FILE)).await.unwrap();
        registry.add(ModelDefinition::new("1", "Watercolor", ModelType::Adapter)).await.unwrap();
        registry.add(ModelDefinition::new("2", "Realism", ModelType::Checkpoint)).await.unwrap();
        registry.add(ModelDefinition::new("3", "Charcoal", ModelType::Adapter)).await.unwrap();
        registry.add(ModelDefinition::new("4", "Blur", ModelType::Adapter)).await.unwrap();

        assert!(registry.set_hidden("4", ModelType::Adapter, true).await.unwrap());
        assert!(!registry.set_hidden("4", ModelType::Checkpoint, true).await.unwrap());

        let visible: Vec<_> = registry.models(ModelType::Adapter, false).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(visible, ["Charcoal", "Watercolor"]);

        let all: Vec<_> = registry.models(ModelType::Adapter, true).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(all, ["Blur", "Charcoal", "Watercolor"]);

        assert!(registry.find("2", ModelType::Checkpoint).is_some());
        assert!(registry.find("2", ModelType::Adapter).is_none());
    }

    #[tokio::test]
    async fn test_register_from_url() {
        let catalog = FixedCatalog::new(&[("757279507095956705", "Flux Dev", "CHECKPOINT")]);
        let mut registry = ModelRegistry::load(scratch_file(MODELS_FILE)).await.unwrap();

        let model = registry
            .register_from_input("https://tensor.art/models/757279507095956705/flux", ModelType::Checkpoint, &catalog)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(model.name, "Flux Dev");
        assert_eq!(registry.all(), [model]);
        assert_eq!(*catalog.lookups.lock().unwrap(), ["757279507095956705"]);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_silently_dropped() {
        // A checkpoint offered as an adapter is discarded without an error.
        let catalog = FixedCatalog::new(&[("12", "Realism", "CHECKPOINT")]);
        let mut registry = ModelRegistry::load(scratch_file(MODELS_FILE)).await.unwrap();

        let model = registry.register_from_input("12", ModelType::Adapter, &catalog).await.unwrap();

        assert!(model.is_none());
        assert!(registry.all().is_empty());
    }

    #[tokio::test]
    async fn test_bad_input_skips_catalog() {
        let catalog = FixedCatalog::new(&[]);
        let mut registry = ModelRegistry::load(scratch_file(MODELS_FILE)).await.unwrap();

        let model = registry.register_from_input("not a model", ModelType::Adapter, &catalog).await.unwrap();

        assert!(model.is_none());
        assert!(catalog.lookups.lock().unwrap().is_empty());
    }
}
