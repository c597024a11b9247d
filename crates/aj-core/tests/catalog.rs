mod common;

use aj_core::backend::{ModelCatalog, ModelCatalogClient, ModelResolution};
use aj_core::registry::MODELS_FILE;
use aj_core::{ModelDefinition, ModelRegistry, ModelType};
use common::{MockServer, TOKEN, scratch_dir};
use serde_json::json;

async fn catalog_server() -> MockServer {
    let server = MockServer::start().await;
    server.with(|m| {
        m.models.insert(
            "757279507095956705".into(),
            json!({ "id": "757279507095956705", "name": "flux1-dev.safetensors", "modelType": "CHECKPOINT", "projectName": "Flux Dev" }),
        );
        m.models.insert(
            "900".into(),
            json!({ "id": "900", "name": "ink.safetensors", "modelType": "LORA" }),
        );
    });
    server
}

#[tokio::test]
async fn test_resolve_uses_project_name() {
    let server = catalog_server().await;
    let catalog = ModelCatalogClient::new(server.config());

    let resolution = catalog.resolve("757279507095956705", ModelType::Checkpoint).await.unwrap();
    assert_eq!(
        resolution,
        ModelResolution::Found(ModelDefinition::new("757279507095956705", "Flux Dev", ModelType::Checkpoint))
    );
    server.with(|m| assert_eq!(m.authorization, [format!("Bearer {}", TOKEN)]));
}

#[tokio::test]
async fn test_resolve_reports_type_mismatch() {
    let server = catalog_server().await;
    let catalog = ModelCatalogClient::new(server.config());

    let resolution = catalog.resolve("900", ModelType::Checkpoint).await.unwrap();
    assert!(matches!(resolution, ModelResolution::TypeMismatch { ref reported, .. } if reported == "LORA"));
    assert!(catalog.resolve_definition("900", ModelType::Checkpoint).await.unwrap().is_none());
    assert!(resolution.into_result().is_err());
}

#[tokio::test]
async fn test_unknown_model_is_request_error() {
    let server = catalog_server().await;
    let catalog = ModelCatalogClient::new(server.config());

    let err = catalog.resolve("1", ModelType::Adapter).await.unwrap_err();
    assert!(err.is_request_error());
}

#[tokio::test]
async fn test_register_from_catalog_url() {
    let server = catalog_server().await;
    let catalog = ModelCatalogClient::new(server.config());
    let path = scratch_dir().join(MODELS_FILE);

    let mut registry = ModelRegistry::load(&path).await.unwrap();
    let added = registry
        .register_from_input("https://tensor.art/models/900/ink-wash", ModelType::Adapter, &catalog)
        .await
        .unwrap();
    assert_eq!(added.map(|m| m.name), Some("ink.safetensors".to_string()));

    let skipped = registry.register_from_input("757279507095956705", ModelType::Adapter, &catalog).await.unwrap();
    assert!(skipped.is_none());

    let reloaded = ModelRegistry::load(&path).await.unwrap();
    assert_eq!(reloaded.all().len(), 1);
    assert_eq!(reloaded.models(ModelType::Adapter, false)[0].model_id, "900");
}
