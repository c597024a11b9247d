use std::sync::Arc;
use aj_core::archive::ARCHIVE_FILE;
use aj_core::backend::{GenerationJobClient, ModelCatalogClient};
use aj_core::registry::MODELS_FILE;
use aj_core::{
    AdapterReference, ArtifactFetcher, CheckpointReference, DirectoryChooser, Job, JobConfiguration,
    JobOrchestrator, JobStatus, ModelRegistry, ModelType, OutputArchive, parse_model_reference,
};
use tracing::{info, warn};
use crate::cli::GenerateArgs;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::picker::{FixedDirectoryChooser, RfdDirectoryChooser};

pub struct AppState {
    config: AppConfig,
    registry: ModelRegistry,
    archive: OutputArchive,
}

impl AppState {
    pub async fn load(config: AppConfig) -> anyhow::Result<Self> {
        let registry = ModelRegistry::load(config.data_dir.join(MODELS_FILE)).await?;
        let archive = OutputArchive::load(config.data_dir.join(ARCHIVE_FILE)).await?;

        Ok(Self { config, registry, archive })
    }

    pub async fn generate(&mut self, args: GenerateArgs) -> anyhow::Result<()> {
        let job_config = build_configuration(&args, &self.registry)?;
        let api = Arc::new(GenerationJobClient::new(self.config.api()?));
        let orchestrator = Arc::new(JobOrchestrator::new(api, ArtifactFetcher::new(), self.config.poll_policy));
        info!("Polling every {:?}", orchestrator.policy().interval);

        let mut status_rx = orchestrator.subscribe();
        let handle = orchestrator.start(&job_config).map_err(AppError::from)?;

        loop {
            status_rx.changed().await?;
            let status = *status_rx.borrow_and_update();
            if status == JobStatus::None {
                continue;
            }
            println!("{} {:?}", status.icon(), status);
            if status.is_complete() {
                break;
            }
        }

        let status = handle.await?;
        let mut job = orchestrator.job().ok_or(AppError::JobFailed("<none>".to_string()))?;

        if status == JobStatus::Failed {
            return Err(AppError::JobFailed(job.job_id().unwrap_or("<unsubmitted>").to_string()).into());
        }

        print_images(&job);

        if args.save {
            self.save(&mut job, &args).await?;
        }
        Ok(())
    }

    async fn save(&mut self, job: &mut Job, args: &GenerateArgs) -> anyhow::Result<()> {
        let chooser: Box<dyn DirectoryChooser> = match &args.output_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir).await?;
                self.archive.forget_capability().await?;
                Box::new(FixedDirectoryChooser(dir.clone()))
            }
            None => Box::new(RfdDirectoryChooser::default()),
        };

        match self.archive.save_job(job, chooser.as_ref()).await? {
            Some(report) => {
                for path in &report.saved {
                    println!("Saved {}", path.display());
                }
                if report.skipped > 0 {
                    warn!("{} image(s) could not be written", report.skipped);
                }
            }
            None => println!("Save cancelled"),
        }
        Ok(())
    }

    pub async fn add_model(&mut self, model_type: ModelType, reference: &str) -> anyhow::Result<()> {
        let catalog = ModelCatalogClient::new(self.config.api()?);

        match self.registry.register_from_input(reference.trim(), model_type, &catalog).await? {
            Some(model) => println!("Added {} {} ({})", model.model_type, model.model_id, model.name),
            None => println!("Nothing added: {:?} is not a known {}", reference, model_type),
        }
        Ok(())
    }

    pub fn list_models(&self, model_type: Option<ModelType>, include_hidden: bool) {
        let types = match model_type {
            Some(t) => vec![t],
            None => ModelType::all().to_vec(),
        };
        info!("Models registered in {}", self.registry.path().display());

        for t in types {
            for model in self.registry.models(t, include_hidden) {
                let hidden = if model.hidden { " (hidden)" } else { "" };
                println!("{:<10} {:<20} {}{}", t, model.model_id, model.name, hidden);
            }
        }
    }

    pub async fn hide_model(&mut self, model_type: ModelType, model_id: &str, hidden: bool) -> anyhow::Result<()> {
        if !self.registry.set_hidden(model_id, model_type, hidden).await? {
            return Err(AppError::UnknownModel {
                model_type,
                model_id: model_id.to_string(),
            }
            .into());
        }
        info!("{} {} hidden: {}", model_type, model_id, hidden);
        Ok(())
    }

    pub async fn history(&self) {
        info!("History stored in {}", self.archive.path().display());
        if let Some(capability) = self.archive.capability() {
            match (capability.resolve().await, capability.issued_at()) {
                (Ok(dir), Some(issued_at)) => println!("Output directory: {} (chosen {})", dir.display(), issued_at),
                _ => println!("Output directory: no longer usable, will ask on next save"),
            }
        }

        for record in self.archive.records() {
            println!(
                "{} {} seed={} {}",
                record.job_id,
                record.image_id,
                record.seed,
                record.local_path.display()
            );
        }
    }
}

fn print_images(job: &Job) {
    for image in job.images() {
        match image.decode() {
            Ok(img) => println!("{} seed={} {}x{}", image.image_id, image.seed, img.width(), img.height()),
            Err(e) => warn!("Could not decode image {}: {}", image.image_id, e),
        }
    }
}

/// Turn command line arguments into a job configuration, naming models the
/// registry knows about.
pub fn build_configuration(args: &GenerateArgs, registry: &ModelRegistry) -> aj_core::Result<JobConfiguration> {
    let defaults = JobConfiguration::default();

    let checkpoint = match &args.checkpoint {
        Some(input) => {
            let model_id = parse_model_reference(input.trim())?;
            let name = registry.find(&model_id, ModelType::Checkpoint).map(|m| m.name.clone());
            CheckpointReference { model_id, name }
        }
        None => defaults.checkpoint.clone(),
    };

    let mut adapters = Vec::with_capacity(args.adapters.len());
    for raw in &args.adapters {
        let (reference, weight) = match raw.rsplit_once('@') {
            Some((reference, weight)) => (reference, Some(weight)),
            None => (raw.as_str(), None),
        };

        let mut adapter = AdapterReference::new(parse_model_reference(reference.trim())?);
        adapter.name = registry.find(&adapter.model_id, ModelType::Adapter).map(|m| m.name.clone());
        if let Some(weight) = weight {
            if !adapter.set_weight_from_input(weight) {
                warn!("Ignoring weight {:?} for adapter {}", weight, adapter.model_id);
            }
        }
        adapters.push(adapter);
    }

    Ok(JobConfiguration {
        prompt: args.prompt.clone(),
        checkpoint,
        adapters,
        sampler: args.sampler.clone().unwrap_or(defaults.sampler),
        width: args.width.unwrap_or(defaults.width),
        height: args.height.unwrap_or(defaults.height),
        seed: args.seed.unwrap_or(defaults.seed),
        steps: args.steps.unwrap_or(defaults.steps),
        cfg_scale: args.cfg_scale.unwrap_or(defaults.cfg_scale),
        clip_skip: args.clip_skip.unwrap_or(defaults.clip_skip),
        guidance: args.guidance.unwrap_or(defaults.guidance),
    })
}
