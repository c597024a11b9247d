pub mod archive;
pub mod backend;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod job;
mod model_types;
pub mod reference;
pub mod registry;

pub use archive::{DirectoryChooser, GeneratedImageRecord, OutputArchive, OutputCapability, SaveReport};
pub use error::{Error, Result};
pub use fetcher::ArtifactFetcher;
pub use generator::{JobOrchestrator, PollPolicy, RunRejected};
pub use job::{AdapterReference, CheckpointReference, Job, JobConfiguration, JobStatus, ResultImage};
pub use model_types::{ModelDefinition, ModelType};
pub use reference::parse_model_reference;
pub use registry::ModelRegistry;
