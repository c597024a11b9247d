use std::path::PathBuf;
use aj_core::ModelType;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "artjob")]
#[command(about = "Submit image generation jobs to a remote service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a job and wait for its images
    Generate(GenerateArgs),
    /// Manage locally known models
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },
    /// List saved images
    History,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    pub prompt: String,

    /// Checkpoint id or catalog URL
    #[arg(short, long)]
    pub checkpoint: Option<String>,

    /// Adapter id or catalog URL, optionally with a weight as `REF@WEIGHT`
    #[arg(short, long = "adapter")]
    pub adapters: Vec<String>,

    #[arg(long)]
    pub sampler: Option<String>,
    #[arg(long)]
    pub width: Option<u32>,
    #[arg(long)]
    pub height: Option<u32>,
    #[arg(long, allow_hyphen_values = true)]
    pub seed: Option<i64>,
    #[arg(long)]
    pub steps: Option<u32>,
    #[arg(long)]
    pub cfg_scale: Option<i32>,
    #[arg(long)]
    pub clip_skip: Option<i32>,
    #[arg(long)]
    pub guidance: Option<f64>,

    /// Save the images once the job completes
    #[arg(long)]
    pub save: bool,

    /// Save here instead of asking for a folder
    #[arg(long, requires = "save")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Look a model up in the remote catalog and register it
    Add {
        #[arg(value_enum)]
        kind: ModelKind,
        /// Model id or catalog URL
        reference: String,
    },
    #[command(alias = "ls")]
    List {
        #[arg(value_enum)]
        kind: Option<ModelKind>,
        /// Include hidden models
        #[arg(long)]
        all: bool,
    },
    Hide {
        #[arg(value_enum)]
        kind: ModelKind,
        model_id: String,
        /// Make the model visible again
        #[arg(long)]
        unhide: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModelKind {
    Checkpoint,
    Adapter,
}

impl From<ModelKind> for ModelType {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Checkpoint => ModelType::Checkpoint,
            ModelKind::Adapter => ModelType::Adapter,
        }
    }
}
