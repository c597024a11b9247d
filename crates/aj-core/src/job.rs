use std::path::PathBuf;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use crate::error::Result;

pub const DEFAULT_CHECKPOINT_ID: &str = "834401335727231078";
pub const DEFAULT_SAMPLER: &str = "Euler a";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    None,
    Created,
    Queued,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Created | Self::Queued | Self::Running)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    // Queued and Running share a rank: the server may move a job back into
    // the queue after it started running.
    fn rank(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Created => 1,
            Self::Queued | Self::Running => 2,
            Self::Complete | Self::Failed => 3,
        }
    }

    /// Whether a job in this status may move to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_complete() && next.rank() >= self.rank()
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::None => "·",
            Self::Created => "📤",
            Self::Queued => "⏳",
            Self::Running => "⚡",
            Self::Complete => "✅",
            Self::Failed => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointReference {
    pub model_id: String,
    pub name: Option<String>,
}

impl Default for CheckpointReference {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_CHECKPOINT_ID.to_string(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterReference {
    pub model_id: String,
    pub name: Option<String>,
    pub weight: f64,
}

impl AdapterReference {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            name: None,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Update the weight from user text. Input that is not a positive
    /// number leaves the current weight untouched.
    pub fn set_weight_from_input(&mut self, input: &str) -> bool {
        match input.trim().parse::<f64>() {
            Ok(weight) if weight.is_finite() && weight > 0.0 => {
                self.weight = weight;
                true
            }
            _ => false,
        }
    }
}

/// Everything the user configures for one generation request. Only read at
/// submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfiguration {
    pub prompt: String,
    pub checkpoint: CheckpointReference,
    pub adapters: Vec<AdapterReference>,
    pub sampler: String,
    pub width: u32,
    pub height: u32,
    /// -1 lets the server choose
    pub seed: i64,
    pub steps: u32,
    pub cfg_scale: i32,
    pub clip_skip: i32,
    pub guidance: f64,
}

impl Default for JobConfiguration {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            checkpoint: CheckpointReference::default(),
            adapters: Vec::new(),
            sampler: DEFAULT_SAMPLER.to_string(),
            width: 1024,
            height: 1152,
            seed: -1,
            steps: 20,
            cfg_scale: 5,
            clip_skip: 1,
            guidance: 3.5,
        }
    }
}

impl JobConfiguration {
    pub fn adapter_ids(&self) -> Vec<String> {
        self.adapters.iter().map(|a| a.model_id.clone()).collect()
    }
}

/// One downloaded result image.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultImage {
    pub image_id: String,
    pub seed: String,
    pub url: String,
    pub bytes: Vec<u8>,
    /// Set once the image has been written to the output directory
    pub local_path: Option<PathBuf>,
}

impl ResultImage {
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }
}

/// A single remote generation request and its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub(crate) job_id: Option<String>,
    pub(crate) status: JobStatus,
    pub(crate) model_id: String,
    pub(crate) adapter_ids: Vec<String>,
    pub(crate) prompt: String,
    pub(crate) images: Vec<ResultImage>,
}

impl Job {
    pub fn new(config: &JobConfiguration) -> Self {
        Self {
            job_id: None,
            status: JobStatus::None,
            model_id: config.checkpoint.model_id.clone(),
            adapter_ids: config.adapter_ids(),
            prompt: config.prompt.clone(),
            images: Vec::new(),
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn adapter_ids(&self) -> &[String] {
        &self.adapter_ids
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn images(&self) -> &[ResultImage] {
        &self.images
    }

    /// Move to `next` unless that would regress or leave a terminal status.
    pub(crate) fn advance(&mut self, next: JobStatus) -> bool {
        if self.status == next || !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        true
    }
}
