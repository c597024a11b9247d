use std::collections::HashMap;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use crate::job::{JobConfiguration, JobStatus};

pub const AUTOMATIC_VAE: &str = "Automatic";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JobRequest {
    pub request_id: Uuid,
    pub stages: Vec<JobStage>,
}

impl JobRequest {
    /// Build the two-stage submission for `config`. The initialization stage
    /// always asks for one image with a server-chosen seed.
    pub fn from_config(config: &JobConfiguration, request_id: Uuid) -> Self {
        Self {
            request_id,
            stages: vec![
                JobStage::InputInitialize {
                    input_initialize: InputInitialize { count: 1, seed: -1 },
                },
                JobStage::Diffusion {
                    diffusion: Diffusion {
                        cfg_scale: config.cfg_scale,
                        clip_skip: config.clip_skip,
                        guidance: config.guidance,
                        height: config.height,
                        prompts: vec![PromptText { text: config.prompt.clone() }],
                        sampler: config.sampler.clone(),
                        sd_vae: AUTOMATIC_VAE.to_string(),
                        sd_model: config.checkpoint.model_id.clone(),
                        steps: config.steps,
                        width: config.width,
                    },
                },
            ],
        }
    }
}

/// One phase of a job submission. Order within `JobRequest::stages` matters.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum JobStage {
    #[serde(rename = "INPUT_INITIALIZE")]
    InputInitialize {
        #[serde(rename = "inputInitialize")]
        input_initialize: InputInitialize,
    },
    #[serde(rename = "DIFFUSION")]
    Diffusion { diffusion: Diffusion },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InputInitialize {
    pub count: u32,
    pub seed: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diffusion {
    pub cfg_scale: i32,
    pub clip_skip: i32,
    pub guidance: f64,
    pub height: u32,
    pub prompts: Vec<PromptText>,
    pub sampler: String,
    pub sd_vae: String,
    #[serde(rename = "sd_model")]
    pub sd_model: String,
    pub steps: u32,
    pub width: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromptText {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JobResponse {
    pub job: JobDetails,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteJobStatus {
    Created,
    Waiting,
    Running,
    Success,
}

impl From<RemoteJobStatus> for JobStatus {
    fn from(status: RemoteJobStatus) -> Self {
        match status {
            RemoteJobStatus::Created => JobStatus::Created,
            RemoteJobStatus::Waiting => JobStatus::Queued,
            RemoteJobStatus::Running => JobStatus::Running,
            RemoteJobStatus::Success => JobStatus::Complete,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub id: String,
    pub status: RemoteJobStatus,
    #[serde(default)]
    pub credits: Option<f64>,
    #[serde(default)]
    pub waiting_info: Option<WaitingInfo>,
    #[serde(default)]
    pub success_info: Option<SuccessInfo>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WaitingInfo {
    #[serde(rename = "queueRank", default, deserialize_with = "lenient_string")]
    pub queue_rank: Option<String>,
    #[serde(rename = "queueLen", default, deserialize_with = "lenient_string")]
    pub queue_len: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessInfo {
    #[serde(default)]
    pub images: Vec<ImageDescriptor>,
    #[serde(default)]
    pub image_exif_meta_map: HashMap<String, ImageExif>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageDescriptor {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ImageExif {
    pub meta: ImageMeta,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ImageMeta {
    #[serde(rename = "FileSize", default, deserialize_with = "lenient_string")]
    pub file_size: Option<String>,
    #[serde(rename = "ImageSize", default, deserialize_with = "lenient_string")]
    pub image_size: Option<String>,
    #[serde(rename = "MIMEType", default, deserialize_with = "lenient_string")]
    pub mime_type: Option<String>,
    #[serde(rename = "Seed", default, deserialize_with = "lenient_string")]
    pub seed: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub model: ModelDetails,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetails {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub model_type: String,
    #[serde(default)]
    pub project_name: String,
}

impl ModelDetails {
    pub fn display_name(&self) -> &str {
        if self.project_name.is_empty() {
            &self.name
        } else {
            &self.project_name
        }
    }
}

// The API is not consistent about quoting numeric metadata.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
