use std::collections::HashMap;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Method};
use uuid::Uuid;
use crate::backend::{send_authorized, ApiConfig};
use crate::backend::schemas::{ImageDescriptor, JobDetails, JobRequest, JobResponse};
use crate::error::Result;
use crate::job::{JobConfiguration, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePosition {
    pub rank: Option<String>,
    pub length: Option<String>,
}

/// Decoded state of a remote job, in local status vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub credits: Option<f64>,
    pub queue: Option<QueuePosition>,
    /// Result images, only populated once the job succeeded
    pub images: Vec<ImageDescriptor>,
    /// Seeds keyed by image id
    pub seeds: HashMap<String, String>,
}

impl From<JobDetails> for JobStatusSnapshot {
    fn from(details: JobDetails) -> Self {
        let queue = details.waiting_info.map(|w| QueuePosition {
            rank: w.queue_rank,
            length: w.queue_len,
        });

        let (images, seeds) = match details.success_info {
            Some(info) => {
                let seeds = info
                    .image_exif_meta_map
                    .into_iter()
                    .filter_map(|(id, exif)| exif.meta.seed.map(|seed| (id, seed)))
                    .collect();
                (info.images, seeds)
            }
            None => (Vec::new(), HashMap::new()),
        };

        Self {
            job_id: details.id,
            status: details.status.into(),
            credits: details.credits,
            queue,
            images,
            seeds,
        }
    }
}

/// The two calls the orchestrator needs from the remote generation service.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Submit a job and return the server-assigned job id.
    async fn submit(&self, config: &JobConfiguration) -> Result<String>;

    async fn get_status(&self, job_id: &str) -> Result<JobStatusSnapshot>;
}

pub struct GenerationJobClient {
    config: ApiConfig,
    client: Client,
}

impl GenerationJobClient {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: ApiConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl GenerationApi for GenerationJobClient {
    async fn submit(&self, config: &JobConfiguration) -> Result<String> {
        let request_body = JobRequest::from_config(config, Uuid::new_v4());
        debug!("Submitting job request {}", request_body.request_id);

        let response = send_authorized(&self.client, &self.config, Method::POST, "/v1/jobs", |req| {
            req.json(&request_body)
        })
        .await?;

        let resp: JobResponse = response.json().await?;
        info!("Job {} submitted ({:?})", resp.job.id, resp.job.status);

        Ok(resp.job.id)
    }

    async fn get_status(&self, job_id: &str) -> Result<JobStatusSnapshot> {
        let path = format!("/v1/jobs/{}", job_id);
        let response = send_authorized(&self.client, &self.config, Method::GET, &path, |req| req).await?;

        let resp: JobResponse = response.json().await?;
        Ok(resp.job.into())
    }
}
