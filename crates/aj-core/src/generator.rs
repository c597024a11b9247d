use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use crate::backend::GenerationApi;
use crate::fetcher::ArtifactFetcher;
use crate::job::{Job, JobConfiguration, JobStatus};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How often job status is checked, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Status checks before giving up. `None` polls until a terminal status.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRejected {
    #[error("A job is already being polled")]
    AlreadyActive,
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("No checkpoint selected")]
    EmptyCheckpoint,
}

/// Releases the in-flight flag when the drive sequence ends, however it ends.
struct PollGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives one job at a time through submit, poll and artifact download.
pub struct JobOrchestrator {
    api: Arc<dyn GenerationApi>,
    fetcher: ArtifactFetcher,
    policy: PollPolicy,
    polling: Arc<AtomicBool>,
    job: Mutex<Option<Job>>,
    status_tx: watch::Sender<JobStatus>,
}

impl JobOrchestrator {
    pub fn new(api: Arc<dyn GenerationApi>, fetcher: ArtifactFetcher, policy: PollPolicy) -> Self {
        let (status_tx, _) = watch::channel(JobStatus::None);

        Self {
            api,
            fetcher,
            policy,
            polling: Arc::new(AtomicBool::new(false)),
            job: Mutex::new(None),
            status_tx,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Live status of the current job.
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> JobStatus {
        *self.status_tx.borrow()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    /// Snapshot of the current job, if one was ever started.
    pub fn job(&self) -> Option<Job> {
        self.lock_job().clone()
    }

    /// Submit `config` and poll until the job reaches a terminal status.
    ///
    /// Rejected without touching any state when the prompt or checkpoint is
    /// empty, or while another run is still polling.
    pub async fn run(&self, config: &JobConfiguration) -> Result<JobStatus, RunRejected> {
        let guard = self.try_begin(config)?;
        Ok(self.drive(config.clone(), guard).await)
    }

    /// Like `run`, but drives the job on a spawned task.
    pub fn start(self: &Arc<Self>, config: &JobConfiguration) -> Result<JoinHandle<JobStatus>, RunRejected> {
        let guard = self.try_begin(config)?;
        let this = Arc::clone(self);
        let config = config.clone();

        Ok(tokio::spawn(async move { this.drive(config, guard).await }))
    }

    fn try_begin(&self, config: &JobConfiguration) -> Result<PollGuard, RunRejected> {
        if self.is_polling() {
            return Err(RunRejected::AlreadyActive);
        }
        if config.prompt.trim().is_empty() {
            return Err(RunRejected::EmptyPrompt);
        }
        if config.checkpoint.model_id.is_empty() {
            return Err(RunRejected::EmptyCheckpoint);
        }

        self.polling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RunRejected::AlreadyActive)?;

        Ok(PollGuard {
            flag: Arc::clone(&self.polling),
        })
    }

    async fn drive(&self, config: JobConfiguration, _guard: PollGuard) -> JobStatus {
        *self.lock_job() = Some(Job::new(&config));
        self.status_tx.send_replace(JobStatus::None);

        let job_id = match self.api.submit(&config).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Error starting job: {}", e);
                return self.set_status(JobStatus::Failed);
            }
        };

        if let Some(job) = self.lock_job().as_mut() {
            job.job_id = Some(job_id.clone());
        }
        self.set_status(JobStatus::Created);

        self.poll(&job_id).await
    }

    async fn poll(&self, job_id: &str) -> JobStatus {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            debug!("Polling job status for job ID {} (attempt {})", job_id, attempts);

            let snapshot = match self.api.get_status(job_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Error polling job {}: {}", job_id, e);
                    return self.set_status(JobStatus::Failed);
                }
            };

            if let Some(queue) = &snapshot.queue {
                debug!(
                    "Job {} queued at {} of {}",
                    job_id,
                    queue.rank.as_deref().unwrap_or("?"),
                    queue.length.as_deref().unwrap_or("?")
                );
            }

            if snapshot.status == JobStatus::Complete {
                if let Some(credits) = snapshot.credits {
                    debug!("Job {} used {} credits", job_id, credits);
                }

                let images = self.fetcher.fetch_all(&snapshot.images, &snapshot.seeds).await;
                if let Some(job) = self.lock_job().as_mut() {
                    job.images = images;
                }
                return self.set_status(JobStatus::Complete);
            }

            self.set_status(snapshot.status);

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    warn!("Job {} still not finished after {} status checks", job_id, attempts);
                    return self.set_status(JobStatus::Failed);
                }
            }

            tokio::time::sleep(self.policy.interval).await;
        }
    }

    /// Apply a status change if it keeps the job monotonic, and publish it.
    fn set_status(&self, next: JobStatus) -> JobStatus {
        let mut guard = self.lock_job();
        let Some(job) = guard.as_mut() else {
            return JobStatus::None;
        };

        if job.advance(next) {
            info!("Job {} is now {:?}", job.job_id().unwrap_or("<unsubmitted>"), next);
            self.status_tx.send_replace(next);
        }
        job.status()
    }

    fn lock_job(&self) -> MutexGuard<'_, Option<Job>> {
        // A poisoned lock only means a panic elsewhere; the job data is intact.
        self.job.lock().unwrap_or_else(|e| e.into_inner())
    }
}
